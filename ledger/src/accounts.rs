use chrono::Utc;
use common::models::Account;
use common::utils::MembershipTier;
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::referrals;
use crate::submissions;

/// Read-side view of an account's money: the two stored buckets, the derived
/// approved sum, the projected pending earnings and the lifetime total.
#[derive(Debug, Serialize)]
pub struct BalancesView {
    pub account_id: i32,
    pub task_earnings_cents: i64,
    pub referral_earnings_cents: i64,
    pub approved_earnings_cents: i64,
    pub pending_earnings_cents: i64,
    pub total_earnings_cents: i64,
    pub tasks_completed: i32,
    pub membership_tier: String,
    pub membership_expires_at: Option<chrono::DateTime<Utc>>,
}

/// The tier that currently gates job access: a paid tier counts only while
/// the membership has not expired.
pub fn effective_tier(account: &Account) -> MembershipTier {
    let tier: MembershipTier = match account.membership_tier.parse() {
        Ok(tier) => tier,
        Err(_) => return MembershipTier::None,
    };

    if !tier.is_paid() {
        return tier;
    }
    match account.membership_expires_at {
        Some(expires_at) if expires_at > Utc::now() => tier,
        _ => MembershipTier::None,
    }
}

pub async fn create_account(
    pool: &Pool<Postgres>,
    email: &str,
    display_name: &str,
    referred_by_code: Option<&str>,
) -> Result<Account, LedgerError> {
    if email.trim().is_empty() {
        return Err(LedgerError::Validation("email must not be empty".to_string()));
    }

    let referral_code = Uuid::new_v4().simple().to_string()[..8].to_uppercase();

    let account: Account = sqlx::query_as(
        "INSERT INTO accounts (email, display_name, referral_code)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(email)
    .bind(display_name)
    .bind(&referral_code)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if crate::error::is_unique_violation(&err) {
            LedgerError::Validation("an account with this email already exists".to_string())
        } else {
            LedgerError::Database(err)
        }
    })?;

    if let Some(code) = referred_by_code {
        referrals::record_referral(pool, code, account.id).await?;
    }

    Ok(account)
}

pub async fn get_account(pool: &Pool<Postgres>, account_id: i32) -> Result<Account, LedgerError> {
    let account: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

    account.ok_or(LedgerError::AccountNotFound(account_id))
}

/// The only read path the dashboard needs: stored buckets plus the two
/// derived figures, computed in one place so no two screens can disagree.
pub async fn get_balances(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<BalancesView, LedgerError> {
    let account = get_account(pool, account_id).await?;
    let pending_earnings_cents = submissions::pending_earnings_cents(pool, account_id).await?;

    Ok(BalancesView {
        account_id: account.id,
        task_earnings_cents: account.task_earnings_cents,
        referral_earnings_cents: account.referral_earnings_cents,
        approved_earnings_cents: account.task_earnings_cents + account.referral_earnings_cents,
        pending_earnings_cents,
        total_earnings_cents: account.total_earnings_cents,
        tasks_completed: account.tasks_completed,
        membership_tier: account.membership_tier,
        membership_expires_at: account.membership_expires_at,
    })
}

/// Accounts are never deleted, only deactivated.
pub async fn deactivate_account(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<(), LedgerError> {
    let result = sqlx::query("UPDATE accounts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(account_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::AccountNotFound(account_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn account_with(tier: &str, expires_at: Option<chrono::DateTime<Utc>>) -> Account {
        Account {
            id: 1,
            email: "worker@example.com".to_string(),
            display_name: "Worker".to_string(),
            referral_code: "ABCD1234".to_string(),
            membership_tier: tier.to_string(),
            membership_expires_at: expires_at,
            daily_tasks_used: 0,
            last_reset_date: None,
            tasks_completed: 0,
            task_earnings_cents: 0,
            referral_earnings_cents: 0,
            total_earnings_cents: 0,
            version: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expired_membership_falls_back_to_free_tier() {
        let expired = account_with("vip", Some(Utc::now() - Duration::days(1)));
        assert_eq!(effective_tier(&expired), MembershipTier::None);

        let current = account_with("vip", Some(Utc::now() + Duration::days(10)));
        assert_eq!(effective_tier(&current), MembershipTier::Vip);

        let never_paid = account_with("none", None);
        assert_eq!(effective_tier(&never_paid), MembershipTier::None);
    }

    #[test]
    fn unknown_tier_string_is_treated_as_free() {
        let broken = account_with("platinum", Some(Utc::now() + Duration::days(10)));
        assert_eq!(effective_tier(&broken), MembershipTier::None);
    }
}
