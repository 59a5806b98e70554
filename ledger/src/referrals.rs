use common::models::{Account, Referral};
use common::utils::{Bucket, EntryReason, MembershipTier, ReferralStatus};
use sqlx::{Pool, Postgres, Transaction};
use tracing::{info, warn};

use crate::entries::apply_entry;
use crate::error::{is_unique_violation, LedgerError};
use crate::policy::Policy;

/// Records a pending referral at signup. An unknown code is not an error:
/// the signup proceeds and no referral exists. A user can appear as the
/// referred party at most once.
pub async fn record_referral(
    pool: &Pool<Postgres>,
    referral_code: &str,
    referred_id: i32,
) -> Result<Option<Referral>, LedgerError> {
    let referrer: Option<Account> =
        sqlx::query_as("SELECT * FROM accounts WHERE referral_code = $1")
            .bind(referral_code)
            .fetch_optional(pool)
            .await?;
    let referrer = match referrer {
        Some(referrer) => referrer,
        None => {
            warn!("signup used unknown referral code {:?}", referral_code);
            return Ok(None);
        }
    };

    if referrer.id == referred_id {
        return Err(LedgerError::Validation(
            "an account cannot refer itself".to_string(),
        ));
    }

    let referral: Referral = sqlx::query_as(
        "INSERT INTO referrals (referrer_id, referred_id, referral_code)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(referrer.id)
    .bind(referred_id)
    .bind(referral_code)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::Validation("this account was already referred".to_string())
        } else {
            LedgerError::Database(err)
        }
    })?;

    Ok(Some(referral))
}

/// Credits the referrer's bonus when the referred account activates a paid
/// membership, exactly once per referral. Runs on the reconciler's
/// transaction so the credit commits atomically with the membership
/// activation. Re-invocation for an already-credited referral is a no-op,
/// which is what makes duplicate gateway deliveries harmless.
pub async fn credit_referral_if_eligible(
    tx: &mut Transaction<'_, Postgres>,
    policy: &Policy,
    referred_id: i32,
    new_tier: MembershipTier,
) -> Result<Option<Referral>, LedgerError> {
    let referral: Option<Referral> =
        sqlx::query_as("SELECT * FROM referrals WHERE referred_id = $1 FOR UPDATE")
            .bind(referred_id)
            .fetch_optional(&mut **tx)
            .await?;
    let referral = match referral {
        Some(referral) => referral,
        None => return Ok(None),
    };

    let status: ReferralStatus = referral
        .status
        .parse()
        .map_err(|_| LedgerError::Validation("referral has an unknown status".to_string()))?;
    if status == ReferralStatus::Credited {
        info!(
            "referral {} already credited, skipping duplicate trigger",
            referral.id
        );
        return Ok(None);
    }

    let bonus_cents = policy.bonus_for(new_tier);
    if bonus_cents == 0 {
        return Ok(None);
    }

    let credited: Referral = sqlx::query_as(
        "UPDATE referrals
         SET status = $1, referred_tier = $2, bonus_cents = $3, credited_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(ReferralStatus::Credited.to_string())
    .bind(new_tier.to_string())
    .bind(bonus_cents)
    .bind(referral.id)
    .fetch_one(&mut **tx)
    .await?;

    apply_entry(
        tx,
        referral.referrer_id,
        Bucket::Referral,
        bonus_cents,
        EntryReason::ReferralCredit,
        referral.id,
    )
    .await?;

    info!(
        "referral {} credited: {} cents to account {} for {} activation",
        credited.id, bonus_cents, credited.referrer_id, new_tier
    );

    Ok(Some(credited))
}

pub async fn list_for_referrer(
    pool: &Pool<Postgres>,
    referrer_id: i32,
) -> Result<Vec<Referral>, LedgerError> {
    let referrals: Vec<Referral> =
        sqlx::query_as("SELECT * FROM referrals WHERE referrer_id = $1 ORDER BY created_at DESC")
            .bind(referrer_id)
            .fetch_all(pool)
            .await?;

    Ok(referrals)
}
