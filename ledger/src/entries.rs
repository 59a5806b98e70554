use common::models::{Account, LedgerEntry};
use common::utils::{Bucket, EntryReason};
use sqlx::{Pool, Postgres, Transaction};
use tracing::info;

use crate::balance::Balances;
use crate::error::LedgerError;

/// The single choke-point for monetary mutation. Locks the account row,
/// applies the delta through the pure [`Balances`] projection, persists the
/// new balances and appends the audit entry, all on the caller's
/// transaction. The entry and the balance update commit or roll back as one
/// unit together with the state transition that triggered them.
pub async fn apply_entry(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i32,
    bucket: Bucket,
    delta_cents: i64,
    reason: EntryReason,
    related_id: i32,
) -> Result<Account, LedgerError> {
    // Per-account serialization point: concurrent writers queue here.
    let account: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE id = $1 FOR UPDATE")
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?;
    let account = account.ok_or(LedgerError::AccountNotFound(account_id))?;

    let mut balances = Balances::of(&account);
    let balance_after = balances.apply(bucket, delta_cents, reason)?;

    let updated: Account = sqlx::query_as(
        "UPDATE accounts
         SET task_earnings_cents = $1,
             referral_earnings_cents = $2,
             total_earnings_cents = $3,
             version = version + 1,
             updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(balances.task_cents)
    .bind(balances.referral_cents)
    .bind(balances.total_cents)
    .bind(account_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO ledger_entries (account_id, bucket, delta_cents, reason, related_id, balance_after_cents)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(account_id)
    .bind(bucket.to_string())
    .bind(delta_cents)
    .bind(reason.to_string())
    .bind(related_id)
    .bind(balance_after)
    .execute(&mut **tx)
    .await?;

    info!(
        "balance_changed: account {} {} {:+} cents ({}) -> {}",
        account_id, bucket, delta_cents, reason, balance_after
    );

    Ok(updated)
}

/// Newest-first audit trail for one account.
pub async fn list_entries(
    pool: &Pool<Postgres>,
    account_id: i32,
    limit: i64,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let entries: Vec<LedgerEntry> = sqlx::query_as(
        "SELECT * FROM ledger_entries WHERE account_id = $1 ORDER BY id DESC LIMIT $2",
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
