use common::models::LedgerEntry;
use common::utils::{Bucket, EntryReason};
use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::accounts::get_account;
use crate::balance::Balances;
use crate::error::LedgerError;

/// Result of replaying an account's entry log against its stored balances.
/// Any difference means a write bypassed the ledger or the log is damaged.
/// Either way the account needs operator attention before more money moves.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub account_id: i32,
    pub entries_replayed: usize,
    pub stored: Balances,
    pub replayed: Balances,
}

impl ReplayReport {
    pub fn in_sync(&self) -> bool {
        self.stored == self.replayed
    }
}

/// Folds an entry log (oldest first) into the balance projection it implies.
pub fn project(entries: &[LedgerEntry]) -> Result<Balances, LedgerError> {
    let mut balances = Balances::default();

    for entry in entries {
        let bucket: Bucket = entry
            .bucket
            .parse()
            .map_err(|_| LedgerError::Validation(format!("entry {} has an unknown bucket", entry.id)))?;
        let reason: EntryReason = entry
            .reason
            .parse()
            .map_err(|_| LedgerError::Validation(format!("entry {} has an unknown reason", entry.id)))?;

        let after = balances.apply(bucket, entry.delta_cents, reason)?;
        if after != entry.balance_after_cents {
            return Err(LedgerError::Validation(format!(
                "entry {} recorded balance {} but replay produced {}",
                entry.id, entry.balance_after_cents, after
            )));
        }
    }

    Ok(balances)
}

/// Replays the full entry log for one account and diffs it against the
/// stored columns.
pub async fn verify_account(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<ReplayReport, LedgerError> {
    let account = get_account(pool, account_id).await?;

    let entries: Vec<LedgerEntry> =
        sqlx::query_as("SELECT * FROM ledger_entries WHERE account_id = $1 ORDER BY id ASC")
            .bind(account_id)
            .fetch_all(pool)
            .await?;

    let replayed = project(&entries)?;

    Ok(ReplayReport {
        account_id,
        entries_replayed: entries.len(),
        stored: Balances::of(&account),
        replayed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i64, bucket: &str, delta: i64, reason: &str, after: i64) -> LedgerEntry {
        LedgerEntry {
            id,
            account_id: 1,
            bucket: bucket.to_string(),
            delta_cents: delta,
            reason: reason.to_string(),
            related_id: 7,
            balance_after_cents: after,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replay_reproduces_a_clean_history() {
        let log = vec![
            entry(1, "task", 1_250, "submission-approved", 1_250),
            entry(2, "referral", 1_500, "referral-credit", 1_500),
            entry(3, "referral", -1_500, "withdrawal-debit", 0),
            entry(4, "referral", 1_500, "withdrawal-refund", 1_500),
        ];

        let balances = project(&log).unwrap();
        assert_eq!(balances.task_cents, 1_250);
        assert_eq!(balances.referral_cents, 1_500);
        assert_eq!(balances.approved_cents(), 2_750);
        assert_eq!(balances.total_cents, 2_750);
    }

    #[test]
    fn replay_catches_a_tampered_running_balance() {
        let log = vec![entry(1, "task", 1_000, "submission-approved", 999)];

        let err = project(&log).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn replay_rejects_logs_that_overdraw() {
        // A debit with no prior credit cannot come from a healthy ledger.
        let log = vec![entry(1, "task", -500, "withdrawal-debit", -500)];

        let err = project(&log).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[test]
    fn drift_report_compares_stored_and_replayed() {
        let report = ReplayReport {
            account_id: 1,
            entries_replayed: 1,
            stored: Balances {
                task_cents: 1_000,
                referral_cents: 0,
                total_cents: 1_000,
            },
            replayed: Balances {
                task_cents: 1_000,
                referral_cents: 0,
                total_cents: 1_000,
            },
        };
        assert!(report.in_sync());

        let drifted = ReplayReport {
            stored: Balances {
                task_cents: 900,
                referral_cents: 0,
                total_cents: 1_000,
            },
            ..report
        };
        assert!(!drifted.in_sync());
    }
}
