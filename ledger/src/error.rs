use common::utils::Bucket;
use thiserror::Error;

fn usd(cents: &i64) -> String {
    format!("{:.2}", *cents as f64 / 100.0)
}

/// Failure taxonomy for every ledger-adjacent operation. Validation and
/// business rejections carry messages suitable for the caller; `Database`
/// wraps infra faults that surface as a generic retry-later response.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(i32),

    #[error("insufficient {} balance: ${} available, ${} requested", .bucket, usd(.available_cents), usd(.requested_cents))]
    InsufficientFunds {
        bucket: Bucket,
        available_cents: i64,
        requested_cents: i64,
    },

    #[error("minimum withdrawal for {} balance is ${}", .bucket, usd(.minimum_cents))]
    BelowMinimum { bucket: Bucket, minimum_cents: i64 },

    #[error("a pending {bucket} withdrawal already exists for this account")]
    PendingWithdrawalExists { bucket: Bucket },

    #[error("{entity} is {from}, cannot {action}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    #[error("submission {0} not found")]
    SubmissionNotFound(i32),

    #[error("withdrawal {0} not found")]
    WithdrawalNotFound(i32),

    #[error("payment {0} not found")]
    PaymentNotFound(String),

    #[error("job {0} not found")]
    JobNotFound(i32),

    #[error("{0} membership or higher is required for this job")]
    TierRequired(String),

    #[error("this job has already been submitted by this account")]
    DuplicateSubmission,

    #[error("daily task limit reached, try again tomorrow")]
    DailyLimitReached,

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    /// True for errors the caller can fix and resubmit; false for faults
    /// that should surface as a generic retry-later response.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, LedgerError::Database(_))
    }
}

/// Postgres unique-violation check, used to map constraint races (duplicate
/// submission, second pending withdrawal) onto their business errors.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
