use common::models::WithdrawalRequest;
use common::notify;
use common::utils::{Bucket, EntryReason, WithdrawalStatus};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::entries::apply_entry;
use crate::error::{is_unique_violation, LedgerError};
use crate::policy::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalDecision {
    Approve,
    Reject,
    Complete,
}

impl WithdrawalDecision {
    fn action(&self) -> &'static str {
        match self {
            WithdrawalDecision::Approve => "approve",
            WithdrawalDecision::Reject => "reject",
            WithdrawalDecision::Complete => "complete",
        }
    }
}

/// Files a withdrawal and reserves the funds in the same transaction: the
/// bucket is debited the instant the request exists, so two requests can
/// never spend the same balance. A partial unique index backs the
/// one-pending-per-bucket rule against races the pre-check cannot see.
pub async fn request_withdrawal(
    pool: &Pool<Postgres>,
    policy: &Policy,
    account_id: i32,
    amount_cents: i64,
    bucket: Bucket,
    payment_method: &str,
    payment_details: serde_json::Value,
) -> Result<WithdrawalRequest, LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::Validation(
            "withdrawal amount must be positive".to_string(),
        ));
    }
    if payment_method.trim().is_empty() {
        return Err(LedgerError::Validation(
            "a payment method is required".to_string(),
        ));
    }
    let minimum_cents = policy.min_withdrawal_cents(bucket);
    if amount_cents < minimum_cents {
        return Err(LedgerError::BelowMinimum {
            bucket,
            minimum_cents,
        });
    }

    let mut tx = pool.begin().await?;

    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM withdrawal_requests
         WHERE account_id = $1 AND bucket = $2 AND status = 'pending'",
    )
    .bind(account_id)
    .bind(bucket.to_string())
    .fetch_optional(&mut *tx)
    .await?;
    if existing.is_some() {
        return Err(LedgerError::PendingWithdrawalExists { bucket });
    }

    let request: WithdrawalRequest = sqlx::query_as(
        "INSERT INTO withdrawal_requests (account_id, amount_cents, bucket, payment_method, payment_details)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(account_id)
    .bind(amount_cents)
    .bind(bucket.to_string())
    .bind(payment_method)
    .bind(&payment_details)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::PendingWithdrawalExists { bucket }
        } else {
            LedgerError::Database(err)
        }
    })?;

    // Reserve the funds now, not at approval. Insufficient balance aborts
    // the transaction and takes the request row with it.
    apply_entry(
        &mut tx,
        account_id,
        bucket,
        -amount_cents,
        EntryReason::WithdrawalDebit,
        request.id,
    )
    .await?;

    tx.commit().await?;
    info!(
        "withdrawal {} filed: {} cents from {} bucket of account {}",
        request.id, amount_cents, bucket, account_id
    );

    Ok(request)
}

/// Admin decision on a withdrawal. Approval and completion are status-only
/// (the money already left at request time); rejection refunds exactly the
/// reserved amount back to the originating bucket.
pub async fn review_withdrawal(
    pool: &Pool<Postgres>,
    withdrawal_id: i32,
    decision: WithdrawalDecision,
    reviewer_id: i32,
    notes: Option<String>,
) -> Result<WithdrawalRequest, LedgerError> {
    let mut tx = pool.begin().await?;

    let request: Option<WithdrawalRequest> =
        sqlx::query_as("SELECT * FROM withdrawal_requests WHERE id = $1 FOR UPDATE")
            .bind(withdrawal_id)
            .fetch_optional(&mut *tx)
            .await?;
    let request = request.ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

    let status: WithdrawalStatus = request
        .status
        .parse()
        .map_err(|_| LedgerError::Validation("withdrawal has an unknown status".to_string()))?;
    let bucket: Bucket = request
        .bucket
        .parse()
        .map_err(|_| LedgerError::Validation("withdrawal has an unknown bucket".to_string()))?;

    let reviewed = match (status, decision) {
        (WithdrawalStatus::Pending, WithdrawalDecision::Approve) => {
            let reviewed: WithdrawalRequest = sqlx::query_as(
                "UPDATE withdrawal_requests
                 SET status = $1, reviewed_by = $2, reviewed_at = NOW(), admin_notes = $3
                 WHERE id = $4
                 RETURNING *",
            )
            .bind(WithdrawalStatus::Approved.to_string())
            .bind(reviewer_id)
            .bind(&notes)
            .bind(withdrawal_id)
            .fetch_one(&mut *tx)
            .await?;
            reviewed
        }
        (WithdrawalStatus::Pending, WithdrawalDecision::Reject) => {
            let reviewed: WithdrawalRequest = sqlx::query_as(
                "UPDATE withdrawal_requests
                 SET status = $1, reviewed_by = $2, reviewed_at = NOW(), admin_notes = $3
                 WHERE id = $4
                 RETURNING *",
            )
            .bind(WithdrawalStatus::Rejected.to_string())
            .bind(reviewer_id)
            .bind(&notes)
            .bind(withdrawal_id)
            .fetch_one(&mut *tx)
            .await?;

            // Exact restore of what the request reserved.
            apply_entry(
                &mut tx,
                request.account_id,
                bucket,
                request.amount_cents,
                EntryReason::WithdrawalRefund,
                withdrawal_id,
            )
            .await?;

            reviewed
        }
        (WithdrawalStatus::Approved, WithdrawalDecision::Complete) => {
            let reviewed: WithdrawalRequest = sqlx::query_as(
                "UPDATE withdrawal_requests
                 SET status = $1, completed_at = NOW()
                 WHERE id = $2
                 RETURNING *",
            )
            .bind(WithdrawalStatus::Completed.to_string())
            .bind(withdrawal_id)
            .fetch_one(&mut *tx)
            .await?;
            reviewed
        }
        _ => {
            return Err(LedgerError::InvalidStateTransition {
                entity: "withdrawal",
                from: request.status,
                action: decision.action(),
            });
        }
    };

    tx.commit().await?;

    let (account_id, title, message) = match decision {
        WithdrawalDecision::Approve => (
            reviewed.account_id,
            "Withdrawal approved".to_string(),
            format!(
                "Your withdrawal of ${:.2} was approved and will be paid out shortly.",
                reviewed.amount_cents as f64 / 100.0
            ),
        ),
        WithdrawalDecision::Reject => (
            reviewed.account_id,
            "Withdrawal rejected".to_string(),
            format!(
                "Your withdrawal of ${:.2} was rejected and the funds were returned to your {} balance.",
                reviewed.amount_cents as f64 / 100.0,
                reviewed.bucket
            ),
        ),
        WithdrawalDecision::Complete => (
            reviewed.account_id,
            "Withdrawal completed".to_string(),
            format!(
                "Your withdrawal of ${:.2} has been sent to your {}.",
                reviewed.amount_cents as f64 / 100.0,
                reviewed.payment_method
            ),
        ),
    };
    tokio::spawn(async move {
        notify::notify(account_id, &title, &message, "withdrawal_review").await;
    });
    info!("withdrawal {} reviewed: {:?}", withdrawal_id, decision);

    Ok(reviewed)
}

pub async fn list_for_account(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<Vec<WithdrawalRequest>, LedgerError> {
    let requests: Vec<WithdrawalRequest> = sqlx::query_as(
        "SELECT * FROM withdrawal_requests WHERE account_id = $1 ORDER BY created_at DESC",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// Admin listing, optionally narrowed to one status, oldest first.
pub async fn list_by_status(
    pool: &Pool<Postgres>,
    status: Option<WithdrawalStatus>,
    limit: i64,
) -> Result<Vec<WithdrawalRequest>, LedgerError> {
    let requests: Vec<WithdrawalRequest> = match status {
        Some(status) => {
            sqlx::query_as(
                "SELECT * FROM withdrawal_requests WHERE status = $1 ORDER BY created_at ASC LIMIT $2",
            )
            .bind(status.to_string())
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT * FROM withdrawal_requests ORDER BY created_at ASC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(requests)
}
