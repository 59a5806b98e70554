use chrono::Utc;
use common::models::{Account, Job, Submission};
use common::notify;
use common::utils::{Bucket, EntryReason, SubmissionStatus};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::accounts::effective_tier;
use crate::entries::apply_entry;
use crate::error::{is_unique_violation, LedgerError};
use crate::policy::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Files a work submission against a job. The payout amount is copied from
/// the job here and never read from the job again: price edits after this
/// point do not change what this submission pays.
pub async fn create_submission(
    pool: &Pool<Postgres>,
    policy: &Policy,
    account_id: i32,
    job_id: i32,
    proof_url: &str,
) -> Result<Submission, LedgerError> {
    // No proof, no submission: a failed upload must not leave a row behind.
    if proof_url.trim().is_empty() {
        return Err(LedgerError::Validation(
            "a proof attachment is required to submit work".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let job: Option<Job> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1 AND is_active = TRUE")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
    let job = job.ok_or(LedgerError::JobNotFound(job_id))?;

    // Locked so the quota check-and-increment cannot race a parallel submit.
    let account: Option<Account> =
        sqlx::query_as("SELECT * FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await?;
    let account = account.ok_or(LedgerError::AccountNotFound(account_id))?;

    let tier = effective_tier(&account);
    let required: common::utils::MembershipTier = job
        .required_tier
        .parse()
        .map_err(|_| LedgerError::Validation("job has an unknown required tier".to_string()))?;
    if tier.rank() < required.rank() {
        return Err(LedgerError::TierRequired(job.required_tier));
    }

    let today = Utc::now().date_naive();
    let used_today = if account.last_reset_date == Some(today) {
        account.daily_tasks_used
    } else {
        0
    };
    if used_today >= policy.daily_task_limit(tier) {
        return Err(LedgerError::DailyLimitReached);
    }

    let submission: Submission = sqlx::query_as(
        "INSERT INTO submissions (job_id, account_id, payment_amount_cents, proof_url)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(job_id)
    .bind(account_id)
    .bind(job.payment_amount_cents)
    .bind(proof_url)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LedgerError::DuplicateSubmission
        } else {
            LedgerError::Database(err)
        }
    })?;

    sqlx::query(
        "UPDATE accounts SET daily_tasks_used = $1, last_reset_date = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(used_today + 1)
    .bind(today)
    .bind(account_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(submission)
}

/// The admin decision on a pending submission. Approval credits the frozen
/// payout to the task bucket and bumps the lifetime task counter in the same
/// transaction as the status flip; a rejected submission was never credited,
/// so rejection touches no balance.
pub async fn review_submission(
    pool: &Pool<Postgres>,
    submission_id: i32,
    decision: ReviewDecision,
    reviewer_id: i32,
    feedback: Option<String>,
) -> Result<Submission, LedgerError> {
    let mut tx = pool.begin().await?;

    let submission: Option<Submission> =
        sqlx::query_as("SELECT * FROM submissions WHERE id = $1 FOR UPDATE")
            .bind(submission_id)
            .fetch_optional(&mut *tx)
            .await?;
    let submission = submission.ok_or(LedgerError::SubmissionNotFound(submission_id))?;

    let status: SubmissionStatus = submission
        .status
        .parse()
        .map_err(|_| LedgerError::Validation("submission has an unknown status".to_string()))?;
    if status != SubmissionStatus::Pending {
        return Err(LedgerError::InvalidStateTransition {
            entity: "submission",
            from: submission.status,
            action: "review",
        });
    }

    let reviewed = match decision {
        ReviewDecision::Approve => {
            let reviewed: Submission = sqlx::query_as(
                "UPDATE submissions
                 SET status = $1, reviewed_by = $2, reviewed_at = NOW(), admin_feedback = $3
                 WHERE id = $4
                 RETURNING *",
            )
            .bind(SubmissionStatus::Approved.to_string())
            .bind(reviewer_id)
            .bind(&feedback)
            .bind(submission_id)
            .fetch_one(&mut *tx)
            .await?;

            apply_entry(
                &mut tx,
                submission.account_id,
                Bucket::Task,
                submission.payment_amount_cents,
                EntryReason::SubmissionApproved,
                submission_id,
            )
            .await?;

            sqlx::query(
                "UPDATE accounts SET tasks_completed = tasks_completed + 1 WHERE id = $1",
            )
            .bind(submission.account_id)
            .execute(&mut *tx)
            .await?;

            reviewed
        }
        ReviewDecision::Reject => {
            let reviewed: Submission = sqlx::query_as(
                "UPDATE submissions
                 SET status = $1, reviewed_by = $2, reviewed_at = NOW(), admin_feedback = $3
                 WHERE id = $4
                 RETURNING *",
            )
            .bind(SubmissionStatus::Rejected.to_string())
            .bind(reviewer_id)
            .bind(&feedback)
            .bind(submission_id)
            .fetch_one(&mut *tx)
            .await?;

            reviewed
        }
    };

    tx.commit().await?;

    let (account_id, title, message) = match decision {
        ReviewDecision::Approve => (
            reviewed.account_id,
            "Submission approved".to_string(),
            format!(
                "Your submission for job {} was approved and ${:.2} was credited to your task earnings.",
                reviewed.job_id,
                reviewed.payment_amount_cents as f64 / 100.0
            ),
        ),
        ReviewDecision::Reject => (
            reviewed.account_id,
            "Submission rejected".to_string(),
            reviewed
                .admin_feedback
                .clone()
                .unwrap_or_else(|| "Your submission did not meet the requirements.".to_string()),
        ),
    };
    tokio::spawn(async move {
        notify::notify(account_id, &title, &message, "submission_review").await;
    });
    info!("submission {} reviewed: {:?}", submission_id, decision);

    Ok(reviewed)
}

/// Read-time projection of pending earnings: the sum of open submissions'
/// frozen payouts. Never stored, so it cannot drift.
pub async fn pending_earnings_cents(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<i64, LedgerError> {
    let total: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(payment_amount_cents), 0)::BIGINT
         FROM submissions
         WHERE account_id = $1 AND status = 'pending'",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;

    Ok(total.0)
}

pub async fn list_for_account(
    pool: &Pool<Postgres>,
    account_id: i32,
) -> Result<Vec<Submission>, LedgerError> {
    let submissions: Vec<Submission> =
        sqlx::query_as("SELECT * FROM submissions WHERE account_id = $1 ORDER BY created_at DESC")
            .bind(account_id)
            .fetch_all(pool)
            .await?;

    Ok(submissions)
}

/// Admin review queue, oldest first.
pub async fn list_pending(
    pool: &Pool<Postgres>,
    limit: i64,
) -> Result<Vec<Submission>, LedgerError> {
    let submissions: Vec<Submission> = sqlx::query_as(
        "SELECT * FROM submissions WHERE status = 'pending' ORDER BY created_at ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(submissions)
}
