//! End-to-end ledger properties against a real Postgres. These tests need a
//! provisioned database:
//!
//!     DATABASE_URL=postgres://localhost/marketplace_test cargo test -- --ignored
//!
//! Each test creates its own accounts (unique emails) so runs are independent.

use common::utils::{Bucket, MembershipTier, PaymentGateway};
use ledger::policy::Policy;
use ledger::reconcile::{CaptureStatus, ReconcileOutcome};
use ledger::{accounts, reconcile, replay, submissions, withdrawals, LedgerError};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

async fn setup() -> Pool<Postgres> {
    let pool = common::db::establish_connection()
        .await
        .expect("DATABASE_URL must point at a test database");
    common::db::apply_schema(&pool).await.expect("failed to apply schema");
    pool
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

async fn seed_account(pool: &Pool<Postgres>, prefix: &str) -> common::models::Account {
    accounts::create_account(pool, &unique_email(prefix), prefix, None)
        .await
        .expect("failed to create account")
}

async fn seed_job(pool: &Pool<Postgres>, payment_amount_cents: i64) -> i32 {
    let row: (i32,) = sqlx::query_as(
        "INSERT INTO jobs (title, payment_amount_cents) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("job-{}", Uuid::new_v4().simple()))
    .bind(payment_amount_cents)
    .fetch_one(pool)
    .await
    .expect("failed to seed job");
    row.0
}

/// Credits a bucket by pushing a submission through approval.
async fn earn(pool: &Pool<Postgres>, account_id: i32, reviewer_id: i32, cents: i64) {
    let policy = Policy::default();
    let job_id = seed_job(pool, cents).await;
    let submission =
        submissions::create_submission(pool, &policy, account_id, job_id, "https://proofs/1.png")
            .await
            .expect("failed to submit");
    submissions::review_submission(
        pool,
        submission.id,
        submissions::ReviewDecision::Approve,
        reviewer_id,
        None,
    )
    .await
    .expect("failed to approve");
}

#[tokio::test]
#[ignore]
async fn approving_a_submission_credits_once_and_only_once() {
    let pool = setup().await;
    let worker = seed_account(&pool, "worker").await;
    let admin = seed_account(&pool, "admin").await;
    let policy = Policy::default();

    let job_id = seed_job(&pool, 1_250).await;
    let submission = submissions::create_submission(
        &pool,
        &policy,
        worker.id,
        job_id,
        "https://proofs/shot.png",
    )
    .await
    .unwrap();

    submissions::review_submission(
        &pool,
        submission.id,
        submissions::ReviewDecision::Approve,
        admin.id,
        None,
    )
    .await
    .unwrap();

    // Re-reviewing a terminal submission is rejected, not double-applied.
    let err = submissions::review_submission(
        &pool,
        submission.id,
        submissions::ReviewDecision::Approve,
        admin.id,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidStateTransition { .. }));

    let balances = accounts::get_balances(&pool, worker.id).await.unwrap();
    assert_eq!(balances.task_earnings_cents, 1_250);
    assert_eq!(balances.approved_earnings_cents, 1_250);
    assert_eq!(balances.total_earnings_cents, 1_250);
    assert_eq!(balances.tasks_completed, 1);
    assert_eq!(balances.pending_earnings_cents, 0);
}

#[tokio::test]
#[ignore]
async fn concurrent_withdrawals_cannot_double_spend() {
    let pool = setup().await;
    let worker = seed_account(&pool, "worker").await;
    let admin = seed_account(&pool, "admin").await;
    let policy = Policy::default();

    earn(&pool, worker.id, admin.id, 15_000).await;

    // Only one of these fits the balance; they also collide on the
    // one-pending-per-bucket rule.
    let (a, b) = tokio::join!(
        withdrawals::request_withdrawal(
            &pool,
            &policy,
            worker.id,
            12_000,
            Bucket::Task,
            "mpesa",
            serde_json::json!({"phone": "+254700000001"}),
        ),
        withdrawals::request_withdrawal(
            &pool,
            &policy,
            worker.id,
            12_000,
            Bucket::Task,
            "mpesa",
            serde_json::json!({"phone": "+254700000001"}),
        ),
    );

    let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1, "exactly one concurrent withdrawal may win");
    for result in [a, b] {
        if let Err(err) = result {
            assert!(matches!(
                err,
                LedgerError::InsufficientFunds { .. }
                    | LedgerError::PendingWithdrawalExists { .. }
            ));
        }
    }

    let balances = accounts::get_balances(&pool, worker.id).await.unwrap();
    assert_eq!(balances.task_earnings_cents, 3_000);
    // The lifetime total never moves on withdrawals.
    assert_eq!(balances.total_earnings_cents, 15_000);
}

#[tokio::test]
#[ignore]
async fn rejecting_a_withdrawal_refunds_exactly() {
    let pool = setup().await;
    let worker = seed_account(&pool, "worker").await;
    let admin = seed_account(&pool, "admin").await;
    let mut policy = Policy::default();
    policy.min_withdrawal_referral_cents = 3_000;

    // Stand in for referral earnings of $40 via direct ledger credit.
    let mut tx = pool.begin().await.unwrap();
    ledger::entries::apply_entry(
        &mut tx,
        worker.id,
        Bucket::Referral,
        4_000,
        common::utils::EntryReason::ReferralCredit,
        0,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let request = withdrawals::request_withdrawal(
        &pool,
        &policy,
        worker.id,
        3_500,
        Bucket::Referral,
        "paypal",
        serde_json::json!({"email": "worker@example.com"}),
    )
    .await
    .unwrap();

    let after_debit = accounts::get_balances(&pool, worker.id).await.unwrap();
    assert_eq!(after_debit.referral_earnings_cents, 500);

    withdrawals::review_withdrawal(
        &pool,
        request.id,
        withdrawals::WithdrawalDecision::Reject,
        admin.id,
        Some("bad payment details".to_string()),
    )
    .await
    .unwrap();

    let after_refund = accounts::get_balances(&pool, worker.id).await.unwrap();
    assert_eq!(after_refund.referral_earnings_cents, 4_000);
    assert_eq!(after_refund.task_earnings_cents, 0);
    assert_eq!(after_refund.total_earnings_cents, 4_000);

    let report = replay::verify_account(&pool, worker.id).await.unwrap();
    assert!(report.in_sync());
}

#[tokio::test]
#[ignore]
async fn withdrawal_over_balance_changes_nothing() {
    let pool = setup().await;
    let worker = seed_account(&pool, "worker").await;
    let admin = seed_account(&pool, "admin").await;
    let policy = Policy::default();

    earn(&pool, worker.id, admin.id, 12_000).await;

    let err = withdrawals::request_withdrawal(
        &pool,
        &policy,
        worker.id,
        13_000,
        Bucket::Task,
        "mpesa",
        serde_json::json!({}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    let balances = accounts::get_balances(&pool, worker.id).await.unwrap();
    assert_eq!(balances.task_earnings_cents, 12_000);

    let open: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM withdrawal_requests WHERE account_id = $1",
    )
    .bind(worker.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(open.0, 0, "the aborted request must leave no row behind");
}

#[tokio::test]
#[ignore]
async fn triple_capture_delivery_activates_and_credits_once() {
    let pool = setup().await;
    let referrer = seed_account(&pool, "referrer").await;
    let referred = accounts::create_account(
        &pool,
        &unique_email("referred"),
        "referred",
        Some(&referrer.referral_code),
    )
    .await
    .unwrap();
    let policy = Policy::default();

    let payment = reconcile::create_payment(
        &pool,
        &policy,
        referred.id,
        PaymentGateway::Paypal,
        MembershipTier::Vip,
        "USD",
    )
    .await
    .unwrap();
    reconcile::attach_gateway_order(&pool, payment.id, "PAYPAL-ORDER-1")
        .await
        .unwrap();

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        outcomes.push(
            reconcile::reconcile_payment_event(
                &pool,
                &policy,
                &payment.merchant_reference,
                CaptureStatus::Completed,
            )
            .await
            .unwrap(),
        );
    }
    assert_eq!(outcomes[0], ReconcileOutcome::Activated);
    assert_eq!(outcomes[1], ReconcileOutcome::AlreadyProcessed);
    assert_eq!(outcomes[2], ReconcileOutcome::AlreadyProcessed);

    let activated = accounts::get_account(&pool, referred.id).await.unwrap();
    assert_eq!(activated.membership_tier, "vip");
    assert!(activated.membership_expires_at.is_some());

    let subscriptions: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE account_id = $1")
            .bind(referred.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(subscriptions.0, 1);

    // VIP activation pays the referrer exactly one $15 bonus.
    let balances = accounts::get_balances(&pool, referrer.id).await.unwrap();
    assert_eq!(balances.referral_earnings_cents, 1_500);
    assert_eq!(balances.total_earnings_cents, 1_500);

    let report = replay::verify_account(&pool, referrer.id).await.unwrap();
    assert!(report.in_sync());
}
