use chrono::{Duration, Utc};
use common::models::Payment;
use common::notify;
use common::utils::{MembershipTier, PaymentGateway, PaymentStatus};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::policy::Policy;
use crate::referrals::credit_referral_if_eligible;

/// A gateway event normalized to what the reconciler cares about. The
/// gateway clients map their own status vocabulary onto this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Completed,
    Failed,
    Cancelled,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First successful capture: membership activated, referral triggered.
    Activated,
    /// The payment was already completed: duplicate delivery, absorbed.
    AlreadyProcessed,
    MarkedFailed,
    MarkedCancelled,
    StillPending,
}

/// Creates the internal payment record for a membership purchase. The
/// merchant reference is ours (the gateway echoes it back) and is the
/// idempotency anchor for every later event about this payment.
pub async fn create_payment(
    pool: &Pool<Postgres>,
    policy: &Policy,
    account_id: i32,
    gateway: PaymentGateway,
    tier: MembershipTier,
    currency: &str,
) -> Result<Payment, LedgerError> {
    let amount_cents = policy
        .plan_price_cents(tier)
        .ok_or_else(|| LedgerError::Validation("this tier cannot be purchased".to_string()))?;

    let merchant_reference = Uuid::new_v4().to_string();

    let payment: Payment = sqlx::query_as(
        "INSERT INTO payments (account_id, gateway, merchant_reference, plan_tier, amount_cents, currency)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(account_id)
    .bind(gateway.to_string())
    .bind(&merchant_reference)
    .bind(tier.to_string())
    .bind(amount_cents)
    .bind(currency)
    .fetch_one(pool)
    .await?;

    Ok(payment)
}

/// Stores the gateway's order id once the order has been created upstream
/// and moves the payment to `pending` (awaiting capture).
pub async fn attach_gateway_order(
    pool: &Pool<Postgres>,
    payment_id: i32,
    gateway_order_id: &str,
) -> Result<(), LedgerError> {
    let result = sqlx::query(
        "UPDATE payments SET gateway_order_id = $1, status = 'pending', updated_at = NOW()
         WHERE id = $2",
    )
    .bind(gateway_order_id)
    .bind(payment_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::PaymentNotFound(payment_id.to_string()));
    }
    Ok(())
}

/// Order creation failed upstream; the payment can never complete.
pub async fn mark_unstartable(pool: &Pool<Postgres>, payment_id: i32) -> Result<(), LedgerError> {
    sqlx::query("UPDATE payments SET status = 'failed', updated_at = NOW() WHERE id = $1")
        .bind(payment_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_by_gateway_order(
    pool: &Pool<Postgres>,
    gateway_order_id: &str,
) -> Result<Payment, LedgerError> {
    let payment: Option<Payment> =
        sqlx::query_as("SELECT * FROM payments WHERE gateway_order_id = $1")
            .bind(gateway_order_id)
            .fetch_optional(pool)
            .await?;

    payment.ok_or_else(|| LedgerError::PaymentNotFound(gateway_order_id.to_string()))
}

/// Payments the background poller should re-query: Pesapal orders that were
/// handed to the gateway but have not reached a terminal status.
pub async fn list_open_pesapal(
    pool: &Pool<Postgres>,
    limit: i64,
) -> Result<Vec<Payment>, LedgerError> {
    let payments: Vec<Payment> = sqlx::query_as(
        "SELECT * FROM payments
         WHERE gateway = 'pesapal' AND status = 'pending' AND gateway_order_id IS NOT NULL
         ORDER BY created_at ASC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

/// Turns one gateway event into internal state, exactly once. Gateways
/// deliver at least once; the status check under the row lock is what makes
/// the second and third delivery harmless. Everything a successful capture
/// implies (payment completed, membership activated, subscription history,
/// referral credit) commits in one transaction, and an internal error rolls
/// the whole thing back so redelivery can retry it from scratch.
pub async fn reconcile_payment_event(
    pool: &Pool<Postgres>,
    policy: &Policy,
    merchant_reference: &str,
    status: CaptureStatus,
) -> Result<ReconcileOutcome, LedgerError> {
    let mut tx = pool.begin().await?;

    let payment: Option<Payment> =
        sqlx::query_as("SELECT * FROM payments WHERE merchant_reference = $1 FOR UPDATE")
            .bind(merchant_reference)
            .fetch_optional(&mut *tx)
            .await?;
    let payment =
        payment.ok_or_else(|| LedgerError::PaymentNotFound(merchant_reference.to_string()))?;

    let current: PaymentStatus = payment
        .status
        .parse()
        .map_err(|_| LedgerError::Validation("payment has an unknown status".to_string()))?;
    if current == PaymentStatus::Completed {
        info!(
            "payment {} already completed, absorbing duplicate {:?} event",
            payment.merchant_reference, status
        );
        return Ok(ReconcileOutcome::AlreadyProcessed);
    }

    match status {
        CaptureStatus::Pending => Ok(ReconcileOutcome::StillPending),
        CaptureStatus::Failed => {
            sqlx::query("UPDATE payments SET status = 'failed', updated_at = NOW() WHERE id = $1")
                .bind(payment.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            warn!("payment {} failed at the gateway", payment.merchant_reference);
            Ok(ReconcileOutcome::MarkedFailed)
        }
        CaptureStatus::Cancelled => {
            sqlx::query(
                "UPDATE payments SET status = 'cancelled', updated_at = NOW() WHERE id = $1",
            )
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(ReconcileOutcome::MarkedCancelled)
        }
        CaptureStatus::Completed => {
            let tier: MembershipTier = payment
                .plan_tier
                .parse()
                .map_err(|_| LedgerError::Validation("payment has an unknown tier".to_string()))?;

            sqlx::query(
                "UPDATE payments SET status = 'completed', updated_at = NOW() WHERE id = $1",
            )
            .bind(payment.id)
            .execute(&mut *tx)
            .await?;

            let now = Utc::now();
            let expires_at = now + Duration::days(policy.membership_days);
            let activated = sqlx::query(
                "UPDATE accounts
                 SET membership_tier = $1, membership_expires_at = $2, updated_at = NOW()
                 WHERE id = $3",
            )
            .bind(tier.to_string())
            .bind(expires_at)
            .bind(payment.account_id)
            .execute(&mut *tx)
            .await?;
            if activated.rows_affected() == 0 {
                return Err(LedgerError::AccountNotFound(payment.account_id));
            }

            sqlx::query(
                "INSERT INTO subscriptions (account_id, payment_id, tier, starts_at, expires_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(payment.account_id)
            .bind(payment.id)
            .bind(tier.to_string())
            .bind(now)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;

            credit_referral_if_eligible(&mut tx, policy, payment.account_id, tier).await?;

            tx.commit().await?;

            let account_id = payment.account_id;
            let message = format!(
                "Your {} membership is active until {}.",
                tier,
                expires_at.format("%Y-%m-%d")
            );
            tokio::spawn(async move {
                notify::notify(account_id, "Payment received", &message, "payment_success").await;
            });
            info!(
                "payment {} captured: account {} activated {} until {}",
                payment.merchant_reference, payment.account_id, tier, expires_at
            );

            Ok(ReconcileOutcome::Activated)
        }
    }
}
