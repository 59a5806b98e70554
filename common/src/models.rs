use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::Serialize;

/// One row per user. The three `_cents` columns are the only stored balances;
/// approved earnings are always derived as task + referral and pending
/// earnings are projected from open submissions at read time.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub referral_code: String,
    pub membership_tier: String,
    pub membership_expires_at: Option<DateTime<Utc>>,
    pub daily_tasks_used: i32,
    pub last_reset_date: Option<NaiveDate>,
    pub tasks_completed: i32,
    pub task_earnings_cents: i64,
    pub referral_earnings_cents: i64,
    pub total_earnings_cents: i64,
    pub version: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: i32,
    pub job_id: i32,
    pub account_id: i32,
    pub status: String,
    /// Copied from the job at creation time and immutable after; a later
    /// price change on the job never changes an existing payout.
    pub payment_amount_cents: i64,
    pub proof_url: String,
    pub admin_feedback: Option<String>,
    pub reviewed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct WithdrawalRequest {
    pub id: i32,
    pub account_id: i32,
    pub amount_cents: i64,
    pub bucket: String,
    pub payment_method: String,
    pub payment_details: serde_json::Value,
    pub status: String,
    pub admin_notes: Option<String>,
    pub reviewed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Referral {
    pub id: i32,
    pub referrer_id: i32,
    pub referred_id: i32,
    pub referral_code: String,
    pub status: String,
    pub referred_tier: Option<String>,
    pub bonus_cents: i64,
    pub created_at: DateTime<Utc>,
    pub credited_at: Option<DateTime<Utc>>,
}

/// Append-only audit record of a single signed balance change. Account
/// balances are a materialized projection over this log.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: i32,
    pub bucket: String,
    pub delta_cents: i64,
    pub reason: String,
    pub related_id: i32,
    pub balance_after_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i32,
    pub account_id: i32,
    pub gateway: String,
    pub gateway_order_id: Option<String>,
    pub merchant_reference: String,
    pub plan_tier: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i32,
    pub account_id: i32,
    pub payment_id: i32,
    pub tier: String,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Reference data consumed read-only by the core; job CRUD lives elsewhere.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub payment_amount_cents: i64,
    pub required_tier: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
