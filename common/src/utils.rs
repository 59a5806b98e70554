use serde::{Deserialize, Serialize};

use crate::impl_str_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    None,
    Regular,
    Pro,
    Vip,
}

impl MembershipTier {
    /// Ordering used for job access gating: a user may take a job whose
    /// required tier ranks at or below their own.
    pub fn rank(&self) -> u8 {
        match self {
            MembershipTier::None => 0,
            MembershipTier::Regular => 1,
            MembershipTier::Pro => 2,
            MembershipTier::Vip => 3,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, MembershipTier::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Credited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    Paypal,
    Pesapal,
}

/// The two withdrawable earning streams. Pending earnings are a read-time
/// projection over open submissions and never appear as a ledger bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Task,
    Referral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryReason {
    SubmissionApproved,
    WithdrawalDebit,
    WithdrawalRefund,
    ReferralCredit,
}

impl EntryReason {
    /// Reasons that count toward the lifetime total. Withdrawals move money
    /// out of a bucket but never reduce the lifetime counter.
    pub fn credits_total(&self) -> bool {
        matches!(
            self,
            EntryReason::SubmissionApproved | EntryReason::ReferralCredit
        )
    }
}

impl_str_enum!(MembershipTier, None => "none", Regular => "regular", Pro => "pro", Vip => "vip");
impl_str_enum!(SubmissionStatus, Pending => "pending", Approved => "approved", Rejected => "rejected");
impl_str_enum!(WithdrawalStatus, Pending => "pending", Approved => "approved", Rejected => "rejected", Completed => "completed");
impl_str_enum!(ReferralStatus, Pending => "pending", Credited => "credited");
impl_str_enum!(PaymentStatus, Created => "created", Pending => "pending", Completed => "completed", Failed => "failed", Cancelled => "cancelled");
impl_str_enum!(PaymentGateway, Paypal => "paypal", Pesapal => "pesapal");
impl_str_enum!(Bucket, Task => "task", Referral => "referral");
impl_str_enum!(
    EntryReason,
    SubmissionApproved => "submission-approved",
    WithdrawalDebit => "withdrawal-debit",
    WithdrawalRefund => "withdrawal-refund",
    ReferralCredit => "referral-credit"
);

/// Display helper for the HTTP boundary; balances are i64 cents internally.
pub fn cents_to_major(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_round_trips_through_db_strings() {
        assert_eq!(EntryReason::SubmissionApproved.to_string(), "submission-approved");
        assert_eq!(
            "submission-approved".parse::<EntryReason>().unwrap(),
            EntryReason::SubmissionApproved
        );
        assert_eq!(Bucket::Referral.to_string(), "referral");
        assert_eq!("task".parse::<Bucket>().unwrap(), Bucket::Task);
        assert!("TASK".parse::<Bucket>().is_err());
    }

    #[test]
    fn tier_ranks_gate_access() {
        assert!(MembershipTier::Vip.rank() > MembershipTier::Pro.rank());
        assert!(MembershipTier::Regular.rank() > MembershipTier::None.rank());
        assert!(!MembershipTier::None.is_paid());
        assert!(MembershipTier::Regular.is_paid());
    }

    #[test]
    fn only_earning_reasons_credit_total() {
        assert!(EntryReason::SubmissionApproved.credits_total());
        assert!(EntryReason::ReferralCredit.credits_total());
        assert!(!EntryReason::WithdrawalDebit.credits_total());
        assert!(!EntryReason::WithdrawalRefund.credits_total());
    }
}
