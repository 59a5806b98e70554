use common::models::Account;
use common::utils::{Bucket, EntryReason};
use serde::Serialize;

use crate::error::LedgerError;

/// Pure projection of an account's monetary state. All balance arithmetic
/// and invariant enforcement lives here so it can be checked without a
/// database; `entries::apply_entry` persists what this type computes.
///
/// Invariants:
/// - no bucket ever goes negative
/// - approved earnings are always `task + referral`, never stored
/// - the lifetime total only moves on crediting reasons and never decreases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub task_cents: i64,
    pub referral_cents: i64,
    pub total_cents: i64,
}

impl Balances {
    pub fn of(account: &Account) -> Self {
        Balances {
            task_cents: account.task_earnings_cents,
            referral_cents: account.referral_earnings_cents,
            total_cents: account.total_earnings_cents,
        }
    }

    pub fn approved_cents(&self) -> i64 {
        self.task_cents + self.referral_cents
    }

    pub fn bucket_cents(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::Task => self.task_cents,
            Bucket::Referral => self.referral_cents,
        }
    }

    /// Applies one signed delta to a bucket and returns the bucket balance
    /// after the change. Rejects zero deltas, deltas whose sign does not
    /// match the reason, and any change that would take the bucket negative.
    pub fn apply(
        &mut self,
        bucket: Bucket,
        delta_cents: i64,
        reason: EntryReason,
    ) -> Result<i64, LedgerError> {
        if delta_cents == 0 {
            return Err(LedgerError::Validation(
                "ledger entry delta must be non-zero".to_string(),
            ));
        }

        let debit_expected = matches!(reason, EntryReason::WithdrawalDebit);
        if debit_expected != (delta_cents < 0) {
            return Err(LedgerError::Validation(format!(
                "delta sign does not match reason {}",
                reason
            )));
        }

        let current = self.bucket_cents(bucket);
        let next = current + delta_cents;
        if next < 0 {
            return Err(LedgerError::InsufficientFunds {
                bucket,
                available_cents: current,
                requested_cents: -delta_cents,
            });
        }

        match bucket {
            Bucket::Task => self.task_cents = next,
            Bucket::Referral => self.referral_cents = next,
        }
        if reason.credits_total() {
            self.total_cents += delta_cents;
        }

        Ok(next)
    }

    pub fn holds_invariant(&self) -> bool {
        self.task_cents >= 0
            && self.referral_cents >= 0
            && self.total_cents >= self.approved_cents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approving_a_submission_credits_task_and_total() {
        let mut balances = Balances::default();
        // Job worth $12.50.
        let after = balances
            .apply(Bucket::Task, 1_250, EntryReason::SubmissionApproved)
            .unwrap();

        assert_eq!(after, 1_250);
        assert_eq!(balances.task_cents, 1_250);
        assert_eq!(balances.approved_cents(), 1_250);
        assert_eq!(balances.total_cents, 1_250);
        assert!(balances.holds_invariant());
    }

    #[test]
    fn withdrawal_debits_bucket_but_not_total() {
        let mut balances = Balances {
            referral_cents: 4_000,
            total_cents: 4_000,
            ..Default::default()
        };

        balances
            .apply(Bucket::Referral, -3_500, EntryReason::WithdrawalDebit)
            .unwrap();

        assert_eq!(balances.referral_cents, 500);
        assert_eq!(balances.approved_cents(), 500);
        // Lifetime total is untouched by withdrawals.
        assert_eq!(balances.total_cents, 4_000);
        assert!(balances.holds_invariant());
    }

    #[test]
    fn refund_restores_exactly_what_was_debited() {
        let mut balances = Balances {
            referral_cents: 4_000,
            total_cents: 4_000,
            ..Default::default()
        };

        balances
            .apply(Bucket::Referral, -3_500, EntryReason::WithdrawalDebit)
            .unwrap();
        balances
            .apply(Bucket::Referral, 3_500, EntryReason::WithdrawalRefund)
            .unwrap();

        assert_eq!(balances.referral_cents, 4_000);
        assert_eq!(balances.task_cents, 0);
        assert_eq!(balances.total_cents, 4_000);
    }

    #[test]
    fn overdraw_is_rejected_and_leaves_state_untouched() {
        let mut balances = Balances {
            task_cents: 4_000,
            total_cents: 4_000,
            ..Default::default()
        };

        let err = balances
            .apply(Bucket::Task, -5_000, EntryReason::WithdrawalDebit)
            .unwrap_err();

        match err {
            LedgerError::InsufficientFunds {
                bucket,
                available_cents,
                requested_cents,
            } => {
                assert_eq!(bucket, Bucket::Task);
                assert_eq!(available_cents, 4_000);
                assert_eq!(requested_cents, 5_000);
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
        assert_eq!(balances.task_cents, 4_000);
        assert_eq!(balances.total_cents, 4_000);
    }

    #[test]
    fn referral_credit_lands_in_referral_bucket() {
        let mut balances = Balances::default();
        balances
            .apply(Bucket::Referral, 1_500, EntryReason::ReferralCredit)
            .unwrap();

        assert_eq!(balances.referral_cents, 1_500);
        assert_eq!(balances.task_cents, 0);
        assert_eq!(balances.total_cents, 1_500);
    }

    #[test]
    fn buckets_are_independent() {
        let mut balances = Balances::default();
        balances
            .apply(Bucket::Task, 2_000, EntryReason::SubmissionApproved)
            .unwrap();
        balances
            .apply(Bucket::Referral, 500, EntryReason::ReferralCredit)
            .unwrap();
        balances
            .apply(Bucket::Task, -2_000, EntryReason::WithdrawalDebit)
            .unwrap();

        assert_eq!(balances.task_cents, 0);
        assert_eq!(balances.referral_cents, 500);
        assert_eq!(balances.approved_cents(), 500);
        assert_eq!(balances.total_cents, 2_500);
        assert!(balances.holds_invariant());
    }

    #[test]
    fn zero_and_wrong_sign_deltas_are_rejected() {
        let mut balances = Balances::default();

        assert!(balances
            .apply(Bucket::Task, 0, EntryReason::SubmissionApproved)
            .is_err());
        // A credit reason must not carry a negative delta.
        assert!(balances
            .apply(Bucket::Task, -100, EntryReason::SubmissionApproved)
            .is_err());
        // A debit reason must not carry a positive delta.
        assert!(balances
            .apply(Bucket::Task, 100, EntryReason::WithdrawalDebit)
            .is_err());
        assert_eq!(balances, Balances::default());
    }
}
