use std::env;

use common::utils::{Bucket, MembershipTier};

/// Monetary policy knobs: withdrawal minimums, the referral bonus schedule,
/// plan pricing and daily task quotas. One source of truth, loaded from the
/// environment at startup so the numbers are never baked into call sites.
#[derive(Debug, Clone)]
pub struct Policy {
    pub min_withdrawal_task_cents: i64,
    pub min_withdrawal_referral_cents: i64,

    pub bonus_regular_cents: i64,
    pub bonus_pro_cents: i64,
    pub bonus_vip_cents: i64,

    pub plan_regular_cents: i64,
    pub plan_pro_cents: i64,
    pub plan_vip_cents: i64,
    pub membership_days: i64,

    pub daily_tasks_free: i32,
    pub daily_tasks_regular: i32,
    pub daily_tasks_pro: i32,
    pub daily_tasks_vip: i32,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            min_withdrawal_task_cents: 10_000,
            min_withdrawal_referral_cents: 3_000,
            bonus_regular_cents: 500,
            bonus_pro_cents: 1_000,
            bonus_vip_cents: 1_500,
            plan_regular_cents: 999,
            plan_pro_cents: 1_999,
            plan_vip_cents: 2_999,
            membership_days: 30,
            daily_tasks_free: 2,
            daily_tasks_regular: 10,
            daily_tasks_pro: 20,
            daily_tasks_vip: 40,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<i64>()
        .unwrap_or_else(|_| panic!("{} must be a valid integer", key))
}

fn env_i32(key: &str, default: i32) -> i32 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<i32>()
        .unwrap_or_else(|_| panic!("{} must be a valid integer", key))
}

impl Policy {
    pub fn from_env() -> Self {
        let defaults = Policy::default();

        Policy {
            min_withdrawal_task_cents: env_i64(
                "MIN_WITHDRAWAL_TASK_CENTS",
                defaults.min_withdrawal_task_cents,
            ),
            min_withdrawal_referral_cents: env_i64(
                "MIN_WITHDRAWAL_REFERRAL_CENTS",
                defaults.min_withdrawal_referral_cents,
            ),
            bonus_regular_cents: env_i64("REFERRAL_BONUS_REGULAR_CENTS", defaults.bonus_regular_cents),
            bonus_pro_cents: env_i64("REFERRAL_BONUS_PRO_CENTS", defaults.bonus_pro_cents),
            bonus_vip_cents: env_i64("REFERRAL_BONUS_VIP_CENTS", defaults.bonus_vip_cents),
            plan_regular_cents: env_i64("PLAN_REGULAR_CENTS", defaults.plan_regular_cents),
            plan_pro_cents: env_i64("PLAN_PRO_CENTS", defaults.plan_pro_cents),
            plan_vip_cents: env_i64("PLAN_VIP_CENTS", defaults.plan_vip_cents),
            membership_days: env_i64("MEMBERSHIP_DAYS", defaults.membership_days),
            daily_tasks_free: env_i32("DAILY_TASKS_FREE", defaults.daily_tasks_free),
            daily_tasks_regular: env_i32("DAILY_TASKS_REGULAR", defaults.daily_tasks_regular),
            daily_tasks_pro: env_i32("DAILY_TASKS_PRO", defaults.daily_tasks_pro),
            daily_tasks_vip: env_i32("DAILY_TASKS_VIP", defaults.daily_tasks_vip),
        }
    }

    pub fn min_withdrawal_cents(&self, bucket: Bucket) -> i64 {
        match bucket {
            Bucket::Task => self.min_withdrawal_task_cents,
            Bucket::Referral => self.min_withdrawal_referral_cents,
        }
    }

    /// Referral bonus as a pure function of the activated tier.
    pub fn bonus_for(&self, tier: MembershipTier) -> i64 {
        match tier {
            MembershipTier::None => 0,
            MembershipTier::Regular => self.bonus_regular_cents,
            MembershipTier::Pro => self.bonus_pro_cents,
            MembershipTier::Vip => self.bonus_vip_cents,
        }
    }

    /// Plan price for a purchasable tier; `none` cannot be bought.
    pub fn plan_price_cents(&self, tier: MembershipTier) -> Option<i64> {
        match tier {
            MembershipTier::None => None,
            MembershipTier::Regular => Some(self.plan_regular_cents),
            MembershipTier::Pro => Some(self.plan_pro_cents),
            MembershipTier::Vip => Some(self.plan_vip_cents),
        }
    }

    pub fn daily_task_limit(&self, tier: MembershipTier) -> i32 {
        match tier {
            MembershipTier::None => self.daily_tasks_free,
            MembershipTier::Regular => self.daily_tasks_regular,
            MembershipTier::Pro => self.daily_tasks_pro,
            MembershipTier::Vip => self.daily_tasks_vip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_schedule_follows_tier() {
        let policy = Policy::default();
        assert_eq!(policy.bonus_for(MembershipTier::None), 0);
        assert_eq!(policy.bonus_for(MembershipTier::Regular), 500);
        assert_eq!(policy.bonus_for(MembershipTier::Pro), 1_000);
        assert_eq!(policy.bonus_for(MembershipTier::Vip), 1_500);
    }

    #[test]
    fn withdrawal_minimums_per_bucket() {
        let policy = Policy::default();
        assert_eq!(policy.min_withdrawal_cents(Bucket::Referral), 3_000);
        assert_eq!(policy.min_withdrawal_cents(Bucket::Task), 10_000);
    }

    #[test]
    fn free_tier_has_no_plan_price() {
        let policy = Policy::default();
        assert!(policy.plan_price_cents(MembershipTier::None).is_none());
        assert_eq!(policy.plan_price_cents(MembershipTier::Vip), Some(2_999));
    }
}
