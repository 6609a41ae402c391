use crate::core::{CostEstimate, OtherCosts};

pub const WORKING_DAYS_PER_MONTH: u32 = 22;
pub const DEFAULT_COST_PER_1K_TOKENS: f64 = 0.03;
pub const DEFAULT_AVG_TOKENS_PER_EMAIL: u32 = 500;

/// 加到總額的固定月費。刻意是常數，不是 other_costs 的即時加總。
const FIXED_MONTHLY_OVERHEAD: f64 = 15.0;

fn fixed_other_costs() -> OtherCosts {
    OtherCosts {
        email_service: 10.0,
        data_sources: 0.0,
        hosting: 5.0,
    }
}

/// 依每日寄送量估算每月成本。純函數，不做任何 I/O。
pub fn estimate_cost(
    daily_volume: u32,
    cost_per_1k_tokens: f64,
    avg_tokens_per_email: u32,
) -> CostEstimate {
    let days = u64::from(WORKING_DAYS_PER_MONTH);
    let daily = u64::from(daily_volume);

    let daily_token_cost =
        (f64::from(daily_volume) * f64::from(avg_tokens_per_email) / 1000.0) * cost_per_1k_tokens;
    let monthly_llm_cost = daily_token_cost * f64::from(WORKING_DAYS_PER_MONTH);

    CostEstimate {
        daily_volume,
        emails_per_month: daily * days,
        // 極端輸入時停在 u64::MAX
        estimated_token_usage: daily
            .saturating_mul(u64::from(avg_tokens_per_email))
            .saturating_mul(days),
        estimated_monthly_llm_cost: monthly_llm_cost,
        other_costs: fixed_other_costs(),
        total_estimated_monthly_cost: monthly_llm_cost + FIXED_MONTHLY_OVERHEAD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_emails_per_day() {
        let estimate = estimate_cost(100, DEFAULT_COST_PER_1K_TOKENS, DEFAULT_AVG_TOKENS_PER_EMAIL);

        assert_eq!(estimate.daily_volume, 100);
        assert_eq!(estimate.emails_per_month, 2200);
        assert_eq!(estimate.estimated_token_usage, 1_100_000);
        assert!((estimate.estimated_monthly_llm_cost - 33.0).abs() < 1e-9);
        assert!((estimate.total_estimated_monthly_cost - 48.0).abs() < 1e-9);

        let per_email = estimate.cost_per_email().unwrap();
        assert!((per_email - 48.0 / 2200.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = estimate_cost(37, 0.015, 730);
        let b = estimate_cost(37, 0.015, 730);
        assert_eq!(a, b);
    }

    #[test]
    fn test_total_adds_fixed_overhead_not_live_sum() {
        for volume in [1, 10, 250, 5000] {
            let estimate = estimate_cost(volume, 0.002, 1200);
            assert_eq!(
                estimate.total_estimated_monthly_cost,
                estimate.estimated_monthly_llm_cost + 15.0
            );
        }
        assert_eq!(fixed_other_costs().total(), 15.0);
    }

    #[test]
    fn test_huge_inputs_saturate_token_usage() {
        let estimate = estimate_cost(u32::MAX, 0.03, u32::MAX);

        assert_eq!(estimate.emails_per_month, u64::from(u32::MAX) * 22);
        assert_eq!(estimate.estimated_token_usage, u64::MAX);
        assert!(estimate.estimated_monthly_llm_cost.is_finite());

        let estimate = estimate_cost(4_000_000_000, 0.03, 1_000_000_000);
        assert_eq!(estimate.estimated_token_usage, u64::MAX);
    }

    #[test]
    fn test_zero_volume_has_no_per_email_cost() {
        let estimate = estimate_cost(0, DEFAULT_COST_PER_1K_TOKENS, DEFAULT_AVG_TOKENS_PER_EMAIL);
        assert_eq!(estimate.emails_per_month, 0);
        assert_eq!(estimate.estimated_monthly_llm_cost, 0.0);
        assert_eq!(estimate.total_estimated_monthly_cost, 15.0);
        assert!(estimate.cost_per_email().is_none());
    }
}
