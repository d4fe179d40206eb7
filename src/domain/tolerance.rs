//! 容差计算
//!
//! 纯函数：根据目标字数和容差百分比计算可接受区间与完成度

use serde::{Deserialize, Serialize};

/// 可接受字数区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub min_acceptable: u32,
    pub max_acceptable: u32,
}

impl ToleranceBand {
    /// 边界值也算在区间内
    pub fn contains(&self, word_count: u32) -> bool {
        self.min_acceptable <= word_count && word_count <= self.max_acceptable
    }
}

/// 某一时刻的容差评估结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceStatus {
    pub band: ToleranceBand,
    pub words_reduced: u32,
    pub words_remaining: u32,
    pub percent_complete: f64,
    pub is_within_tolerance: bool,
}

/// 容差百分比是否合法
pub fn is_valid_tolerance(tolerance_percent: f64) -> bool {
    tolerance_percent.is_finite() && (0.0..100.0).contains(&tolerance_percent)
}

/// 计算可接受区间
///
/// min = round(target * (1 - tol/100)), max = round(target * (1 + tol/100))
pub fn tolerance_band(target_word_count: u32, tolerance_percent: f64) -> ToleranceBand {
    let target = f64::from(target_word_count);
    let ratio = tolerance_percent / 100.0;
    let min = (target * (1.0 - ratio)).round().max(0.0);
    let max = (target * (1.0 + ratio)).round().min(f64::from(u32::MAX));

    ToleranceBand {
        min_acceptable: min as u32,
        max_acceptable: max as u32,
    }
}

/// 需要删减的字数（已低于目标时为 0）
pub fn words_to_cut(current_word_count: u32, target_word_count: u32) -> u32 {
    current_word_count.saturating_sub(target_word_count)
}

/// 完成百分比，限制在 [0, 100]
///
/// words_to_cut 在修订开始时固定；为 0 时直接视为 100
pub fn percent_complete(words_reduced: u32, words_to_cut: u32) -> f64 {
    if words_to_cut == 0 {
        return 100.0;
    }
    let pct = f64::from(words_reduced) / f64::from(words_to_cut) * 100.0;
    pct.clamp(0.0, 100.0)
}

/// 综合评估
pub fn evaluate(
    current_word_count: u32,
    target_word_count: u32,
    tolerance_percent: f64,
    words_reduced: u32,
    words_to_cut: u32,
) -> ToleranceStatus {
    let band = tolerance_band(target_word_count, tolerance_percent);
    ToleranceStatus {
        band,
        words_reduced,
        words_remaining: words_to_cut.saturating_sub(words_reduced),
        percent_complete: percent_complete(words_reduced, words_to_cut),
        is_within_tolerance: band.contains(current_word_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_for_reference_book() {
        let band = tolerance_band(80_000, 5.0);
        assert_eq!(band.min_acceptable, 76_000);
        assert_eq!(band.max_acceptable, 84_000);
    }

    #[test]
    fn test_band_brackets_target() {
        for target in [1_u32, 7, 999, 12_345, 80_000, 250_000] {
            for tol in [0.5, 1.0, 5.0, 12.5, 50.0, 99.0] {
                let band = tolerance_band(target, tol);
                assert!(band.min_acceptable <= target, "target={target} tol={tol}");
                assert!(target <= band.max_acceptable, "target={target} tol={tol}");
            }
        }
    }

    #[test]
    fn test_zero_tolerance_collapses_band() {
        let band = tolerance_band(50_000, 0.0);
        assert_eq!(band.min_acceptable, 50_000);
        assert_eq!(band.max_acceptable, 50_000);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let band = tolerance_band(80_000, 5.0);
        assert!(band.contains(76_000));
        assert!(band.contains(84_000));
        assert!(!band.contains(75_999));
        assert!(!band.contains(84_001));
    }

    #[test]
    fn test_words_to_cut_never_negative() {
        assert_eq!(words_to_cut(95_000, 80_000), 15_000);
        assert_eq!(words_to_cut(70_000, 80_000), 0);
    }

    #[test]
    fn test_percent_complete_without_cut_needed() {
        assert_eq!(percent_complete(0, 0), 100.0);
        assert_eq!(percent_complete(500, 0), 100.0);
    }

    #[test]
    fn test_percent_complete_is_clamped() {
        assert_eq!(percent_complete(0, 15_000), 0.0);
        assert_eq!(percent_complete(7_500, 15_000), 50.0);
        assert_eq!(percent_complete(20_000, 15_000), 100.0);
    }

    #[test]
    fn test_evaluate_reference_book_after_full_cut() {
        let status = evaluate(80_000, 80_000, 5.0, 15_000, 15_000);
        assert!(status.is_within_tolerance);
        assert_eq!(status.percent_complete, 100.0);
        assert_eq!(status.words_remaining, 0);
    }

    #[test]
    fn test_tolerance_validation() {
        assert!(is_valid_tolerance(0.0));
        assert!(is_valid_tolerance(5.0));
        assert!(!is_valid_tolerance(100.0));
        assert!(!is_valid_tolerance(-1.0));
        assert!(!is_valid_tolerance(f64::NAN));
    }
}
