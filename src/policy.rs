//! 评分与统计的业务规则常量

/// 及格线：score >= 5 视为通过，低于此分数的任务需要重做
pub const PASSING_SCORE: f64 = 5.0;

/// 单项分数（hifdh / rules）上限
pub const MAX_SUB_SCORE: f64 = 5.0;

/// 总分上限（hifdh + rules）
pub const MAX_SCORE: f64 = 10.0;

/// 出勤与每周分数统计的滚动窗口（天，含今天）
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// 分数是否及格
pub fn is_passing(score: f64) -> bool {
    score >= PASSING_SCORE
}

/// 单项分数是否在 [0, MAX_SUB_SCORE] 闭区间内
pub fn is_valid_sub_score(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_SUB_SCORE).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_threshold() {
        assert!(is_passing(5.0));
        assert!(is_passing(7.0));
        assert!(!is_passing(4.5));
    }

    #[test]
    fn test_sub_score_bounds() {
        assert!(is_valid_sub_score(0.0));
        assert!(is_valid_sub_score(5.0));
        assert!(is_valid_sub_score(2.5));
        assert!(!is_valid_sub_score(6.0));
        assert!(!is_valid_sub_score(-0.5));
        assert!(!is_valid_sub_score(f64::NAN));
    }
}
