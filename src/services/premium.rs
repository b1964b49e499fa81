//! 保费计算
//! 年保费 = 保额 × 系数，按自然年剩余月份折算；金额单位为分

use chrono::{Datelike, NaiveDate};

pub fn annual_premium(coverage_amount: i64, premium_factor: f64) -> f64 {
    coverage_amount as f64 * premium_factor
}

/// 当月及之后剩余的月份数（1..=12）
pub fn months_remaining_including(date: NaiveDate) -> u32 {
    13 - date.month()
}

/// 批准时收取的折算保费，含当月
pub fn prorated_premium(coverage_amount: i64, premium_factor: f64, on: NaiveDate) -> i64 {
    let months = months_remaining_including(on) as f64;
    (annual_premium(coverage_amount, premium_factor) * months / 12.0).round() as i64
}

/// 停保退还的保费，只退当月之后的月份
pub fn refund_amount(coverage_amount: i64, premium_factor: f64, on: NaiveDate) -> i64 {
    let months = (months_remaining_including(on) - 1) as f64;
    (annual_premium(coverage_amount, premium_factor) * months / 12.0).round() as i64
}

/// 当月最后一天
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}
