//! 타임스탬프 정규화
//!
//! 세 가지 원본 형식의 타임스탬프를 모두 [`CANONICAL_TIMESTAMP_FORMAT`]
//! (`YYYY-MM-DDTHH:MM:SS.mmm`) 문자열로 변환합니다.
//! 파싱에 실패해도 에러를 반환하지 않고 항상 대체 값으로 복구합니다.

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
};
use logsieve_core::types::CANONICAL_TIMESTAMP_FORMAT;

/// 정규화된 타임스탬프 문자열을 생성합니다.
pub fn canonical(dt: &NaiveDateTime) -> String {
    dt.format(CANONICAL_TIMESTAMP_FORMAT).to_string()
}

/// BSD syslog 타임스탬프 (`Jan  2 15:04:05`)를 정규화합니다.
///
/// 연도 정보가 없으므로 `year`를 가정합니다. 실패하면 연도 없이(0년, 윤년이므로
/// `Feb 29`도 보존) 다시 시도하고, 그래도 실패하면 시각만 `0000-01-01`에 붙입니다.
pub fn from_bsd(timestamp: &str, year: i32) -> String {
    let normalized = timestamp.split_whitespace().collect::<Vec<_>>().join(" ");

    for candidate_year in [year, 0] {
        let with_year = format!("{candidate_year:04} {normalized}");
        if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S") {
            return canonical(&dt);
        }
    }

    let epoch_date = NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN);
    let time = normalized
        .rsplit(' ')
        .next()
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok())
        .unwrap_or(NaiveTime::MIN);
    canonical(&epoch_date.and_time(time))
}

/// 현재 로컬 연도를 가정하여 BSD syslog 타임스탬프를 정규화합니다.
pub fn from_bsd_current_year(timestamp: &str) -> String {
    from_bsd(timestamp, Local::now().year())
}

/// RFC 3339 계열 타임스탬프를 정규화합니다.
///
/// 시도 순서:
/// 1. 완전한 RFC 3339 (오프셋 포함, 해당 오프셋의 벽시계 시각 유지)
/// 2. 오프셋 없는 로컬 시각
/// 3. 소수 초가 있는 로컬 시각
/// 4. 모두 실패하면 현재 시각 (근사값)
pub fn from_rfc3339_like(timestamp: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return canonical(&dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S") {
        return canonical(&dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return canonical(&dt);
    }
    tracing::debug!(timestamp, "unparseable timestamp, falling back to now");
    canonical(&Local::now().naive_local())
}

/// Unix epoch 초(소수부 포함)를 로컬 시각으로 정규화합니다.
///
/// 소수부는 버립니다. 표현 범위를 벗어나면 epoch 0을 사용합니다.
pub fn from_epoch(epoch: &str) -> String {
    let secs = epoch
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
        .unwrap_or(0);
    let utc = DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH);
    let offset = Local.offset_from_utc_datetime(&utc.naive_utc()).fix();
    from_epoch_secs_at(secs, offset)
}

/// 고정 오프셋 기준으로 epoch 초를 정규화합니다.
///
/// 오프셋을 더한 결과가 `NaiveDateTime` 범위를 넘으면 epoch 0을 사용합니다.
fn from_epoch_secs_at(secs: i64, offset: FixedOffset) -> String {
    let unix_epoch = DateTime::UNIX_EPOCH.naive_utc();
    let local = match DateTime::from_timestamp(secs, 0)
        .and_then(|utc| utc.naive_utc().checked_add_offset(offset))
    {
        Some(local) => local,
        None => {
            tracing::debug!(secs, "epoch out of range, falling back to unix epoch");
            unix_epoch.checked_add_offset(offset).unwrap_or(unix_epoch)
        }
    };
    canonical(&local)
}
