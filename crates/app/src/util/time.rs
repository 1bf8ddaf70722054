use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};

use crate::config::RangeParams;
use crate::error::{AppError, Result};
use presence_core::TimeRange;

pub fn resolve_range(params: &RangeParams, now: DateTime<Utc>) -> Result<TimeRange> {
    if let (Some(start), Some(end)) = (params.start.as_deref(), params.end.as_deref()) {
        let start = normalize_rfc3339_to_utc(start)?;
        let end = normalize_rfc3339_to_utc(end)?;
        if end < start {
            return Err(AppError::InvalidInput(
                "range end is before range start".to_string(),
            ));
        }
        return Ok(TimeRange { start, end });
    }
    if let Some(start) = params.start.as_deref() {
        let start = normalize_rfc3339_to_utc(start)?;
        return Ok(TimeRange { start, end: now });
    }
    let now_local = now.with_timezone(&Local);
    let start_local = match params.range.as_deref().unwrap_or("today") {
        "today" => Local
            .with_ymd_and_hms(
                now_local.year(),
                now_local.month(),
                now_local.day(),
                0,
                0,
                0,
            )
            .earliest()
            .ok_or_else(|| AppError::InvalidInput("invalid local date".to_string()))?,
        "last7days" => now_local - Duration::days(7),
        "last14days" => now_local - Duration::days(14),
        "thismonth" => Local
            .with_ymd_and_hms(now_local.year(), now_local.month(), 1, 0, 0, 0)
            .earliest()
            .ok_or_else(|| AppError::InvalidInput("invalid local date".to_string()))?,
        "alltime" => {
            return Ok(TimeRange {
                start: DateTime::<Utc>::UNIX_EPOCH,
                end: now,
            });
        }
        value => {
            return Err(AppError::InvalidInput(format!(
                "unsupported range {}",
                value
            )));
        }
    };
    Ok(TimeRange {
        start: start_local.with_timezone(&Utc),
        end: now,
    })
}

pub fn normalize_rfc3339_to_utc(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|err| AppError::InvalidInput(format!("invalid datetime: {}", err)))?;
    Ok(parsed.with_timezone(&Utc))
}
