use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::business_availability::Model as AvailabilityModel,
    error::{AppError, AppResult},
    models::Weekday,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvailabilityEntryRequest {
    #[schema(example = "monday")]
    pub day: Option<String>,
    pub is_closed: Option<bool>,
    #[schema(example = "09:00")]
    pub open_time: Option<String>,
    #[schema(example = "17:30")]
    pub close_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DayHoursRequest {
    pub is_closed: Option<bool>,
    #[schema(example = "09:00")]
    pub open_time: Option<String>,
    #[schema(example = "17:30")]
    pub close_time: Option<String>,
}

/// Opening hours for one weekday. Open days always satisfy `open < close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub day: Weekday,
    pub hours: Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hours {
    Closed,
    Open { open: NaiveTime, close: NaiveTime },
}

impl Hours {
    pub fn is_closed(&self) -> bool {
        matches!(self, Hours::Closed)
    }

    pub fn open_time(&self) -> Option<NaiveTime> {
        match self {
            Hours::Closed => None,
            Hours::Open { open, .. } => Some(*open),
        }
    }

    pub fn close_time(&self) -> Option<NaiveTime> {
        match self {
            Hours::Closed => None,
            Hours::Open { close, .. } => Some(*close),
        }
    }
}

pub fn parse_day(raw: &str) -> AppResult<Weekday> {
    Weekday::parse(raw).ok_or_else(|| AppError::bad_request(format!("Invalid day: {raw}")))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn validate_hours(
    day: Weekday,
    is_closed: Option<bool>,
    open_time: Option<&str>,
    close_time: Option<&str>,
) -> AppResult<Hours> {
    let day = day.as_str();
    let is_closed = is_closed.ok_or_else(|| {
        AppError::bad_request(format!("is_closed must be boolean for day: {day}"))
    })?;
    if is_closed {
        return Ok(Hours::Closed);
    }

    let (Some(open), Some(close)) = (
        open_time.filter(|t| !t.trim().is_empty()),
        close_time.filter(|t| !t.trim().is_empty()),
    ) else {
        return Err(AppError::bad_request(format!(
            "open_time and close_time required when not closed for day: {day}"
        )));
    };

    let open = parse_time(open)
        .ok_or_else(|| AppError::bad_request(format!("Invalid open_time for day: {day}")))?;
    let close = parse_time(close)
        .ok_or_else(|| AppError::bad_request(format!("Invalid close_time for day: {day}")))?;
    if open >= close {
        return Err(AppError::bad_request(format!(
            "open_time must be before close_time for day: {day}"
        )));
    }
    Ok(Hours::Open { open, close })
}

impl AvailabilityEntryRequest {
    pub fn validate(&self) -> AppResult<DayHours> {
        let raw_day = self.day.as_deref().unwrap_or_default();
        let day = parse_day(raw_day)?;
        let hours = validate_hours(
            day,
            self.is_closed,
            self.open_time.as_deref(),
            self.close_time.as_deref(),
        )?;
        Ok(DayHours { day, hours })
    }
}

impl DayHoursRequest {
    pub fn validate(&self, day: Weekday) -> AppResult<DayHours> {
        let hours = validate_hours(
            day,
            self.is_closed,
            self.open_time.as_deref(),
            self.close_time.as_deref(),
        )?;
        Ok(DayHours { day, hours })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct AvailabilityView {
    pub day: Weekday,
    pub is_closed: bool,
    #[schema(value_type = Option<String>, example = "09:00")]
    pub open_time: Option<String>,
    #[schema(value_type = Option<String>, example = "17:30")]
    pub close_time: Option<String>,
}

impl AvailabilityView {
    pub fn from_model(model: AvailabilityModel) -> Option<Self> {
        let day = Weekday::parse(&model.day)?;
        let format = |t: NaiveTime| t.format("%H:%M").to_string();
        Some(Self {
            day,
            is_closed: model.is_closed,
            open_time: model.open_time.map(format),
            close_time: model.close_time.map(format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        day: &str,
        is_closed: Option<bool>,
        open: Option<&str>,
        close: Option<&str>,
    ) -> AvailabilityEntryRequest {
        AvailabilityEntryRequest {
            day: Some(day.into()),
            is_closed,
            open_time: open.map(String::from),
            close_time: close.map(String::from),
        }
    }

    #[test]
    fn open_day_parses_both_time_formats() {
        let hours = entry("Tuesday", Some(false), Some("09:00"), Some("17:30:00"))
            .validate()
            .unwrap();
        assert_eq!(hours.day, Weekday::Tuesday);
        assert_eq!(hours.hours.open_time(), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(hours.hours.close_time(), NaiveTime::from_hms_opt(17, 30, 0));
    }

    #[test]
    fn closed_day_ignores_times() {
        let hours = entry("sunday", Some(true), Some("garbage"), None)
            .validate()
            .unwrap();
        assert_eq!(hours.hours, Hours::Closed);
    }

    #[test]
    fn equal_open_and_close_is_rejected() {
        let err = entry("monday", Some(false), Some("09:00"), Some("09:00"))
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "open_time must be before close_time for day: monday"
        );
    }

    #[test]
    fn each_failure_has_its_own_message() {
        assert_eq!(
            entry("someday", Some(true), None, None).validate().unwrap_err().to_string(),
            "Invalid day: someday"
        );
        assert_eq!(
            entry("friday", None, None, None).validate().unwrap_err().to_string(),
            "is_closed must be boolean for day: friday"
        );
        assert_eq!(
            entry("friday", Some(false), Some("09:00"), None)
                .validate()
                .unwrap_err()
                .to_string(),
            "open_time and close_time required when not closed for day: friday"
        );
        assert_eq!(
            entry("friday", Some(false), Some("9am"), Some("17:00"))
                .validate()
                .unwrap_err()
                .to_string(),
            "Invalid open_time for day: friday"
        );
    }
}
