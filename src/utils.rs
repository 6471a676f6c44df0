use axum::http::StatusCode;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::constants::*;

pub fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{} cannot be empty", field_name)));
    }
    if value.len() > max_length {
        return Err(bad_request(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), format).ok()
}

pub fn validate_date(value: &str, field_name: &str) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{} cannot be empty", field_name)));
    }
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| bad_request(format!("{} must be formatted as YYYY-MM-DD", field_name)))
}

pub fn validate_amount(value: f64, field_name: &str) -> Result<(), (StatusCode, String)> {
    if !value.is_finite() {
        return Err(bad_request(format!("{} must be a valid number", field_name)));
    }
    if value < 0.0 {
        return Err(bad_request(format!("{} cannot be negative", field_name)));
    }
    Ok(())
}

pub fn validate_color(value: &str) -> Result<(), (StatusCode, String)> {
    let hex = value.strip_prefix('#').unwrap_or("");
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad_request("Color must be a hex value like #10B981"));
    }
    Ok(())
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, (StatusCode, String)> {
    match limit {
        Some(0) => Err(bad_request("Limit must be greater than 0")),
        Some(l) if l > MAX_LIMIT => Err(bad_request(format!("Limit cannot exceed {}", MAX_LIMIT))),
        Some(l) => Ok(l),
        None => Ok(default),
    }
}

pub fn validate_offset(offset: Option<u32>) -> Result<u32, (StatusCode, String)> {
    match offset {
        Some(o) if o > MAX_OFFSET => Err(bad_request(format!(
            "Offset cannot exceed {}",
            MAX_OFFSET
        ))),
        Some(o) => Ok(o),
        None => Ok(0),
    }
}

/// Trims an optional text field, mapping blank input to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
