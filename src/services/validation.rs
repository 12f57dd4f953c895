//! Field-level rules applied to user records before they are persisted.
//!
//! Rules are checked in a fixed order (name, age, dateOfBirth, password,
//! gender, about) and the first failure is returned. Request fields arrive
//! as raw JSON and are cast the way a loosely typed client expects: numbers
//! and booleans become text, numeric strings become numbers. Values that
//! cannot be cast fail on the field they were sent for. Nothing here
//! touches the store.

use chrono::{DateTime as ChronoDateTime, NaiveDate};
use mongodb::bson::DateTime;
use serde_json::Value;

use crate::models::{CreateUserRequest, Gender, NewUser, UpdateUserRequest, UserPatch};
use crate::utils::AppError;

pub const NAME_MIN_LEN: usize = 2;
pub const AGE_MIN: i64 = 0;
pub const AGE_MAX: i64 = 120;
pub const PASSWORD_MIN_LEN: usize = 10;
pub const ABOUT_MAX_LEN: usize = 5000;

/// Validates a create request and returns the typed record.
pub fn validate_new_user(request: &CreateUserRequest) -> Result<NewUser, AppError> {
    let name = validate_name(&required("name", &request.name)?)?;
    let age = validate_age(whole_number("age", &request.age)?.ok_or_else(|| missing("age"))?)?;
    let date_of_birth = date_value(&request.date_of_birth)?.ok_or_else(|| missing("dateOfBirth"))?;
    let password = validate_password(&required("password", &request.password)?)?;
    let gender = parse_gender(&required("gender", &request.gender)?)?;
    let about = text("about", &request.about)?
        .as_deref()
        .map(validate_about)
        .transpose()?;

    Ok(NewUser {
        name,
        age,
        date_of_birth,
        password,
        gender,
        about,
    })
}

/// Validates only the fields present in an update request. `null` counts as
/// absent. The returned patch carries the plain-text password; hashing is the
/// caller's job.
pub fn validate_patch(request: &UpdateUserRequest) -> Result<UserPatch, AppError> {
    Ok(UserPatch {
        name: text("name", &request.name)?
            .as_deref()
            .map(validate_name)
            .transpose()?,
        age: whole_number("age", &request.age)?
            .map(validate_age)
            .transpose()?,
        date_of_birth: date_value(&request.date_of_birth)?,
        password: text("password", &request.password)?
            .as_deref()
            .map(validate_password)
            .transpose()?,
        gender: text("gender", &request.gender)?
            .as_deref()
            .map(parse_gender)
            .transpose()?,
        about: text("about", &request.about)?
            .as_deref()
            .map(validate_about)
            .transpose()?,
    })
}

fn missing(field: &'static str) -> AppError {
    AppError::validation(field, format!("{} is required", field))
}

fn required(field: &'static str, value: &Value) -> Result<String, AppError> {
    match text(field, value)? {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

/// Reads a text field. Numbers and booleans are cast to their string form.
pub fn text(field: &'static str, value: &Value) -> Result<Option<String>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(AppError::validation(
            field,
            format!("{} must be a string", field),
        )),
    }
}

/// Reads an integer field from a JSON number or a numeric string. Blank
/// strings count as absent; fractional values are rejected.
pub fn whole_number(field: &'static str, value: &Value) -> Result<Option<i64>, AppError> {
    let invalid = || AppError::validation(field, format!("{} must be a whole number", field));

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .map(Some)
            .ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(Some)
                .ok_or_else(invalid)
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(invalid()),
    }
}

fn integral(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up, so the bound is exclusive
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

/// Reads a date from a string (see [`parse_date_of_birth`]) or from epoch
/// milliseconds. Blank strings count as absent.
pub fn date_value(value: &Value) -> Result<Option<DateTime>, AppError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_date_of_birth(s).map(Some),
        Value::Number(n) => n
            .as_i64()
            .map(|millis| Some(DateTime::from_millis(millis)))
            .ok_or_else(invalid_date),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Err(invalid_date()),
    }
}

fn invalid_date() -> AppError {
    AppError::validation("dateOfBirth", "Invalid date format")
}

pub fn validate_name(name: &str) -> Result<String, AppError> {
    if name.is_empty() {
        return Err(missing("name"));
    }
    if name.chars().count() < NAME_MIN_LEN {
        return Err(AppError::validation(
            "name",
            format!("name must be at least {} characters long", NAME_MIN_LEN),
        ));
    }
    Ok(name.to_string())
}

pub fn validate_age(age: i64) -> Result<i32, AppError> {
    if !(AGE_MIN..=AGE_MAX).contains(&age) {
        return Err(AppError::validation(
            "age",
            format!("age must be between {} and {}", AGE_MIN, AGE_MAX),
        ));
    }
    // bounded by AGE_MAX above
    Ok(age as i32)
}

/// Accepts a calendar date (`1994-01-01`, read as midnight UTC) or a full
/// RFC 3339 timestamp.
pub fn parse_date_of_birth(raw: &str) -> Result<DateTime, AppError> {
    let raw = raw.trim();

    let millis = if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
    } else {
        ChronoDateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.timestamp_millis())
    };

    millis.map(DateTime::from_millis).ok_or_else(invalid_date)
}

pub fn validate_password(password: &str) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(missing("password"));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::validation(
            "password",
            format!("password must be at least {} characters long", PASSWORD_MIN_LEN),
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(AppError::validation(
            "password",
            "Password must be alphanumeric and at least 10 characters long",
        ));
    }
    Ok(password.to_string())
}

pub fn parse_gender(raw: &str) -> Result<Gender, AppError> {
    raw.parse::<Gender>()
        .map_err(|msg| AppError::validation("gender", msg))
}

pub fn validate_about(about: &str) -> Result<String, AppError> {
    if about.chars().count() > ABOUT_MAX_LEN {
        return Err(AppError::validation(
            "about",
            format!("about must be at most {} characters long", ABOUT_MAX_LEN),
        ));
    }
    Ok(about.to_string())
}
