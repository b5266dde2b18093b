// Field validation for contact submissions.
//
// Fields are checked in a fixed order (name, phone, course, message,
// timestamp) and the first failure wins.

use crate::config::CourseSet;
use crate::models::Submission;
use serde_json::{Map, Value};
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const PHONE_PREFIX: &str = "+998";
pub const PHONE_DIGITS: usize = 9;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request body")]
    NotAnObject,

    #[error("Name is required and must be under 100 characters")]
    Name,

    #[error("Invalid phone number format")]
    Phone,

    #[error("Invalid course selection")]
    Course,

    #[error("Message must be under 1000 characters")]
    Message,

    #[error("Timestamp is required")]
    Timestamp,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotAnObject => "body",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Course => "course",
            Self::Message => "message",
            Self::Timestamp => "timestamp",
        }
    }
}

// Validate a decoded JSON body and build the normalized [`Submission`].
//
// `name` and `message` are trimmed; `phone`, `course` and `timestamp` pass
// through unchanged. A missing or null `message` becomes the empty string.
pub fn validate(body: &Value, courses: &CourseSet) -> Result<Submission, ValidationError> {
    let fields = body.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = string_field(fields, "name")
        .filter(|n| !n.trim().is_empty() && n.chars().count() <= MAX_NAME_CHARS)
        .ok_or(ValidationError::Name)?;

    let phone = string_field(fields, "phone")
        .filter(|p| is_valid_phone(p))
        .ok_or(ValidationError::Phone)?;

    let course = string_field(fields, "course")
        .filter(|c| courses.contains(c))
        .ok_or(ValidationError::Course)?;

    let message = match fields.get("message") {
        None | Some(Value::Null) => "",
        Some(Value::String(m)) if m.chars().count() <= MAX_MESSAGE_CHARS => m.trim(),
        Some(_) => return Err(ValidationError::Message),
    };

    let timestamp = string_field(fields, "timestamp").ok_or(ValidationError::Timestamp)?;

    Ok(Submission::new(
        name.trim().to_string(),
        phone.to_string(),
        course.to_string(),
        message.to_string(),
        timestamp.to_string(),
    ))
}

// "+998" followed by exactly nine ASCII digits, nothing else
pub fn is_valid_phone(phone: &str) -> bool {
    phone.strip_prefix(PHONE_PREFIX).is_some_and(|digits| {
        digits.len() == PHONE_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}
