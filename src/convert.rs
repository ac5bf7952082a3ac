//! Conversion between field text and typed values.
//!
//! A [`SimpleTypeMapping`](crate::mapping::SimpleTypeMapping) holds a converter and an
//! opaque format (a list of strings) that is handed to the converter unchanged on every
//! call. The engines never interpret the format themselves.
//!
//! `None` is the "no value" text on both sides: converters map [`Value::Null`] to `None`
//! when writing and `None` to [`Value::Null`] when reading.
//!
//! | Converter | Value | Format |
//! |-----------|-------|--------|
//! | [`StringConverter`] | `String` | unused |
//! | [`IntegerConverter`] | `Number::Integer` | unused |
//! | [`FloatConverter`] | `Number::Float` | unused |
//! | [`BooleanConverter`] | `Bool` | `[true_text, false_text]`, default `["true", "false"]` |
//! | [`DateTimeConverter`] | `Date` | `[chrono pattern]`, default RFC 3339 |
//! | [`BigIntConverter`] | `BigInt` | unused |
//! | [`EnumConverter`] | `String` (constant name) | `CONSTANT` or `CONSTANT=text` entries |

use crate::{Error, Number, Result, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use std::fmt;

/// Converts between a field's text and its value.
pub trait SimpleTypeConverter: Send + Sync + fmt::Debug {
    /// Renders a value as field text; `Ok(None)` writes an empty field.
    fn to_string(&self, value: &Value, format: &[String]) -> Result<Option<String>>;

    /// Parses field text; `None` means the field was absent or empty.
    fn from_string(&self, text: Option<&str>, format: &[String]) -> Result<Value>;
}

fn unexpected(expected: &str, value: &Value) -> Error {
    Error::conversion(format!("expected {}, found {}", expected, value.kind()))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StringConverter;

impl SimpleTypeConverter for StringConverter {
    fn to_string(&self, value: &Value, _format: &[String]) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Bool(_) | Value::Number(_) | Value::Date(_) | Value::BigInt(_) => {
                Ok(Some(value.to_string()))
            }
            other => Err(unexpected("string", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, _format: &[String]) -> Result<Value> {
        Ok(text.map(Value::from).unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerConverter;

impl SimpleTypeConverter for IntegerConverter {
    fn to_string(&self, value: &Value, _format: &[String]) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .map(|i| Some(i.to_string()))
                .ok_or_else(|| Error::conversion(format!("{} is not an integer", n))),
            other => Err(unexpected("integer", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, _format: &[String]) -> Result<Value> {
        match text.map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(text) => text
                .parse::<i64>()
                .map(|i| Value::Number(Number::Integer(i)))
                .map_err(|e| Error::conversion(format!("invalid integer {:?}: {}", text, e))),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FloatConverter;

impl SimpleTypeConverter for FloatConverter {
    fn to_string(&self, value: &Value, _format: &[String]) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(n.as_f64().to_string())),
            other => Err(unexpected("number", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, _format: &[String]) -> Result<Value> {
        match text.map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(text) => text
                .parse::<f64>()
                .map(|f| Value::Number(Number::Float(f)))
                .map_err(|e| Error::conversion(format!("invalid number {:?}: {}", text, e))),
        }
    }
}

/// Booleans as configurable texts; format `["Y", "N"]` writes `Y`/`N`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BooleanConverter;

impl BooleanConverter {
    fn texts(format: &[String]) -> (&str, &str) {
        match format {
            [on, off, ..] => (on.as_str(), off.as_str()),
            _ => ("true", "false"),
        }
    }
}

impl SimpleTypeConverter for BooleanConverter {
    fn to_string(&self, value: &Value, format: &[String]) -> Result<Option<String>> {
        let (on, off) = Self::texts(format);
        match value {
            Value::Null => Ok(None),
            Value::Bool(true) => Ok(Some(on.to_string())),
            Value::Bool(false) => Ok(Some(off.to_string())),
            other => Err(unexpected("bool", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, format: &[String]) -> Result<Value> {
        let (on, off) = Self::texts(format);
        match text {
            None => Ok(Value::Null),
            Some(text) if text == on => Ok(Value::Bool(true)),
            Some(text) if text == off => Ok(Value::Bool(false)),
            Some(text) => Err(Error::conversion(format!(
                "invalid boolean {:?}, expected {:?} or {:?}",
                text, on, off
            ))),
        }
    }
}

/// Timestamps in UTC.
///
/// With a format, the first entry is a `chrono` strftime pattern; a pattern without time
/// fields (such as `%d.%m.%Y`) reads as midnight UTC. Without a format, RFC 3339 is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateTimeConverter;

impl DateTimeConverter {
    fn parse(text: &str, pattern: Option<&str>) -> Result<DateTime<Utc>> {
        let invalid = |e: chrono::ParseError| {
            Error::conversion(format!("invalid date {:?}: {}", text, e))
        };
        match pattern {
            None => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(invalid),
            Some(pattern) => match NaiveDateTime::parse_from_str(text, pattern) {
                Ok(naive) => Ok(naive.and_utc()),
                Err(_) => {
                    let date = NaiveDate::parse_from_str(text, pattern).map_err(invalid)?;
                    date.and_hms_opt(0, 0, 0)
                        .map(|naive| naive.and_utc())
                        .ok_or_else(|| Error::conversion(format!("invalid date {:?}", text)))
                }
            },
        }
    }
}

impl SimpleTypeConverter for DateTimeConverter {
    fn to_string(&self, value: &Value, format: &[String]) -> Result<Option<String>> {
        let pattern = format.first().map(String::as_str);
        let date = match value {
            Value::Null => return Ok(None),
            Value::Date(date) => *date,
            Value::String(text) => Self::parse(text, None)?,
            other => return Err(unexpected("date", other)),
        };
        Ok(Some(match pattern {
            Some(pattern) => date.format(pattern).to_string(),
            None => date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }))
    }

    fn from_string(&self, text: Option<&str>, format: &[String]) -> Result<Value> {
        match text.map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(text) => Self::parse(text, format.first().map(String::as_str)).map(Value::Date),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BigIntConverter;

impl SimpleTypeConverter for BigIntConverter {
    fn to_string(&self, value: &Value, _format: &[String]) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::BigInt(bi) => Ok(Some(bi.to_string())),
            Value::Number(n) => n
                .as_i64()
                .map(|i| Some(i.to_string()))
                .ok_or_else(|| Error::conversion(format!("{} is not an integer", n))),
            other => Err(unexpected("big integer", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, _format: &[String]) -> Result<Value> {
        match text.map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(text) => text
                .parse::<BigInt>()
                .map(Value::BigInt)
                .map_err(|e| Error::conversion(format!("invalid integer {:?}: {}", text, e))),
        }
    }
}

/// Enum constants as strings.
///
/// Each format entry is either `CONSTANT` (written as-is) or `CONSTANT=text`.
/// Values and texts outside the declared constants are rejected.
///
/// ```rust
/// use rbf_codec::convert::{EnumConverter, SimpleTypeConverter};
/// use rbf_codec::Value;
///
/// let format = vec!["Active=A".to_string(), "Closed=C".to_string()];
/// let text = EnumConverter.to_string(&Value::from("Closed"), &format).unwrap();
/// assert_eq!(text.as_deref(), Some("C"));
/// assert_eq!(EnumConverter.from_string(Some("A"), &format).unwrap(), Value::from("Active"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumConverter;

impl EnumConverter {
    fn constants(format: &[String]) -> impl Iterator<Item = (&str, &str)> {
        format.iter().map(|entry| match entry.split_once('=') {
            Some((constant, text)) => (constant, text),
            None => (entry.as_str(), entry.as_str()),
        })
    }
}

impl SimpleTypeConverter for EnumConverter {
    fn to_string(&self, value: &Value, format: &[String]) -> Result<Option<String>> {
        match value {
            Value::Null => Ok(None),
            Value::String(name) => Self::constants(format)
                .find(|(constant, _)| constant == name)
                .map(|(_, text)| Some(text.to_string()))
                .ok_or_else(|| Error::conversion(format!("unknown enum constant {}", name))),
            other => Err(unexpected("enum constant", other)),
        }
    }

    fn from_string(&self, text: Option<&str>, format: &[String]) -> Result<Value> {
        match text {
            None => Ok(Value::Null),
            Some(text) => Self::constants(format)
                .find(|(_, candidate)| *candidate == text)
                .map(|(constant, _)| Value::from(constant))
                .ok_or_else(|| Error::conversion(format!("unknown enum text {:?}", text))),
        }
    }
}
