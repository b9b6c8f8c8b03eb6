//! Built-in coercion kinds.
//!
//! Each kind is a pair of pure functions: `dump` turns an application value into a
//! storage-ready primitive, `load` turns the primitive back. Both are only called with
//! non-null values; the registry short-circuits `Null`.

use std::io::Cursor;

use chrono::{DateTime, NaiveDate, Utc};

use crate::value::Value;

use super::CoercionError;

/// Signature shared by dump and load functions.
pub type CoerceFn = fn(&str, &Value) -> Result<Value, CoercionError>;

/// The built-in coercion kinds an attribute can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Identity in both directions.
    Raw,
    String,
    Integer,
    Float,
    /// Raw bytes out, seekable stream in.
    BinaryStream,
    /// Stored as `1`/`0`.
    Boolean,
    /// Stored as floating-point epoch seconds.
    Timestamp,
    /// Stored as epoch seconds of midnight UTC; loads truncate to the day.
    Date,
    /// Stored as floating-point epoch seconds; numeric input passes through.
    DateTime,
}

/// A dump/load function pair registered for one attribute.
#[derive(Clone, Copy)]
pub struct Codec {
    kind: Option<Coercion>,
    dump: CoerceFn,
    load: CoerceFn,
}

impl Codec {
    /// Builds a codec from custom dump/load functions.
    pub fn custom(dump: CoerceFn, load: CoerceFn) -> Self {
        Self {
            kind: None,
            dump,
            load,
        }
    }

    /// The built-in kind, or `None` for custom codecs.
    pub fn kind(&self) -> Option<Coercion> {
        self.kind
    }

    pub(crate) fn dump(&self, attribute: &str, value: &Value) -> Result<Value, CoercionError> {
        (self.dump)(attribute, value)
    }

    pub(crate) fn load(&self, attribute: &str, value: &Value) -> Result<Value, CoercionError> {
        (self.load)(attribute, value)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "Codec({kind:?})"),
            None => write!(f, "Codec(custom)"),
        }
    }
}

impl From<Coercion> for Codec {
    fn from(kind: Coercion) -> Self {
        let (dump, load): (CoerceFn, CoerceFn) = match kind {
            Coercion::Raw => (identity, identity),
            Coercion::String => (string, string),
            Coercion::Integer => (integer, integer),
            Coercion::Float => (float, float),
            Coercion::BinaryStream => (dump_binary_stream, load_binary_stream),
            Coercion::Boolean => (dump_boolean, load_boolean),
            Coercion::Timestamp => (dump_timestamp, load_timestamp),
            Coercion::Date => (dump_date, load_date),
            Coercion::DateTime => (dump_date_time, load_date_time),
        };
        Self {
            kind: Some(kind),
            dump,
            load,
        }
    }
}

fn invalid(attribute: &str, expected: &'static str, found: &Value) -> CoercionError {
    CoercionError::InvalidValue {
        attribute: attribute.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn identity(_: &str, value: &Value) -> Result<Value, CoercionError> {
    Ok(value.clone())
}

fn string(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::String(_) => Ok(value.clone()),
        other => Err(invalid(attribute, "string", other)),
    }
}

fn integer(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Int(_) => Ok(value.clone()),
        // i64::MAX is not representable as f64; the bound rounds up to 2^63.
        Value::Float(f)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            Ok(Value::Int(*f as i64))
        }
        other => Err(invalid(attribute, "int", other)),
    }
}

fn float(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Float(_) => Ok(value.clone()),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        other => Err(invalid(attribute, "float", other)),
    }
}

fn dump_binary_stream(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Binary(_) | Value::Stream(_) => Ok(value.clone()),
        other => Err(invalid(attribute, "binary", other)),
    }
}

fn load_binary_stream(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Stream(_) => Ok(value.clone()),
        Value::Binary(bytes) => Ok(Value::Stream(Cursor::new(bytes.clone()))),
        other => Err(invalid(attribute, "binary", other)),
    }
}

/// `true` (or an already dumped `1`) becomes `1`; any other value becomes `0`.
fn dump_boolean(_: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Bool(true) => Ok(Value::Int(1)),
        Value::Int(i) => Ok(Value::Int(i64::from(*i == 1))),
        _ => Ok(Value::Int(0)),
    }
}

fn load_boolean(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Int(i) => Ok(Value::Bool(*i == 1)),
        Value::Float(f) => Ok(Value::Bool(*f == 1.0)),
        Value::Bool(_) => Ok(value.clone()),
        other => Err(invalid(attribute, "bool", other)),
    }
}

fn dump_timestamp(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Timestamp(ts) => Ok(Value::Float(epoch_seconds(ts))),
        other => Err(invalid(attribute, "timestamp", other)),
    }
}

fn load_timestamp(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    from_epoch_seconds(attribute, value).map(Value::Timestamp)
}

fn dump_date(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Date(date) => Ok(Value::Float(epoch_seconds(&midnight_utc(*date)))),
        other => Err(invalid(attribute, "date", other)),
    }
}

fn load_date(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    from_epoch_seconds(attribute, value).map(|ts| Value::Date(ts.date_naive()))
}

fn dump_date_time(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        Value::DateTime(dt) => Ok(Value::Float(epoch_seconds(&dt.with_timezone(&Utc)))),
        Value::Timestamp(ts) => Ok(Value::Float(epoch_seconds(ts))),
        other => Err(invalid(attribute, "datetime", other)),
    }
}

fn load_date_time(attribute: &str, value: &Value) -> Result<Value, CoercionError> {
    from_epoch_seconds(attribute, value).map(|ts| Value::DateTime(ts.fixed_offset()))
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_nanos()) / 1e9
}

/// Converts epoch seconds back to a timestamp, rounded to the microsecond.
///
/// An `f64` holding present-day epoch seconds resolves well below a microsecond, so
/// rounding there recovers what was dumped.
fn from_epoch_seconds(attribute: &str, value: &Value) -> Result<DateTime<Utc>, CoercionError> {
    let seconds = match value {
        Value::Float(f) if f.is_finite() => *f,
        Value::Int(i) => *i as f64,
        other => return Err(invalid(attribute, "epoch seconds", other)),
    };
    let micros = (seconds * 1e6).round() as i64;
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| invalid(attribute, "epoch seconds", value))
}
