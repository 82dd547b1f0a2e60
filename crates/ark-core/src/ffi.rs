//! The host-value boundary: conversions between Ark values and
//! `serde_json::Value`, the coercion pair used by intrinsics and
//! truthiness, and the adapter trait for opaque host objects.
//!
//! Two conversion modes, as with the JSON bridge elsewhere:
//! - **Strict** (`to_host`): errors on NaN/Infinity and non-data values.
//! - **Lossy** (`to_host_lossy`): NaN/Infinity→null, non-data→string.

use std::fmt;

use hashbrown::HashMap;
use lasso::Spur;

use crate::error::ArkError;
use crate::value::{intern, resolve, Value};

/// An opaque host object: property access delegates to the adapter.
pub trait NativeObject: fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn get_prop(&self, name: &str) -> Result<Value, ArkError>;

    fn set_prop(&self, name: &str, _value: Value) -> Result<(), ArkError> {
        Err(ArkError::runtime(format!(
            "cannot set property {name} on {}",
            self.type_name()
        )))
    }
}

/// Convert a host JSON value to an Ark value.
pub fn from_host(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::str(s),
        serde_json::Value::Array(items) => Value::list(items.iter().map(from_host).collect()),
        serde_json::Value::Object(fields) => {
            let mut map: HashMap<Spur, Value> = HashMap::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(intern(k), from_host(v));
            }
            Value::object(map)
        }
    }
}

fn num_to_host(n: f64) -> Result<serde_json::Value, ArkError> {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.007_199_254_740_992e15 {
        return Ok(serde_json::Value::Number((n as i64).into()));
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .ok_or_else(|| ArkError::host("cannot encode NaN/Infinity as JSON"))
}

/// Key stringification for map entries crossing the host boundary.
fn key_to_string(k: &Value) -> String {
    match k {
        Value::Str(s) => resolve(*s),
        other => other.to_string(),
    }
}

/// Convert an Ark value to a host JSON value, erroring on NaN/Infinity and
/// on values with no host representation.
pub fn to_host(val: &Value) -> Result<serde_json::Value, ArkError> {
    match val {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Num(n) => num_to_host(*n),
        Value::Str(s) => Ok(serde_json::Value::String(resolve(*s))),
        Value::List(items) => {
            let arr: Result<Vec<_>, _> = items.borrow().iter().map(to_host).collect();
            Ok(serde_json::Value::Array(arr?))
        }
        Value::Map(entries) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in entries.borrow().iter() {
                obj.insert(key_to_string(k), to_host(v)?);
            }
            Ok(serde_json::Value::Object(obj))
        }
        Value::Object(fields) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in fields.borrow().iter() {
                obj.insert(resolve(*k), to_host(v)?);
            }
            Ok(serde_json::Value::Object(obj))
        }
        other => Err(ArkError::host(format!(
            "cannot convert {} to a host value",
            other.type_name()
        ))),
    }
}

/// Convert an Ark value to host JSON without erroring. NaN/Infinity become
/// null, values with no host representation become their display string.
pub fn to_host_lossy(val: &Value) -> serde_json::Value {
    match val {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Num(n) => num_to_host(*n).unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(resolve(*s)),
        Value::List(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_host_lossy).collect())
        }
        Value::Map(entries) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in entries.borrow().iter() {
                obj.insert(key_to_string(k), to_host_lossy(v));
            }
            serde_json::Value::Object(obj)
        }
        Value::Object(fields) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in fields.borrow().iter() {
                obj.insert(resolve(*k), to_host_lossy(v));
            }
            serde_json::Value::Object(obj)
        }
        other => serde_json::Value::String(other.to_string()),
    }
}

/// Host-style truthiness: null, undefined, false, 0, NaN, and the empty
/// string are falsy; everything else is truthy.
pub fn coerce_to_bool(val: &Value) -> bool {
    match val {
        Value::Null | Value::Undefined => false,
        Value::Bool(b) => *b,
        Value::Num(n) => *n != 0.0 && !n.is_nan(),
        Value::Str(s) => crate::value::with_resolved(*s, |raw| !raw.is_empty()),
        _ => true,
    }
}

/// Host-style numeric coercion. Strings parse after trimming, the empty
/// string is 0, anything unparseable is NaN.
pub fn coerce_to_num(val: &Value) -> f64 {
    match val {
        Value::Num(n) => *n,
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::Null => 0.0,
        Value::Str(s) => crate::value::with_resolved(*s, |raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }),
        _ => f64::NAN,
    }
}

/// Host ToInt32: truncate, then wrap modulo 2^32 into the signed range.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let m = n.trunc() % 4_294_967_296.0;
    let m = if m < 0.0 { m + 4_294_967_296.0 } else { m };
    (m as u32) as i32
}

/// Host ToUint32.
pub fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}
