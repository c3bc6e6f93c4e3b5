//! Conversion between JSON values and Firestore's wire values.

use std::collections::HashMap;

use anyhow::anyhow;
use firestore_grpc::v1::{value::ValueType, ArrayValue, MapValue, Value};
use serde_json::{Map, Number};

use crate::error::FirebaseError;

/// Turns a JSON object into document fields. Anything other than an object
/// cannot be stored as a document.
pub(crate) fn to_document_fields(
    value: serde_json::Value,
) -> Result<HashMap<String, Value>, FirebaseError> {
    match value {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, to_firestore_value(v)))
            .collect()),
        other => Err(anyhow!("A document must be a JSON object, got {other}").into()),
    }
}

pub(crate) fn to_firestore_value(value: serde_json::Value) -> Value {
    let value_type = match value {
        serde_json::Value::Null => ValueType::NullValue(0),
        serde_json::Value::Bool(b) => ValueType::BooleanValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => ValueType::IntegerValue(i),
            // u64 beyond i64::MAX and floats
            None => ValueType::DoubleValue(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => ValueType::StringValue(s),
        serde_json::Value::Array(values) => ValueType::ArrayValue(ArrayValue {
            values: values.into_iter().map(to_firestore_value).collect(),
        }),
        serde_json::Value::Object(map) => ValueType::MapValue(MapValue {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, to_firestore_value(v)))
                .collect(),
        }),
    };

    Value {
        value_type: Some(value_type),
    }
}

/// Turns document fields into a JSON object. References are rendered relative
/// to `root_resource_path`.
pub(crate) fn from_document_fields(
    fields: HashMap<String, Value>,
    root_resource_path: &str,
) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k, from_firestore_value(v, root_resource_path)))
            .collect(),
    )
}

#[allow(unreachable_patterns)]
pub(crate) fn from_firestore_value(value: Value, root_resource_path: &str) -> serde_json::Value {
    let Some(value_type) = value.value_type else {
        return serde_json::Value::Null;
    };

    match value_type {
        ValueType::NullValue(_) => serde_json::Value::Null,
        ValueType::BooleanValue(b) => serde_json::Value::Bool(b),
        ValueType::IntegerValue(i) => serde_json::Value::from(i),
        ValueType::DoubleValue(f) => Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueType::StringValue(s) => serde_json::Value::String(s),
        ValueType::BytesValue(bytes) => serde_json::Value::from(bytes),
        ValueType::ReferenceValue(reference) => serde_json::Value::String(
            reference
                .strip_prefix(root_resource_path)
                .map(|r| r.trim_start_matches('/').to_string())
                .unwrap_or(reference),
        ),
        ValueType::TimestampValue(ts) => serde_json::json!({
            "seconds": ts.seconds,
            "nanos": ts.nanos,
        }),
        ValueType::GeoPointValue(point) => serde_json::json!({
            "latitude": point.latitude,
            "longitude": point.longitude,
        }),
        ValueType::ArrayValue(array) => serde_json::Value::Array(
            array
                .values
                .into_iter()
                .map(|v| from_firestore_value(v, root_resource_path))
                .collect(),
        ),
        ValueType::MapValue(map) => serde_json::Value::Object(
            map.fields
                .into_iter()
                .map(|(k, v)| (k, from_firestore_value(v, root_resource_path)))
                .collect::<Map<_, _>>(),
        ),
        _ => serde_json::Value::Null,
    }
}
