use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::database::record::{format_timestamp, SYSTEM_FIELDS};
use crate::schema::{FieldDef, FieldDefault, FieldKind, ResourceSchema};

/// Field-level failures collected while casting client input
#[derive(Debug, thiserror::Error)]
#[error("{label} validation failed")]
pub struct RecordError {
    pub label: &'static str,
    pub field_errors: BTreeMap<String, String>,
}

impl RecordError {
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }
}

const REQUIRED: &str = "This field is required";

/// Cast a create payload: known fields only, defaults applied, required
/// fields enforced. Unknown and system fields are dropped.
pub fn cast_create(
    schema: &ResourceSchema,
    input: Map<String, Value>,
) -> Result<Map<String, Value>, RecordError> {
    log_dropped(schema, &input);

    let mut output = Map::new();
    let mut errors = BTreeMap::new();

    for def in &schema.fields {
        match input.get(def.name).map(|v| cast_value(def, v)) {
            Some(Err(msg)) => {
                errors.insert(def.name.to_string(), msg);
                continue;
            }
            Some(Ok(Some(value))) => {
                output.insert(def.name.to_string(), value);
            }
            Some(Ok(None)) | None => {}
        }

        if !output.contains_key(def.name) {
            if let Some(FieldDefault::Now) = def.default {
                output.insert(def.name.to_string(), Value::String(format_timestamp(&Utc::now())));
            }
        }

        if def.required && is_missing(output.get(def.name)) {
            errors.insert(def.name.to_string(), REQUIRED.to_string());
        }
    }

    finish(schema, output, errors)
}

/// Cast an update payload. Only sent fields are returned; `Value::Null`
/// in the result means "clear this field".
pub fn cast_update(
    schema: &ResourceSchema,
    input: Map<String, Value>,
) -> Result<Map<String, Value>, RecordError> {
    log_dropped(schema, &input);

    let mut changes = Map::new();
    let mut errors = BTreeMap::new();

    for (key, raw) in &input {
        let Some(def) = schema.field_def(key) else {
            continue;
        };

        let cast = if raw.is_null() { Ok(None) } else { cast_value(def, raw) };
        match cast {
            Err(msg) => {
                errors.insert(key.clone(), msg);
            }
            Ok(value) if def.required && is_missing(value.as_ref()) => {
                errors.insert(key.clone(), REQUIRED.to_string());
            }
            Ok(Some(value)) => {
                changes.insert(key.clone(), value);
            }
            Ok(None) => {
                changes.insert(key.clone(), Value::Null);
            }
        }
    }

    finish(schema, changes, errors)
}

fn finish(
    schema: &ResourceSchema,
    output: Map<String, Value>,
    errors: BTreeMap<String, String>,
) -> Result<Map<String, Value>, RecordError> {
    if errors.is_empty() {
        Ok(output)
    } else {
        Err(RecordError { label: schema.label, field_errors: errors })
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn log_dropped(schema: &ResourceSchema, input: &Map<String, Value>) {
    let dropped: Vec<&str> = input
        .keys()
        .map(String::as_str)
        .filter(|k| schema.field_def(k).is_none() && !SYSTEM_FIELDS.contains(k))
        .collect();
    if !dropped.is_empty() {
        tracing::debug!("Ignoring unknown {} fields: {:?}", schema.label, dropped);
    }
}

/// Cast one value. `Ok(None)` means the input counts as unset.
fn cast_value(def: &FieldDef, value: &Value) -> Result<Option<Value>, String> {
    match def.kind {
        FieldKind::String => cast_string(value),
        FieldKind::Number => cast_number(value),
        FieldKind::Date => cast_date(value),
        FieldKind::Reference => cast_reference(value),
    }
}

fn cast_string(value: &Value) -> Result<Option<Value>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(Value::String(s.clone()))),
        Value::Number(n) => Ok(Some(Value::String(n.to_string()))),
        Value::Bool(b) => Ok(Some(Value::String(b.to_string()))),
        other => Err(format!("Cast to String failed for value {}", other)),
    }
}

fn cast_number(value: &Value) -> Result<Option<Value>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(Value::Number(n.clone()))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_number(trimmed)
                .map(|n| Some(Value::Number(n)))
                .ok_or_else(|| format!("Cast to Number failed for value \"{}\"", s))
        }
        other => Err(format!("Cast to Number failed for value {}", other)),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn cast_date(value: &Value) -> Result<Option<Value>, String> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            parse_date(trimmed)
        }
        _ => None,
    };

    parsed
        .map(|dt| Some(Value::String(format_timestamp(&dt))))
        .ok_or_else(|| format!("Cast to Date failed for value {}", value))
}

/// Accepts RFC 3339, bare dates, zone-less date-times (read as UTC) and
/// epoch milliseconds
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }
    None
}

fn cast_reference(value: &Value) -> Result<Option<Value>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => uuid::Uuid::parse_str(s.trim())
            .map(|id| Some(Value::String(id.to_string())))
            .map_err(|_| format!("Cast to reference id failed for value \"{}\"", s)),
        other => Err(format!("Cast to reference id failed for value {}", other)),
    }
}
