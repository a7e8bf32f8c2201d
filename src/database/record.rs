use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Fields owned by the storage layer. They never come from API input.
pub const SYSTEM_FIELDS: &[&str] = &["_id", "createdAt", "updatedAt", "__v"];

/// A stored document: server-assigned identity plus schema-shaped fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a new record with a fresh identity
    pub fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a string field
    #[cfg(test)]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Shallow-merge changes into the record. `Value::Null` removes the field.
    pub fn merge(&mut self, changes: Map<String, Value>) -> &mut Self {
        for (key, value) in changes {
            if value.is_null() {
                self.fields.remove(&key);
            } else {
                self.fields.insert(key, value);
            }
        }
        self.updated_at = Utc::now();
        self
    }

    /// Convert to the public wire format: `_id` plus fields, and
    /// `createdAt`/`updatedAt` when the schema exposes timestamps
    pub fn to_api_output(&self, timestamps: bool) -> Value {
        let mut output = Map::new();
        output.insert("_id".into(), Value::String(self.id.to_string()));
        for (key, value) in &self.fields {
            output.insert(key.clone(), value.clone());
        }
        if timestamps {
            output.insert("createdAt".into(), Value::String(format_timestamp(&self.created_at)));
            output.insert("updatedAt".into(), Value::String(format_timestamp(&self.updated_at)));
        }
        Value::Object(output)
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a record id. Anything that is not a UUID cannot name a record.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
