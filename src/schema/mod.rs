//! Declarative resource schemas.
//!
//! A `ResourceSchema` describes one CRUD collection: where it is routed,
//! which collection stores it, and how each field is cast and validated.
//! The same generic store and handlers serve every schema; the catalog
//! instantiates them per tenant.

pub mod cast;
pub mod catalog;

use serde::Serialize;

use crate::types::Tenant;

pub use cast::{cast_create, cast_update, RecordError};

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Date,
    /// Identifier of a record in another collection
    Reference,
}

/// Server-side default applied on create when the client omits the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldDefault {
    Now,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<FieldDefault>,
}

impl FieldDef {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, default: None }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn reference(name: &'static str) -> Self {
        Self::new(name, FieldKind::Reference)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(FieldDefault::Now);
        self
    }
}

/// What an upload contributes to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileReference {
    /// Generated file name only (`1718000000000.jpg`)
    FileName,
    /// Relative path under the upload prefix (`uploads/1718000000000.jpg`)
    StoredPath,
}

/// Single-file attachment accepted on create/update
#[derive(Debug, Clone, Serialize)]
pub struct UploadSpec {
    /// Multipart field name; also the record field holding the reference
    pub field: &'static str,
    pub reference: FileReference,
}

/// Read-time resolution of a reference field into display fields
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSpec {
    pub field: &'static str,
    pub collection: &'static str,
    pub select: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub tenant: Tenant,
    /// Human-readable singular name used in messages ("Employee")
    pub label: &'static str,
    pub collection: &'static str,
    /// Route prefix, e.g. `/api/employees`
    pub path: &'static str,
    pub fields: Vec<FieldDef>,
    pub upload: Option<UploadSpec>,
    pub reference: Option<ReferenceSpec>,
    /// Expose `createdAt`/`updatedAt` in responses
    pub timestamps: bool,
}

impl ResourceSchema {
    pub fn new(
        tenant: Tenant,
        label: &'static str,
        collection: &'static str,
        path: &'static str,
    ) -> Self {
        Self {
            tenant,
            label,
            collection,
            path,
            fields: Vec::new(),
            upload: None,
            reference: None,
            timestamps: false,
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Accept a file under `field` and store its reference in the same field
    pub fn upload(mut self, field: &'static str, reference: FileReference) -> Self {
        self.upload = Some(UploadSpec { field, reference });
        self
    }

    /// Populate `field` from `collection` with the `select`ed fields on read
    pub fn populate(
        mut self,
        field: &'static str,
        collection: &'static str,
        select: &'static [&'static str],
    ) -> Self {
        self.reference = Some(ReferenceSpec { field, collection, select });
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Path of the record-level routes (`/api/employees/:id`)
    pub fn item_path(&self) -> String {
        format!("{}/:id", self.path)
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found!", self.label)
    }
}
