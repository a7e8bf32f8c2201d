use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::database::record::parse_id;
use crate::database::{DatabaseError, DocumentStore, Record};
use crate::schema::ReferenceSpec;

/// Replaces a stored reference id with `{_id, ...select}` from the target
/// collection. Targets are fetched in one batch per call; a reference whose
/// target is gone keeps its raw id.
pub struct ReferencePopulator<'a> {
    spec: &'a ReferenceSpec,
    store: &'a DocumentStore,
}

impl<'a> ReferencePopulator<'a> {
    pub fn new(spec: &'a ReferenceSpec, store: &'a DocumentStore) -> Self {
        Self { spec, store }
    }

    pub async fn populate(&self, docs: &mut [Value]) -> Result<(), DatabaseError> {
        let mut ids: Vec<Uuid> = docs.iter().filter_map(|doc| self.reference_of(doc)).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }

        let targets: HashMap<Uuid, Record> = self
            .store
            .backend()
            .find_by_ids(self.spec.collection, &ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        for doc in docs.iter_mut() {
            let Some(id) = self.reference_of(doc) else {
                continue;
            };
            match targets.get(&id) {
                Some(target) => {
                    if let Some(obj) = doc.as_object_mut() {
                        obj.insert(self.spec.field.to_string(), self.summary(target));
                    }
                }
                None => {
                    warn!(
                        "Dangling {} reference {} into {}",
                        self.spec.field, id, self.spec.collection
                    );
                }
            }
        }
        Ok(())
    }

    fn reference_of(&self, doc: &Value) -> Option<Uuid> {
        doc.get(self.spec.field).and_then(Value::as_str).and_then(parse_id)
    }

    fn summary(&self, target: &Record) -> Value {
        let mut out = Map::new();
        out.insert("_id".into(), Value::String(target.id.to_string()));
        for field in self.spec.select {
            if let Some(value) = target.get(field) {
                out.insert((*field).to_string(), value.clone());
            }
        }
        Value::Object(out)
    }
}
