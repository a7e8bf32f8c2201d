pub mod manager;
pub mod memory;
pub mod postgres;
pub mod record;

pub use manager::{DatabaseError, DocumentBackend, DocumentStore};
pub use record::Record;
