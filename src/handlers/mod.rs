// handlers/mod.rs - generic record handlers
//
// Every resource shares the same five handlers; the router built for a
// resource carries its store as state.

pub mod input;
pub mod resource;

pub use input::{RecordInput, UploadedFile};
pub use resource::{router, ResourceContext};
