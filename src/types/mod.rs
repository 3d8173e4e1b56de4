// src/types/mod.rs
pub mod cv_data;
pub mod schema;
pub mod submission;

pub use cv_data::*;
pub use schema::{OutputSchema, StructuredOutput};
pub use submission::Draft;
