pub mod entities;
pub mod patterns;
pub mod relations;

pub use entities::{extract_entities, extract_entities_from_content};
pub use relations::extract_relationships;
