pub mod classify;
pub mod layout;
pub mod refs;
pub mod tables;

pub use classify::classify_section;
pub use layout::analyze_layout;
pub use refs::parse_references;
pub use tables::{extract_page_tables, extract_tables};
