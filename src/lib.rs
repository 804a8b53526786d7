//! Paginated PDF rendering for smart-contract audit reports.

pub mod assets;
pub mod config;
pub mod layout;
pub mod render;
pub mod types;
