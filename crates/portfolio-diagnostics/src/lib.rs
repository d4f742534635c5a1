pub mod models;
pub mod scoring;

pub use models::*;
pub use scoring::{diagnose, prepare_holdings, Finding};
