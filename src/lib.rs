pub mod db;

pub mod accounts;
pub mod assets;
pub mod holdings;

pub mod constants;
pub mod datatypes;
pub mod errors;
pub mod formulas;
pub mod fx;
pub mod market_data;
pub mod schema;
pub mod schemas;
pub mod snapshots;

pub mod allocations;
pub mod analytics;

pub use errors::{Error, Result};
