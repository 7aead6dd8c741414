pub mod config;
pub mod error;
pub mod group;
pub mod plot;
pub mod record;
pub mod report;

pub use error::{ReportError, Result};
