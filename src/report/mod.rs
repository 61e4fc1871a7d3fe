//! Reporting utilities: terminal summaries and the executive summary file.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
