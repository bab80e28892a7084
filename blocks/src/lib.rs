pub mod block;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod options;
pub mod pattern;
pub mod report;
pub mod scanner;
pub mod sink;

pub use config::ScanConfig;
pub use error::BlocksError;
pub use options::ScanOptions;
pub use pattern::{PatternRole, PatternSet};
pub use scanner::{BlockScanner, ScanSummary};

/// Name used as the prefix of diagnostics and trace records.
pub const PROGRAM_NAME: &str = "blocks";

/// Log target of the per-phase call/return trace.
pub const TRACE_TARGET: &str = "blocks::trace";
