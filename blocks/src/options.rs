use crate::PROGRAM_NAME;

/// How blocks are selected and printed. Fixed for the lifetime of a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Print at most this many blocks. `None` prints all of them.
    pub block_count: Option<usize>,
    /// Silently drop this many blocks before printing any.
    pub skip_count: usize,
    /// Stop at the first nesting error.
    pub fatal_error: bool,
    pub line_numbers: bool,
    /// Print `<file>:` before the first block printed from each file.
    pub print_file_names: bool,
    pub mark_start: Option<String>,
    pub mark_end: Option<String>,
    /// Print only the inside of each block.
    pub ignore_top: bool,
    /// Suppress normal output. Diagnostics are still printed.
    pub quiet: bool,
    /// Prefix of every diagnostic line.
    pub error_label: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            block_count: None,
            skip_count: 0,
            fatal_error: false,
            line_numbers: false,
            print_file_names: false,
            mark_start: None,
            mark_end: None,
            ignore_top: false,
            quiet: false,
            error_label: PROGRAM_NAME.to_string(),
        }
    }
}
