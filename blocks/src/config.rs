use serde::Deserialize;

use crate::error::BlocksError;
use crate::options::ScanOptions;
use crate::pattern::{self, PatternRole, PatternSet};

pub const DEFAULT_BLOCK_NAME: &str = r"\{";
pub const DEFAULT_BLOCK_START: &str = r"\{";
pub const DEFAULT_BLOCK_END: &str = r"\}";

/// Uncompiled scan settings, as given on the command line or in a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub block_name: String,
    pub block_start: String,
    pub block_end: String,
    pub comment: Option<String>,
    pub regex_match: Option<String>,
    pub regex_no_match: Option<String>,
    pub mark_start: Option<String>,
    pub mark_end: Option<String>,
    pub block_count: Option<usize>,
    pub skip: usize,
    pub fatal_error: bool,
    pub line_numbers: bool,
    pub print_file_names: bool,
    pub case_insensitive: bool,
    pub ignore_top: bool,
    pub quiet: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            block_name: DEFAULT_BLOCK_NAME.to_string(),
            block_start: DEFAULT_BLOCK_START.to_string(),
            block_end: DEFAULT_BLOCK_END.to_string(),
            comment: None,
            regex_match: None,
            regex_no_match: None,
            mark_start: None,
            mark_end: None,
            block_count: None,
            skip: 0,
            fatal_error: false,
            line_numbers: false,
            print_file_names: false,
            case_insensitive: false,
            ignore_top: false,
            quiet: false,
        }
    }
}

impl ScanConfig {
    /// Compile the patterns and build the scan options.
    pub fn compile(&self) -> Result<(PatternSet, ScanOptions), BlocksError> {
        if self.block_start == self.block_end {
            return Err(BlocksError::AmbiguousDelimiters);
        }

        let icase = self.case_insensitive;
        let optional = |role, src: &Option<String>| {
            src.as_deref()
                .map(|p| pattern::compile(role, p, icase))
                .transpose()
        };

        let patterns = PatternSet::new(
            pattern::compile(PatternRole::Name, &self.block_name, icase)?,
            pattern::compile(PatternRole::Open, &self.block_start, icase)?,
            pattern::compile(PatternRole::Close, &self.block_end, icase)?,
        )
        .with_comment(optional(PatternRole::Comment, &self.comment)?)
        .with_content_match(optional(PatternRole::ContentMatch, &self.regex_match)?)
        .with_content_no_match(optional(PatternRole::ContentNoMatch, &self.regex_no_match)?);

        let options = ScanOptions {
            block_count: self.block_count,
            skip_count: self.skip,
            fatal_error: self.fatal_error,
            line_numbers: self.line_numbers,
            print_file_names: self.print_file_names,
            mark_start: self.mark_start.clone(),
            mark_end: self.mark_end.clone(),
            ignore_top: self.ignore_top,
            quiet: self.quiet,
            ..ScanOptions::default()
        };

        Ok((patterns, options))
    }
}
