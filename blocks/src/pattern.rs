use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::BlocksError;

/// What a pattern is used for. Shows up in compile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    Name,
    Open,
    Close,
    Comment,
    ContentMatch,
    ContentNoMatch,
}

impl fmt::Display for PatternRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternRole::Name => "block name",
            PatternRole::Open => "block start",
            PatternRole::Close => "block end",
            PatternRole::Comment => "comment",
            PatternRole::ContentMatch => "regex match",
            PatternRole::ContentNoMatch => "regex no match",
        };
        f.write_str(s)
    }
}

/// Compile a user supplied pattern for the given role.
pub fn compile(
    role: PatternRole,
    pattern: &str,
    case_insensitive: bool,
) -> Result<Regex, BlocksError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| BlocksError::Pattern {
            role,
            pattern: pattern.to_string(),
            source,
        })
}

/// The compiled patterns driving a scan.
///
/// Name, open and close are always present. The comment and content filters
/// are optional; leaving one out disables the feature.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub name: Regex,
    pub open: Regex,
    pub close: Regex,
    pub comment: Option<Regex>,
    pub content_match: Option<Regex>,
    pub content_no_match: Option<Regex>,
}

impl PatternSet {
    pub fn new(name: Regex, open: Regex, close: Regex) -> Self {
        PatternSet {
            name,
            open,
            close,
            comment: None,
            content_match: None,
            content_no_match: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<Regex>) -> Self {
        self.comment = comment;
        self
    }

    /// Only blocks with at least one line matching `re` are printed.
    pub fn with_content_match(mut self, re: Option<Regex>) -> Self {
        self.content_match = re;
        self
    }

    /// Blocks with any line matching `re` are dropped.
    pub fn with_content_no_match(mut self, re: Option<Regex>) -> Self {
        self.content_no_match = re;
        self
    }

    /// Patterns searched for while looking for a block name.
    pub(crate) fn name_phase(&self) -> [Option<&Regex>; 2] {
        [Some(&self.name), self.comment.as_ref()]
    }

    /// Patterns searched for while counting nesting inside a block.
    pub(crate) fn body_phase(&self) -> [Option<&Regex>; 3] {
        [Some(&self.open), Some(&self.close), self.comment.as_ref()]
    }
}
