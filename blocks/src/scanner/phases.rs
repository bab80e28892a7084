use std::io::{BufRead, Write};

use super::BlockScanner;
use crate::block::TokenKind;
use crate::error::BlocksError;

/// How the body of a block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOutcome {
    /// Every open was closed, or input ended before any open.
    Balanced,
    /// A close showed up with no open left to match it.
    PrematureClose,
    /// Input ended with opens still pending.
    Unterminated,
}

/// A nesting token found inside a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Open,
    Close,
}

/// Token kinds in the order of `PatternSet::body_phase`.
const BODY_KINDS: [TokenKind; 3] = [TokenKind::Open, TokenKind::Close, TokenKind::Comment];

/// Index of the comment pattern in `PatternSet::name_phase`.
const NAME_PHASE_COMMENT: usize = 1;

impl<R: BufRead, W: Write, E: Write> BlockScanner<'_, R, W, E> {
    /// Look for the next block name, starting at the cursor.
    ///
    /// Starts a fresh block. On success the name's line is the block's first
    /// line and the cursor sits at the start of the name, so the body search
    /// sees the name again. A comment hides the rest of its line.
    pub fn seek_name(&mut self) -> Result<bool, BlocksError> {
        self.trace("call  ", "seek_name", None);

        self.block.clear();
        self.line_recorded = false;

        let patterns = self.patterns;
        let mut found = false;
        while self.cursor.has_input() {
            match self.cursor.find_earliest(&patterns.name_phase()) {
                Some(NAME_PHASE_COMMENT) | None => {
                    self.next_line()?;
                }
                Some(_) => {
                    self.cursor.anchor_at_match();
                    self.record(Some(TokenKind::Name));
                    found = true;
                    break;
                }
            }
        }

        self.trace("return", "seek_name", Some(i64::from(found)));
        Ok(found)
    }

    /// Find the next open or close, moving past it.
    ///
    /// Every line looked at is recorded in the block. A comment is recorded
    /// too, and nothing after it on the same line is seen. Returns `None`
    /// at end of input.
    pub fn next_delimiter(&mut self) -> Result<Option<Delimiter>, BlocksError> {
        self.trace("call  ", "next_delimiter", None);

        let patterns = self.patterns;
        let mut found = None;
        while self.cursor.has_input() {
            let kind = self
                .cursor
                .find_earliest(&patterns.body_phase())
                .map(|index| BODY_KINDS[index]);
            self.record(kind);

            if let Some(kind) = kind {
                self.cursor.commit_past_match();
                found = match kind {
                    TokenKind::Open => Some(Delimiter::Open),
                    TokenKind::Close => Some(Delimiter::Close),
                    _ => None,
                };
                if found.is_some() {
                    break;
                }
            }

            self.next_line()?;
        }

        let val = match found {
            Some(Delimiter::Open) => 1,
            Some(Delimiter::Close) => 2,
            None => 0,
        };
        self.trace("return", "next_delimiter", Some(val));
        Ok(found)
    }

    /// Count opens and closes from the cursor until the block's nesting
    /// resolves one way or another.
    pub fn scan_body(&mut self) -> Result<BodyOutcome, BlocksError> {
        self.trace("call  ", "scan_body", None);

        let mut depth = 0usize;
        let outcome = loop {
            match self.next_delimiter()? {
                Some(Delimiter::Open) => depth += 1,
                Some(Delimiter::Close) => {
                    if depth == 0 {
                        break BodyOutcome::PrematureClose;
                    }
                    depth -= 1;
                    if depth == 0 {
                        break BodyOutcome::Balanced;
                    }
                }
                None if depth == 0 => break BodyOutcome::Balanced,
                None => break BodyOutcome::Unterminated,
            }
        };

        self.trace("return", "scan_body", Some(outcome as i64));
        Ok(outcome)
    }
}
