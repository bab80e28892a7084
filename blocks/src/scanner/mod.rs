mod phases;

pub use phases::{BodyOutcome, Delimiter};

use std::io::{BufRead, Write};

use crate::TRACE_TARGET;
use crate::block::{BlockLine, CurrentBlock, TokenKind, TokenKinds};
use crate::cursor::LineCursor;
use crate::error::BlocksError;
use crate::format::{self, Budget, Flush};
use crate::options::ScanOptions;
use crate::pattern::PatternSet;
use crate::report::{self, NestingError, Reported};
use crate::sink::Sinks;

/// Outcome of one [`BlockScanner::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// At least one balanced block got through the filters.
    pub matched: bool,
    /// A nesting error was reported in fatal mode; the scan stopped there.
    pub fatal: bool,
}

/// Finds named, properly nested blocks in a line stream.
///
/// One scanner is used for every input of a run: [`BlockScanner::reset`]
/// moves it to the next input while the skip and block budgets carry over.
pub struct BlockScanner<'p, R, W, E> {
    cursor: LineCursor<R>,
    sinks: Sinks<W, E>,
    patterns: &'p PatternSet,
    options: ScanOptions,
    budget: Budget,
    block: CurrentBlock,
    /// The cursor's current line is already in `block`.
    line_recorded: bool,
    file: Option<String>,
    header_pending: bool,
}

impl<'p, R: BufRead, W: Write, E: Write> BlockScanner<'p, R, W, E> {
    pub fn new(
        input: R,
        sinks: Sinks<W, E>,
        patterns: &'p PatternSet,
        options: ScanOptions,
    ) -> Self {
        BlockScanner {
            cursor: LineCursor::new(input),
            sinks,
            budget: Budget::new(&options),
            patterns,
            options,
            block: CurrentBlock::new(),
            line_recorded: false,
            file: None,
            header_pending: false,
        }
    }

    /// Switch to a new input.
    pub fn reset(&mut self, input: R) {
        self.cursor.reset(input);
        self.block.clear();
        self.line_recorded = false;
    }

    /// Scan the current input to its end, printing selected blocks and
    /// reporting nesting errors. `file` labels the input in diagnostics and
    /// in the per-file header.
    pub fn scan(&mut self, file: Option<&str>) -> Result<ScanSummary, BlocksError> {
        self.trace("call  ", "scan", None);

        self.file = file.map(str::to_string);
        self.header_pending = self.options.print_file_names;
        self.block.clear();
        self.line_recorded = false;

        let mut summary = ScanSummary::default();
        if self.budget.is_exhausted() {
            self.trace("return", "scan", Some(0));
            return Ok(summary);
        }
        if !self.cursor.has_input() {
            self.next_line()?;
        }

        while self.seek_name()? {
            match self.scan_body()? {
                BodyOutcome::Balanced => match self.flush()? {
                    Flush::Emitted => summary.matched = true,
                    Flush::Dropped => {}
                    Flush::Exhausted => break,
                },
                BodyOutcome::PrematureClose | BodyOutcome::Unterminated => {
                    if self.report_nesting()? == Reported::Fatal {
                        summary.fatal = true;
                        break;
                    }
                }
            }

            if self.budget.is_exhausted() {
                break;
            }
        }

        self.sinks.flush()?;
        self.trace("return", "scan", Some(i64::from(summary.matched)));
        Ok(summary)
    }

    pub fn cursor(&self) -> &LineCursor<R> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut LineCursor<R> {
        &mut self.cursor
    }

    /// Lines of the block found last.
    pub fn block(&self) -> &CurrentBlock {
        &self.block
    }

    pub fn sinks_mut(&mut self) -> &mut Sinks<W, E> {
        &mut self.sinks
    }

    pub fn into_sinks(self) -> Sinks<W, E> {
        self.sinks
    }

    fn flush(&mut self) -> Result<Flush, BlocksError> {
        self.trace("call  ", "flush", None);

        let header = if self.header_pending {
            self.file.as_deref()
        } else {
            None
        };
        let flushed = format::flush_block(
            &mut self.sinks,
            &self.block,
            self.patterns,
            &self.options,
            &mut self.budget,
            header,
        )?;
        if flushed == Flush::Emitted {
            self.header_pending = false;
        }

        self.trace("return", "flush", Some(flushed as i64));
        Ok(flushed)
    }

    fn report_nesting(&mut self) -> Result<Reported, BlocksError> {
        self.trace("call  ", "report_nesting", None);

        let line = self.cursor.line_number();
        let error = NestingError {
            file: self.file.clone(),
            line,
            column: self.cursor.position(),
            first_line: self.block.first().map_or(line, |first| first.line_no),
            text: self
                .block
                .last()
                .map_or_else(|| self.cursor.line().to_string(), |last| last.text.clone()),
        };
        let reported = report::report(&mut self.sinks, &error, &self.options)?;

        self.trace("return", "report_nesting", None);
        Ok(reported)
    }

    /// Load the next line; the new line is not part of the block yet.
    fn next_line(&mut self) -> Result<bool, BlocksError> {
        self.line_recorded = false;
        let loaded = self.cursor.load_next_line()?;
        self.trace("return", "next_line", Some(i64::from(loaded)));
        Ok(loaded)
    }

    /// Add the current line to the block, or merge `kind` into it if it is
    /// already there.
    fn record(&mut self, kind: Option<TokenKind>) {
        if self.line_recorded {
            self.block.mark_last(kind);
            return;
        }
        self.block.push(BlockLine {
            text: self.cursor.line().to_string(),
            kinds: TokenKinds::from(kind),
            line_no: self.cursor.line_number(),
        });
        self.line_recorded = true;
    }

    fn trace(&self, action: &str, op: &str, val: Option<i64>) {
        if !log::log_enabled!(target: TRACE_TARGET, log::Level::Trace) {
            return;
        }
        let val = val.map(|v| format!(" val {v}")).unwrap_or_default();
        log::trace!(
            target: TRACE_TARGET,
            "{action} {op}(){val} line {} position {}",
            self.cursor.line_number(),
            self.cursor.position()
        );
    }
}
