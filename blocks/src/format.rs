use std::io::{self, Write};

use crate::block::{CurrentBlock, TokenKind};
use crate::options::ScanOptions;
use crate::pattern::PatternSet;
use crate::sink::Sinks;

/// Result of pushing a balanced block through the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    /// The block was selected (and printed unless quiet).
    Emitted,
    /// Dropped by a content filter or the skip count.
    Dropped,
    /// The block budget was already used up; nothing more will be printed.
    Exhausted,
}

/// Skip and block counts left. Shared by every input of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    skip: usize,
    remaining: Option<usize>,
}

enum Admit {
    Skip,
    Emit,
    Exhausted,
}

impl Budget {
    pub fn new(options: &ScanOptions) -> Self {
        Budget {
            skip: options.skip_count,
            remaining: options.block_count,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    fn admit(&mut self) -> Admit {
        if self.skip > 0 {
            self.skip -= 1;
            return Admit::Skip;
        }
        match &mut self.remaining {
            None => Admit::Emit,
            Some(0) => Admit::Exhausted,
            Some(n) => {
                *n -= 1;
                Admit::Emit
            }
        }
    }
}

/// True unless a content filter rejects the block.
pub fn passes_filters(block: &CurrentBlock, patterns: &PatternSet) -> bool {
    if let Some(re) = &patterns.content_match {
        if !block.any_line_matches(re) {
            return false;
        }
    }
    if let Some(re) = &patterns.content_no_match {
        if block.any_line_matches(re) {
            return false;
        }
    }
    true
}

/// Filter `block`, charge it against `budget`, and print it if selected.
///
/// `file_header` is printed as `<header>:` before the block when given; the
/// caller makes sure that happens once per file.
pub fn flush_block<W: Write, E: Write>(
    sinks: &mut Sinks<W, E>,
    block: &CurrentBlock,
    patterns: &PatternSet,
    options: &ScanOptions,
    budget: &mut Budget,
    file_header: Option<&str>,
) -> io::Result<Flush> {
    if !passes_filters(block, patterns) {
        return Ok(Flush::Dropped);
    }

    match budget.admit() {
        Admit::Skip => Ok(Flush::Dropped),
        Admit::Exhausted => Ok(Flush::Exhausted),
        Admit::Emit => {
            if !options.quiet {
                write_block(sinks, block, options, file_header)?;
            }
            Ok(Flush::Emitted)
        }
    }
}

/// Print a block with the marks, line numbers and trimming of `options`.
pub fn write_block<W: Write, E: Write>(
    sinks: &mut Sinks<W, E>,
    block: &CurrentBlock,
    options: &ScanOptions,
    file_header: Option<&str>,
) -> io::Result<()> {
    if let Some(header) = file_header {
        sinks.print_line(&format!("{header}:"))?;
    }
    if let Some(mark) = &options.mark_start {
        sinks.print_line(mark)?;
    }

    let lines = block.lines();
    let body = if options.ignore_top {
        // Everything through the first line with an open, and the last line.
        let first_open = lines
            .iter()
            .position(|line| line.kinds.contains(TokenKind::Open))
            .unwrap_or(lines.len());
        let start = first_open + 1;
        let end = lines.len().saturating_sub(1);
        lines.get(start..end).unwrap_or_default()
    } else {
        lines
    };

    for line in body {
        if options.line_numbers {
            sinks.print_str(&format!("{:>8} ", line.line_no))?;
        }
        sinks.print_line(&line.text)?;
    }

    if let Some(mark) = &options.mark_end {
        sinks.print_line(mark)?;
    }
    Ok(())
}
