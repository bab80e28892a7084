use std::io::{self, BufRead};

use regex::Regex;

/// Line source with a forward-only match position inside the current line.
///
/// Searches only look at the part of the line from the cursor onward. A
/// search never moves the cursor by itself; [`LineCursor::commit_past_match`]
/// and [`LineCursor::anchor_at_match`] do.
pub struct LineCursor<R> {
    input: R,
    buf: Vec<u8>,
    line: String,
    /// Byte offset into `line` where the next search starts.
    offset: usize,
    line_no: usize,
    has_input: bool,
    /// Absolute start of the most recent successful search.
    last_match: Option<usize>,
    /// Set when a match at the very end of the line was committed.
    exhausted: bool,
}

impl<R: BufRead> LineCursor<R> {
    /// A cursor with no line loaded yet.
    pub fn new(input: R) -> Self {
        LineCursor {
            input,
            buf: Vec::new(),
            line: String::new(),
            offset: 0,
            line_no: 0,
            has_input: false,
            last_match: None,
            exhausted: false,
        }
    }

    /// Start over on a new input.
    pub fn reset(&mut self, input: R) {
        self.input = input;
        self.line.clear();
        self.offset = 0;
        self.line_no = 0;
        self.has_input = false;
        self.last_match = None;
        self.exhausted = false;
    }

    /// Load the next line. Returns false at end of input, in which case the
    /// line number and position stay where they were.
    pub fn load_next_line(&mut self) -> io::Result<bool> {
        self.buf.clear();
        let read = self.input.read_until(b'\n', &mut self.buf)?;
        self.last_match = None;
        if read == 0 {
            self.has_input = false;
            return Ok(false);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        self.line = String::from_utf8_lossy(&self.buf).into_owned();
        self.line_no += 1;
        self.offset = 0;
        self.exhausted = false;
        self.has_input = true;
        Ok(true)
    }

    /// Index of the pattern matching earliest in the rest of the line.
    ///
    /// `None` entries are skipped. When two patterns match at the same
    /// offset the lower index wins. Returns `None` if nothing matches or no
    /// line is loaded.
    pub fn find_earliest(&mut self, patterns: &[Option<&Regex>]) -> Option<usize> {
        self.last_match = None;
        if !self.has_input || self.exhausted {
            return None;
        }

        let rest = &self.line[self.offset..];
        let mut best: Option<(usize, usize)> = None;
        for (index, re) in patterns.iter().enumerate() {
            let Some(re) = re else { continue };
            if let Some(m) = re.find(rest) {
                if best.is_none_or(|(_, start)| m.start() < start) {
                    best = Some((index, m.start()));
                }
            }
        }

        let (index, start) = best?;
        self.last_match = Some(self.offset + start);
        Some(index)
    }

    /// Move the cursor one character past the start of the last match.
    ///
    /// Not past its end: back to back single character tokens like `}}` are
    /// found one per search, and a later search may land inside the tail of
    /// a longer token.
    pub fn commit_past_match(&mut self) {
        let Some(start) = self.last_match.take() else {
            return;
        };
        match self.line[start..].chars().next() {
            Some(c) => self.offset = start + c.len_utf8(),
            None => {
                self.offset = self.line.len();
                self.exhausted = true;
            }
        }
    }

    /// Move the cursor to the start of the last match, leaving the match
    /// itself to be searched again.
    pub fn anchor_at_match(&mut self) {
        if let Some(start) = self.last_match {
            self.offset = start;
        }
    }

    pub fn has_input(&self) -> bool {
        self.has_input
    }

    /// The current line. After end of input this is still the last line read.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Cursor offset within the current line.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// 1-based number of the current line, 0 before the first line.
    pub fn line_number(&self) -> usize {
        self.line_no
    }
}
