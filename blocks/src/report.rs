use std::io::{self, Write};

use crate::options::ScanOptions;
use crate::sink::Sinks;

/// A block whose opens and closes don't pair up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingError {
    pub file: Option<String>,
    /// Line and column of the cursor when the problem was found.
    pub line: usize,
    pub column: usize,
    /// Line where the block's name was found.
    pub first_line: usize,
    /// Text of the line where the problem was found.
    pub text: String,
}

/// What the scan should do after an error was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reported {
    Recovered,
    Fatal,
}

impl NestingError {
    /// The three diagnostic lines: location, offending line, caret.
    pub fn render(&self, label: &str) -> [String; 3] {
        let prefix = format!("{label} error: ");
        let file = self
            .file
            .as_deref()
            .map(|f| format!("file {f}, "))
            .unwrap_or_default();
        let caret_at = self.column.saturating_sub(1);

        [
            format!(
                "{prefix}{file}line {}, col {}: improper nesting from line {}",
                self.line, self.column, self.first_line
            ),
            format!("{prefix}{}", self.text),
            format!("{prefix}{}^", " ".repeat(caret_at)),
        ]
    }
}

/// Print `error` to the error sink.
pub fn report<W: Write, E: Write>(
    sinks: &mut Sinks<W, E>,
    error: &NestingError,
    options: &ScanOptions,
) -> io::Result<Reported> {
    for line in error.render(&options.error_label) {
        sinks.print_error(&line)?;
    }

    Ok(if options.fatal_error {
        Reported::Fatal
    } else {
        Reported::Recovered
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(file: Option<&str>, column: usize) -> NestingError {
        NestingError {
            file: file.map(str::to_string),
            line: 3,
            column,
            first_line: 1,
            text: "  } }".to_string(),
        }
    }

    #[test]
    fn render_with_file() {
        let [location, text, caret] = sample(Some("a.c"), 5).render("blocks");
        assert_eq!(
            location,
            "blocks error: file a.c, line 3, col 5: improper nesting from line 1"
        );
        assert_eq!(text, "blocks error:   } }");
        assert_eq!(caret, "blocks error:     ^");
    }

    #[test]
    fn render_without_file_and_column_zero() {
        let [location, _, caret] = sample(None, 0).render("blocks");
        assert_eq!(
            location,
            "blocks error: line 3, col 0: improper nesting from line 1"
        );
        assert_eq!(caret, "blocks error: ^");
    }

    #[test]
    fn fatal_mode_asks_to_stop() {
        let mut sinks = Sinks::new(Vec::new(), Vec::new());
        let options = ScanOptions {
            fatal_error: true,
            ..ScanOptions::default()
        };
        let reported = report(&mut sinks, &sample(None, 1), &options).unwrap();
        assert_eq!(reported, Reported::Fatal);

        let (out, err) = sinks.into_inner();
        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap().lines().count(), 3);
    }
}
