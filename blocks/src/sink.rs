use std::io::{self, Write};

/// Where block output and diagnostics go.
pub struct Sinks<W, E> {
    out: W,
    err: E,
}

impl<W: Write, E: Write> Sinks<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Sinks { out, err }
    }

    /// Write `s` and a newline to the output.
    pub fn print_line(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())?;
        self.out.write_all(b"\n")
    }

    /// Write `s` to the output as is.
    pub fn print_str(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    /// Write `s` and a newline to the error output.
    pub fn print_error(&mut self, s: &str) -> io::Result<()> {
        self.err.write_all(s.as_bytes())?;
        self.err.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }
}
