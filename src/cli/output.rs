//! Colored terminal output for task progress.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, Write};

/// Writes task progress to the terminal.
///
/// Operator-facing messages go through here; diagnostics go to `log`.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager.
    ///
    /// `quiet` suppresses everything except warnings and errors.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    fn write(&self, stderr: bool, color: Option<Color>, bold: bool, message: &str) -> io::Result<()> {
        let mut stream = if stderr {
            StandardStream::stderr(ColorChoice::Auto)
        } else {
            StandardStream::stdout(ColorChoice::Auto)
        };
        stream.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stream, "{message}")?;
        stream.reset()?;
        writeln!(stream)
    }

    /// Section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(false, Some(Color::Cyan), true, &format!("==> {title}"))
    }

    /// Plain progress line.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(false, None, false, message)
    }

    /// Success line.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(false, Some(Color::Green), false, message)
    }

    /// Warning line, shown even when quiet.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.write(true, Some(Color::Yellow), true, &format!("WARN: {message}"))
    }

    /// Prominent block of text the operator has to read.
    pub fn highlight(&self, message: &str) -> io::Result<()> {
        self.write(false, Some(Color::Magenta), true, message)
    }

    /// Echo of an external command about to run.
    pub fn command(&self, command_line: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(false, None, true, command_line)
    }

    /// Detail line shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.quiet || !self.verbose {
            return Ok(());
        }
        self.write(false, Some(Color::Blue), false, message)
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new(true, false)
    }
}
