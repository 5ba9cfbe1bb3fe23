//! Colored terminal output.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, Write};

/// Prints user-facing messages with color, honoring verbose/quiet flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager. `quiet` wins over `verbose`.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose: verbose && !quiet,
            quiet,
        }
    }

    /// Prints only in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.colored_line(Some(Color::Cyan), false, "  ", message)
    }

    /// Prints a warning unless quiet.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.colored_line(Some(Color::Yellow), true, "⚠ ", message)
    }

    /// Prints a success message unless quiet.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.colored_line(Some(Color::Green), true, "✓ ", message)
    }

    /// Prints a progress message unless quiet.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.colored_line(Some(Color::Blue), false, "→ ", message)
    }

    /// Prints a section header unless quiet.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        println!();
        self.colored_line(None, true, "", title)
    }

    /// Prints indented plain text unless quiet.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        for line in message.lines() {
            writeln!(stdout, "    {}", line)?;
        }
        Ok(())
    }

    /// Prints an error to stderr, always.
    pub fn error(&self, message: &str) -> io::Result<()> {
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stderr, "✗ ")?;
        stderr.reset()?;
        writeln!(stderr, "{}", message)
    }

    fn colored_line(&self, color: Option<Color>, bold: bool, prefix: &str, message: &str) -> io::Result<()> {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        stdout.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stdout, "{}", prefix)?;
        if color.is_none() {
            writeln!(stdout, "{}", message)?;
            return stdout.reset();
        }
        stdout.reset()?;
        writeln!(stdout, "{}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        let output = OutputManager::new(true, true);
        assert!(!output.verbose);
        assert!(output.verbose("hidden").is_ok());
    }
}
