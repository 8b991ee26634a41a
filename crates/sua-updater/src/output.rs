//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use sua_update::{Notifier, Progress, ProgressSink, Severity};

/// Resolution of the determinate bar
const BAR_LENGTH: u64 = 1000;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Progress display on the foreground task
///
/// Switches between a spinner for work of unknown size and a bar for
/// fractional progress.
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Handle for printing above the bar
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for TerminalProgress {
    fn on_status(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn on_progress(&self, progress: Progress) {
        match progress {
            Progress::Fraction(fraction) => {
                if self.bar.length() != Some(BAR_LENGTH) {
                    self.bar.set_length(BAR_LENGTH);
                    self.bar.set_style(bar_style());
                }
                let position = (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64;
                self.bar.set_position(position);
            }
            Progress::Indeterminate => {
                if self.bar.length().is_some() {
                    self.bar.unset_length();
                    self.bar.set_position(0);
                    self.bar.set_style(spinner_style());
                }
            }
        }
    }
}

/// Prints notices above the progress display
pub struct TerminalNotifier {
    bar: ProgressBar,
    quiet: bool,
}

impl TerminalNotifier {
    pub fn new(bar: ProgressBar, quiet: bool) -> Self {
        Self { bar, quiet }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        if self.quiet && severity != Severity::Error {
            return;
        }

        self.bar.suspend(|| {
            let heading = format!("{}: {}", title, first_line(message));
            match severity {
                Severity::Info => success(&heading),
                Severity::Warning => warning(&heading),
                Severity::Error => error(&heading),
            }
            for line in message.lines().skip(1).filter(|l| !l.trim().is_empty()) {
                println!("  {}", line);
            }
        });
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("one\ntwo"), "one");
        assert_eq!(first_line(""), "");
    }

    #[test]
    fn test_progress_switches_between_bar_and_spinner() {
        let progress = TerminalProgress::new(true);

        progress.on_progress(Progress::Fraction(0.5));
        assert_eq!(progress.bar.length(), Some(BAR_LENGTH));
        assert_eq!(progress.bar.position(), BAR_LENGTH / 2);

        progress.on_progress(Progress::Fraction(1.0));
        assert_eq!(progress.bar.position(), BAR_LENGTH);

        progress.on_progress(Progress::Indeterminate);
        assert_eq!(progress.bar.length(), None);
    }

    #[test]
    fn test_status_sets_message() {
        let progress = TerminalProgress::new(true);
        progress.on_status("Downloading...");
        assert_eq!(progress.bar.message(), "Downloading...");
    }
}
