/*!
Human-readable console report for each check
*/

use std::io::{self, Write};
use std::time::Duration;

use crate::core::{
    config::TerminalFormat,
    diff_engine::{CheckOutcome, UnfollowerReport},
};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

pub struct TerminalReporter<W: Write> {
    format: TerminalFormat,
    out: W,
}

impl TerminalReporter<io::Stdout> {
    pub fn stdout(format: TerminalFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> TerminalReporter<W> {
    pub fn new(format: TerminalFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        match self.format {
            TerminalFormat::Plain => text.to_string(),
            TerminalFormat::Colored => format!("{color}{text}{RESET}"),
        }
    }

    pub fn report(&mut self, outcome: &CheckOutcome) -> io::Result<()> {
        match outcome {
            CheckOutcome::Completed(report) => self.report_completed(report),
            CheckOutcome::FetchFailed {
                previous_count,
                error,
            } => {
                let line = self.paint(
                    YELLOW,
                    &format!("⚠️ Could not fetch followers: {error}"),
                );
                writeln!(self.out, "\n{line}")?;
                writeln!(
                    self.out,
                    "Keeping the previous snapshot of {previous_count} followers; nothing was saved."
                )?;
                self.out.flush()
            }
        }
    }

    fn report_completed(&mut self, report: &UnfollowerReport) -> io::Result<()> {
        let heading = self.paint(CYAN, "📊 Follower Analysis:");
        writeln!(self.out, "\n{heading}")?;
        writeln!(self.out, "Current followers: {}", report.current_count)?;
        writeln!(self.out, "Previous followers: {}", report.previous_count)?;

        if report.first_run {
            let line = self.paint(
                GREEN,
                &format!(
                    "📥 First check, saved a baseline of {} followers.",
                    report.current_count
                ),
            );
            writeln!(self.out, "\n{line}")?;
        } else if report.unfollowers.is_empty() {
            let line = self.paint(GREEN, "✅ No unfollowers detected.");
            writeln!(self.out, "\n{line}")?;
        } else {
            let line = self.paint(
                RED,
                &format!("🚨 {} users unfollowed you:", report.unfollowers.len()),
            );
            writeln!(self.out, "\n{line}")?;
            for username in &report.unfollowers {
                writeln!(self.out, " • @{username}")?;
            }
        }

        if !report.new_followers.is_empty() {
            writeln!(self.out, "✨ New followers: {}", report.new_followers.len())?;
        }

        writeln!(self.out, "\n💾 Data saved to {}", report.saved_to.display())?;
        self.out.flush()
    }

    pub fn waiting(&mut self, interval: Duration) -> io::Result<()> {
        writeln!(
            self.out,
            "\n⏳ Waiting {} before next check...",
            describe_interval(interval)
        )?;
        self.out.flush()
    }
}

/// "5 minutes", "1 minute", "90 seconds"
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    let (amount, unit) = if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}
