//! Human-readable status lines for a build run.

use crate::orchestrator::{RunReport, SkipReason};
use crate::target::{Outcome, Target};
use std::io::{IsTerminal, Write};

/// Receives progress events from the orchestrator. Presentation only: the
/// outcome of a run never depends on what a reporter does.
pub trait Reporter {
    fn operation_started(&mut self, target: &Target, operation: &str);
    fn operation_finished(&mut self, target: &Target, operation: &str, exit_code: i32);
    fn target_skipped(&mut self, target: &Target, dependency: &str, reason: SkipReason);
    fn target_finished(&mut self, target: &Target, outcome: Outcome);
    fn summary(&mut self, report: &RunReport);
}

// ANSI styles
const HDR: &str = "\x1b[1m";
const OK: &str = "\x1b[32m\x1b[1m";
const FAIL: &str = "\x1b[31m\x1b[1m";
const SKIP: &str = "\x1b[96m\x1b[1m";
const END: &str = "\x1b[0m";

/// Writes coloured status lines to a terminal, or plain lines to anything else.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let color = out.is_terminal();
        Self { out, color }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, style: &str, text: &str) {
        // A closed stdout must not change the run's outcome.
        let _ = if self.color {
            writeln!(self.out, "{style}{text}{END}")
        } else {
            writeln!(self.out, "{text}")
        };
        let _ = self.out.flush();
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn operation_started(&mut self, target: &Target, operation: &str) {
        self.line(HDR, &format!("Beginning {} [{operation}]", target.name));
    }

    fn operation_finished(&mut self, target: &Target, operation: &str, exit_code: i32) {
        if exit_code == 0 {
            self.line(OK, &format!("{} [{operation}] Succeeded", target.name));
        } else {
            self.line(FAIL, &format!("{} [{operation}] Failed", target.name));
        }
    }

    fn target_skipped(&mut self, target: &Target, dependency: &str, reason: SkipReason) {
        let why = match reason {
            SkipReason::NotBuilt => "not built yet",
            SkipReason::Failed => "failed",
        };
        self.line(
            SKIP,
            &format!("Skipping {} dependency {dependency} {why}.", target.name),
        );
    }

    fn target_finished(&mut self, target: &Target, outcome: Outcome) {
        let style = if outcome == Outcome::Succeeded { OK } else { FAIL };
        self.line(style, &format!("{} {outcome}", target.name));
    }

    fn summary(&mut self, report: &RunReport) {
        let _ = writeln!(self.out);
        for (name, outcome) in report.outcomes() {
            match outcome {
                Outcome::Failed => self.line(FAIL, &format!("{name} failed.")),
                Outcome::Skipped => self.line(&format!("{SKIP}\x1b[93m"), &format!("{name} skipped.")),
                Outcome::Succeeded => self.line(&format!("{OK}\x1b[92m"), &format!("{name} succeeded.")),
            }
        }
    }
}
