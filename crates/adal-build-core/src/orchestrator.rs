//! Sequential, dependency-aware runner for the build matrix.
//!
//! Targets run strictly in declaration order. Each target first checks the
//! outcomes already recorded for its dependencies, then runs its operations
//! through the executor for its platform, stopping at the first failure.
//! Every target gets exactly one [`Outcome`]; the run's exit code is `0` only
//! when all of them succeeded.

use crate::clean::Cleaner;
use crate::executor::{BuildExecutor, Executors};
use crate::report::Reporter;
use crate::target::{Outcome, Target};
use std::collections::HashMap;

/// Exit code recorded for an operation whose command could not be started.
pub const EXIT_SPAWN_FAILED: i32 = 127;

// ---------------------------------------------------------------------------
// Dependency checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The dependency has no outcome yet (unknown, or declared later).
    NotBuilt,
    /// The dependency failed or was itself skipped.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCheck {
    Satisfied,
    Unsatisfied {
        dependency: String,
        reason: SkipReason,
    },
}

/// Check `target`'s dependencies against the outcomes recorded so far.
/// The first unsatisfied dependency, in declaration order, is reported.
pub fn check_dependencies(target: &Target, outcomes: &HashMap<String, Outcome>) -> DependencyCheck {
    for dependency in &target.dependencies {
        let reason = match outcomes.get(dependency) {
            None => SkipReason::NotBuilt,
            Some(Outcome::Succeeded) => continue,
            Some(_) => SkipReason::Failed,
        };
        return DependencyCheck::Unsatisfied {
            dependency: dependency.clone(),
            reason,
        };
    }
    DependencyCheck::Satisfied
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Outcomes of a single run, in target declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    outcomes: Vec<(String, Outcome)>,
}

impl RunReport {
    pub fn outcomes(&self) -> &[(String, Outcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| *o == Outcome::Succeeded)
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    fn record(&mut self, name: &str, outcome: Outcome) {
        self.outcomes.push((name.to_string(), outcome));
    }
}

impl FromIterator<(String, Outcome)> for RunReport {
    fn from_iter<I: IntoIterator<Item = (String, Outcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    executors: Executors,
    cleaner: Box<dyn Cleaner>,
}

impl Orchestrator {
    pub fn new(executors: Executors, cleaner: Box<dyn Cleaner>) -> Self {
        Self { executors, cleaner }
    }

    /// Run every target in order and return their outcomes.
    ///
    /// When `clean` is set the cleaner runs once before the first target. A
    /// cleaning failure is logged and the run continues.
    pub fn run(&mut self, targets: &[Target], clean: bool, reporter: &mut dyn Reporter) -> RunReport {
        if clean {
            match self.cleaner.clean() {
                Ok(removed) => tracing::debug!(removed, "cleaned derived data"),
                Err(e) => tracing::warn!("failed to clean derived data: {e}"),
            }
        }

        let mut status: HashMap<String, Outcome> = HashMap::new();
        let mut report = RunReport::default();

        for target in targets {
            let outcome = match check_dependencies(target, &status) {
                DependencyCheck::Unsatisfied { dependency, reason } => {
                    reporter.target_skipped(target, &dependency, reason);
                    Outcome::Skipped
                }
                DependencyCheck::Satisfied => {
                    let executor = self.executors.for_platform(target.platform);
                    let outcome = run_operations(executor, target, reporter);
                    reporter.target_finished(target, outcome);
                    outcome
                }
            };
            status.insert(target.name.clone(), outcome);
            report.record(&target.name, outcome);
        }

        reporter.summary(&report);
        report
    }
}

/// Run a target's operations until one fails.
fn run_operations(
    executor: &mut dyn BuildExecutor,
    target: &Target,
    reporter: &mut dyn Reporter,
) -> Outcome {
    for operation in &target.operations {
        reporter.operation_started(target, operation);
        let exit_code = match executor.execute(target, operation) {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(target = %target.name, operation = %operation, "{e}");
                EXIT_SPAWN_FAILED
            }
        };
        reporter.operation_finished(target, operation, exit_code);

        // Later operations (test after build) cannot pass once one has failed.
        if exit_code != 0 {
            return Outcome::Failed;
        }
    }
    Outcome::Succeeded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
