//! Build-system collaborator interface
//!
//! Everything the orchestrator asks of Buildroot goes through
//! [`BuildSystem`]. Running a target and asking whether a target exists are
//! separate queries so either can be substituted in tests.

use crate::error::BuildError;

/// The external make-driven build system
pub trait BuildSystem {
    /// Run `target` to completion, failing on a non-zero exit status
    ///
    /// `step` names the orchestration step for error reporting.
    fn invoke(&self, step: &str, target: &str) -> Result<(), BuildError>;

    /// Whether `target` is known to the build system, without building it
    fn try_resolve_target(&self, target: &str) -> bool;
}

/// Result of a step that tolerates failure
#[derive(Debug)]
pub enum StepOutcome {
    /// The command succeeded
    Completed,
    /// The command failed and execution continued
    Recovered(BuildError),
}

impl StepOutcome {
    /// Whether the step failed and was recovered
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered(_))
    }
}

/// Run a step whose failure is logged but not fatal
pub fn best_effort(build: &dyn BuildSystem, step: &str, target: &str) -> StepOutcome {
    match build.invoke(step, target) {
        Ok(()) => StepOutcome::Completed,
        Err(e) => {
            tracing::warn!("Continuing after best-effort step failed: {e}");
            StepOutcome::Recovered(e)
        }
    }
}
