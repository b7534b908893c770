//! Error types for frame-graph scheduling.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No unscheduled pass had all its pre-conditions satisfied, with some
    /// passes still left to run. Carries one diagnostic line per stuck
    /// pass naming its unmet `(resource, state)` pre-conditions.
    #[error("frame graph stalled with {remaining} pass(es) unscheduled: {diagnostics:?}")]
    Stalled { remaining: usize, diagnostics: Vec<String> },

    /// A pass was submitted twice under the same name in one frame.
    #[error("duplicate pass name: {0}")]
    DuplicatePass(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
