//! Exit codes for the operational surface.

/// Process exit codes: callers script against these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliExitCode {
    /// Clean run.
    Success = 0,
    /// The operation finished but reported warnings (degraded run, orphaned
    /// relationship, failed validation check).
    Warnings = 1,
    /// Hard failure: configuration, storage, or transaction error.
    Failure = 2,
}

impl CliExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}
