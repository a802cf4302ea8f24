//! Run-level errors and process exit codes

use thiserror::Error;

use crate::selector::QueryError;

/// Errors that end a run with a dedicated exit code
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("candidate selection failed: {0}")]
    Query(#[from] QueryError),

    #[error("interrupted; working trees were removed and a partial report was printed")]
    Interrupted,
}

impl AuditError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AuditError::Query(_) => 2,
            AuditError::Interrupted => 130,
        }
    }
}

/// Exit code for an error returned from the CLI, 1 unless an [`AuditError`]
/// is somewhere in its chain
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AuditError>())
        .map_or(1, AuditError::exit_code)
}
