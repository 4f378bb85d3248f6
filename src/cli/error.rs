//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Application(app) => application_exit_code(app),
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Write { .. } => exitcode::CANTCREAT,
                InfraError::Encode(_) => exitcode::SOFTWARE,
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(DomainError::Syntax { .. } | DomainError::Shape { .. }) => {
            exitcode::DATAERR
        }
        ApplicationError::Domain(DomainError::Include { .. }) => exitcode::NOINPUT,
        ApplicationError::Io { .. } if e.is_not_found() => exitcode::NOINPUT,
        ApplicationError::Io { .. } if e.is_permission_denied() => exitcode::NOPERM,
        ApplicationError::Io { .. } => exitcode::IOERR,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => exitcode::SOFTWARE,
    }
}
