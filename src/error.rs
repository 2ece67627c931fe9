use thiserror::Error;

/// Package-manager failures. Reported to the user, never fatal.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Could not run the package manager: {0}.")]
    Spawn(#[from] std::io::Error),
    #[error("Error refreshing package lists. Return code: {code}.")]
    Update { code: i32 },
    #[error("Error installing '{package}'. Return code: {code}.")]
    Install { package: String, code: i32 },
}
