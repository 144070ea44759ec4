use thiserror::Error;

use crate::platform::PlatformError;

/// Error taxonomy for everything a handler can fail with. The first two are
/// user-visible rejections that never mutate state and are not logged as
/// errors; platform failures are operational. Completion-service failures
/// never reach here: the AI proxy answers them with a fallback reply.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Platform call failed: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        Error::Precondition(msg.into())
    }

    pub fn denied<S: Into<String>>(msg: S) -> Self {
        Error::PermissionDenied(msg.into())
    }

    /// What the offending user sees. Platform and internal failures are
    /// collapsed into a generic notice; the details stay in the logs.
    pub fn user_notice(&self) -> String {
        match self {
            Error::PermissionDenied(msg) | Error::Precondition(msg) => msg.clone(),
            Error::Platform(_) => {
                "Action failed — check that the bot has the required admin permissions.".to_string()
            }
        }
    }
}
