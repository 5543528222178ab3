use std::fmt;

use thiserror::Error;

use super::window::InvalidWindow;

pub(crate) const UNMATCHED_HINT: &str =
    "Make sure that the video file listed above is matched by Shoko";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Plex,
    Shoko,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plex => f.write_str("Plex"),
            Self::Shoko => f.write_str("Shoko"),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SyncError {
    #[error("Invalid Argument (Relative Date): {0}")]
    InvalidWindow(#[from] InvalidWindow),

    #[error("Configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("{service} Credentials Invalid or Server Offline: {source:#}")]
    Auth {
        service: Service,
        source: anyhow::Error,
    },

    #[error("Server Name Not Found: {server}: {source:#}")]
    ServerNotFound {
        server: String,
        source: anyhow::Error,
    },

    #[error("User {username}: {source:#}")]
    UserResolution {
        username: String,
        source: anyhow::Error,
    },

    #[error("Library {library} for {account}: {source:#}")]
    LibraryResolution {
        library: String,
        account: String,
        source: anyhow::Error,
    },

    #[error("Episode search in {library} for {account}: {source:#}")]
    LibrarySearch {
        library: String,
        account: String,
        source: anyhow::Error,
    },

    #[error("{path}: {source:#}. {}", UNMATCHED_HINT)]
    Relay { path: String, source: anyhow::Error },
}

impl SyncError {
    pub(crate) fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidWindow(_)
            | Self::Config(_)
            | Self::Auth { .. }
            | Self::ServerNotFound { .. } => true,
            Self::UserResolution { .. }
            | Self::LibraryResolution { .. }
            | Self::LibrarySearch { .. }
            | Self::Relay { .. } => false,
        }
    }
}
