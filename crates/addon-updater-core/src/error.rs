use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::version::VersionParseError;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{context} failed with HTTP {status}{body_snippet}")]
    HttpStatus {
        context: &'static str,
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse version descriptor: {0}")]
    Parse(#[from] VersionParseError),
    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("{0}")]
    Invalid(String),
    #[error("no update is available to download")]
    NoUpdate,
}

impl UpdateError {
    pub(crate) fn network(context: &'static str, source: reqwest::Error) -> Self {
        Self::Network { context, source }
    }

    pub(crate) fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the failure came from the transport or the remote server.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("could not resolve add-on installation path: {0}")]
    PathUnavailable(String),
    #[error("failed to launch reload command '{program}': {source}")]
    ReloadSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("reload command '{program}' exited with {status}{stderr}")]
    ReloadFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}
