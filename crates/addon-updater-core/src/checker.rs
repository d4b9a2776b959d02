//! The update checker: version polling, state tracking and self-replacement.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::download::{download_and_persist, fetch_text, redact_url};
use crate::error::UpdateError;
use crate::host::AddonHost;
use crate::preferences::UpdatePreferences;
use crate::version::Version;

/// Remote resources the checker reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEndpoints {
    /// Plain-text version descriptor, e.g. `1.4.0`.
    pub version_url: String,
    /// Full replacement source for the add-on.
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    UpToDate,
    UpdateAvailable { online: Version },
    Downloading { online: Version },
}

impl UpdateState {
    /// Version waiting to be installed, if any.
    #[must_use]
    pub fn pending_version(self) -> Option<Version> {
        match self {
            Self::UpToDate => None,
            Self::UpdateAvailable { online } | Self::Downloading { online } => Some(online),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    UpdateAvailable(Version),
    Updated { from: Version, to: Version },
    UpdateFailed { online: Version, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// A user-facing report of the most recent check or update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
            at: Utc::now(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&CheckOutcome> for StatusMessage {
    fn from(outcome: &CheckOutcome) -> Self {
        match outcome {
            CheckOutcome::UpToDate => Self::info("Add-on is up to date."),
            CheckOutcome::UpdateAvailable(online) => Self::info(format!(
                "New version available: {online}. Please update manually."
            )),
            CheckOutcome::Updated { from, to } => {
                Self::info(format!("Updated add-on from {from} to {to}."))
            }
            CheckOutcome::UpdateFailed { reason, .. } => {
                Self::error(format!("Failed to update add-on: {reason}"))
            }
        }
    }
}

pub struct UpdateChecker<H> {
    client: reqwest::Client,
    endpoints: UpdateEndpoints,
    current_version: Version,
    preferences: UpdatePreferences,
    state: UpdateState,
    last_status: Option<StatusMessage>,
    host: H,
}

impl<H: AddonHost> UpdateChecker<H> {
    /// A checker that starts up to date and has not checked yet.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        endpoints: UpdateEndpoints,
        current_version: Version,
        preferences: UpdatePreferences,
        host: H,
    ) -> Self {
        Self {
            client,
            endpoints,
            current_version,
            preferences,
            state: UpdateState::UpToDate,
            last_status: None,
            host,
        }
    }

    #[must_use]
    pub fn current_version(&self) -> Version {
        self.current_version
    }

    #[must_use]
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Whether the UI should offer a manual update action.
    #[must_use]
    pub fn update_available(&self) -> bool {
        matches!(self.state, UpdateState::UpdateAvailable { .. })
    }

    #[must_use]
    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.last_status.as_ref()
    }

    #[must_use]
    pub fn preferences(&self) -> UpdatePreferences {
        self.preferences
    }

    pub fn set_preferences(&mut self, preferences: UpdatePreferences) {
        self.preferences = preferences;
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Delay until the next periodic check.
    #[must_use]
    pub fn schedule_next_check(&self) -> Duration {
        self.preferences.check_interval.as_duration()
    }

    /// Fetch the version descriptor and compare it with the running version.
    ///
    /// With auto-update enabled a newer version is downloaded immediately; a
    /// failed download is reported in the outcome rather than as an error.
    ///
    /// # Errors
    /// Returns an error when the descriptor cannot be fetched or parsed. The
    /// update state is left unchanged in that case.
    pub async fn check_for_update(&mut self) -> Result<CheckOutcome, UpdateError> {
        let body = fetch_text(&self.client, &self.endpoints.version_url, "version check").await?;
        let online = Version::parse(&body)?;
        debug!(
            "Version descriptor at {} reports {online} (running {})",
            redact_url(&self.endpoints.version_url),
            self.current_version
        );

        if online <= self.current_version {
            self.state = UpdateState::UpToDate;
            return Ok(CheckOutcome::UpToDate);
        }

        info!("Add-on update available: {} -> {online}", self.current_version);
        self.state = UpdateState::UpdateAvailable { online };

        if !self.preferences.auto_update {
            return Ok(CheckOutcome::UpdateAvailable(online));
        }

        Ok(self.install_pending().await)
    }

    /// Download the pending version over the installed add-on and reload it.
    ///
    /// On success the downloaded version becomes the current version.
    ///
    /// # Errors
    /// Returns [`UpdateError::NoUpdate`] when no update is pending, or the
    /// download, write, or reload error. The update stays pending on failure.
    pub async fn download_and_replace(&mut self) -> Result<Version, UpdateError> {
        let UpdateState::UpdateAvailable { online } = self.state else {
            return Err(UpdateError::NoUpdate);
        };

        self.state = UpdateState::Downloading { online };
        match self.replace_and_reload().await {
            Ok(()) => {
                info!("Add-on updated from {} to {online}", self.current_version);
                self.current_version = online;
                self.state = UpdateState::UpToDate;
                Ok(online)
            }
            Err(error) => {
                self.state = UpdateState::UpdateAvailable { online };
                Err(error)
            }
        }
    }

    /// Timer entry point: run one check and turn the result into a status
    /// message. Never fails.
    pub async fn run_check(&mut self) -> StatusMessage {
        let status = match self.check_for_update().await {
            Ok(outcome) => StatusMessage::from(&outcome),
            Err(error) => StatusMessage::error(format!("Failed to check for update: {error}")),
        };
        self.record(status)
    }

    /// Manual "update now" action offered while an update is available.
    pub async fn manual_update(&mut self) -> StatusMessage {
        let status = match self.state {
            UpdateState::UpdateAvailable { .. } => {
                StatusMessage::from(&self.install_pending().await)
            }
            UpdateState::Downloading { .. } => {
                StatusMessage::info("An update is already in progress.")
            }
            UpdateState::UpToDate => StatusMessage::from(&CheckOutcome::UpToDate),
        };
        self.record(status)
    }

    async fn install_pending(&mut self) -> CheckOutcome {
        let from = self.current_version;
        match self.download_and_replace().await {
            Ok(to) => CheckOutcome::Updated { from, to },
            Err(error) => {
                let online = self.state.pending_version().unwrap_or(from);
                warn!("Add-on update to {online} failed: {error}");
                CheckOutcome::UpdateFailed {
                    online,
                    reason: error.to_string(),
                }
            }
        }
    }

    async fn replace_and_reload(&self) -> Result<(), UpdateError> {
        let dest = self.host.addon_path()?;
        download_and_persist(&self.client, &self.endpoints.source_url, &dest).await?;
        self.host.reload().await?;
        Ok(())
    }

    fn record(&mut self, status: StatusMessage) -> StatusMessage {
        if status.is_error() {
            error!("{status}");
        } else {
            info!("{status}");
        }
        self.last_status = Some(status.clone());
        status
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{
        CheckOutcome, StatusLevel, StatusMessage, UpdateChecker, UpdateEndpoints, UpdateState,
    };
    use crate::host::{AddonHost, CommandHost};
    use crate::preferences::UpdatePreferences;
    use crate::version::Version;

    #[test]
    fn status_messages_match_outcomes() {
        let up_to_date = StatusMessage::from(&CheckOutcome::UpToDate);
        assert_eq!(up_to_date.text, "Add-on is up to date.");
        assert_eq!(up_to_date.level, StatusLevel::Info);

        let available =
            StatusMessage::from(&CheckOutcome::UpdateAvailable(Version::new(1, 4, 0)));
        assert_eq!(
            available.text,
            "New version available: 1.4.0. Please update manually."
        );

        let updated = StatusMessage::from(&CheckOutcome::Updated {
            from: Version::new(1, 1, 0),
            to: Version::new(1, 4, 0),
        });
        assert_eq!(updated.text, "Updated add-on from 1.1.0 to 1.4.0.");

        let failed = StatusMessage::from(&CheckOutcome::UpdateFailed {
            online: Version::new(1, 4, 0),
            reason: "disk full".to_string(),
        });
        assert!(failed.is_error());
        assert_eq!(failed.text, "Failed to update add-on: disk full");
    }

    #[test]
    fn pending_version_tracks_state() {
        let online = Version::new(2, 0, 0);
        assert_eq!(UpdateState::UpToDate.pending_version(), None);
        assert_eq!(
            UpdateState::UpdateAvailable { online }.pending_version(),
            Some(online)
        );
        assert_eq!(
            UpdateState::Downloading { online }.pending_version(),
            Some(online)
        );
    }

    #[test]
    fn new_checker_starts_idle_and_exposes_its_host() {
        let addon_path = PathBuf::from("addons").join("addon_test.py");
        let checker = UpdateChecker::new(
            reqwest::Client::new(),
            UpdateEndpoints {
                version_url: "https://example.com/version.txt".to_string(),
                source_url: "https://example.com/addon.py".to_string(),
            },
            Version::new(1, 1, 0),
            UpdatePreferences::default(),
            CommandHost::new(Some(addon_path.clone()), None),
        );

        assert_eq!(checker.state(), UpdateState::UpToDate);
        assert!(!checker.update_available());
        assert!(checker.last_status().is_none());
        assert_eq!(checker.current_version(), Version::new(1, 1, 0));
        assert_eq!(
            checker.host().addon_path().expect("configured path should resolve"),
            addon_path
        );
    }
}
