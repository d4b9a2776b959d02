use std::time::Duration;

use serde::{Deserialize, Serialize};

const DAY_SECS: u64 = 24 * 60 * 60;

/// How often the periodic check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInterval {
    /// Development setting for exercising the update loop.
    #[serde(rename = "5s")]
    FiveSeconds,
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl CheckInterval {
    pub const ALL: [Self; 4] = [Self::FiveSeconds, Self::Daily, Self::Weekly, Self::Monthly];

    #[must_use]
    pub const fn as_secs(self) -> u64 {
        match self {
            Self::FiveSeconds => 5,
            Self::Daily => DAY_SECS,
            Self::Weekly => 7 * DAY_SECS,
            Self::Monthly => 30 * DAY_SECS,
        }
    }

    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FiveSeconds => "Every 5 seconds",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for CheckInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePreferences {
    #[serde(default)]
    pub auto_update: bool,

    #[serde(default)]
    pub check_interval: CheckInterval,
}
