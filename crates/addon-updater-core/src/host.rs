use std::path::PathBuf;

use async_trait::async_trait;
use log::{debug, info};

use crate::error::HostError;

/// The application the add-on is installed into.
///
/// The checker never touches the host's plugin registry directly: it asks the
/// host where the add-on lives and to reload it once new code is on disk.
#[async_trait]
pub trait AddonHost: Send + Sync {
    /// Installed location of the add-on's source file.
    ///
    /// # Errors
    /// Returns [`HostError::PathUnavailable`] when the host cannot say where
    /// the add-on is installed.
    fn addon_path(&self) -> Result<PathBuf, HostError>;

    /// Disable and re-enable the add-on so replaced code takes effect.
    ///
    /// # Errors
    /// Returns a [`HostError`] when the add-on could not be reloaded.
    async fn reload(&self) -> Result<(), HostError>;
}

/// Host adapter that reloads the add-on by running an external command.
#[derive(Debug, Clone)]
pub struct CommandHost {
    addon_path: Option<PathBuf>,
    reload_command: Option<Vec<String>>,
}

impl CommandHost {
    #[must_use]
    pub fn new(addon_path: Option<PathBuf>, reload_command: Option<Vec<String>>) -> Self {
        Self {
            addon_path,
            reload_command: reload_command.filter(|command| !command.is_empty()),
        }
    }
}

#[async_trait]
impl AddonHost for CommandHost {
    fn addon_path(&self) -> Result<PathBuf, HostError> {
        self.addon_path
            .clone()
            .ok_or_else(|| HostError::PathUnavailable("no add-on path configured".to_string()))
    }

    async fn reload(&self) -> Result<(), HostError> {
        let Some((program, args)) = self
            .reload_command
            .as_deref()
            .and_then(<[String]>::split_first)
        else {
            info!("No reload command configured; restart the host to load the new add-on");
            return Ok(());
        };

        debug!("Running reload command: {program} {}", args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| HostError::ReloadSpawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            info!("Add-on reloaded via '{program}'");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            Err(HostError::ReloadFailed {
                program: program.clone(),
                status: output.status,
                stderr: if stderr.is_empty() {
                    String::new()
                } else {
                    format!(": {stderr}")
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AddonHost, CommandHost};
    use crate::error::HostError;

    #[test]
    fn addon_path_requires_configuration() {
        let host = CommandHost::new(None, None);
        assert!(matches!(
            host.addon_path(),
            Err(HostError::PathUnavailable(_))
        ));

        let host = CommandHost::new(Some("/opt/addons/addon.py".into()), None);
        assert_eq!(
            host.addon_path().expect("configured path should resolve"),
            std::path::PathBuf::from("/opt/addons/addon.py")
        );
    }

    #[tokio::test]
    async fn reload_without_command_is_a_no_op() {
        let host = CommandHost::new(None, Some(Vec::new()));
        host.reload().await.expect("empty reload command should succeed");
    }

    #[tokio::test]
    async fn reload_reports_missing_program() {
        let host = CommandHost::new(
            None,
            Some(vec!["addon-updater-definitely-missing-binary".to_string()]),
        );
        assert!(matches!(
            host.reload().await,
            Err(HostError::ReloadSpawn { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reload_maps_exit_status() {
        let ok = CommandHost::new(None, Some(vec!["true".to_string()]));
        ok.reload().await.expect("`true` should reload successfully");

        let failing = CommandHost::new(
            None,
            Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo boom >&2; exit 3".to_string(),
            ]),
        );
        match failing.reload().await {
            Err(HostError::ReloadFailed { stderr, .. }) => assert_eq!(stderr, ": boom"),
            other => panic!("expected reload failure, got {other:?}"),
        }
    }
}
