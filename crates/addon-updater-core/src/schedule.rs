use std::time::Duration;

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::checker::{StatusMessage, UpdateChecker};
use crate::host::AddonHost;

/// Delay before the first check after the updater starts.
pub const FIRST_CHECK_DELAY: Duration = Duration::from_secs(1);

/// Run update checks forever on the current task until `cancel` fires.
///
/// The next delay is read from the checker after each tick, so preference
/// changes made through `on_status` take effect from the following check.
pub async fn run_periodic<H, F>(
    checker: &mut UpdateChecker<H>,
    first_delay: Duration,
    cancel: CancellationToken,
    mut on_status: F,
) where
    H: AddonHost,
    F: FnMut(&mut UpdateChecker<H>, &StatusMessage),
{
    let mut delay = first_delay;
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Update checks cancelled");
                return;
            }
            () = tokio::time::sleep(delay) => {}
        }

        let status = checker.run_check().await;
        on_status(checker, &status);

        delay = checker.schedule_next_check();
        debug!("Next update check in {}s", delay.as_secs());
    }
}
