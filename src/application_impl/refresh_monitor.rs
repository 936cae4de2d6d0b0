use crate::application_port::TokenRefreshService;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub check_interval: Duration,
    /// Refresh as soon as less than this is left on the access token.
    pub proactive_threshold: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            proactive_threshold: Duration::from_secs(120),
        }
    }
}

/// One pass of the proactive check. Returns whether a refresh happened.
pub async fn check_session_once(service: &dyn TokenRefreshService, threshold: Duration) -> bool {
    if service.access_token().is_none() {
        return false;
    }
    let Some(secs_left) = service.time_until_expiry() else {
        return false;
    };
    if secs_left >= threshold.as_secs() {
        trace!(secs_left, "access token healthy");
        return false;
    }

    debug!(secs_left, "access token close to expiry, refreshing ahead of time");
    service.refresh_if_needed_within(threshold).await
}

/// Runs [`check_session_once`] on every tick until `cancel` fires.
pub fn spawn_refresh_monitor(
    service: Arc<dyn TokenRefreshService>,
    config: MonitorConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("refresh monitor shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    check_session_once(service.as_ref(), config.proactive_threshold).await;
                }
            }
        }
    })
}
