use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_http::*;
use crate::infra_local::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything a panel process needs to keep its API session alive, built
/// once from settings and shared with the API-calling code.
pub struct SessionClient {
    pub refresh_service: Arc<dyn TokenRefreshService>,
    pub navigator: Arc<dyn Navigator>,
    monitor_config: MonitorConfig,
    monitor_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl SessionClient {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let navigator: Arc<dyn Navigator> = Arc::new(LocationNavigator::default());

        let storage: Arc<dyn AuthStorage> = match settings.storage.backend.as_str() {
            "memory" => Arc::new(MemoryAuthStorage::new()),
            "file" => {
                let path = settings
                    .storage
                    .path
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("storage.path is required for the file backend"))?;
                Arc::new(FileAuthStorage::open(path)?)
            }
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let policy = RefreshPolicy {
            expiry_buffer: settings.session.expiry_buffer(),
            login_grace: settings.session.login_grace(),
            login_path: settings.session.login_path.clone(),
        };

        let refresh_service: Arc<dyn TokenRefreshService> =
            match settings.session.backend.as_str() {
                "fake" => Arc::new(FakeTokenRefreshService::new(storage, clock, policy)),
                "real" => {
                    let transport: Arc<dyn RefreshTransport> = Arc::new(HttpRefreshTransport::try_new(
                        &settings.api.base_url,
                        Duration::from_secs(settings.api.timeout_secs),
                    )?);
                    Arc::new(RealTokenRefreshService::new(
                        storage,
                        transport,
                        navigator.clone(),
                        clock,
                        policy,
                    ))
                }
                other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
            };

        Ok(Self {
            refresh_service,
            navigator,
            monitor_config: MonitorConfig {
                check_interval: settings.session.check_interval(),
                proactive_threshold: settings.session.proactive_threshold(),
            },
            monitor_handle: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    /// Starts the background refresh monitor. Calling it twice is a no-op.
    pub fn start_monitor(&self) {
        if let Ok(mut lock) = self.monitor_handle.lock() {
            if lock.is_none() {
                *lock = Some(spawn_refresh_monitor(
                    self.refresh_service.clone(),
                    self.monitor_config.clone(),
                    self.cancel.clone(),
                ));
                info!(
                    every_secs = self.monitor_config.check_interval.as_secs(),
                    "refresh monitor started"
                );
            }
        }
    }

    pub async fn shutdown(&self) {
        info!("session client shutting down...");

        self.cancel.cancel();

        let handle = match self.monitor_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("monitor handle dropped: {:?}", r);
        }
    }
}
