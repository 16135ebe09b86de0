use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Profile};
use crate::displays;
use crate::driver::{self, GammaDriver, NullDriver};
use crate::foreground::{self, ForegroundSource, UnavailableSource};
use crate::monitor::{ForegroundMonitor, MonitorState, DEFAULT_POLL_INTERVAL};
use crate::processes;
use crate::store::{ConfigStore, SaveEvent, DEFAULT_DEBOUNCE, SETTINGS_FILE};
use crate::{autostart, log_info, log_warn};
use crossbeam_channel::Receiver;

/// Construction parameters for [`AppContext`].
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub config_dir: PathBuf,
    pub poll_interval: Duration,
    pub save_debounce: Duration,
}

impl ContextOptions {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            save_debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Owns the store, driver and monitor, and is the surface the UI talks to.
pub struct AppContext {
    config_dir: PathBuf,
    store: Arc<ConfigStore>,
    monitor: ForegroundMonitor,
}

impl AppContext {
    /// Build with the native driver and foreground source, falling back to
    /// inert implementations when the platform lacks them.
    pub fn new(options: ContextOptions) -> Result<Self> {
        let driver: Arc<dyn GammaDriver> = match driver::native_driver() {
            Ok(driver) => Arc::from(driver),
            Err(e) => {
                log_warn!("{}; display calibration disabled", e);
                Arc::new(NullDriver)
            }
        };
        let source: Arc<dyn ForegroundSource> = match foreground::native_source() {
            Ok(source) => Arc::from(source),
            Err(e) => {
                log_warn!("{}; per-application switching disabled", e);
                Arc::new(UnavailableSource)
            }
        };
        Self::with_parts(options, driver, source)
    }

    pub fn with_parts(
        options: ContextOptions,
        driver: Arc<dyn GammaDriver>,
        source: Arc<dyn ForegroundSource>,
    ) -> Result<Self> {
        let store = Arc::new(ConfigStore::open(
            options.config_dir.join(SETTINGS_FILE),
            options.save_debounce,
        )?);
        let monitor = ForegroundMonitor::new(driver, source, Arc::clone(&store), options.poll_interval);

        Ok(Self {
            config_dir: options.config_dir,
            store,
            monitor,
        })
    }

    /// Begin watching the foreground application.
    pub fn start(&self) {
        self.monitor.init();
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn config(&self) -> Config {
        self.store.get_config()
    }

    pub fn set_config(&self, config: Config) {
        self.store.set_config(config);
    }

    pub fn set_application(&self, application: &str, profile: Profile) {
        self.store.set_application(application, profile);
    }

    pub fn set_live_preview_active(&self, active: bool) {
        self.monitor.set_live_preview_active(active);
    }

    pub fn set_live_preview_values(&self, values: Profile) {
        self.monitor.set_live_preview_values(values);
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.monitor.state()
    }

    pub fn current_application(&self) -> Option<String> {
        self.monitor.current_application()
    }

    pub fn observe_saves(&self) -> Receiver<SaveEvent> {
        self.store.observe_saves()
    }

    pub fn list_displays(&self) -> Result<Vec<String>> {
        displays::display_names()
    }

    pub fn list_processes(&self) -> Result<Vec<String>> {
        processes::list_executables()
    }

    pub fn auto_launch_enabled(&self) -> Result<bool> {
        autostart::is_enabled()
    }

    pub fn set_auto_launch(&self, enabled: bool) -> Result<()> {
        let exe = std::env::current_exe()?;
        autostart::set_enabled(enabled, &exe)?;
        log_info!("Launch at startup {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn app_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Stop monitoring and restore neutral ramps on all configured displays.
    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }
}
