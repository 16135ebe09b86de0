use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::{Config, Profile};
use crate::{log_error, log_info, log_warn};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Outcome of a debounced write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    Saved,
    Failed(String),
}

/// Change listener; returning `false` unsubscribes it.
type Subscriber = Box<dyn FnMut(&Config) -> bool + Send>;

enum WriteCommand {
    Update(Config),
    Shutdown,
}

/// `%APPDATA%\GammaSwitch`, or `GAMMASWITCH_CONFIG_DIR` when set.
pub fn default_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("GAMMASWITCH_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let app_data = std::env::var("APPDATA").context("Failed to get APPDATA environment variable")?;
    Ok(PathBuf::from(app_data).join("GammaSwitch"))
}

/// In-memory authority for [`Config`], mirrored to one JSON file.
///
/// Every replacement is broadcast to subscribers in issue order; disk writes
/// are debounced so a burst of replacements costs a single write.
pub struct ConfigStore {
    path: PathBuf,
    state: RwLock<Config>,
    subscribers: Mutex<Vec<Subscriber>>,
    save_subscribers: Arc<Mutex<Vec<Sender<SaveEvent>>>>,
    write_sender: Sender<WriteCommand>,
    write_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>, debounce: Duration) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let initial = if path.exists() {
            Self::load(&path)?
        } else {
            let config = Config::default();
            write_config(&path, &config).context("Failed to write default config")?;
            log_info!("Created default config at {}", path.display());
            config
        };

        let save_subscribers: Arc<Mutex<Vec<Sender<SaveEvent>>>> = Arc::new(Mutex::new(Vec::new()));
        let (write_sender, write_receiver) = unbounded();

        let worker_path = path.clone();
        let worker_saves = Arc::clone(&save_subscribers);
        let write_thread = thread::Builder::new()
            .name("config-writer".into())
            .spawn(move || write_worker(worker_path, write_receiver, debounce, worker_saves))
            .context("Failed to spawn config writer")?;

        Ok(Self {
            path,
            state: RwLock::new(initial),
            subscribers: Mutex::new(Vec::new()),
            save_subscribers,
            write_sender,
            write_thread: Mutex::new(Some(write_thread)),
        })
    }

    fn load(path: &Path) -> Result<Config> {
        let content = fs::read(path).context("Failed to read config file")?;

        // Bad encoding and bad JSON both land in the move-aside branch.
        match serde_json::from_slice::<Config>(&content) {
            Ok(mut config) => {
                config.dedup_displays();
                Ok(config)
            }
            Err(e) => {
                let aside = path.with_extension("json.corrupt");
                log_warn!(
                    "Config at {} is unreadable ({}); moving it to {} and using defaults",
                    path.display(),
                    e,
                    aside.display()
                );
                if let Err(e) = fs::rename(path, &aside) {
                    log_error!("Failed to move corrupt config aside: {}", e);
                }
                Ok(Config::default())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_config(&self) -> Config {
        self.state.read().clone()
    }

    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Config) -> R,
    {
        f(&self.state.read())
    }

    /// Replace the config, notify subscribers and schedule a write.
    pub fn set_config(&self, config: Config) {
        // Held for the whole call so concurrent setters notify in the order they commit.
        let mut subscribers = self.subscribers.lock();
        *self.state.write() = config.clone();
        subscribers.retain_mut(|notify| notify(&config));
        let _ = self.write_sender.send(WriteCommand::Update(config));
    }

    /// Read-modify-write on the current config.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.get_config();
        f(&mut config);
        self.set_config(config);
    }

    /// Store a profile for `application`. Empty names are ignored; values are
    /// clamped into range.
    pub fn set_application(&self, application: &str, profile: Profile) {
        let application = application.trim();
        if application.is_empty() {
            log_warn!("Ignoring profile with empty application name");
            return;
        }
        let profile = profile.clamped();
        self.update(|config| {
            config.applications.insert(application.to_string(), profile);
        });
    }

    pub fn set_displays(&self, displays: Vec<String>) {
        self.update(|config| {
            config.displays = displays;
            config.dedup_displays();
        });
    }

    /// Future replacements only; the feed lives as long as the receiver.
    pub fn observe_changes(&self) -> Receiver<Config> {
        let (tx, rx) = unbounded();
        self.subscribe(move |config| tx.send(config.clone()).is_ok());
        rx
    }

    /// Call `notify` synchronously, inside `set_config`, for every future
    /// replacement until it returns `false`.
    pub fn subscribe<F>(&self, notify: F)
    where
        F: FnMut(&Config) -> bool + Send + 'static,
    {
        self.subscribers.lock().push(Box::new(notify));
    }

    pub fn observe_saves(&self) -> Receiver<SaveEvent> {
        let (tx, rx) = unbounded();
        self.save_subscribers.lock().push(tx);
        rx
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        let _ = self.write_sender.send(WriteCommand::Shutdown);
        if let Some(handle) = self.write_thread.lock().take() {
            let _ = handle.join();
        }
    }
}

/// Serialize and replace the file in one rename.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).context("Failed to write temporary config file")?;
    fs::rename(&tmp, path).context("Failed to replace config file")?;
    Ok(())
}

fn write_worker(
    path: PathBuf,
    receiver: Receiver<WriteCommand>,
    debounce: Duration,
    save_subscribers: Arc<Mutex<Vec<Sender<SaveEvent>>>>,
) {
    let notify = |event: SaveEvent| {
        save_subscribers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    };

    let mut pending: Option<Config> = None;
    let mut attempts = 0u32;

    loop {
        let command = if pending.is_some() {
            match receiver.recv_timeout(debounce) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(WriteCommand::Shutdown),
            }
        } else {
            match receiver.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        match command {
            Some(WriteCommand::Update(config)) => {
                pending = Some(config);
                attempts = 0;
            }
            Some(WriteCommand::Shutdown) => {
                if let Some(config) = pending.take() {
                    match write_config(&path, &config) {
                        Ok(()) => notify(SaveEvent::Saved),
                        Err(e) => log_error!("Failed to save config on shutdown: {:#}", e),
                    }
                }
                break;
            }
            None => {
                let Some(config) = pending.take() else { continue };
                match write_config(&path, &config) {
                    Ok(()) => {
                        log_info!("Config saved to {}", path.display());
                        notify(SaveEvent::Saved);
                    }
                    Err(e) => {
                        attempts += 1;
                        log_error!("Failed to save config (attempt {}): {:#}", attempts, e);
                        notify(SaveEvent::Failed(format!("{:#}", e)));
                        if attempts < MAX_WRITE_ATTEMPTS {
                            pending = Some(config);
                        } else {
                            log_error!("Giving up on saving config until the next change");
                        }
                    }
                }
            }
        }
    }
}
