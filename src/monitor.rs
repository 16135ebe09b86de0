use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{Config, Profile};
use crate::driver::GammaDriver;
use crate::error::ForegroundError;
use crate::foreground::{owner_file_name, ForegroundSource};
use crate::ramp::GammaRamp;
use crate::store::ConfigStore;
use crate::{log_info, log_warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const PREVIEW_THROTTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Polling,
    LivePreview,
    Stopped,
}

/// Monitor state machine. Every method runs to completion; the caller
/// serializes events (the worker thread in [`ForegroundMonitor`], or a test).
pub struct MonitorCore {
    driver: Arc<dyn GammaDriver>,
    store: Arc<ConfigStore>,
    started: bool,
    ever_started: bool,
    last_foreground: Option<String>,
    live_preview_active: bool,
    live_preview_values: Profile,
    preview_pending: bool,
    last_preview_apply: Option<Instant>,
    generation: u64,
    in_flight: Option<u64>,
    query_failing: bool,
}

impl MonitorCore {
    pub fn new(driver: Arc<dyn GammaDriver>, store: Arc<ConfigStore>) -> Self {
        Self {
            driver,
            store,
            started: false,
            ever_started: false,
            last_foreground: None,
            live_preview_active: false,
            live_preview_values: Profile::NEUTRAL,
            preview_pending: false,
            last_preview_apply: None,
            generation: 0,
            in_flight: None,
            query_failing: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        match (self.started, self.ever_started) {
            (true, _) if self.live_preview_active => MonitorState::LivePreview,
            (true, _) => MonitorState::Polling,
            (false, true) => MonitorState::Stopped,
            (false, false) => MonitorState::Idle,
        }
    }

    pub fn current_application(&self) -> Option<&str> {
        self.last_foreground.as_deref()
    }

    pub fn live_preview_active(&self) -> bool {
        self.live_preview_active
    }

    pub fn on_start(&mut self, now: Instant) {
        self.started = true;
        self.ever_started = true;
        self.invalidate();
        if self.live_preview_active {
            self.request_preview(now);
        }
    }

    pub fn on_stop(&mut self) {
        self.started = false;
        self.preview_pending = false;
        self.in_flight = None;
    }

    /// Periodic tick. Returns the generation to tag a foreground query with,
    /// or `None` when no query should be issued.
    pub fn on_tick(&mut self) -> Option<u64> {
        if !self.started || self.live_preview_active {
            return None;
        }
        if self.in_flight == Some(self.generation) {
            return None;
        }
        self.in_flight = Some(self.generation);
        Some(self.generation)
    }

    /// Result of a foreground query. Returns whether ramps were (re)applied.
    pub fn on_foreground(&mut self, generation: u64, result: Result<String, ForegroundError>) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
        }
        if !self.started || generation != self.generation || self.live_preview_active {
            return false;
        }

        let path = match result {
            Ok(path) => {
                if self.query_failing {
                    log_info!("Foreground query recovered");
                    self.query_failing = false;
                }
                path
            }
            Err(e) => {
                if !self.query_failing {
                    log_warn!("Foreground query failed: {}", e);
                    self.query_failing = true;
                }
                return false;
            }
        };

        let name = owner_file_name(&path);
        if self.last_foreground.as_deref() == Some(name) {
            return false;
        }
        self.last_foreground = Some(name.to_string());

        let config = self.store.get_config();
        let profile = match config.profile_for(name) {
            Some(profile) => {
                log_info!("Applying profile for {}", name);
                *profile
            }
            None => Profile::NEUTRAL,
        };
        self.apply_to_displays(&config, &profile);
        true
    }

    /// The config was replaced; the next tick must re-resolve even if the
    /// foreground application is unchanged.
    pub fn on_config_changed(&mut self) {
        self.invalidate();
    }

    pub fn set_live_preview_active(&mut self, active: bool, now: Instant) {
        if self.live_preview_active != active {
            log_info!("Live preview {}", if active { "enabled" } else { "disabled" });
        }
        self.live_preview_active = active;
        self.invalidate();
        if active {
            self.request_preview(now);
        } else {
            self.preview_pending = false;
        }
    }

    pub fn set_live_preview_values(&mut self, values: Profile, now: Instant) {
        self.live_preview_values = values;
        if self.live_preview_active {
            self.request_preview(now);
        }
    }

    /// When a throttled preview value is waiting, the instant it becomes due.
    pub fn preview_deadline(&self) -> Option<Instant> {
        if !self.preview_pending || !self.live_preview_active {
            return None;
        }
        self.last_preview_apply.map(|t| t + PREVIEW_THROTTLE)
    }

    pub fn on_preview_deadline(&mut self, now: Instant) {
        if self.preview_pending && self.live_preview_active {
            self.request_preview(now);
        }
    }

    /// Neutral ramp on every configured display. Returns displays that accepted it.
    pub fn reset_displays(&self) -> usize {
        let config = self.store.get_config();
        log_info!("Resetting {} display(s) to neutral", config.displays.len());
        self.apply_to_displays(&config, &Profile::NEUTRAL)
    }

    fn invalidate(&mut self) {
        self.last_foreground = None;
        self.generation = self.generation.wrapping_add(1);
    }

    fn request_preview(&mut self, now: Instant) {
        if !self.started {
            self.preview_pending = false;
            return;
        }
        let due = self
            .last_preview_apply
            .map_or(true, |last| now.duration_since(last) >= PREVIEW_THROTTLE);
        if due {
            let config = self.store.get_config();
            let values = self.live_preview_values;
            self.apply_to_displays(&config, &values);
            self.last_preview_apply = Some(now);
            self.preview_pending = false;
        } else {
            self.preview_pending = true;
        }
    }

    fn apply_to_displays(&self, config: &Config, profile: &Profile) -> usize {
        if config.displays.is_empty() {
            return 0;
        }
        let ramp: GammaRamp = profile.ramp();
        config
            .displays
            .iter()
            .filter(|display| self.driver.apply_ramp(display, &ramp))
            .count()
    }
}

/// Everything the worker reacts to, funneled through one queue so events are
/// handled in the order they were raised.
enum Event {
    LivePreviewActive(bool),
    LivePreviewValues(Profile),
    ConfigChanged,
    Tick,
    Foreground(u64, Result<String, ForegroundError>),
    Stop,
}

struct Worker {
    events: Sender<Event>,
    thread: thread::JoinHandle<()>,
}

/// Runs [`MonitorCore`] on a dedicated thread: ticks, config changes, control
/// messages and foreground results are handled one at a time, in arrival order.
pub struct ForegroundMonitor {
    core: Arc<Mutex<MonitorCore>>,
    store: Arc<ConfigStore>,
    source: Arc<dyn ForegroundSource>,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl ForegroundMonitor {
    pub fn new(
        driver: Arc<dyn GammaDriver>,
        source: Arc<dyn ForegroundSource>,
        store: Arc<ConfigStore>,
        interval: Duration,
    ) -> Self {
        Self {
            core: Arc::new(Mutex::new(MonitorCore::new(driver, Arc::clone(&store)))),
            store,
            source,
            interval,
            worker: Mutex::new(None),
        }
    }

    /// Start polling. Restarts cleanly when already running.
    pub fn init(&self) {
        let mut worker = self.worker.lock();
        if let Some(previous) = worker.take() {
            Self::join_worker(previous, &self.core);
        }

        let (events_tx, events_rx) = unbounded();
        let changes_tx = events_tx.clone();
        self.store
            .subscribe(move |_| changes_tx.send(Event::ConfigChanged).is_ok());
        self.core.lock().on_start(Instant::now());

        let core = Arc::clone(&self.core);
        let source = Arc::clone(&self.source);
        let interval = self.interval;
        let worker_events = events_tx.clone();
        let spawned = thread::Builder::new()
            .name("foreground-monitor".into())
            .spawn(move || run_worker(core, source, worker_events, events_rx, interval));

        match spawned {
            Ok(thread) => {
                *worker = Some(Worker {
                    events: events_tx,
                    thread,
                });
                log_info!("Foreground monitor started (interval {:?})", self.interval);
            }
            Err(e) => {
                self.core.lock().on_stop();
                crate::log_error!("Failed to start foreground monitor: {}", e);
            }
        }
    }

    pub fn stop(&self) {
        if let Some(worker) = self.worker.lock().take() {
            Self::join_worker(worker, &self.core);
            log_info!("Foreground monitor stopped");
        }
    }

    fn join_worker(worker: Worker, core: &Mutex<MonitorCore>) {
        let _ = worker.events.send(Event::Stop);
        let _ = worker.thread.join();
        core.lock().on_stop();
    }

    pub fn set_live_preview_active(&self, active: bool) {
        if !self.send(Event::LivePreviewActive(active)) {
            self.core.lock().set_live_preview_active(active, Instant::now());
        }
    }

    pub fn set_live_preview_values(&self, values: Profile) {
        if !self.send(Event::LivePreviewValues(values)) {
            self.core.lock().set_live_preview_values(values, Instant::now());
        }
    }

    fn send(&self, event: Event) -> bool {
        match self.worker.lock().as_ref() {
            Some(worker) => worker.events.send(event).is_ok(),
            None => false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.core.lock().state()
    }

    pub fn current_application(&self) -> Option<String> {
        self.core.lock().current_application().map(str::to_string)
    }

    /// Stop and put every configured display back on the neutral ramp.
    pub fn shutdown(&self) {
        self.stop();
        self.core.lock().reset_displays();
    }
}

impl Drop for ForegroundMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    core: Arc<Mutex<MonitorCore>>,
    source: Arc<dyn ForegroundSource>,
    events_tx: Sender<Event>,
    events: Receiver<Event>,
    interval: Duration,
) {
    let (query_tx, query_rx) = unbounded::<u64>();

    // Queries may block in the OS; a detached helper keeps the event loop responsive.
    let results = events_tx.clone();
    let spawned = thread::Builder::new()
        .name("foreground-query".into())
        .spawn(move || {
            while let Ok(generation) = query_rx.recv() {
                let result = source.foreground_path();
                if results.send(Event::Foreground(generation, result)).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        crate::log_error!("Failed to start foreground query thread: {}", e);
        return;
    }

    // Exits on the first tick after the worker's queue is gone.
    let spawned = thread::Builder::new()
        .name("foreground-tick".into())
        .spawn(move || {
            for _ in crossbeam_channel::tick(interval).iter() {
                if events_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        crate::log_error!("Failed to start foreground ticker: {}", e);
        return;
    }

    loop {
        let deadline = core.lock().preview_deadline();
        let event = match deadline {
            Some(at) => match events.recv_deadline(at) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    core.lock().on_preview_deadline(Instant::now());
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match events.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        if !handle_event(&core, &query_tx, event) {
            break;
        }
    }
}

/// Returns `false` once the worker should exit.
fn handle_event(core: &Mutex<MonitorCore>, queries: &Sender<u64>, event: Event) -> bool {
    match event {
        Event::LivePreviewActive(active) => core.lock().set_live_preview_active(active, Instant::now()),
        Event::LivePreviewValues(values) => core.lock().set_live_preview_values(values, Instant::now()),
        Event::ConfigChanged => core.lock().on_config_changed(),
        Event::Tick => {
            let generation = core.lock().on_tick();
            if let Some(generation) = generation {
                let _ = queries.send(generation);
            }
        }
        Event::Foreground(generation, result) => {
            core.lock().on_foreground(generation, result);
        }
        Event::Stop => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::RecordingDriver;
    use crate::foreground::testing::ScriptedSource;
    use crate::store::SETTINGS_FILE;

    struct Fixture {
        core: MonitorCore,
        driver: Arc<RecordingDriver>,
        store: Arc<ConfigStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(displays: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            ConfigStore::open(dir.path().join(SETTINGS_FILE), Duration::from_millis(50)).unwrap(),
        );
        store.set_displays(displays.iter().map(|d| d.to_string()).collect());
        store.set_application("game.exe", Profile::new(0.8, 0.6, 1.4));
        let driver = Arc::new(RecordingDriver::default());
        let mut core = MonitorCore::new(driver.clone(), Arc::clone(&store));
        core.on_start(Instant::now());
        Fixture {
            core,
            driver,
            store,
            _dir: dir,
        }
    }

    fn tick_with(core: &mut MonitorCore, path: &str) -> bool {
        let generation = core.on_tick().expect("tick should issue a query");
        core.on_foreground(generation, Ok(path.to_string()))
    }

    #[test]
    fn test_initial_state_is_idle_then_polling() {
        let mut f = fixture(&["D1"]);
        let idle = MonitorCore::new(f.driver.clone(), Arc::clone(&f.store));
        assert_eq!(idle.state(), MonitorState::Idle);
        assert_eq!(f.core.state(), MonitorState::Polling);
        f.core.on_stop();
        assert_eq!(f.core.state(), MonitorState::Stopped);
    }

    #[test]
    fn test_unchanged_foreground_is_applied_once() {
        let mut f = fixture(&["D1"]);
        assert!(tick_with(&mut f.core, r"C:\bin\a.exe"));
        assert!(!tick_with(&mut f.core, r"C:\bin\a.exe"));
        assert!(tick_with(&mut f.core, r"C:\bin\b.exe"));
        assert_eq!(f.driver.applied_count(), 2);
    }

    #[test]
    fn test_profile_resolution_and_neutral_fallback() {
        let mut f = fixture(&["D1"]);
        tick_with(&mut f.core, r"C:\Games\game.exe");
        tick_with(&mut f.core, r"C:\Windows\explorer.exe");

        let applied = f.driver.take_applied();
        assert_eq!(applied[0].1, Profile::new(0.8, 0.6, 1.4).ramp());
        assert_eq!(applied[1].1, GammaRamp::neutral());
        assert_eq!(f.core.current_application(), Some("explorer.exe"));
    }

    #[test]
    fn test_every_display_receives_the_ramp() {
        let mut f = fixture(&["D1", "D2", "D3"]);
        tick_with(&mut f.core, "game.exe");
        let names: Vec<String> = f.driver.take_applied().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["D1", "D2", "D3"]);
    }

    #[test]
    fn test_failing_display_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            ConfigStore::open(dir.path().join(SETTINGS_FILE), Duration::from_millis(50)).unwrap(),
        );
        store.set_displays(vec!["D1".into(), "BAD".into(), "D3".into()]);
        let driver = Arc::new(RecordingDriver::with_broken(&["BAD"]));
        let mut core = MonitorCore::new(driver.clone(), store);
        core.on_start(Instant::now());

        tick_with(&mut core, "game.exe");
        let names: Vec<String> = driver.take_applied().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["D1", "D3"]);
    }

    #[test]
    fn test_no_driver_calls_without_displays() {
        let mut f = fixture(&[]);
        assert!(tick_with(&mut f.core, "game.exe"));
        assert!(f.driver.calls.lock().is_empty());
        assert_eq!(f.core.reset_displays(), 0);
        assert!(f.driver.calls.lock().is_empty());
    }

    #[test]
    fn test_config_change_reapplies_on_next_tick() {
        let mut f = fixture(&["D1"]);
        let changes = f.store.observe_changes();
        tick_with(&mut f.core, "game.exe");

        f.store.set_application("game.exe", Profile::new(0.2, 0.5, 1.0));
        for _ in changes.try_iter() {
            f.core.on_config_changed();
        }

        assert!(tick_with(&mut f.core, "game.exe"));
        let applied = f.driver.take_applied();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].1, Profile::new(0.2, 0.5, 1.0).ramp());
    }

    #[test]
    fn test_tick_queued_after_config_change_uses_new_generation() {
        let mut f = fixture(&["D1"]);
        tick_with(&mut f.core, "game.exe");
        f.driver.take_applied();

        let core = Mutex::new(f.core);
        let (events_tx, events) = unbounded();
        let changes_tx = events_tx.clone();
        f.store.subscribe(move |_| changes_tx.send(Event::ConfigChanged).is_ok());

        f.store.set_application("game.exe", Profile::new(0.3, 0.5, 1.0));
        events_tx.send(Event::Tick).unwrap();
        events_tx.send(Event::Stop).unwrap();

        let (query_tx, queries) = unbounded();
        while let Ok(event) = events.try_recv() {
            if !handle_event(&core, &query_tx, event) {
                break;
            }
        }

        let generation = queries.try_recv().unwrap();
        assert!(core.lock().on_foreground(generation, Ok("game.exe".into())));
        assert_eq!(f.driver.take_applied()[0].1, Profile::new(0.3, 0.5, 1.0).ramp());
    }

    #[test]
    fn test_stale_query_result_is_discarded() {
        let mut f = fixture(&["D1"]);
        let stale = f.core.on_tick().unwrap();
        f.core.on_config_changed();

        assert!(!f.core.on_foreground(stale, Ok("game.exe".into())));
        assert_eq!(f.driver.applied_count(), 0);

        let fresh = f.core.on_tick().unwrap();
        assert_ne!(fresh, stale);
        assert!(f.core.on_foreground(fresh, Ok("game.exe".into())));
    }

    #[test]
    fn test_no_second_query_while_one_is_in_flight() {
        let mut f = fixture(&["D1"]);
        let generation = f.core.on_tick().unwrap();
        assert_eq!(f.core.on_tick(), None);
        f.core.on_foreground(generation, Ok("a.exe".into()));
        assert!(f.core.on_tick().is_some());
    }

    #[test]
    fn test_query_failure_is_swallowed() {
        let mut f = fixture(&["D1"]);
        let generation = f.core.on_tick().unwrap();
        assert!(!f.core.on_foreground(generation, Err(ForegroundError::NoForegroundWindow)));
        assert_eq!(f.core.state(), MonitorState::Polling);
        assert!(tick_with(&mut f.core, "game.exe"));
    }

    #[test]
    fn test_live_preview_suppresses_resolution_until_disabled() {
        let mut f = fixture(&["D1"]);
        let t0 = Instant::now();
        tick_with(&mut f.core, "game.exe");
        f.driver.take_applied();

        f.core.set_live_preview_active(true, t0);
        assert_eq!(f.core.state(), MonitorState::LivePreview);
        // Enabling applies the current preview values (neutral by default).
        assert_eq!(f.driver.take_applied().len(), 1);
        assert_eq!(f.core.on_tick(), None);

        f.core.set_live_preview_active(false, t0 + Duration::from_millis(500));
        assert_eq!(f.core.state(), MonitorState::Polling);
        assert!(tick_with(&mut f.core, "game.exe"));
        assert_eq!(f.driver.take_applied()[0].1, Profile::new(0.8, 0.6, 1.4).ramp());
    }

    #[test]
    fn test_in_flight_query_discarded_when_preview_starts() {
        let mut f = fixture(&["D1"]);
        let generation = f.core.on_tick().unwrap();
        f.core.set_live_preview_active(true, Instant::now());
        f.driver.take_applied();

        assert!(!f.core.on_foreground(generation, Ok("game.exe".into())));
        assert_eq!(f.driver.applied_count(), 0);
    }

    #[test]
    fn test_live_preview_values_are_throttled_with_trailing_flush() {
        let mut f = fixture(&["D1"]);
        let t0 = Instant::now();
        f.core.set_live_preview_active(true, t0);
        f.driver.take_applied();

        let first = Profile::new(0.6, 0.5, 1.0);
        let last = Profile::new(0.7, 0.5, 1.0);
        f.core.set_live_preview_values(first, t0 + Duration::from_millis(150));
        f.core.set_live_preview_values(Profile::new(0.65, 0.5, 1.0), t0 + Duration::from_millis(170));
        f.core.set_live_preview_values(last, t0 + Duration::from_millis(190));

        let applied = f.driver.take_applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].1, first.ramp());

        let deadline = f.core.preview_deadline().unwrap();
        assert_eq!(deadline, t0 + Duration::from_millis(250));
        f.core.on_preview_deadline(deadline);

        let applied = f.driver.take_applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].1, last.ramp());
        assert_eq!(f.core.preview_deadline(), None);
    }

    #[test]
    fn test_preview_values_bypass_application_profiles() {
        let mut f = fixture(&["D1", "D2"]);
        let values = Profile::new(0.3, 0.3, 2.0);
        f.core.set_live_preview_values(values, Instant::now());
        assert_eq!(f.driver.applied_count(), 0);

        f.core.set_live_preview_active(true, Instant::now());
        let applied = f.driver.take_applied();
        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|(_, ramp)| *ramp == values.ramp()));
    }

    #[test]
    fn test_reset_displays_writes_neutral_once_each() {
        let mut f = fixture(&["D1", "D2"]);
        tick_with(&mut f.core, "game.exe");
        f.core.set_live_preview_active(true, Instant::now());
        f.driver.take_applied();

        assert_eq!(f.core.reset_displays(), 2);
        let applied = f.driver.take_applied();
        let names: Vec<&str> = applied.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["D1", "D2"]);
        assert!(applied.iter().all(|(_, ramp)| *ramp == GammaRamp::neutral()));
    }

    #[test]
    fn test_threaded_monitor_applies_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            ConfigStore::open(dir.path().join(SETTINGS_FILE), Duration::from_millis(50)).unwrap(),
        );
        store.set_displays(vec!["D1".into()]);
        store.set_application("game.exe", Profile::new(0.8, 0.6, 1.4));

        let driver = Arc::new(RecordingDriver::default());
        let source = Arc::new(ScriptedSource::new(&[r"C:\Games\game.exe"]));
        let monitor = ForegroundMonitor::new(driver.clone(), source, Arc::clone(&store), Duration::from_millis(10));

        monitor.init();
        assert_eq!(monitor.state(), MonitorState::Polling);

        let deadline = Instant::now() + Duration::from_secs(3);
        while driver.applied_count() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(100));
        assert_eq!(driver.applied_count(), 1);
        assert_eq!(monitor.current_application().as_deref(), Some("game.exe"));

        monitor.shutdown();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        let applied = driver.take_applied();
        assert_eq!(applied.last().unwrap().1, GammaRamp::neutral());
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_init_is_reentrant_and_stop_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            ConfigStore::open(dir.path().join(SETTINGS_FILE), Duration::from_millis(50)).unwrap(),
        );
        let driver = Arc::new(RecordingDriver::default());
        let source = Arc::new(ScriptedSource::new(&["a.exe"]));
        let monitor = ForegroundMonitor::new(driver, source, store, Duration::from_millis(10));

        assert_eq!(monitor.state(), MonitorState::Idle);
        monitor.init();
        monitor.init();
        assert_eq!(monitor.state(), MonitorState::Polling);

        monitor.set_live_preview_active(true);
        let deadline = Instant::now() + Duration::from_secs(3);
        while monitor.state() != MonitorState::LivePreview && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(monitor.state(), MonitorState::LivePreview);

        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        monitor.stop();
    }
}
