pub mod logger;
pub mod error;
pub mod ramp;
pub mod config;
pub mod store;
pub mod driver;
pub mod foreground;
pub mod processes;
pub mod displays;
pub mod autostart;
pub mod monitor;
pub mod context;

pub use logger::*;
pub use config::{Config, Profile};
pub use context::{AppContext, ContextOptions};
pub use driver::{DeviceContext, GammaDriver, NullDriver};
pub use error::{ForegroundError, Unsupported};
pub use foreground::ForegroundSource;
pub use monitor::{ForegroundMonitor, MonitorCore, MonitorState};
pub use ramp::{compute_ramp, GammaRamp};
pub use store::{ConfigStore, SaveEvent};
