#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Result;
use gammaswitch::{log_info, log_warn, AppContext, ContextOptions};

const LOG_RETENTION: usize = 10;

fn main() -> Result<()> {
    let result = run_app();
    let _ = gammaswitch::logger::finalize_logs();
    result
}

fn run_app() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let stream_logs = args.contains(&"--stream-logs".to_string());

    let config_dir = gammaswitch::store::default_config_dir()?;
    gammaswitch::logger::init_logger(config_dir.join("logs"), "gammaswitch", LOG_RETENTION, stream_logs)?;

    log_info!("=== GammaSwitch {} Starting ===", env!("CARGO_PKG_VERSION"));
    if let Some(log_path) = gammaswitch::logger::get_log_path() {
        log_info!("Log file: {}", log_path.display());
    }

    let app = AppContext::new(ContextOptions::new(config_dir))?;
    log_info!("Config: {}", app.store().path().display());

    platform::run(app)
}

#[cfg(not(windows))]
mod platform {
    use super::*;

    pub fn run(app: AppContext) -> Result<()> {
        log_warn!("Native display control is only available on Windows; exiting");
        app.shutdown();
        Ok(())
    }
}

#[cfg(windows)]
mod platform {
    use super::*;
    use crossbeam_channel::{bounded, Sender};
    use gammaswitch::SaveEvent;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
    use tray_icon::{Icon, MouseButton, TrayIconBuilder, TrayIconEvent};
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
    };

    #[derive(Debug)]
    enum AppCommand {
        OpenSettingsFolder,
        ToggleAutoLaunch,
        Exit,
    }

    const SAVED_NOTICE: Duration = Duration::from_secs(3);

    fn tooltip(app: &AppContext, saved_at: Option<Instant>) -> String {
        let mut text = match app.current_application() {
            Some(name) => format!("GammaSwitch\nActive: {}", name),
            None => "GammaSwitch".to_string(),
        };
        if saved_at.is_some_and(|t| t.elapsed() < SAVED_NOTICE) {
            text.push_str("\nSettings saved");
        }
        text
    }

    pub fn run(app: AppContext) -> Result<()> {
        let app = Arc::new(app);
        app.start();

        let saves = app.observe_saves();
        let (command_tx, command_rx) = bounded::<AppCommand>(10);
        let wakeup = Arc::new((parking_lot::Mutex::new(()), parking_lot::Condvar::new()));

        let auto_launch = app.auto_launch_enabled().unwrap_or_else(|e| {
            log_warn!("Could not read launch-at-startup state: {}", e);
            false
        });

        let menu = Menu::new();
        let open_item = MenuItem::new("Open Settings Folder", true, None);
        let autostart_item = CheckMenuItem::new("Launch at Startup", true, auto_launch, None);
        let separator = PredefinedMenuItem::separator();
        let exit_item = MenuItem::new("Exit", true, None);

        menu.append(&open_item)?;
        menu.append(&autostart_item)?;
        menu.append(&separator)?;
        menu.append(&exit_item)?;

        let open_id = open_item.id().clone();
        let autostart_id = autostart_item.id().clone();
        let exit_id = exit_item.id().clone();

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false)
            .with_tooltip(tooltip(&app, None))
            .with_icon(load_icon()?)
            .build()?;

        log_info!("Tray icon created");

        let click_tx = command_tx.clone();
        let click_wakeup = Arc::clone(&wakeup);
        TrayIconEvent::set_event_handler(Some(move |event| {
            if let TrayIconEvent::DoubleClick { button: MouseButton::Left, .. } = event {
                send(&click_tx, AppCommand::OpenSettingsFolder);
                click_wakeup.1.notify_one();
            }
        }));

        let menu_wakeup = Arc::clone(&wakeup);
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            if event.id == open_id {
                send(&command_tx, AppCommand::OpenSettingsFolder);
            } else if event.id == autostart_id {
                send(&command_tx, AppCommand::ToggleAutoLaunch);
            } else if event.id == exit_id {
                log_info!("Exit clicked");
                send(&command_tx, AppCommand::Exit);
            }
            menu_wakeup.1.notify_one();
        }));

        log_info!("Entering main event loop");

        let mut saved_at: Option<Instant> = None;
        let mut last_tray_update = Instant::now();

        let result = loop {
            let mut quit = false;
            unsafe {
                let mut msg = MSG::default();
                while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                    if msg.message == WM_QUIT {
                        log_info!("WM_QUIT received, exiting");
                        quit = true;
                        break;
                    }
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            if quit {
                break Ok(());
            }

            let mut exit = false;
            while let Ok(command) = command_rx.try_recv() {
                match command {
                    AppCommand::OpenSettingsFolder => {
                        let _ = std::process::Command::new("explorer").arg(app.config_dir()).spawn();
                    }
                    AppCommand::ToggleAutoLaunch => {
                        let enable = autostart_item.is_checked();
                        if let Err(e) = app.set_auto_launch(enable) {
                            log_warn!("Failed to update launch at startup: {}", e);
                            autostart_item.set_checked(!enable);
                        }
                    }
                    AppCommand::Exit => exit = true,
                }
            }
            if exit {
                break Ok(());
            }

            for event in saves.try_iter() {
                match event {
                    SaveEvent::Saved => saved_at = Some(Instant::now()),
                    SaveEvent::Failed(reason) => log_warn!("Settings not saved: {}", reason),
                }
            }

            if last_tray_update.elapsed() >= Duration::from_millis(500) {
                tray_icon.set_tooltip(Some(tooltip(&app, saved_at))).ok();
                last_tray_update = Instant::now();
            }

            let mut guard = wakeup.0.lock();
            let _ = wakeup.1.wait_for(&mut guard, Duration::from_millis(100));
        };

        log_info!("Shutting down");
        app.shutdown();
        result
    }

    fn send(tx: &Sender<AppCommand>, command: AppCommand) {
        let _ = tx.try_send(command);
    }

    fn load_icon() -> Result<Icon> {
        let icon_path = std::env::current_exe()?
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Failed to get parent directory"))?
            .join("icon.ico");

        if icon_path.exists() {
            match Icon::from_path(&icon_path, Some((32, 32))) {
                Ok(icon) => return Ok(icon),
                Err(e) => log_warn!("Failed to load icon from {:?}: {}. Using fallback.", icon_path, e),
            }
        }

        let mut rgba = Vec::with_capacity(16 * 16 * 4);
        for i in 0..16 * 16 {
            // Dark-to-light ramp across the icon.
            let level = ((i % 16) * 16) as u8;
            rgba.extend_from_slice(&[level, level, level, 255]);
        }

        Icon::from_rgba(rgba, 16, 16).map_err(|e| anyhow::anyhow!("Failed to create fallback icon: {}", e))
    }
}
