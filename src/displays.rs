use anyhow::Result;

#[cfg(windows)]
use windows::{
    core::BOOL,
    Win32::Foundation::{LPARAM, RECT},
    Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW, MONITORINFOF_PRIMARY,
    },
};

/// A connected display, named the way `CreateDCW` expects (`\\.\DISPLAY1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub name: String,
    pub is_primary: bool,
}

/// Device names for the display picker, primary display first.
pub fn display_names() -> Result<Vec<String>> {
    let mut displays = attached_displays()?;
    sort_primary_first(&mut displays);
    Ok(displays.into_iter().map(|d| d.name).collect())
}

fn sort_primary_first(displays: &mut [DisplayInfo]) {
    // Stable, so enumeration order is kept among non-primary displays.
    displays.sort_by(|a, b| b.is_primary.cmp(&a.is_primary));
}

#[cfg(windows)]
fn attached_displays() -> Result<Vec<DisplayInfo>> {
    let mut displays: Vec<DisplayInfo> = Vec::new();

    // The callback runs synchronously on this thread.
    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(collect_display),
            LPARAM(&mut displays as *mut Vec<DisplayInfo> as isize),
        )
    };
    if !ok.as_bool() && displays.is_empty() {
        anyhow::bail!("EnumDisplayMonitors failed");
    }
    Ok(displays)
}

#[cfg(windows)]
unsafe extern "system" fn collect_display(monitor: HMONITOR, _hdc: HDC, _rect: *mut RECT, data: LPARAM) -> BOOL {
    let displays = &mut *(data.0 as *mut Vec<DisplayInfo>);

    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(monitor, &mut info.monitorInfo).as_bool() {
        let len = info.szDevice.iter().position(|&c| c == 0).unwrap_or(info.szDevice.len());
        displays.push(DisplayInfo {
            name: String::from_utf16_lossy(&info.szDevice[..len]),
            is_primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    }

    true.into()
}

#[cfg(not(windows))]
fn attached_displays() -> Result<Vec<DisplayInfo>> {
    Ok(Vec::new())
}
