use anyhow::Result;
use std::path::Path;

#[cfg(windows)]
use windows::{
    core::HSTRING,
    Win32::Foundation::ERROR_FILE_NOT_FOUND,
    Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_SAM_FLAGS, REG_SZ,
    },
};

#[cfg(windows)]
const RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";
#[cfg(windows)]
const VALUE_NAME: &str = "GammaSwitch";

/// Open handle on the current user's Run key, closed on drop.
#[cfg(windows)]
struct RunKey(HKEY);

#[cfg(windows)]
impl RunKey {
    /// `None` when the key itself does not exist.
    fn open(access: REG_SAM_FLAGS) -> Result<Option<Self>> {
        let mut hkey = HKEY::default();
        let status = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, &HSTRING::from(RUN_KEY), None, access, &mut hkey) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if status.is_err() {
            anyhow::bail!("Failed to open Run key: {:?}", status);
        }
        Ok(Some(Self(hkey)))
    }

    fn has_value(&self) -> bool {
        let status = unsafe { RegQueryValueExW(self.0, &HSTRING::from(VALUE_NAME), None, None, None, None) };
        status.is_ok()
    }

    fn set_value(&self, command: &str) -> Result<()> {
        let wide: Vec<u16> = command.encode_utf16().chain(std::iter::once(0)).collect();
        let bytes: Vec<u8> = wide.iter().flat_map(|c| c.to_le_bytes()).collect();
        let status = unsafe { RegSetValueExW(self.0, &HSTRING::from(VALUE_NAME), None, REG_SZ, Some(&bytes)) };
        if status.is_err() {
            anyhow::bail!("Failed to write Run value: {:?}", status);
        }
        Ok(())
    }

    fn delete_value(&self) -> Result<()> {
        let status = unsafe { RegDeleteValueW(self.0, &HSTRING::from(VALUE_NAME)) };
        // Already absent counts as disabled.
        if status.is_err() && status != ERROR_FILE_NOT_FOUND {
            anyhow::bail!("Failed to delete Run value: {:?}", status);
        }
        Ok(())
    }
}

#[cfg(windows)]
impl Drop for RunKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

/// Whether the tray app is registered to launch with Windows.
#[cfg(windows)]
pub fn is_enabled() -> Result<bool> {
    Ok(RunKey::open(KEY_READ)?.is_some_and(|key| key.has_value()))
}

/// Register (or unregister) `exe_path` under the current user's Run key.
#[cfg(windows)]
pub fn set_enabled(enabled: bool, exe_path: &Path) -> Result<()> {
    let key = RunKey::open(KEY_WRITE)?.ok_or_else(|| anyhow::anyhow!("Run key is missing"))?;
    if enabled {
        key.set_value(&run_command(exe_path))
    } else {
        key.delete_value()
    }
}

#[cfg(not(windows))]
pub fn is_enabled() -> Result<bool> {
    Ok(false)
}

#[cfg(not(windows))]
pub fn set_enabled(_enabled: bool, _exe_path: &Path) -> Result<()> {
    anyhow::bail!("Launch at startup is only supported on Windows")
}

/// Command line stored in the Run key; quoted so paths with spaces survive.
pub fn run_command(exe_path: &Path) -> String {
    format!("\"{}\"", exe_path.display())
}
