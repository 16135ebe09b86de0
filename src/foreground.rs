use crate::error::{ForegroundError, Unsupported};

/// Source of the executable path owning the focused window.
pub trait ForegroundSource: Send + Sync {
    fn foreground_path(&self) -> Result<String, ForegroundError>;
}

/// Trailing segment of an executable path, used as the profile key.
pub fn owner_file_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn native_source() -> Result<Box<dyn ForegroundSource>, Unsupported> {
    #[cfg(windows)]
    {
        Ok(Box::new(win32::Win32Foreground))
    }

    #[cfg(not(windows))]
    {
        Err(Unsupported::new("Foreground window query", "requires Windows"))
    }
}

/// Source used when the platform has no foreground query.
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl ForegroundSource for UnavailableSource {
    fn foreground_path(&self) -> Result<String, ForegroundError> {
        Err(ForegroundError::Unavailable("no native foreground query".to_string()))
    }
}

#[cfg(windows)]
pub use win32::Win32Foreground;

#[cfg(windows)]
mod win32 {
    use super::ForegroundSource;
    use crate::error::ForegroundError;
    use windows::core::PWSTR;
    use windows::Win32::Foundation::{CloseHandle, MAX_PATH};
    use windows::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

    /// `GetForegroundWindow` → owning pid → `QueryFullProcessImageNameW`.
    #[derive(Debug, Default)]
    pub struct Win32Foreground;

    impl ForegroundSource for Win32Foreground {
        fn foreground_path(&self) -> Result<String, ForegroundError> {
            unsafe {
                let hwnd = GetForegroundWindow();
                if hwnd.is_invalid() {
                    return Err(ForegroundError::NoForegroundWindow);
                }

                let mut pid = 0u32;
                GetWindowThreadProcessId(hwnd, Some(&mut pid));
                if pid == 0 {
                    return Err(ForegroundError::NoForegroundWindow);
                }

                let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).map_err(|e| {
                    ForegroundError::OpenProcess {
                        pid,
                        message: e.message(),
                    }
                })?;

                let mut buffer = [0u16; MAX_PATH as usize * 2];
                let mut size = buffer.len() as u32;
                let result = QueryFullProcessImageNameW(
                    process,
                    PROCESS_NAME_WIN32,
                    PWSTR(buffer.as_mut_ptr()),
                    &mut size,
                );
                let _ = CloseHandle(process);

                result.map_err(|e| ForegroundError::QueryImageName {
                    pid,
                    message: e.message(),
                })?;

                Ok(String::from_utf16_lossy(&buffer[..size as usize]))
            }
        }
    }
}
