use anyhow::Result;

use crate::error::Unsupported;
use crate::ramp::GammaRamp;
use crate::{log_error, log_warn};

/// Opaque display device context returned by [`GammaDriver::create_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceContext(pub isize);

/// Collapse the over-escaped device path some enumerators report
/// (`\\\\.\DISPLAY1`) to the form `CreateDCW` accepts (`\\.\DISPLAY1`).
/// Only the first occurrence is rewritten.
pub fn normalize_display_name(name: &str) -> String {
    name.replacen(r"\\\\.", r"\\.", 1)
}

/// Per-display gamma ramp access.
pub trait GammaDriver: Send + Sync {
    /// Open a device context for `display_name`. `None` when the OS refuses.
    fn create_context(&self, display_name: &str) -> Option<DeviceContext>;

    fn get_ramp(&self, context: DeviceContext) -> Result<GammaRamp>;

    fn set_ramp(&self, context: DeviceContext, ramp: &GammaRamp) -> bool;

    fn delete_context(&self, context: DeviceContext);

    /// Create a context, install `ramp`, release the context.
    ///
    /// Never calls `set_ramp` with a context that failed to open.
    fn apply_ramp(&self, display_name: &str, ramp: &GammaRamp) -> bool {
        let Some(context) = self.create_context(display_name) else {
            log_warn!("Could not open device context for display {}", display_name);
            return false;
        };
        let applied = self.set_ramp(context, ramp);
        self.delete_context(context);
        if !applied {
            log_error!("Display {} rejected gamma ramp", display_name);
        }
        applied
    }

    /// Read the ramp currently installed on `display_name`.
    fn read_ramp(&self, display_name: &str) -> Result<GammaRamp> {
        let context = self
            .create_context(display_name)
            .ok_or_else(|| anyhow::anyhow!("Could not open device context for display {}", display_name))?;
        let ramp = self.get_ramp(context);
        self.delete_context(context);
        ramp
    }
}

/// Driver used when native gamma control is unavailable. Every context
/// creation fails, so nothing is ever written.
#[derive(Debug, Default)]
pub struct NullDriver;

impl GammaDriver for NullDriver {
    fn create_context(&self, _display_name: &str) -> Option<DeviceContext> {
        None
    }

    fn get_ramp(&self, _context: DeviceContext) -> Result<GammaRamp> {
        anyhow::bail!("Gamma ramps are not available on this platform")
    }

    fn set_ramp(&self, _context: DeviceContext, _ramp: &GammaRamp) -> bool {
        false
    }

    fn delete_context(&self, _context: DeviceContext) {}
}

/// Pick the GDI driver when the platform has one.
pub fn native_driver() -> std::result::Result<Box<dyn GammaDriver>, Unsupported> {
    #[cfg(windows)]
    {
        Ok(Box::new(gdi::GdiDriver))
    }

    #[cfg(not(windows))]
    {
        Err(Unsupported::new("Display gamma control", "GDI gamma ramps require Windows"))
    }
}

#[cfg(windows)]
pub use gdi::GdiDriver;

#[cfg(windows)]
mod gdi {
    use super::{normalize_display_name, DeviceContext, GammaDriver};
    use crate::ramp::GammaRamp;
    use anyhow::Result;
    use windows::core::PCWSTR;
    use windows::Win32::Graphics::Gdi::{CreateDCW, DeleteDC, HDC};
    use windows::Win32::UI::ColorSystem::{GetDeviceGammaRamp, SetDeviceGammaRamp};

    /// `CreateDCW` / `Get|SetDeviceGammaRamp` / `DeleteDC` from gdi32.
    #[derive(Debug, Default)]
    pub struct GdiDriver;

    fn hdc(context: DeviceContext) -> HDC {
        HDC(context.0 as *mut _)
    }

    impl GammaDriver for GdiDriver {
        fn create_context(&self, display_name: &str) -> Option<DeviceContext> {
            let name = normalize_display_name(display_name);
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();

            let dc = unsafe { CreateDCW(PCWSTR::null(), PCWSTR(wide.as_ptr()), PCWSTR::null(), None) };
            if dc.is_invalid() {
                None
            } else {
                Some(DeviceContext(dc.0 as isize))
            }
        }

        fn get_ramp(&self, context: DeviceContext) -> Result<GammaRamp> {
            let mut ramp = GammaRamp::zeroed();
            let ok = unsafe { GetDeviceGammaRamp(hdc(context), &mut ramp as *mut GammaRamp as *mut _) };
            if !ok.as_bool() {
                anyhow::bail!("GetDeviceGammaRamp failed");
            }
            Ok(ramp)
        }

        fn set_ramp(&self, context: DeviceContext, ramp: &GammaRamp) -> bool {
            unsafe { SetDeviceGammaRamp(hdc(context), ramp as *const GammaRamp as *const _) }.as_bool()
        }

        fn delete_context(&self, context: DeviceContext) {
            unsafe {
                let _ = DeleteDC(hdc(context));
            }
        }
    }
}
