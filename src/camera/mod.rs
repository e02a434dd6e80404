//! Camera device access for picam-console.
//!
//! The console only talks to the device through the [`Camera`] trait:
//! - Property writes via [`Camera::set`] and [`Camera::set_all`]
//! - Preview control, still capture and release
//!
//! [`RaspiCam`] is the hardware backend, driving the `raspivid` and `raspistill` binaries.

mod raspicam;
mod types;

pub use raspicam::RaspiCam;
pub use types::{CameraError, Crop, Property, Resolution};

use std::path::Path;

/// A camera device that accepts property writes and captures stills.
///
/// Writes are fire-and-forget: an implementation applies the value or
/// returns an error, and the caller never retries.
pub trait Camera {
    /// Write one property to the device.
    fn set(&mut self, property: Property) -> Result<(), CameraError>;

    /// Write several properties as one change.
    ///
    /// Backends that must restart the preview to apply a write restart it
    /// once for the whole batch.
    fn set_all(&mut self, properties: Vec<Property>) -> Result<(), CameraError> {
        for property in properties {
            self.set(property)?;
        }
        Ok(())
    }

    /// Start the live preview.
    fn start_preview(&mut self) -> Result<(), CameraError>;

    /// Stop the live preview.
    fn stop_preview(&mut self) -> Result<(), CameraError>;

    /// Capture a still image to `path`. Blocks until the device accepted it.
    fn capture(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Capture a still to `path`, then write `after` before the preview
    /// resumes. `after` is only written if the capture succeeded.
    fn capture_then(&mut self, path: &Path, after: Vec<Property>) -> Result<(), CameraError> {
        self.capture(path)?;
        self.set_all(after)
    }

    /// Release the device. No further calls are valid afterwards.
    fn close(&mut self) -> Result<(), CameraError>;
}
