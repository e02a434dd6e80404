//! Camera property and error types.

use std::fmt;

/// Camera resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Full sensor field of view at 2x2 binning on the v1 module.
    pub const BINNED_4_3: Resolution = Resolution {
        width: 1296,
        height: 972,
    };
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Region of interest as fractions of the full frame: `(x, y, w, h)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Crop {
    pub const FULL: Crop = Crop {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

/// A single property write forwarded to the camera device.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    FrameRate(u32),
    Orientation {
        hflip: bool,
        vflip: bool,
        rotation: u32,
    },
    Crop(Crop),
    VideoStabilization(bool),
    Resolution(Resolution),
    ExposureMode(&'static str),
    ImageEffect(&'static str),
    AwbMode(&'static str),
    MeterMode(&'static str),
    Brightness(i32),
    Contrast(i32),
    Sharpness(i32),
    Saturation(i32),
    ExposureCompensation(i32),
    /// ISO value, where 0 is auto.
    Iso(u32),
    /// Text overlaid on the preview.
    Annotation(String),
}

/// Errors that can occur during camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    /// The camera binary is not installed
    #[error("Camera binary '{0}' not found. Is the legacy camera stack (raspistill) installed?")]
    BinaryNotFound(String),
    /// Failed to spawn the camera process
    #[error("Failed to start camera process: {0}")]
    SpawnFailed(#[source] std::io::Error),
    /// Still capture exited unsuccessfully
    #[error("Capture to '{path}' failed with exit code {exit_code:?}")]
    CaptureFailed {
        path: String,
        exit_code: Option<i32>,
    },
    /// The device was already closed
    #[error("Camera is closed")]
    Closed,
    /// I/O error while talking to the camera process
    #[error("Camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}
