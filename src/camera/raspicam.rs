//! Camera backend for the legacy Raspberry Pi camera stack.
//!
//! The preview is a long-running `raspivid -t 0` child; stills are taken with
//! a one-shot `raspistill`. Both read every setting from the command line,
//! so the backend mirrors each property written to it and respawns the
//! preview whenever one changes.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use super::types::{CameraError, Crop, Property, Resolution};
use super::Camera;

/// Time `raspistill` runs its own metering before taking the shot, in ms.
const STILL_TIMEOUT_MS: u32 = 500;

/// How long a stopping preview gets after SIGINT before it is killed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// `raspivid`/`raspistill` accept EV compensation in this range only.
const EV_RANGE: (i32, i32) = (-10, 10);

/// Last value written for each property.
#[derive(Debug, Clone, PartialEq)]
struct Mirror {
    framerate: u32,
    hflip: bool,
    vflip: bool,
    rotation: u32,
    crop: Crop,
    video_stabilization: bool,
    resolution: Resolution,
    exposure_mode: &'static str,
    image_effect: &'static str,
    awb_mode: &'static str,
    meter_mode: &'static str,
    brightness: i32,
    contrast: i32,
    sharpness: i32,
    saturation: i32,
    exposure_compensation: i32,
    iso: u32,
    annotation: String,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            framerate: 30,
            hflip: false,
            vflip: false,
            rotation: 0,
            crop: Crop::FULL,
            video_stabilization: false,
            resolution: Resolution::BINNED_4_3,
            exposure_mode: "auto",
            image_effect: "none",
            awb_mode: "auto",
            meter_mode: "average",
            brightness: 50,
            contrast: 0,
            sharpness: 0,
            saturation: 0,
            exposure_compensation: 0,
            iso: 0,
            annotation: String::new(),
        }
    }
}

impl Mirror {
    fn apply(&mut self, property: Property) {
        match property {
            Property::FrameRate(fps) => self.framerate = fps,
            Property::Orientation {
                hflip,
                vflip,
                rotation,
            } => {
                self.hflip = hflip;
                self.vflip = vflip;
                self.rotation = rotation;
            }
            Property::Crop(crop) => self.crop = crop,
            Property::VideoStabilization(on) => self.video_stabilization = on,
            Property::Resolution(res) => self.resolution = res,
            Property::ExposureMode(mode) => self.exposure_mode = mode,
            Property::ImageEffect(effect) => self.image_effect = effect,
            Property::AwbMode(mode) => self.awb_mode = mode,
            Property::MeterMode(mode) => self.meter_mode = mode,
            Property::Brightness(v) => self.brightness = v,
            Property::Contrast(v) => self.contrast = v,
            Property::Sharpness(v) => self.sharpness = v,
            Property::Saturation(v) => self.saturation = v,
            Property::ExposureCompensation(v) => self.exposure_compensation = v,
            Property::Iso(v) => self.iso = v,
            Property::Annotation(text) => self.annotation = text,
        }
    }

    /// Arguments shared by preview and still capture.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "-w".to_string(),
            self.resolution.width.to_string(),
            "-h".to_string(),
            self.resolution.height.to_string(),
            "-ex".to_string(),
            self.exposure_mode.to_string(),
            "-ifx".to_string(),
            // raspicam spells it the British way
            match self.image_effect {
                "solarize" => "solarise".to_string(),
                other => other.to_string(),
            },
            "-awb".to_string(),
            self.awb_mode.to_string(),
            "-mm".to_string(),
            self.meter_mode.to_string(),
            "-br".to_string(),
            self.brightness.to_string(),
            "-co".to_string(),
            self.contrast.to_string(),
            "-sh".to_string(),
            self.sharpness.to_string(),
            "-sa".to_string(),
            self.saturation.to_string(),
            "-ev".to_string(),
            self.exposure_compensation
                .clamp(EV_RANGE.0, EV_RANGE.1)
                .to_string(),
            "-rot".to_string(),
            self.rotation.to_string(),
            "-roi".to_string(),
            format!(
                "{},{},{},{}",
                self.crop.x, self.crop.y, self.crop.width, self.crop.height
            ),
        ];
        if self.iso != 0 {
            args.push("-ISO".to_string());
            args.push(self.iso.to_string());
        }
        if self.hflip {
            args.push("-hf".to_string());
        }
        if self.vflip {
            args.push("-vf".to_string());
        }
        if self.video_stabilization {
            args.push("-vs".to_string());
        }
        if !self.annotation.is_empty() {
            args.push("-a".to_string());
            args.push(self.annotation.clone());
        }
        args
    }

    fn preview_args(&self) -> Vec<String> {
        let mut args = vec![
            "-t".to_string(),
            "0".to_string(),
            "-fps".to_string(),
            self.framerate.to_string(),
        ];
        args.extend(self.common_args());
        args
    }

    fn still_args(&self, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-t".to_string(),
            STILL_TIMEOUT_MS.to_string(),
            "-n".to_string(),
            "-o".to_string(),
            path.display().to_string(),
        ];
        args.extend(self.common_args());
        args
    }
}

/// Raspberry Pi camera driven through the `raspivid`/`raspistill` binaries.
pub struct RaspiCam {
    preview_binary: String,
    still_binary: String,
    mirror: Mirror,
    preview: Option<Child>,
    /// Whether the preview should be running (survives captures)
    previewing: bool,
    closed: bool,
    /// Number of preview processes started so far
    preview_spawns: usize,
}

impl RaspiCam {
    /// Open the camera with the given preview and still binaries.
    pub fn with_binaries(preview: impl Into<String>, still: impl Into<String>) -> Self {
        Self {
            preview_binary: preview.into(),
            still_binary: still.into(),
            mirror: Mirror::default(),
            preview: None,
            previewing: false,
            closed: false,
            preview_spawns: 0,
        }
    }

    /// Whether a preview process is currently alive.
    pub fn is_previewing(&mut self) -> bool {
        match self.preview.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn ensure_open(&self) -> Result<(), CameraError> {
        if self.closed {
            Err(CameraError::Closed)
        } else {
            Ok(())
        }
    }

    fn spawn(binary: &str, args: &[String]) -> Result<Child, CameraError> {
        Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CameraError::BinaryNotFound(binary.to_string())
                } else {
                    CameraError::SpawnFailed(e)
                }
            })
    }

    fn spawn_preview(&mut self) -> Result<(), CameraError> {
        let args = self.mirror.preview_args();
        log::debug!(
            "Starting preview #{}: {} {}",
            self.preview_spawns + 1,
            self.preview_binary,
            args.join(" ")
        );
        self.preview = Some(Self::spawn(&self.preview_binary, &args)?);
        self.preview_spawns += 1;
        Ok(())
    }

    /// Stop the preview child: SIGINT first, SIGKILL after the timeout.
    fn kill_preview(&mut self) -> Result<Option<ExitStatus>, CameraError> {
        let Some(mut child) = self.preview.take() else {
            return Ok(None);
        };

        #[cfg(unix)]
        {
            unsafe {
                libc::kill(child.id() as i32, libc::SIGINT);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = child.kill();
        }

        let start = Instant::now();
        loop {
            match child.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None => {
                    if start.elapsed() > SHUTDOWN_TIMEOUT {
                        let _ = child.kill();
                        return Ok(Some(child.wait()?));
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }
    }
}

impl Camera for RaspiCam {
    fn set(&mut self, property: Property) -> Result<(), CameraError> {
        self.set_all(vec![property])
    }

    fn set_all(&mut self, properties: Vec<Property>) -> Result<(), CameraError> {
        self.ensure_open()?;
        let before = self.mirror.clone();
        for property in properties {
            self.mirror.apply(property);
        }
        if self.previewing && self.mirror != before {
            self.kill_preview()?;
            self.spawn_preview()?;
        }
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.ensure_open()?;
        if self.preview.is_none() {
            self.spawn_preview()?;
        }
        self.previewing = true;
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        self.ensure_open()?;
        self.previewing = false;
        self.kill_preview()?;
        Ok(())
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        self.capture_then(path, Vec::new())
    }

    fn capture_then(&mut self, path: &Path, after: Vec<Property>) -> Result<(), CameraError> {
        self.ensure_open()?;

        // The sensor can only be owned by one process at a time.
        self.kill_preview()?;

        let args = self.mirror.still_args(path);
        log::debug!("Capturing: {} {}", self.still_binary, args.join(" "));
        let status = Self::spawn(&self.still_binary, &args)?.wait()?;

        if status.success() {
            for property in after {
                self.mirror.apply(property);
            }
        }
        if self.previewing {
            self.spawn_preview()?;
        }

        if status.success() {
            log::info!("Captured {}", path.display());
            Ok(())
        } else {
            Err(CameraError::CaptureFailed {
                path: path.display().to_string(),
                exit_code: status.code(),
            })
        }
    }

    fn close(&mut self) -> Result<(), CameraError> {
        if self.closed {
            return Ok(());
        }
        self.previewing = false;
        self.closed = true;
        self.kill_preview()?;
        Ok(())
    }
}

impl Drop for RaspiCam {
    fn drop(&mut self) {
        // Best-effort cleanup - ignore errors during drop
        let _ = self.kill_preview();
    }
}
