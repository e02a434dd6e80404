//! The parameter console: keystrokes in, camera writes out.
//!
//! [`Console`] owns the session [`Settings`] and the camera for the whole
//! run. It reads one byte at a time, looks the key up in the
//! [`keymap`](crate::keymap) table and forwards the resulting property to
//! the device.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::camera::{Camera, CameraError, Crop, Property, Resolution};
use crate::config::{self, ConfigError};
use crate::keymap::{self, Action};
use crate::settings::Settings;
use crate::terminal::TerminalError;

/// Preview frame rate.
pub const FRAME_RATE: u32 = 15;

/// Preview and capture resolution.
pub const RESOLUTION: Resolution = Resolution::BINNED_4_3;

/// How long the console waits after a capture before reading more keys.
pub const CAPTURE_SETTLE: Duration = Duration::from_secs(1);

/// Timestamp format of captured file names, one-second resolution.
const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Errors that end the interactive session.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error("Failed to read keyboard input: {0}")]
    Input(#[source] io::Error),
}

/// How the key loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `q` was pressed; settings were saved
    Quit,
    /// Input closed before `q`; settings were not saved
    EndOfInput,
}

/// Build the path of a still captured at `at`.
///
/// Two captures within the same second map to the same file.
pub fn capture_path(output_dir: &Path, at: &NaiveDateTime) -> PathBuf {
    output_dir.join(format!("image{}.jpg", at.format(TIMESTAMP_FORMAT)))
}

/// Interactive controller for one camera session.
pub struct Console<C: Camera> {
    camera: C,
    settings: Settings,
    output_dir: PathBuf,
    config_path: PathBuf,
    settle: Duration,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<C: Camera> Console<C> {
    pub fn new(camera: C, settings: Settings, output_dir: PathBuf, config_path: PathBuf) -> Self {
        Self {
            camera,
            settings,
            output_dir,
            config_path,
            settle: CAPTURE_SETTLE,
            clock: local_now,
        }
    }

    /// Override the post-capture wait.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Override the time source used for capture file names.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Configure the device from the fixed setup and current settings, then
    /// start the preview.
    pub fn start(&mut self) -> Result<(), ConsoleError> {
        let s = &self.settings;
        let setup = [
            Property::FrameRate(FRAME_RATE),
            Property::Orientation {
                hflip: true,
                vflip: true,
                rotation: 0,
            },
            Property::Crop(Crop::FULL),
            Property::VideoStabilization(false),
            Property::Resolution(RESOLUTION),
            Property::ExposureMode(s.exposure_mode()),
            Property::ImageEffect(s.image_effect()),
            Property::AwbMode(s.awb_mode()),
            Property::MeterMode(s.meter_mode()),
            Property::Brightness(s.brightness.value()),
            Property::Saturation(s.saturation.value()),
            Property::Iso(s.iso().as_raw()),
            Property::Contrast(s.contrast.value()),
            Property::Sharpness(s.sharpness.value()),
            Property::ExposureCompensation(s.exposure_compensation.value()),
        ];
        for property in setup {
            self.camera.set(property)?;
        }
        self.camera.start_preview()?;
        log::info!("Preview started at {} {}fps", RESOLUTION, FRAME_RATE);
        Ok(())
    }

    /// Run the key loop until `q` or end of input.
    pub fn run<R: Read>(&mut self, mut input: R) -> Result<Exit, ConsoleError> {
        loop {
            let Some(key) = read_key(&mut input).map_err(ConsoleError::Input)? else {
                log::warn!("Input closed; releasing camera without saving settings");
                self.camera.close()?;
                return Ok(Exit::EndOfInput);
            };

            match keymap::lookup(key) {
                Some(Action::Quit) => {
                    self.quit()?;
                    return Ok(Exit::Quit);
                }
                Some(Action::Capture) => self.capture()?,
                Some(Action::Adjust(label, update)) => {
                    let property = update(&mut self.settings);
                    let text = keymap::display_value(&property)
                        .map(|value| format!("{}: {}", label, value));
                    let mut batch = vec![property];
                    if let Some(text) = text {
                        batch.push(announce(text));
                    }
                    self.camera.set_all(batch)?;
                }
                None => log::debug!("Ignoring key {:?}", key),
            }
        }
    }

    fn capture(&mut self) -> Result<(), ConsoleError> {
        let path = capture_path(&self.output_dir, &(self.clock)());
        let text = "Captured".to_string();
        self.camera
            .capture_then(&path, vec![Property::Annotation(text.clone())])?;
        println!("{}", text);
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        Ok(())
    }

    fn quit(&mut self) -> Result<(), ConsoleError> {
        self.camera.stop_preview()?;
        self.camera.close()?;
        config::save(&self.config_path, &self.settings)?;
        Ok(())
    }
}

/// Print `text` and turn it into the on-screen annotation write.
fn announce(text: String) -> Property {
    println!("{}", text);
    Property::Annotation(text)
}

/// Read one key. Returns `None` at end of input.
///
/// Bytes outside ASCII are returned as-is and end up unbound.
fn read_key<R: Read>(input: &mut R) -> io::Result<Option<char>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0] as char)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_capture_path_format() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(
            capture_path(Path::new("/tmp/photos"), &at),
            PathBuf::from("/tmp/photos/image2024_01_02_03_04_05.jpg")
        );
    }

    #[test]
    fn test_capture_path_same_second_collides() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 100)
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 900)
            .unwrap();
        let dir = Path::new("/tmp");
        assert_eq!(capture_path(dir, &at), capture_path(dir, &later));
    }

    #[test]
    fn test_read_key_sequence_and_eof() {
        let mut input: &[u8] = b"eq";
        assert_eq!(read_key(&mut input).unwrap(), Some('e'));
        assert_eq!(read_key(&mut input).unwrap(), Some('q'));
        assert_eq!(read_key(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_key_retries_interrupted() {
        struct Flaky {
            interrupted: bool,
        }
        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
                buf[0] = b' ';
                Ok(1)
            }
        }
        let mut input = Flaky { interrupted: false };
        assert_eq!(read_key(&mut input).unwrap(), Some(' '));
    }
}
