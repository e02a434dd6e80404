//! Camera settings state for picam-console.
//!
//! Every adjustable parameter is either a [`Cyclic`] index into a fixed label
//! list or a [`Clamped`] integer. [`Settings`] aggregates the ten of them and
//! is the whole session state of the console.

use std::fmt;

/// Exposure modes, in cycling order.
pub const EXPOSURE_MODES: &[&str] = &["off", "auto", "night", "backlight"];

/// Image effects, in cycling order.
pub const IMAGE_EFFECTS: &[&str] = &[
    "none",
    "negative",
    "solarize",
    "sketch",
    "denoise",
    "emboss",
    "oilpaint",
    "hatch",
    "gpen",
    "pastel",
    "watercolor",
    "film",
    "blur",
    "saturation",
    "colorswap",
    "washedout",
    "posterise",
    "colorpoint",
    "colorbalance",
    "cartoon",
    "deinterlace1",
    "deinterlace2",
];

/// Auto-white-balance modes, in cycling order.
pub const AWB_MODES: &[&str] = &[
    "off",
    "auto",
    "sunlight",
    "cloudy",
    "shade",
    "tungsten",
    "fluorescent",
    "incandescent",
    "flash",
    "horizon",
];

/// Metering modes, in cycling order.
pub const METER_MODES: &[&str] = &["average", "spot", "backlit", "matrix"];

/// ISO values, in cycling order. `0` is auto.
pub const ISO_VALUES: &[u32] = &[0, 100, 200, 320, 400, 500, 640, 800, 1000, 1250, 1600];

/// A cyclic index into a fixed, non-empty list of choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cyclic {
    index: usize,
    len: usize,
}

impl Cyclic {
    /// Create a cyclic index. Returns `None` if `index` is out of `[0, len)`.
    pub fn new(index: usize, len: usize) -> Option<Self> {
        (index < len).then_some(Self { index, len })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Advance to the next choice, wrapping to 0 after the last.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }
}

/// An integer with an inclusive range and saturating steps of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    value: i32,
    min: i32,
    max: i32,
}

impl Clamped {
    /// Create a clamped value. Returns `None` if `value` is outside `min..=max`.
    pub fn new(value: i32, min: i32, max: i32) -> Option<Self> {
        (min..=max)
            .contains(&value)
            .then_some(Self { value, min, max })
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn range(&self) -> (i32, i32) {
        (self.min, self.max)
    }

    pub fn increment(&mut self) {
        self.value = (self.value + 1).min(self.max);
    }

    pub fn decrement(&mut self) {
        self.value = (self.value - 1).max(self.min);
    }
}

/// An ISO choice as shown to the user and written to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iso {
    Auto,
    Value(u32),
}

impl Iso {
    /// Raw value for the device, where 0 means auto.
    pub fn as_raw(&self) -> u32 {
        match self {
            Iso::Auto => 0,
            Iso::Value(v) => *v,
        }
    }
}

impl fmt::Display for Iso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iso::Auto => write!(f, "auto"),
            Iso::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Inclusive ranges for the scalar settings.
pub const BRIGHTNESS_RANGE: (i32, i32) = (0, 100);
pub const SATURATION_RANGE: (i32, i32) = (-100, 100);
pub const CONTRAST_RANGE: (i32, i32) = (-100, 100);
pub const SHARPNESS_RANGE: (i32, i32) = (-100, 100);
pub const EXPOSURE_COMPENSATION_RANGE: (i32, i32) = (-25, 25);

/// Raw setting values as they are stored on disk.
///
/// Converted into [`Settings`] with [`Settings::from_raw`], which rejects any
/// out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSettings {
    pub exposure_index: usize,
    pub image_effect_index: usize,
    pub awb_index: usize,
    pub meter_index: usize,
    pub brightness: i32,
    pub saturation: i32,
    pub iso_index: usize,
    pub contrast: i32,
    pub sharpness: i32,
    pub exposure_compensation: i32,
}

/// Rejected raw value during conversion to [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} value {value} is out of range")]
pub struct OutOfRange {
    pub name: &'static str,
    pub value: i64,
}

/// The full session state of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub exposure: Cyclic,
    pub image_effect: Cyclic,
    pub awb: Cyclic,
    pub meter: Cyclic,
    pub brightness: Clamped,
    pub saturation: Clamped,
    pub iso: Cyclic,
    pub contrast: Clamped,
    pub sharpness: Clamped,
    pub exposure_compensation: Clamped,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exposure: Cyclic { index: 2, len: EXPOSURE_MODES.len() },
            image_effect: Cyclic { index: 0, len: IMAGE_EFFECTS.len() },
            awb: Cyclic { index: 1, len: AWB_MODES.len() },
            meter: Cyclic { index: 0, len: METER_MODES.len() },
            brightness: Clamped { value: 50, min: BRIGHTNESS_RANGE.0, max: BRIGHTNESS_RANGE.1 },
            saturation: Clamped { value: 0, min: SATURATION_RANGE.0, max: SATURATION_RANGE.1 },
            iso: Cyclic { index: 0, len: ISO_VALUES.len() },
            contrast: Clamped { value: 0, min: CONTRAST_RANGE.0, max: CONTRAST_RANGE.1 },
            sharpness: Clamped { value: 0, min: SHARPNESS_RANGE.0, max: SHARPNESS_RANGE.1 },
            exposure_compensation: Clamped {
                value: 0,
                min: EXPOSURE_COMPENSATION_RANGE.0,
                max: EXPOSURE_COMPENSATION_RANGE.1,
            },
        }
    }
}

fn cyclic(name: &'static str, index: usize, len: usize) -> Result<Cyclic, OutOfRange> {
    Cyclic::new(index, len).ok_or(OutOfRange {
        name,
        value: index as i64,
    })
}

fn clamped(name: &'static str, value: i32, range: (i32, i32)) -> Result<Clamped, OutOfRange> {
    Clamped::new(value, range.0, range.1).ok_or(OutOfRange {
        name,
        value: value as i64,
    })
}

impl Settings {
    /// Build settings from stored values, failing on the first value outside
    /// its list or range.
    pub fn from_raw(raw: RawSettings) -> Result<Self, OutOfRange> {
        Ok(Self {
            exposure: cyclic("exposure_index", raw.exposure_index, EXPOSURE_MODES.len())?,
            image_effect: cyclic("image_effect_index", raw.image_effect_index, IMAGE_EFFECTS.len())?,
            awb: cyclic("awb_index", raw.awb_index, AWB_MODES.len())?,
            meter: cyclic("meter_index", raw.meter_index, METER_MODES.len())?,
            brightness: clamped("brightness", raw.brightness, BRIGHTNESS_RANGE)?,
            saturation: clamped("saturation", raw.saturation, SATURATION_RANGE)?,
            iso: cyclic("iso_index", raw.iso_index, ISO_VALUES.len())?,
            contrast: clamped("contrast", raw.contrast, CONTRAST_RANGE)?,
            sharpness: clamped("sharpness", raw.sharpness, SHARPNESS_RANGE)?,
            exposure_compensation: clamped(
                "exposure_compensation",
                raw.exposure_compensation,
                EXPOSURE_COMPENSATION_RANGE,
            )?,
        })
    }

    pub fn to_raw(&self) -> RawSettings {
        RawSettings {
            exposure_index: self.exposure.index(),
            image_effect_index: self.image_effect.index(),
            awb_index: self.awb.index(),
            meter_index: self.meter.index(),
            brightness: self.brightness.value(),
            saturation: self.saturation.value(),
            iso_index: self.iso.index(),
            contrast: self.contrast.value(),
            sharpness: self.sharpness.value(),
            exposure_compensation: self.exposure_compensation.value(),
        }
    }

    pub fn exposure_mode(&self) -> &'static str {
        EXPOSURE_MODES[self.exposure.index()]
    }

    pub fn image_effect(&self) -> &'static str {
        IMAGE_EFFECTS[self.image_effect.index()]
    }

    pub fn awb_mode(&self) -> &'static str {
        AWB_MODES[self.awb.index()]
    }

    pub fn meter_mode(&self) -> &'static str {
        METER_MODES[self.meter.index()]
    }

    /// Current ISO choice; index 0 is always [`Iso::Auto`].
    pub fn iso(&self) -> Iso {
        match self.iso.index() {
            0 => Iso::Auto,
            i => Iso::Value(ISO_VALUES[i]),
        }
    }

    /// Multi-line summary of the effective settings, printed at startup.
    pub fn summary(&self) -> String {
        format!(
            "Camera settings:\n\
             \x20 Exposure mode:         {}\n\
             \x20 Image effect:          {}\n\
             \x20 AWB mode:              {}\n\
             \x20 Meter mode:            {}\n\
             \x20 Brightness:            {}\n\
             \x20 Saturation:            {}\n\
             \x20 ISO:                   {}\n\
             \x20 Contrast:              {}\n\
             \x20 Sharpness:             {}\n\
             \x20 Exposure compensation: {}",
            self.exposure_mode(),
            self.image_effect(),
            self.awb_mode(),
            self.meter_mode(),
            self.brightness.value(),
            self.saturation.value(),
            self.iso(),
            self.contrast.value(),
            self.sharpness.value(),
            self.exposure_compensation.value(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_cyclic(settings: &mut Settings) -> Vec<&mut Cyclic> {
        vec![
            &mut settings.exposure,
            &mut settings.image_effect,
            &mut settings.awb,
            &mut settings.meter,
            &mut settings.iso,
        ]
    }

    fn all_clamped(settings: &mut Settings) -> Vec<&mut Clamped> {
        vec![
            &mut settings.brightness,
            &mut settings.saturation,
            &mut settings.contrast,
            &mut settings.sharpness,
            &mut settings.exposure_compensation,
        ]
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.exposure_mode(), "night");
        assert_eq!(settings.image_effect(), "none");
        assert_eq!(settings.awb_mode(), "auto");
        assert_eq!(settings.meter_mode(), "average");
        assert_eq!(settings.brightness.value(), 50);
        assert_eq!(settings.saturation.value(), 0);
        assert_eq!(settings.iso(), Iso::Auto);
        assert_eq!(settings.contrast.value(), 0);
        assert_eq!(settings.sharpness.value(), 0);
        assert_eq!(settings.exposure_compensation.value(), 0);
    }

    #[test]
    fn test_cyclic_wraps_after_len_advances() {
        let mut settings = Settings::default();
        for c in all_cyclic(&mut settings) {
            for start in 0..c.len() {
                let mut cycle = Cyclic::new(start, c.len()).unwrap();
                for _ in 0..c.len() {
                    cycle.advance();
                }
                assert_eq!(cycle.index(), start);
            }
            let original = *c;
            for _ in 0..c.len() {
                c.advance();
            }
            assert_eq!(*c, original);
        }
    }

    #[test]
    fn test_cyclic_rejects_out_of_range() {
        assert!(Cyclic::new(4, 4).is_none());
        assert!(Cyclic::new(3, 4).is_some());
    }

    #[test]
    fn test_clamped_saturates_at_bounds() {
        let mut settings = Settings::default();
        for c in all_clamped(&mut settings) {
            let (min, max) = c.range();
            for _ in 0..500 {
                c.increment();
                assert!(c.value() <= max);
            }
            assert_eq!(c.value(), max);
            for _ in 0..500 {
                c.decrement();
                assert!(c.value() >= min);
            }
            assert_eq!(c.value(), min);
        }
    }

    #[test]
    fn test_clamped_rejects_out_of_range() {
        assert!(Clamped::new(101, 0, 100).is_none());
        assert!(Clamped::new(-1, 0, 100).is_none());
        assert!(Clamped::new(100, 0, 100).is_some());
    }

    #[test]
    fn test_exposure_cycle_from_default() {
        let mut settings = Settings::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            settings.exposure.advance();
            seen.push(settings.exposure_mode());
        }
        assert_eq!(seen, vec!["backlight", "off", "auto"]);
    }

    #[test]
    fn test_iso_last_wraps_to_auto() {
        let mut settings = Settings::default();
        settings.iso = Cyclic::new(10, ISO_VALUES.len()).unwrap();
        assert_eq!(settings.iso(), Iso::Value(1600));
        settings.iso.advance();
        assert_eq!(settings.iso.index(), 0);
        assert_eq!(settings.iso().to_string(), "auto");
    }

    #[test]
    fn test_iso_auto_never_numeric_in_summary() {
        let settings = Settings::default();
        let summary = settings.summary();
        let line = summary
            .lines()
            .find(|l| l.trim_start().starts_with("ISO:"))
            .unwrap();
        assert!(line.ends_with("auto"));
        assert!(!line.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_raw_round_trip() {
        let mut settings = Settings::default();
        settings.awb.advance();
        settings.brightness.increment();
        settings.exposure_compensation.decrement();
        assert_eq!(Settings::from_raw(settings.to_raw()), Ok(settings));
    }

    #[test]
    fn test_from_raw_rejects_bad_index() {
        let mut raw = Settings::default().to_raw();
        raw.meter_index = 4;
        let err = Settings::from_raw(raw).unwrap_err();
        assert_eq!(err.name, "meter_index");
    }

    #[test]
    fn test_from_raw_rejects_bad_scalar() {
        let mut raw = Settings::default().to_raw();
        raw.exposure_compensation = 26;
        assert!(Settings::from_raw(raw).is_err());
    }
}
