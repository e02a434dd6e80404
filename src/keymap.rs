//! Key bindings for the parameter console.
//!
//! Each key maps to one [`Action`]. Settings actions carry a plain update
//! function which mutates exactly one setting and returns the device write
//! that mirrors it.

use crate::camera::Property;
use crate::settings::Settings;

/// Update function for one settings key.
pub type Update = fn(&mut Settings) -> Property;

/// What a key press does.
#[derive(Clone, Copy)]
pub enum Action {
    /// Capture a still image
    Capture,
    /// Stop, save and exit
    Quit,
    /// Mutate one setting and forward it to the device
    Adjust(&'static str, Update),
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Capture => write!(f, "Capture"),
            Action::Quit => write!(f, "Quit"),
            Action::Adjust(label, _) => write!(f, "Adjust({})", label),
        }
    }
}

/// The fixed key table. Keys are lowercase; lookups fold case first.
pub const KEY_TABLE: &[(char, Action)] = &[
    (' ', Action::Capture),
    ('q', Action::Quit),
    ('e', Action::Adjust("Exposure mode", next_exposure_mode)),
    ('i', Action::Adjust("Image effect", next_image_effect)),
    ('b', Action::Adjust("AWB mode", next_awb_mode)),
    ('m', Action::Adjust("Meter mode", next_meter_mode)),
    ('a', Action::Adjust("Brightness", brightness_down)),
    ('d', Action::Adjust("Brightness", brightness_up)),
    ('w', Action::Adjust("Saturation", saturation_up)),
    ('s', Action::Adjust("Saturation", saturation_down)),
    ('r', Action::Adjust("ISO", next_iso)),
    ('o', Action::Adjust("Contrast", contrast_down)),
    ('p', Action::Adjust("Contrast", contrast_up)),
    ('k', Action::Adjust("Sharpness", sharpness_down)),
    ('l', Action::Adjust("Sharpness", sharpness_up)),
    ('h', Action::Adjust("Exposure compensation", exposure_compensation_down)),
    ('j', Action::Adjust("Exposure compensation", exposure_compensation_up)),
];

/// Look up the action for a key, folding it to lowercase first.
pub fn lookup(key: char) -> Option<Action> {
    let key = key.to_ascii_lowercase();
    KEY_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, action)| *action)
}

/// Human-readable value of a property written by a settings key.
///
/// Returns `None` for device setup writes, which no key produces.
pub fn display_value(property: &Property) -> Option<String> {
    match property {
        Property::ExposureMode(s)
        | Property::ImageEffect(s)
        | Property::AwbMode(s)
        | Property::MeterMode(s) => Some(s.to_string()),
        Property::Brightness(v)
        | Property::Contrast(v)
        | Property::Sharpness(v)
        | Property::Saturation(v)
        | Property::ExposureCompensation(v) => Some(v.to_string()),
        Property::Iso(0) => Some("auto".to_string()),
        Property::Iso(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Short help text listing every binding.
pub fn help() -> &'static str {
    "Keys:\n\
     \x20 space  capture          q  quit\n\
     \x20 e  exposure mode        i  image effect\n\
     \x20 b  AWB mode             m  meter mode\n\
     \x20 a/d  brightness -/+     w/s  saturation +/-\n\
     \x20 r  ISO                  o/p  contrast -/+\n\
     \x20 k/l  sharpness -/+      h/j  exposure compensation -/+"
}

fn next_exposure_mode(s: &mut Settings) -> Property {
    s.exposure.advance();
    Property::ExposureMode(s.exposure_mode())
}

fn next_image_effect(s: &mut Settings) -> Property {
    s.image_effect.advance();
    Property::ImageEffect(s.image_effect())
}

fn next_awb_mode(s: &mut Settings) -> Property {
    s.awb.advance();
    Property::AwbMode(s.awb_mode())
}

fn next_meter_mode(s: &mut Settings) -> Property {
    s.meter.advance();
    Property::MeterMode(s.meter_mode())
}

fn next_iso(s: &mut Settings) -> Property {
    s.iso.advance();
    Property::Iso(s.iso().as_raw())
}

fn brightness_up(s: &mut Settings) -> Property {
    s.brightness.increment();
    Property::Brightness(s.brightness.value())
}

fn brightness_down(s: &mut Settings) -> Property {
    s.brightness.decrement();
    Property::Brightness(s.brightness.value())
}

fn saturation_up(s: &mut Settings) -> Property {
    s.saturation.increment();
    Property::Saturation(s.saturation.value())
}

fn saturation_down(s: &mut Settings) -> Property {
    s.saturation.decrement();
    Property::Saturation(s.saturation.value())
}

fn contrast_up(s: &mut Settings) -> Property {
    s.contrast.increment();
    Property::Contrast(s.contrast.value())
}

fn contrast_down(s: &mut Settings) -> Property {
    s.contrast.decrement();
    Property::Contrast(s.contrast.value())
}

fn sharpness_up(s: &mut Settings) -> Property {
    s.sharpness.increment();
    Property::Sharpness(s.sharpness.value())
}

fn sharpness_down(s: &mut Settings) -> Property {
    s.sharpness.decrement();
    Property::Sharpness(s.sharpness.value())
}

fn exposure_compensation_up(s: &mut Settings) -> Property {
    s.exposure_compensation.increment();
    Property::ExposureCompensation(s.exposure_compensation.value())
}

fn exposure_compensation_down(s: &mut Settings) -> Property {
    s.exposure_compensation.decrement();
    Property::ExposureCompensation(s.exposure_compensation.value())
}
