//! Builds the color command frame for a light.
//!
//! The encoder is a pure function of the light's state, its family
//! and the white-mixing thresholds. It never touches the state and
//! never performs I/O; the caller hands the resulting `Command` to a
//! `Transport`, which appends the checksum.
//!
//! Frame layouts (the checksum isn't part of a `Command`):
//!
//!   RGB only:          [0x31, R, G, B, 0x00, mask, 0x0F]
//!   RGB + warm:        [0x31, R, G, B, WW, mask, 0x0F]
//!   RGB + warm + cold: [0x31, R, G, B, WW, CW, mask, 0x0F]
//!
//! Reversed RGB strips swap the R and G bytes.

use crate::{
    color::{self, clamp},
    light::LightState,
    profile::{ChannelOrder, Family, Profile},
    whites,
};
use serde_derive::Deserialize;
use tracing::{debug, warn};

pub const OPCODE_COLOR: u8 = 0x31;
pub const TERMINATOR: u8 = 0x0F;

/// Tells the controller which group of LEDs to light.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Mask {
    Color = 0xF0,
    White = 0x0F,
    Both = 0xFF,
}

// A (hue, saturation) pair emitted by a host's color picker for one
// of its preset swatches. These are compared exactly.

type Swatch = (u16, u8);

/// The host's "warm white" preset.
pub const WARM_WHITE_SWATCH: Swatch = (31, 33);

/// The host's "cool white" preset.
pub const COOL_WHITE_SWATCH: Swatch = (208, 17);

/// Plain white with no hue.
pub const NEUTRAL_SWATCH: Swatch = (0, 0);

/// The saturation levels used to decide when the white channels take
/// over from the color channels.

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Thresholds {
    /// Below this saturation, non-simultaneous devices switch to
    /// their white LEDs.
    pub color_white_threshold: u8,
    /// Below this saturation, simultaneous devices blend fully
    /// saturated color with white.
    pub color_white_threshold_simultaneous: u8,
    /// Below this saturation, simultaneous devices turn their color
    /// LEDs off.
    pub color_off_threshold_simultaneous: u8,
    /// Enables the color/white blend on simultaneous devices.
    pub allow_simultaneous_color_white: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            color_white_threshold: 33,
            color_white_threshold_simultaneous: 50,
            color_off_threshold_simultaneous: 5,
            allow_simultaneous_color_white: true,
        }
    }
}

/// An encoded color frame, ready to be handed to a `Transport`.

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command(Vec<u8>);

impl Command {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the mask byte, which always precedes the terminator.

    pub fn mask(&self) -> u8 {
        self.0[self.0.len() - 2]
    }
}

impl AsRef<[u8]> for Command {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// The five channel values before they're laid out for a family.

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
struct Channels {
    r: u8,
    g: u8,
    b: u8,
    ww: u8,
    cw: u8,
}

impl Channels {
    fn without_color(self) -> Self {
        Channels {
            r: 0,
            g: 0,
            b: 0,
            ..self
        }
    }

    fn without_white(self) -> Self {
        Channels {
            ww: 0,
            cw: 0,
            ..self
        }
    }

    fn warm_only(brightness: u8) -> Self {
        Channels {
            ww: scale(255, brightness),
            ..Channels::default()
        }
    }

    fn cold_only(brightness: u8) -> Self {
        Channels {
            cw: scale(255, brightness),
            ..Channels::default()
        }
    }
}

// Applies the brightness percentage to a channel value.

fn scale(v: u8, brightness: u8) -> u8 {
    clamp(
        ((f64::from(v) / 100.0) * f64::from(brightness)).round(),
        0.0,
        255.0,
    ) as u8
}

fn is_swatch(state: &LightState, swatch: Swatch) -> bool {
    state.hue == swatch.0 && state.saturation == swatch.1
}

// Recomputes the color channels at full saturation. Simultaneous
// devices use this when blending: the white LEDs provide the washed
// out look so the color LEDs can stay vivid.

fn saturated(state: &LightState, ch: Channels) -> Channels {
    let (r, g, b) = color::hsl_to_rgb(state.hue, 100, state.luminance);

    Channels { r, g, b, ..ch }
}

// RGB plus warm white; only one group may be lit.

fn single_white(
    state: &LightState,
    ch: Channels,
    thr: &Thresholds,
) -> (Channels, Mask) {
    if state.saturation < thr.color_white_threshold
        || is_swatch(state, WARM_WHITE_SWATCH)
        || is_swatch(state, COOL_WHITE_SWATCH)
        || is_swatch(state, NEUTRAL_SWATCH)
    {
        debug!("warm white only");
        (Channels::warm_only(state.brightness), Mask::White)
    } else {
        debug!("color without white");
        (ch.without_white(), Mask::Color)
    }
}

// RGB plus warm and cold white; only one group may be lit.

fn dual_white(
    state: &LightState,
    ch: Channels,
    thr: &Thresholds,
) -> (Channels, Mask) {
    if is_swatch(state, WARM_WHITE_SWATCH) {
        debug!("warm white only");
        (Channels::warm_only(state.brightness), Mask::White)
    } else if is_swatch(state, COOL_WHITE_SWATCH) {
        debug!("cold white only");
        (Channels::cold_only(state.brightness), Mask::White)
    } else if state.saturation < thr.color_white_threshold {
        debug!("warm and cold white without color");
        (ch.without_color(), Mask::White)
    } else {
        debug!("color without white");
        (ch.without_white(), Mask::Color)
    }
}

// RGB plus warm and cold white; both groups may be lit.

fn dual_white_simultaneous(
    state: &LightState,
    ch: Channels,
    thr: &Thresholds,
) -> (Channels, Mask) {
    if is_swatch(state, WARM_WHITE_SWATCH) {
        debug!("warm white only");
        (Channels::warm_only(state.brightness), Mask::White)
    } else if is_swatch(state, COOL_WHITE_SWATCH) {
        debug!("cold white only");
        (Channels::cold_only(state.brightness), Mask::White)
    } else if state.saturation < thr.color_off_threshold_simultaneous {
        debug!("color off, white on");
        (ch.without_color(), Mask::Both)
    } else if state.saturation < thr.color_white_threshold_simultaneous
        && thr.allow_simultaneous_color_white
    {
        debug!("saturated color mixed with white");
        (saturated(state, ch), Mask::Both)
    } else {
        debug!("color without white");
        (ch.without_white(), Mask::Both)
    }
}

// RGB plus warm white; both groups may be lit. The white channel is
// always driven at the full, brightness-scaled level.

fn single_white_simultaneous(
    state: &LightState,
    ch: Channels,
    thr: &Thresholds,
) -> (Channels, Mask) {
    if is_swatch(state, WARM_WHITE_SWATCH)
        || is_swatch(state, COOL_WHITE_SWATCH)
        || is_swatch(state, NEUTRAL_SWATCH)
        || state.saturation < thr.color_off_threshold_simultaneous
    {
        debug!("color off, warm white on");
        (Channels::warm_only(state.brightness), Mask::Both)
    } else if state.saturation < thr.color_white_threshold_simultaneous
        && thr.allow_simultaneous_color_white
    {
        debug!("saturated color mixed with warm white");
        (
            saturated(state, Channels::warm_only(state.brightness)),
            Mask::Both,
        )
    } else {
        debug!("color without white");
        (ch.without_white(), Mask::Both)
    }
}

// Places the channels in the order and width the family expects.

fn layout(profile: &Profile, ch: &Channels, mask: Mask) -> Command {
    let (first, second) = match profile.order {
        ChannelOrder::Rgb => (ch.r, ch.g),
        ChannelOrder::Grb => (ch.g, ch.r),
    };
    let mut buf = Vec::with_capacity(8);

    buf.extend_from_slice(&[OPCODE_COLOR, first, second, ch.b]);

    match (profile.warm_white, profile.cold_white) {
        (false, _) => buf.push(0x00),
        (true, false) => buf.push(ch.ww),
        (true, true) => buf.extend_from_slice(&[ch.ww, ch.cw]),
    }

    buf.extend_from_slice(&[mask as u8, TERMINATOR]);
    Command(buf)
}

/// Encodes the color command for a light of the given family.
///
/// An unknown family is logged as a warning and encoded as a plain RGB
/// controller, which may or may not work.

pub fn encode(state: &LightState, family: Family, thr: &Thresholds) -> Command {
    let (red, green, blue) =
        color::hsl_to_rgb(state.hue, state.saturation, state.luminance);
    let (warm, cold) = whites::calculate_white_channels(state.hue);
    let br = state.brightness;

    debug!(
        "h:{} s:{} l:{} br:{} -> r:{} g:{} b:{}",
        state.hue, state.saturation, state.luminance, br, red, green, blue
    );

    let ch = Channels {
        r: scale(red, br),
        g: scale(green, br),
        b: scale(blue, br),
        ww: scale(warm, br),
        cw: scale(cold, br),
    };

    if !family.is_known() {
        warn!("{} : color probably can't be set, trying anyway", family);
    }

    let profile = family.profile();
    let (ch, mask) =
        match (profile.warm_white, profile.cold_white, profile.simultaneous) {
            (false, _, _) => (ch, Mask::Color),
            (true, false, false) => single_white(state, ch, thr),
            (true, false, true) => single_white_simultaneous(state, ch, thr),
            (true, true, false) => dual_white(state, ch, thr),
            (true, true, true) => dual_white_simultaneous(state, ch, thr),
        };

    layout(&profile, &ch, mask)
}
