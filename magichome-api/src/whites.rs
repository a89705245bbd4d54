//! Derives the warm-white and cold-white intensities from a hue.
//!
//! The hue circle is split into four 90 degree quadrants. Warm white
//! is pinned at full scale around 0/360 and cold white around 180. In
//! each quadrant the other channel fades linearly so that both are at
//! full scale at 90 and 270.

use crate::color::clamp;

const FULL: f64 = 255.0;

fn to_channel(v: f64) -> u8 {
    clamp(v.round(), 0.0, FULL) as u8
}

/// Returns the `(warm_white, cold_white)` pair for the given hue.

pub fn calculate_white_channels(hue: u16) -> (u8, u8) {
    let h = f64::from(hue);

    if h <= 90.0 {
        (255, to_channel(FULL * (h / 90.0)))
    } else if h > 270.0 {
        (255, to_channel(FULL * (1.0 - (h - 270.0) / 90.0)))
    } else if h > 180.0 {
        (to_channel(FULL * ((h - 180.0) / 90.0)), 255)
    } else {
        (to_channel(FULL * (1.0 - (h - 90.0) / 90.0)), 255)
    }
}
