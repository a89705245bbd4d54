//! Conversions between the HSL space used by home-automation hosts and
//! the 8-bit RGB channels the controllers understand.
//!
//! Hue is in degrees and saturation/luminance are percentages. RGB
//! values are rounded to the nearest integer and clamped to 0..=255.
//! Out-of-range inputs aren't rejected; they produce whatever the
//! clamped math yields.

use palette::{encoding, FromColor, Hsl, Srgb};

/// Limits `v` to the range `min..=max`.

pub fn clamp<T: PartialOrd>(v: T, min: T, max: T) -> T {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

// Converts a color component in the range 0.0..=1.0 into an 8-bit
// channel value.

fn to_channel(v: f64) -> u8 {
    clamp((v * 255.0).round(), 0.0, 255.0) as u8
}

/// Converts a hue (degrees), saturation (%) and luminance (%) into a
/// red, green, blue triple.

pub fn hsl_to_rgb(hue: u16, saturation: u8, luminance: u8) -> (u8, u8, u8) {
    let hsl = Hsl::<encoding::Srgb, f64>::new(
        f64::from(hue),
        clamp(f64::from(saturation) / 100.0, 0.0, 1.0),
        clamp(f64::from(luminance) / 100.0, 0.0, 1.0),
    );
    let rgb = Srgb::<f64>::from_color(hsl);

    (to_channel(rgb.red), to_channel(rgb.green), to_channel(rgb.blue))
}

/// Converts an RGB triple into hue (degrees, 0..360) and saturation
/// (%). Luminance isn't needed by any caller so it isn't returned. An
/// achromatic color (all channels equal) reports a hue of 0.

pub fn rgb_to_hsl(red: u8, green: u8, blue: u8) -> (u16, u8) {
    let rgb = Srgb::<f64>::new(
        f64::from(red) / 255.0,
        f64::from(green) / 255.0,
        f64::from(blue) / 255.0,
    );
    let hsl = Hsl::<encoding::Srgb, f64>::from_color(rgb);
    let hue = hsl.hue.into_positive_degrees().round() as u16 % 360;
    let saturation = clamp((hsl.saturation * 100.0).round(), 0.0, 100.0);

    (hue, saturation as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Returns the distance between two hues, taking the wrap at 360
    // degrees into account.

    fn hue_dist(a: u16, b: u16) -> u16 {
        let d = (i32::from(a) - i32::from(b)).unsigned_abs() as u16 % 360;

        d.min(360 - d)
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-5, 0, 255), 0);
        assert_eq!(clamp(300, 0, 255), 255);
        assert_eq!(clamp(128, 0, 255), 128);
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_primaries() {
        assert_eq!(hsl_to_rgb(0, 100, 50), (255, 0, 0));
        assert_eq!(hsl_to_rgb(120, 100, 50), (0, 255, 0));
        assert_eq!(hsl_to_rgb(240, 100, 50), (0, 0, 255));
        assert_eq!(hsl_to_rgb(60, 100, 50), (255, 255, 0));
        assert_eq!(hsl_to_rgb(0, 0, 50), (128, 128, 128));
        assert_eq!(hsl_to_rgb(123, 0, 0), (0, 0, 0));
        assert_eq!(hsl_to_rgb(123, 0, 100), (255, 255, 255));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(hsl_to_rgb(0, 250, 50), hsl_to_rgb(0, 100, 50));
        assert_eq!(hsl_to_rgb(0, 100, 200), (255, 255, 255));
    }

    #[test]
    fn test_rgb_to_hsl() {
        assert_eq!(rgb_to_hsl(255, 0, 0), (0, 100));
        assert_eq!(rgb_to_hsl(0, 255, 0), (120, 100));
        assert_eq!(rgb_to_hsl(0, 0, 255), (240, 100));
        assert_eq!(rgb_to_hsl(0, 0, 0), (0, 0));
        assert_eq!(rgb_to_hsl(200, 200, 200).1, 0);
    }

    #[test]
    fn test_round_trip() {
        for sat in [50u8, 100u8] {
            for hue in (0u16..360).step_by(15) {
                let (r, g, b) = hsl_to_rgb(hue, sat, 50);
                let (h, s) = rgb_to_hsl(r, g, b);

                assert!(
                    hue_dist(h, hue) <= 1,
                    "hue {} (sat {}) came back as {}",
                    hue,
                    sat,
                    h
                );
                assert!((i32::from(s) - i32::from(sat)).abs() <= 1);
            }
        }

        // With no saturation, the hue is undefined. Only check that
        // the result is gray.

        for hue in (0u16..360).step_by(45) {
            let (r, g, b) = hsl_to_rgb(hue, 0, 50);

            assert_eq!(rgb_to_hsl(r, g, b).1, 0);
        }
    }
}
