//! Folds a device's reported state back into a `LightState`.
//!
//! Devices report power and raw RGB values. Those are converted to
//! hue and saturation; luminance and brightness are left alone since
//! they can't be recovered from the RGB report.

use crate::{color, DeviceState, LightState, Result, Transport};
use tokio::time::Duration;
use tracing::{debug, warn};

/// The fields a sync wrote into the light's state.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Observation {
    pub on: bool,
    pub hue: u16,
    pub saturation: u8,
}

/// Applies a device report to the light state.

pub fn sync_from_device(
    state: &mut LightState,
    raw: &DeviceState,
) -> Observation {
    let (hue, saturation) =
        color::rgb_to_hsl(raw.color.red, raw.color.green, raw.color.blue);

    state.on = raw.is_on;
    state.hue = hue;
    state.saturation = saturation;

    Observation {
        on: raw.is_on,
        hue,
        saturation,
    }
}

/// Queries the device and applies its report to `state`.
///
/// If the transport fails, the error is logged as a warning and
/// returned; `state` is left untouched.

pub async fn read_state<T>(
    transport: &mut T,
    state: &mut LightState,
    timeout: Duration,
) -> Result<Observation>
where
    T: Transport + ?Sized,
{
    match transport.get_state(timeout).await {
        Ok(raw) => {
            debug!("state reply: {:02x?}", &raw.raw);
            Ok(sync_from_device(state, &raw))
        }
        Err(e) => {
            warn!("couldn't read state : {}", &e);
            Err(e)
        }
    }
}
