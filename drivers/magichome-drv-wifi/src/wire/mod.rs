// This module defines the frames exchanged with a MagicHome
// controller, other than the color frame which is built by the
// encoder in `magichome-api`. Every frame sent to the device is
// followed by a one byte checksum.
//
//  Query state:
//
//   Sent:      81 8a 8b [cs]
//   Received:  81 MM PP mm ?? SS RR GG BB WW VV CC ?? [cs]
//
//              MM = model, PP = power (23 on, 24 off), mm = mode,
//              SS = speed, RR/GG/BB = color, WW = warm white,
//              VV = version, CC = cold white
//
//  Power:
//
//   Turn on:   71 23 0f [cs]
//   Turn off:  71 24 0f [cs]
//
//  Built-in pattern:
//
//   Sent:      61 [pattern] [delay] 0f [cs]

use magichome_api::{DeviceState, Error, Result, Rgb};

mod cmd;

pub use cmd::{pattern_cmd, power_cmd, query_cmd, speed_to_delay};

pub const REPLY_LEN: usize = 14;

const REPLY_HEADER: u8 = 0x81;
const POWER_ON: u8 = 0x23;

/// Computes the checksum of a frame: the low 8 bits of the sum of
/// its bytes.

pub fn checksum(buf: &[u8]) -> u8 {
    buf.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Returns a copy of `buf` with its checksum appended.

pub fn with_checksum(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() + 1);

    out.extend_from_slice(buf);
    out.push(checksum(buf));
    out
}

/// Decodes a state reply. The reply must be exactly `REPLY_LEN` bytes,
/// start with the reply header and end with a valid checksum.

pub fn decode_state(buf: &[u8]) -> Result<DeviceState> {
    if buf.len() != REPLY_LEN {
        return Err(Error::ProtocolError(format!(
            "state reply has {} bytes, expected {}",
            buf.len(),
            REPLY_LEN
        )));
    }

    if buf[0] != REPLY_HEADER {
        return Err(Error::ProtocolError(format!(
            "bad state reply header : {:#04x}",
            buf[0]
        )));
    }

    let (body, cs) = buf.split_at(REPLY_LEN - 1);

    if checksum(body) != cs[0] {
        return Err(Error::ProtocolError(format!(
            "bad state reply checksum : {:02x?}",
            buf
        )));
    }

    Ok(DeviceState {
        is_on: buf[2] == POWER_ON,
        color: Rgb {
            red: buf[6],
            green: buf[7],
            blue: buf[8],
        },
        warm_white: buf[9],
        cold_white: buf[11],
        model: buf[1],
        version: buf[10],
        raw: buf.to_vec(),
    })
}
