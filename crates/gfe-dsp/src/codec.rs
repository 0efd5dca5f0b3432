//! Compact text form of a curve
//!
//! Each Y becomes one byte `321 - Y` (so silence is 0 and +40 dB is 321).
//! Values above 254 are escaped as `255, value - 254`. The byte string is
//! base64 encoded, which keeps curves storable as plain strings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use gfe_core::{MINIMUM_CHANNEL_VALUE_Y, VALID_Y_RANGE_HEIGHT, VISIBLE_BIN_COUNT};

use crate::curve::{Curve, clamp_y};

/// Largest value stored in a single byte
const MAX_PLAIN_BYTE: i32 = 254;

/// Prefix of a two-byte value
const ESCAPE_BYTE: u8 = 255;

pub fn encode_curve(curve: &Curve) -> String {
    let mut bytes = Vec::with_capacity(VISIBLE_BIN_COUNT + VISIBLE_BIN_COUNT / 4);
    for &y in curve {
        let value = if y > MINIMUM_CHANNEL_VALUE_Y {
            0
        } else {
            VALID_Y_RANGE_HEIGHT - y.max(0)
        };
        if value <= MAX_PLAIN_BYTE {
            bytes.push(value as u8);
        } else {
            bytes.push(ESCAPE_BYTE);
            bytes.push((value - MAX_PLAIN_BYTE) as u8);
        }
    }
    STANDARD.encode(bytes)
}

/// Decode a string produced by [`encode_curve`]
///
/// Returns `None` for strings too short to hold a curve, invalid base64,
/// or payloads with fewer than `VISIBLE_BIN_COUNT` values. Values past the
/// first `VISIBLE_BIN_COUNT` are ignored.
pub fn decode_curve(text: &str) -> Option<Curve> {
    if text.len() * 3 < VISIBLE_BIN_COUNT * 4 {
        return None;
    }
    let bytes = match STANDARD.decode(text) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("curve decode failed: {err}");
            return None;
        }
    };

    let mut curve = [0; VISIBLE_BIN_COUNT];
    let mut count = 0;
    let mut iter = bytes.iter().copied();
    while count < VISIBLE_BIN_COUNT {
        let value = match iter.next()? {
            ESCAPE_BYTE => iter.next()? as i32 + MAX_PLAIN_BYTE,
            byte => byte as i32,
        };
        curve[count] = clamp_y(VALID_Y_RANGE_HEIGHT - value);
        count += 1;
    }
    Some(curve)
}
