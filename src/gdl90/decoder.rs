//! # GDL-90 Message Decoder
//!
//! Decodes framed GDL-90 messages back into typed values.
//!
//! Used to verify outgoing traffic and to inspect captures. Unlike the
//! encoder, decoding can fail: truncated frames, bad CRCs and dangling
//! escapes are reported as [`Gdl90BridgeError::Protocol`].

use super::crc::crc16_ccitt;
use super::protocol::*;
use crate::error::{Gdl90BridgeError, Result};

/// A verified, unescaped GDL-90 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gdl90Frame {
    /// Message ID (first payload byte)
    pub message_id: u8,

    /// Message bytes after the ID, without CRC
    pub payload: Vec<u8>,
}

/// Decoded Heartbeat fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub gps_valid: bool,
    pub uat_initialized: bool,
    pub utc_ok: bool,

    /// Seconds since 0000Z (17 bits)
    pub timestamp: u32,

    /// Raw message count field
    pub message_counts: u16,
}

/// Decoded Ownship/Traffic Report fields
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub alert_status: u8,
    pub address_type: u8,
    pub icao_address: u32,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in feet, `None` when the field is 0xFFF
    pub altitude: Option<i32>,

    pub airborne: bool,
    pub extrapolated: bool,
    pub track_type: TrackType,
    pub nic: u8,
    pub nacp: u8,

    /// Ground speed in knots, `None` when the field is 0xFFF
    pub h_velocity: Option<u16>,

    /// Vertical velocity in feet per minute, `None` when the field is 0x800
    pub v_velocity: Option<i32>,

    /// Track/heading in degrees
    pub track: f64,

    pub emitter_category: u8,

    /// Callsign with trailing spaces removed
    pub callsign: String,

    pub emergency_code: u8,
}

/// Reverse the byte-stuffing applied by the encoder
///
/// # Errors
///
/// Returns error if the data ends with a lone escape byte
pub fn unescape(data: &[u8]) -> Result<Vec<u8>> {
    let mut unescaped = Vec::with_capacity(data.len());
    let mut bytes = data.iter();

    while let Some(&byte) = bytes.next() {
        if byte == GDL90_ESCAPE_BYTE {
            match bytes.next() {
                Some(&next) => unescaped.push(next ^ GDL90_ESCAPE_XOR),
                None => {
                    return Err(Gdl90BridgeError::Protocol(
                        "Dangling escape byte at end of frame".to_string(),
                    ))
                }
            }
        } else {
            unescaped.push(byte);
        }
    }

    Ok(unescaped)
}

/// Decode a complete GDL-90 frame
///
/// # Arguments
///
/// * `frame` - Frame bytes including both flag bytes
///
/// # Returns
///
/// * `Result<Gdl90Frame>` - Decoded frame, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Frame is not delimited by flag bytes
/// - Frame is too short to hold a message ID and CRC
/// - An escape sequence is malformed
/// - CRC check fails
pub fn decode_frame(frame: &[u8]) -> Result<Gdl90Frame> {
    // Minimum frame: flag(1) + id(1) + crc(2) + flag(1)
    if frame.len() < 5 {
        return Err(Gdl90BridgeError::Protocol(format!(
            "Frame too short: {} bytes",
            frame.len()
        )));
    }

    if frame[0] != GDL90_FLAG_BYTE || frame[frame.len() - 1] != GDL90_FLAG_BYTE {
        return Err(Gdl90BridgeError::Protocol(
            "Frame not delimited by 0x7E flags".to_string(),
        ));
    }

    let interior = &frame[1..frame.len() - 1];
    if interior.contains(&GDL90_FLAG_BYTE) {
        return Err(Gdl90BridgeError::Protocol(
            "Unescaped flag byte inside frame".to_string(),
        ));
    }

    let body = unescape(interior)?;
    if body.len() < 3 {
        return Err(Gdl90BridgeError::Protocol(format!(
            "Message too short: {} bytes",
            body.len()
        )));
    }

    let (message, crc_bytes) = body.split_at(body.len() - 2);
    let received_crc = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    let calculated_crc = crc16_ccitt(message);

    if calculated_crc != received_crc {
        return Err(Gdl90BridgeError::Protocol(format!(
            "CRC mismatch: expected 0x{:04X}, got 0x{:04X}",
            calculated_crc, received_crc
        )));
    }

    Ok(Gdl90Frame {
        message_id: message[0],
        payload: message[1..].to_vec(),
    })
}

/// Split a byte stream into individual frames
///
/// Consecutive messages may share flag bytes or be separated by one each.
/// Bytes outside any flag pair are dropped.
pub fn split_frames(stream: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &byte) in stream.iter().enumerate() {
        if byte != GDL90_FLAG_BYTE {
            continue;
        }

        match start {
            Some(s) if i > s + 1 => {
                frames.push(stream[s..=i].to_vec());
                start = Some(i);
            }
            _ => start = Some(i),
        }
    }

    frames
}

/// Decode a Heartbeat payload (bytes after the message ID)
///
/// # Errors
///
/// Returns error if the payload is shorter than 6 bytes
pub fn decode_heartbeat(payload: &[u8]) -> Result<Heartbeat> {
    if payload.len() < HEARTBEAT_PAYLOAD_SIZE - 1 {
        return Err(Gdl90BridgeError::Protocol(format!(
            "Heartbeat payload too short: {} bytes",
            payload.len()
        )));
    }

    let status1 = payload[0];
    let status2 = payload[1];

    let mut timestamp = u16::from_le_bytes([payload[2], payload[3]]) as u32;
    if status2 & HEARTBEAT_TIMESTAMP_BIT16 != 0 {
        timestamp |= 0x1_0000;
    }

    Ok(Heartbeat {
        gps_valid: status1 & HEARTBEAT_GPS_POS_VALID != 0,
        uat_initialized: status1 & HEARTBEAT_UAT_INITIALIZED != 0,
        utc_ok: status2 & HEARTBEAT_UTC_OK != 0,
        timestamp,
        message_counts: u16::from_be_bytes([payload[4], payload[5]]),
    })
}

/// Decode an Ownship or Traffic Report payload (bytes after the message ID)
///
/// # Errors
///
/// Returns error if the payload is shorter than 27 bytes
pub fn decode_position_report(payload: &[u8]) -> Result<PositionReport> {
    if payload.len() < POSITION_REPORT_PAYLOAD_SIZE - 1 {
        return Err(Gdl90BridgeError::Protocol(format!(
            "Position report payload too short: {} bytes",
            payload.len()
        )));
    }

    let altitude_raw = ((payload[10] as u16) << 4) | (payload[11] >> 4) as u16;
    let misc = payload[11] & 0x0F;
    let h_velocity_raw = ((payload[13] as u16) << 4) | (payload[14] >> 4) as u16;
    let v_velocity_raw = (((payload[14] & 0x0F) as u16) << 8) | payload[15] as u16;

    let callsign = String::from_utf8_lossy(&payload[18..26])
        .trim_end()
        .to_string();

    Ok(PositionReport {
        alert_status: payload[0] >> 4,
        address_type: payload[0] & 0x0F,
        icao_address: read_u24(&payload[1..4]),
        latitude: decode_coordinate(read_u24(&payload[4..7])),
        longitude: decode_coordinate(read_u24(&payload[7..10])),
        altitude: decode_altitude(altitude_raw),
        airborne: misc & 0x08 != 0,
        extrapolated: misc & 0x04 != 0,
        track_type: TrackType::from_bits(misc),
        nic: payload[12] >> 4,
        nacp: payload[12] & 0x0F,
        h_velocity: (h_velocity_raw != VELOCITY_INVALID).then_some(h_velocity_raw),
        v_velocity: decode_vertical_velocity(v_velocity_raw),
        track: payload[16] as f64 * 360.0 / 256.0,
        emitter_category: payload[17],
        callsign,
        emergency_code: payload[26] >> 4,
    })
}

fn read_u24(bytes: &[u8]) -> u32 {
    ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32
}

/// Convert a 24-bit two's-complement coordinate field to degrees
pub fn decode_coordinate(raw: u32) -> f64 {
    // Sign-extend from bit 23
    let value = ((raw << 8) as i32) >> 8;
    value as f64 * 180.0 / 0x80_0000 as f64
}

/// Convert a 12-bit altitude field to feet
pub fn decode_altitude(raw: u16) -> Option<i32> {
    if raw == ALTITUDE_INVALID {
        None
    } else {
        Some(raw as i32 * 25 - 1000)
    }
}

/// Convert a 12-bit vertical velocity field to feet per minute
pub fn decode_vertical_velocity(raw: u16) -> Option<i32> {
    if raw == VVELOCITY_INVALID {
        return None;
    }

    // Sign-extend from bit 11
    let value = (((raw << 4) as i16) >> 4) as i32;
    Some(value * 64)
}
