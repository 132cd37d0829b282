//! # GDL-90 Message Encoder
//!
//! Encodes heartbeats and position reports into framed GDL-90 messages.
//!
//! Every frame on the wire looks like:
//!
//! ```text
//! 0x7E | escaped(message ID + payload + CRC low + CRC high) | 0x7E
//! ```
//!
//! Multi-byte fields inside the payload are big-endian; the CRC and the
//! heartbeat timestamp are little-endian. None of the encoders fail: values
//! outside the representable range saturate at the nearest bound.

use bytes::{BufMut, BytesMut};
use chrono::{Timelike, Utc};

use super::crc::crc16_ccitt;
use super::protocol::*;

/// Degrees-to-field scale for latitude and longitude (2^23 / 180)
const COORDINATE_SCALE: f64 = 0x80_0000 as f64 / 180.0;

/// Source of the heartbeat timestamp
///
/// The heartbeat is the only message that depends on wall-clock time.
/// Injecting the clock keeps the rest of the encoder deterministic.
pub trait UtcClock {
    /// Seconds elapsed since 0000Z today
    fn seconds_since_midnight(&self) -> u32;
}

/// Reads the system clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl UtcClock for SystemClock {
    fn seconds_since_midnight(&self) -> u32 {
        Utc::now().num_seconds_from_midnight()
    }
}

/// Always reports the same time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u32);

impl UtcClock for FixedClock {
    fn seconds_since_midnight(&self) -> u32 {
        self.0
    }
}

/// GDL-90 message encoder
///
/// Stateless apart from the clock used for heartbeat timestamps. Safe to
/// share between threads when the clock is.
///
/// # Examples
///
/// ```
/// use gdl90_bridge::gdl90::encoder::{FixedClock, Gdl90Encoder};
///
/// let encoder = Gdl90Encoder::with_clock(FixedClock(0));
/// let frame = encoder.create_heartbeat(true, true);
/// assert_eq!(frame.first(), Some(&0x7E));
/// assert_eq!(frame.last(), Some(&0x7E));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Gdl90Encoder<C: UtcClock = SystemClock> {
    clock: C,
}

impl Gdl90Encoder<SystemClock> {
    /// Create an encoder that stamps heartbeats with the system UTC time
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: UtcClock> Gdl90Encoder<C> {
    /// Create an encoder with a custom heartbeat clock
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Encode a Heartbeat (ID 0x00) stamped with the current time of day
    ///
    /// # Arguments
    ///
    /// * `gps_valid` - Ownship position is valid
    /// * `utc_ok` - UTC timing is valid
    pub fn create_heartbeat(&self, gps_valid: bool, utc_ok: bool) -> Vec<u8> {
        create_heartbeat_at(gps_valid, utc_ok, self.clock.seconds_since_midnight())
    }

    /// Encode an Ownship Report (ID 0x0A)
    pub fn create_ownship_report(&self, data: &PositionData) -> Vec<u8> {
        prepare_message(&encode_position_report_payload(MSG_ID_OWNSHIP_REPORT, data))
    }

    /// Encode a Traffic Report (ID 0x14)
    ///
    /// Same body as the Ownship Report; only the message ID differs.
    pub fn create_traffic_report(&self, data: &PositionData) -> Vec<u8> {
        prepare_message(&encode_position_report_payload(MSG_ID_TRAFFIC_REPORT, data))
    }
}

/// Encode a Heartbeat for an explicit timestamp
///
/// # Arguments
///
/// * `gps_valid` - Sets status byte 1 bit 7
/// * `utc_ok` - Sets status byte 2 bit 0
/// * `timestamp` - Seconds since 0000Z; only the low 17 bits are sent
///
/// # Returns
///
/// * `Vec<u8>` - Framed message (11 bytes unless the timestamp needs escaping)
pub fn create_heartbeat_at(gps_valid: bool, utc_ok: bool, timestamp: u32) -> Vec<u8> {
    prepare_message(&encode_heartbeat_payload(gps_valid, utc_ok, timestamp))
}

/// Build the 7-byte unframed Heartbeat payload
///
/// ```text
/// Byte 0:   0x00
/// Byte 1:   status 1 (bit 7 GPS valid, bit 0 UAT initialized)
/// Byte 2:   status 2 (bit 7 timestamp bit 16, bit 0 UTC OK)
/// Byte 3-4: timestamp bits 15-0, little-endian
/// Byte 5-6: message counts (always zero)
/// ```
pub fn encode_heartbeat_payload(gps_valid: bool, utc_ok: bool, timestamp: u32) -> Vec<u8> {
    let timestamp = timestamp & 0x1_FFFF;

    let mut status1 = HEARTBEAT_UAT_INITIALIZED;
    if gps_valid {
        status1 |= HEARTBEAT_GPS_POS_VALID;
    }

    let mut status2 = 0u8;
    if utc_ok {
        status2 |= HEARTBEAT_UTC_OK;
    }
    if timestamp & 0x1_0000 != 0 {
        status2 |= HEARTBEAT_TIMESTAMP_BIT16;
    }

    let mut payload = BytesMut::with_capacity(HEARTBEAT_PAYLOAD_SIZE);
    payload.put_u8(MSG_ID_HEARTBEAT);
    payload.put_u8(status1);
    payload.put_u8(status2);
    payload.put_u16_le(timestamp as u16);
    payload.put_u16(0);

    payload.to_vec()
}

/// Build the 28-byte unframed Ownship/Traffic Report payload
///
/// ```text
/// Byte 0:     message ID
/// Byte 1:     alert status (high nibble) | address type (low nibble)
/// Byte 2-4:   participant address
/// Byte 5-7:   latitude
/// Byte 8-10:  longitude
/// Byte 11-12: altitude (12 bits) | misc (4 bits)
/// Byte 13:    NIC (high nibble) | NACp (low nibble)
/// Byte 14-16: horizontal velocity (12 bits) | vertical velocity (12 bits)
/// Byte 17:    track/heading
/// Byte 18:    emitter category
/// Byte 19-26: callsign
/// Byte 27:    emergency/priority code (high nibble) | spare
/// ```
pub fn encode_position_report_payload(message_id: u8, data: &PositionData) -> Vec<u8> {
    let altitude = encode_altitude(data.altitude);
    let misc = encode_misc(data.airborne, data.track_type);
    let h_velocity = encode_horizontal_velocity(data.h_velocity);
    let v_velocity = encode_vertical_velocity(data.v_velocity);

    let mut payload = BytesMut::with_capacity(POSITION_REPORT_PAYLOAD_SIZE);
    payload.put_u8(message_id);
    payload.put_u8(((data.alert_status & 0x0F) << 4) | (data.address_type as u8 & 0x0F));
    payload.put_uint((data.icao_address & 0xFF_FFFF) as u64, 3);
    payload.put_uint(encode_latitude(data.latitude) as u64, 3);
    payload.put_uint(encode_longitude(data.longitude) as u64, 3);
    payload.put_u8((altitude >> 4) as u8);
    payload.put_u8((((altitude & 0x0F) as u8) << 4) | misc);
    payload.put_u8(((data.nic & 0x0F) << 4) | (data.nacp & 0x0F));
    payload.put_u8((h_velocity >> 4) as u8);
    payload.put_u8((((h_velocity & 0x0F) as u8) << 4) | ((v_velocity >> 8) as u8 & 0x0F));
    payload.put_u8(v_velocity as u8);
    payload.put_u8(encode_track(data.track));
    payload.put_u8(data.emitter_category as u8);
    payload.put_slice(&encode_callsign(&data.callsign));
    payload.put_u8((data.emergency_code & 0x0F) << 4);

    payload.to_vec()
}

/// Encode latitude into a 24-bit two's-complement field
///
/// Clamped to ±90°; resolution 180/2^23 degrees, truncated toward zero.
pub fn encode_latitude(latitude: f64) -> u32 {
    encode_coordinate(latitude, 90.0)
}

/// Encode longitude into a 24-bit two's-complement field
///
/// Clamped to ±180°; resolution 180/2^23 degrees, truncated toward zero.
pub fn encode_longitude(longitude: f64) -> u32 {
    encode_coordinate(longitude, 180.0)
}

fn encode_coordinate(degrees: f64, limit: f64) -> u32 {
    // NaN survives clamp() and casts to 0
    let value = (degrees.clamp(-limit, limit) * COORDINATE_SCALE) as i32;
    (value as u32) & 0xFF_FFFF
}

/// Encode altitude in feet into the 12-bit altitude field
///
/// 25 ft steps offset by +1000 ft, saturating to `0..=0xFFE`.
pub fn encode_altitude(altitude_ft: i32) -> u16 {
    let steps = altitude_ft.saturating_add(1000) / 25;
    steps.clamp(0, ALTITUDE_MAX_ENCODED as i32) as u16
}

/// Encode the 4-bit miscellaneous indicator
///
/// Bit 3 airborne, bit 2 extrapolated (never set), bits 1-0 track type.
pub fn encode_misc(airborne: bool, track_type: TrackType) -> u8 {
    ((airborne as u8) << 3) | (track_type as u8 & 0x03)
}

/// Encode ground speed in knots, saturating at 0xFFE
pub fn encode_horizontal_velocity(knots: u16) -> u16 {
    knots.min(VELOCITY_MAX)
}

/// Encode vertical velocity into the 12-bit signed field (64 fpm steps)
///
/// [`VVELOCITY_UNKNOWN`] maps to the "no data" pattern 0x800. Rates beyond
/// ±32576 fpm saturate to 0x1FE / 0xE02.
pub fn encode_vertical_velocity(fpm: i16) -> u16 {
    if fpm == VVELOCITY_UNKNOWN {
        return VVELOCITY_INVALID;
    }
    if fpm > VVELOCITY_LIMIT_FPM {
        return VVELOCITY_CLIMB_SATURATED;
    }
    if fpm < -VVELOCITY_LIMIT_FPM {
        return VVELOCITY_DESCENT_SATURATED;
    }

    ((fpm / 64) as u16) & 0x0FFF
}

/// Encode track/heading in degrees to 360/256° resolution
pub fn encode_track(degrees: u16) -> u8 {
    ((degrees % 360) as u32 * 256 / 360) as u8
}

/// Encode a callsign into the fixed 8-byte field
///
/// Truncated to 8 characters and right-padded with spaces. Characters
/// outside ASCII become spaces.
pub fn encode_callsign(callsign: &str) -> [u8; CALLSIGN_LENGTH] {
    let mut field = [b' '; CALLSIGN_LENGTH];

    for (slot, ch) in field.iter_mut().zip(callsign.chars()) {
        if ch.is_ascii() {
            *slot = ch as u8;
        }
    }

    field
}

/// Byte-stuff a message body
///
/// Every 0x7E or 0x7D becomes 0x7D followed by the byte XOR 0x20.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(data.len() + data.len() / 8);

    for &byte in data {
        if byte == GDL90_FLAG_BYTE || byte == GDL90_ESCAPE_BYTE {
            escaped.push(GDL90_ESCAPE_BYTE);
            escaped.push(byte ^ GDL90_ESCAPE_XOR);
        } else {
            escaped.push(byte);
        }
    }

    escaped
}

/// Turn an unframed payload into a complete GDL-90 frame
///
/// Appends the CRC (low byte first), escapes, then wraps in flag bytes.
pub fn prepare_message(payload: &[u8]) -> Vec<u8> {
    let crc = crc16_ccitt(payload);

    let mut body = BytesMut::with_capacity(payload.len() + 2);
    body.put_slice(payload);
    body.put_u16_le(crc);

    let escaped = escape(&body);

    let mut frame = Vec::with_capacity(escaped.len() + 2);
    frame.push(GDL90_FLAG_BYTE);
    frame.extend_from_slice(&escaped);
    frame.push(GDL90_FLAG_BYTE);

    frame
}
