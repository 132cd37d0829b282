//! # GDL-90 Protocol Constants and Types
//!
//! Core protocol definitions for the GDL-90 Data Interface.

use crate::error::{Gdl90BridgeError, Result};

/// Frame flag byte (start and end of every message)
pub const GDL90_FLAG_BYTE: u8 = 0x7E;

/// Control-escape byte
pub const GDL90_ESCAPE_BYTE: u8 = 0x7D;

/// Value XORed into an escaped byte
pub const GDL90_ESCAPE_XOR: u8 = 0x20;

/// Heartbeat message ID
pub const MSG_ID_HEARTBEAT: u8 = 0x00;

/// Ownship Report message ID
pub const MSG_ID_OWNSHIP_REPORT: u8 = 0x0A;

/// Traffic Report message ID
pub const MSG_ID_TRAFFIC_REPORT: u8 = 0x14;

/// Heartbeat payload size (message ID included)
pub const HEARTBEAT_PAYLOAD_SIZE: usize = 7;

/// Ownship/Traffic Report payload size (message ID included)
pub const POSITION_REPORT_PAYLOAD_SIZE: usize = 28;

/// Callsign field width in bytes
pub const CALLSIGN_LENGTH: usize = 8;

/// Altitude field value meaning "invalid or unavailable"
pub const ALTITUDE_INVALID: u16 = 0xFFF;

/// Largest encodable altitude field value
pub const ALTITUDE_MAX_ENCODED: u16 = 0xFFE;

/// Horizontal velocity field value meaning "no data"
pub const VELOCITY_INVALID: u16 = 0xFFF;

/// Largest encodable horizontal velocity in knots
pub const VELOCITY_MAX: u16 = 0xFFE;

/// Vertical velocity field value meaning "no data"
pub const VVELOCITY_INVALID: u16 = 0x800;

/// Vertical velocity input meaning "unknown"
pub const VVELOCITY_UNKNOWN: i16 = i16::MIN;

/// Largest vertical velocity magnitude in feet per minute
pub const VVELOCITY_LIMIT_FPM: i16 = 32576;

/// Encoded vertical velocity when climbing faster than the limit
pub const VVELOCITY_CLIMB_SATURATED: u16 = 0x1FE;

/// Encoded vertical velocity when descending faster than the limit
pub const VVELOCITY_DESCENT_SATURATED: u16 = 0xE02;

/// Heartbeat status byte 1: GPS position valid
pub const HEARTBEAT_GPS_POS_VALID: u8 = 0x80;

/// Heartbeat status byte 1: UAT initialized
pub const HEARTBEAT_UAT_INITIALIZED: u8 = 0x01;

/// Heartbeat status byte 2: bit 16 of the timestamp
pub const HEARTBEAT_TIMESTAMP_BIT16: u8 = 0x80;

/// Heartbeat status byte 2: UTC timing valid
pub const HEARTBEAT_UTC_OK: u8 = 0x01;

/// Participant address type (low nibble of report byte 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AddressType {
    #[default]
    AdsbIcao = 0,
    AdsbSelfAssigned = 1,
    TisbIcao = 2,
    TisbTrackFile = 3,
    SurfaceVehicle = 4,
    GroundStation = 5,
}

impl TryFrom<u8> for AddressType {
    type Error = Gdl90BridgeError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::AdsbIcao),
            1 => Ok(Self::AdsbSelfAssigned),
            2 => Ok(Self::TisbIcao),
            3 => Ok(Self::TisbTrackFile),
            4 => Ok(Self::SurfaceVehicle),
            5 => Ok(Self::GroundStation),
            other => Err(Gdl90BridgeError::Protocol(format!(
                "Unknown address type: {}",
                other
            ))),
        }
    }
}

/// Emitter category (report byte 18)
///
/// Codes 8 and 13 are reserved by the interface document and have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EmitterCategory {
    #[default]
    NoInfo = 0,
    Light = 1,
    Small = 2,
    Large = 3,
    HighVortexLarge = 4,
    Heavy = 5,
    HighlyManeuverable = 6,
    Rotorcraft = 7,
    Glider = 9,
    LighterThanAir = 10,
    Parachutist = 11,
    UltraLight = 12,
    Uav = 14,
    SpaceVehicle = 15,
}

impl EmitterCategory {
    /// Human readable name, as EFB apps label it
    pub fn name(self) -> &'static str {
        match self {
            Self::NoInfo => "No aircraft type information",
            Self::Light => "Light",
            Self::Small => "Small",
            Self::Large => "Large",
            Self::HighVortexLarge => "High vortex large",
            Self::Heavy => "Heavy",
            Self::HighlyManeuverable => "Highly maneuverable",
            Self::Rotorcraft => "Rotorcraft",
            Self::Glider => "Glider/sailplane",
            Self::LighterThanAir => "Lighter than air",
            Self::Parachutist => "Parachutist/sky diver",
            Self::UltraLight => "Ultra light/hang glider/paraglider",
            Self::Uav => "Unmanned aerial vehicle",
            Self::SpaceVehicle => "Space/trans-atmospheric vehicle",
        }
    }
}

impl TryFrom<u8> for EmitterCategory {
    type Error = Gdl90BridgeError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::NoInfo),
            1 => Ok(Self::Light),
            2 => Ok(Self::Small),
            3 => Ok(Self::Large),
            4 => Ok(Self::HighVortexLarge),
            5 => Ok(Self::Heavy),
            6 => Ok(Self::HighlyManeuverable),
            7 => Ok(Self::Rotorcraft),
            9 => Ok(Self::Glider),
            10 => Ok(Self::LighterThanAir),
            11 => Ok(Self::Parachutist),
            12 => Ok(Self::UltraLight),
            14 => Ok(Self::Uav),
            15 => Ok(Self::SpaceVehicle),
            other => Err(Gdl90BridgeError::Protocol(format!(
                "Unknown emitter category: {}",
                other
            ))),
        }
    }
}

/// Meaning of the track/heading byte (bits 1-0 of the misc field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TrackType {
    #[default]
    Invalid = 0,
    TrueTrack = 1,
    MagneticHeading = 2,
    TrueHeading = 3,
}

impl TrackType {
    /// Decode from the two low bits of the misc field
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Self::TrueTrack,
            2 => Self::MagneticHeading,
            3 => Self::TrueHeading,
            _ => Self::Invalid,
        }
    }
}

/// Position and identity of one aircraft, ready to encode
///
/// Built fresh for every report. Out-of-range values are clamped by the
/// encoder, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionData {
    /// Latitude in degrees (clamped to ±90)
    pub latitude: f64,

    /// Longitude in degrees (clamped to ±180)
    pub longitude: f64,

    /// Pressure altitude in feet
    pub altitude: i32,

    /// Ground speed in knots
    pub h_velocity: u16,

    /// Vertical velocity in feet per minute, [`VVELOCITY_UNKNOWN`] if unknown
    pub v_velocity: i16,

    /// Track or heading in whole degrees
    pub track: u16,

    pub track_type: TrackType,

    pub airborne: bool,

    /// Navigation Integrity Category (4 bits)
    pub nic: u8,

    /// Navigation Accuracy Category for Position (4 bits)
    pub nacp: u8,

    /// 24-bit participant address
    pub icao_address: u32,

    pub callsign: String,

    pub emitter_category: EmitterCategory,

    pub address_type: AddressType,

    /// Traffic alert status (4 bits)
    pub alert_status: u8,

    /// Emergency/priority code (4 bits)
    pub emergency_code: u8,
}

impl Default for PositionData {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0,
            h_velocity: 0,
            v_velocity: VVELOCITY_UNKNOWN,
            track: 0,
            track_type: TrackType::Invalid,
            airborne: false,
            nic: 0,
            nacp: 0,
            icao_address: 0,
            callsign: String::new(),
            emitter_category: EmitterCategory::NoInfo,
            address_type: AddressType::AdsbIcao,
            alert_status: 0,
            emergency_code: 0,
        }
    }
}

/// Human readable name of a message ID
pub fn message_name(message_id: u8) -> &'static str {
    match message_id {
        MSG_ID_HEARTBEAT => "Heartbeat",
        MSG_ID_OWNSHIP_REPORT => "Ownship Report",
        MSG_ID_TRAFFIC_REPORT => "Traffic Report",
        _ => "Unknown",
    }
}
