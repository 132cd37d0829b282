//! # Telemetry Module
//!
//! Turns simulator flight state into [`PositionData`] ready to encode.
//!
//! This module handles:
//! - Converting simulator units (metres, m/s) to GDL-90 units (feet, knots)
//! - Cleaning up callsigns read from the simulator
//! - Abstracting where ownship and traffic positions come from

pub mod simulator;

pub use simulator::SimulatedFlight;

use crate::config::{AccuracyConfig, OwnshipConfig, TrafficTargetConfig};
use crate::gdl90::protocol::{
    AddressType, EmitterCategory, PositionData, TrackType, CALLSIGN_LENGTH,
};

/// Metres to feet
pub const METERS_TO_FEET: f64 = 3.28084;

/// Metres per second to knots
pub const MPS_TO_KNOTS: f64 = 1.94384;

/// Lowest altitude accepted from the simulator, metres
const MIN_ALTITUDE_M: f64 = -1000.0;

/// Highest altitude accepted from the simulator, metres
const MAX_ALTITUDE_M: f64 = 100_000.0;

/// One snapshot of an aircraft as the simulator reports it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlightSample {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Altitude in metres
    pub altitude_m: f64,

    /// Ground speed in metres per second
    pub ground_speed_mps: f64,

    /// True track in degrees
    pub track_deg: f64,

    /// Vertical speed in feet per minute
    pub vertical_speed_fpm: f64,

    pub on_ground: bool,

    /// Tail number or flight ID, when the simulator has one
    pub tail_number: Option<String>,
}

/// Identity and accuracy attached to every report for one aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftIdentity {
    pub icao_address: u32,
    pub callsign: String,
    pub emitter_category: EmitterCategory,
    pub nic: u8,
    pub nacp: u8,
}

impl AircraftIdentity {
    /// Identity of the ownship from configuration
    pub fn ownship(ownship: &OwnshipConfig, accuracy: &AccuracyConfig) -> Self {
        Self {
            icao_address: ownship.icao_address,
            callsign: ownship.callsign.clone(),
            emitter_category: ownship.emitter(),
            nic: accuracy.nic,
            nacp: accuracy.nacp,
        }
    }

    /// Identity of a configured traffic target
    pub fn traffic(target: &TrafficTargetConfig, accuracy: &AccuracyConfig) -> Self {
        Self {
            icao_address: target.icao_address,
            callsign: sanitize_callsign(&target.callsign),
            emitter_category: target.emitter(),
            nic: accuracy.nic,
            nacp: accuracy.nacp,
        }
    }
}

impl FlightSample {
    /// Altitude in feet
    pub fn altitude_ft(&self) -> f64 {
        self.altitude_m * METERS_TO_FEET
    }

    /// Ground speed in knots
    pub fn ground_speed_kt(&self) -> f64 {
        self.ground_speed_mps * MPS_TO_KNOTS
    }

    /// Whether the sample describes an aircraft that actually exists
    ///
    /// Simulators report empty traffic slots as all zeros. Position 0,0 with
    /// no motion is treated as an empty slot.
    pub fn is_present(&self) -> bool {
        let has_position = self.latitude != 0.0 || self.longitude != 0.0;
        let has_motion = self.ground_speed_mps != 0.0
            || self.track_deg != 0.0
            || self.vertical_speed_fpm != 0.0;

        has_position || has_motion
    }

    /// Whether the altitude is inside what a simulator can plausibly report
    pub fn has_plausible_altitude(&self) -> bool {
        (MIN_ALTITUDE_M..=MAX_ALTITUDE_M).contains(&self.altitude_m)
    }

    /// Convert to encoder input
    ///
    /// The simulator tail number wins over the configured callsign when it
    /// is non-empty after cleanup.
    ///
    /// # Examples
    ///
    /// ```
    /// use gdl90_bridge::gdl90::protocol::EmitterCategory;
    /// use gdl90_bridge::telemetry::{AircraftIdentity, FlightSample};
    ///
    /// let identity = AircraftIdentity {
    ///     icao_address: 0xABCDEF,
    ///     callsign: "N12345".to_string(),
    ///     emitter_category: EmitterCategory::Light,
    ///     nic: 11,
    ///     nacp: 11,
    /// };
    /// let sample = FlightSample {
    ///     altitude_m: 1000.0,
    ///     ground_speed_mps: 50.0,
    ///     ..FlightSample::default()
    /// };
    ///
    /// let data = sample.to_position_data(&identity);
    /// assert_eq!(data.altitude, 3281);
    /// assert_eq!(data.h_velocity, 97);
    /// ```
    pub fn to_position_data(&self, identity: &AircraftIdentity) -> PositionData {
        let callsign = self
            .tail_number
            .as_deref()
            .map(sanitize_callsign)
            .filter(|tail| !tail.is_empty())
            .unwrap_or_else(|| identity.callsign.clone());

        PositionData {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude_ft().round() as i32,
            h_velocity: self.ground_speed_kt().round() as u16,
            v_velocity: vertical_speed(self.vertical_speed_fpm),
            track: normalize_track(self.track_deg),
            track_type: TrackType::TrueTrack,
            airborne: !self.on_ground,
            nic: identity.nic,
            nacp: identity.nacp,
            icao_address: identity.icao_address,
            callsign,
            emitter_category: identity.emitter_category,
            address_type: AddressType::AdsbIcao,
            alert_status: 0,
            emergency_code: 0,
        }
    }
}

/// Keep the characters a GDL-90 callsign may hold
///
/// Letters are upper-cased, anything other than digits, letters and spaces
/// is dropped, trailing spaces are trimmed and the result is cut to eight
/// characters.
pub fn sanitize_callsign(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| c.to_ascii_uppercase())
        .take(CALLSIGN_LENGTH)
        .collect();

    cleaned.trim_end().to_string()
}

// i16::MIN is reserved for "unknown", so a real reading never maps onto it
fn vertical_speed(fpm: f64) -> i16 {
    if fpm.is_nan() {
        return 0;
    }
    fpm.round().clamp(-(i16::MAX as f64), i16::MAX as f64) as i16
}

fn normalize_track(degrees: f64) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    (degrees.rem_euclid(360.0) as u16) % 360
}

/// Source of ownship and traffic positions
///
/// Implemented by the built-in simulator; a live simulator connection
/// plugs in here.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySource: Send {
    /// Current ownship position, or `None` when no valid fix is available
    fn ownship(&mut self) -> Option<PositionData>;

    /// Current traffic targets
    fn traffic(&mut self) -> Vec<PositionData>;
}
