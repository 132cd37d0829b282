//! Built-in flight simulator
//!
//! Flies the ownship around a circular orbit and dead-reckons each
//! configured traffic target along its track. Positions depend only on the
//! time elapsed since start, so a given instant always yields the same data.

use std::time::Duration;
use tokio::time::Instant;

use super::{AircraftIdentity, FlightSample, TelemetrySource, METERS_TO_FEET, MPS_TO_KNOTS};
use crate::config::{Config, SimulationConfig, TrafficTargetConfig};
use crate::gdl90::protocol::PositionData;

/// Nautical miles per degree of latitude
const NM_PER_DEGREE: f64 = 60.0;

/// Simulated ownship and traffic
#[derive(Debug, Clone)]
pub struct SimulatedFlight {
    orbit: SimulationConfig,
    ownship: AircraftIdentity,
    traffic: Vec<(AircraftIdentity, TrafficTargetConfig)>,
    start: Instant,
}

impl SimulatedFlight {
    /// Build the simulator from configuration, starting the clock now
    pub fn new(config: &Config) -> Self {
        let traffic = config
            .traffic
            .iter()
            .map(|target| {
                (
                    AircraftIdentity::traffic(target, &config.accuracy),
                    target.clone(),
                )
            })
            .collect();

        Self {
            orbit: config.simulation.clone(),
            ownship: AircraftIdentity::ownship(&config.ownship, &config.accuracy),
            traffic,
            start: Instant::now(),
        }
    }

    /// Number of configured traffic targets
    pub fn traffic_count(&self) -> usize {
        self.traffic.len()
    }

    /// Ownship state after `elapsed`, in simulator units
    pub fn sample_at(&self, elapsed: Duration) -> FlightSample {
        let radius_nm = self.orbit.orbit_radius_nm;
        let speed_kt = self.orbit.ground_speed_kt as f64;

        // Angle swept clockwise from due north of the orbit centre
        let hours = elapsed.as_secs_f64() / 3600.0;
        let angle = (speed_kt * hours / radius_nm).rem_euclid(std::f64::consts::TAU);

        let (latitude, longitude, _) = offset_position(
            self.orbit.center_latitude,
            self.orbit.center_longitude,
            radius_nm * angle.cos(),
            radius_nm * angle.sin(),
        );

        FlightSample {
            latitude,
            longitude,
            altitude_m: self.orbit.altitude_ft as f64 / METERS_TO_FEET,
            ground_speed_mps: speed_kt / MPS_TO_KNOTS,
            track_deg: (angle.to_degrees() + 90.0).rem_euclid(360.0),
            vertical_speed_fpm: 0.0,
            on_ground: false,
            tail_number: None,
        }
    }

    /// Ownship report input after `elapsed`
    pub fn ownship_at(&self, elapsed: Duration) -> PositionData {
        self.sample_at(elapsed).to_position_data(&self.ownship)
    }

    /// Traffic state after `elapsed`, in simulator units
    ///
    /// Each target flies a straight line from its configured position. A
    /// target that crosses a pole comes back down the far meridian with its
    /// track reversed.
    pub fn traffic_samples_at(&self, elapsed: Duration) -> Vec<FlightSample> {
        let minutes = elapsed.as_secs_f64() / 60.0;

        self.traffic
            .iter()
            .map(|(_, target)| {
                let distance_nm = target.ground_speed_kt as f64 * minutes / 60.0;
                let track = target.track_deg as f64;
                let (latitude, longitude, crossed_pole) = offset_position(
                    target.latitude,
                    target.longitude,
                    distance_nm * track.to_radians().cos(),
                    distance_nm * track.to_radians().sin(),
                );

                let climb_ft = target.vertical_speed_fpm as f64 * minutes;

                FlightSample {
                    latitude,
                    longitude,
                    altitude_m: (target.altitude_ft as f64 + climb_ft) / METERS_TO_FEET,
                    ground_speed_mps: target.ground_speed_kt as f64 / MPS_TO_KNOTS,
                    track_deg: if crossed_pole { track + 180.0 } else { track },
                    vertical_speed_fpm: target.vertical_speed_fpm as f64,
                    on_ground: false,
                    tail_number: None,
                }
            })
            .collect()
    }

    /// Traffic report inputs after `elapsed`
    ///
    /// Empty slots and targets at an implausible altitude are left out.
    pub fn traffic_at(&self, elapsed: Duration) -> Vec<PositionData> {
        self.traffic
            .iter()
            .zip(self.traffic_samples_at(elapsed))
            .filter(|(_, sample)| sample.is_present() && sample.has_plausible_altitude())
            .map(|((identity, _), sample)| sample.to_position_data(identity))
            .collect()
    }
}

impl TelemetrySource for SimulatedFlight {
    fn ownship(&mut self) -> Option<PositionData> {
        Some(self.ownship_at(self.start.elapsed()))
    }

    fn traffic(&mut self) -> Vec<PositionData> {
        self.traffic_at(self.start.elapsed())
    }
}

/// Move a position by a north/east displacement in nautical miles
///
/// Returns the new latitude and longitude, and whether the path went over
/// a pole. Latitude past a pole is reflected back and the longitude moves
/// to the opposite meridian. Longitude stays within [-180, 180).
fn offset_position(
    latitude: f64,
    longitude: f64,
    north_nm: f64,
    east_nm: f64,
) -> (f64, f64, bool) {
    let cos_lat = latitude.to_radians().cos();
    let mut new_longitude = if cos_lat.abs() < 1e-9 {
        longitude
    } else {
        longitude + east_nm / (NM_PER_DEGREE * cos_lat)
    };

    // Distance along the meridian circle, measured from the south pole
    let along = (latitude + north_nm / NM_PER_DEGREE + 90.0).rem_euclid(360.0);
    let (new_latitude, crossed_pole) = if along <= 180.0 {
        (along - 90.0, false)
    } else {
        (270.0 - along, true)
    };

    if crossed_pole {
        new_longitude += 180.0;
    }

    (new_latitude, normalize_longitude(new_longitude), crossed_pole)
}

fn normalize_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl90::protocol::EmitterCategory;

    const EPSILON: f64 = 1e-6;

    fn config_with_traffic() -> Config {
        let mut config = Config::default();
        config.traffic = vec![
            TrafficTargetConfig {
                icao_address: 0x100001,
                callsign: "UAL123".to_string(),
                latitude: 37.7749,
                longitude: -122.4194,
                altitude_ft: 35000,
                ground_speed_kt: 420,
                vertical_speed_fpm: 0,
                track_deg: 0,
                emitter_category: 3,
            },
            TrafficTargetConfig {
                icao_address: 0x100002,
                callsign: "N737BA".to_string(),
                latitude: 37.615,
                longitude: -122.375,
                altitude_ft: 800,
                ground_speed_kt: 60,
                vertical_speed_fpm: 600,
                track_deg: 90,
                emitter_category: 1,
            },
        ];
        config
    }

    /// Time to fly a quarter of the default orbit
    fn quarter_orbit() -> Duration {
        let sim = SimulationConfig::default();
        let hours = std::f64::consts::FRAC_PI_2 * sim.orbit_radius_nm / sim.ground_speed_kt as f64;
        Duration::from_secs_f64(hours * 3600.0)
    }

    #[test]
    fn test_starts_north_of_centre_heading_east() {
        let flight = SimulatedFlight::new(&Config::default());
        let sample = flight.sample_at(Duration::ZERO);
        let sim = SimulationConfig::default();

        assert!((sample.latitude - (sim.center_latitude + 2.0 / 60.0)).abs() < EPSILON);
        assert!((sample.longitude - sim.center_longitude).abs() < EPSILON);
        assert!((sample.track_deg - 90.0).abs() < EPSILON);
        assert!(!sample.on_ground);
    }

    #[test]
    fn test_quarter_orbit_is_east_of_centre_heading_south() {
        let flight = SimulatedFlight::new(&Config::default());
        let sample = flight.sample_at(quarter_orbit());
        let sim = SimulationConfig::default();

        assert!((sample.latitude - sim.center_latitude).abs() < 1e-4);
        assert!(sample.longitude > sim.center_longitude);
        assert!((sample.track_deg - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_ownship_units_round_trip_to_config() {
        let flight = SimulatedFlight::new(&Config::default());
        let data = flight.ownship_at(Duration::from_secs(10));

        assert_eq!(data.altitude, 1247);
        assert_eq!(data.h_velocity, 145);
        assert_eq!(data.v_velocity, 0);
        assert_eq!(data.icao_address, 0xABCDEF);
        assert_eq!(data.callsign, "N12345");
        assert_eq!(data.emitter_category, EmitterCategory::Light);
        assert!(data.airborne);
    }

    #[test]
    fn test_deterministic_in_elapsed_time() {
        let flight = SimulatedFlight::new(&config_with_traffic());
        let elapsed = Duration::from_millis(12_345);

        assert_eq!(flight.ownship_at(elapsed), flight.ownship_at(elapsed));
        assert_eq!(flight.traffic_at(elapsed), flight.traffic_at(elapsed));
    }

    #[test]
    fn test_traffic_starts_at_configured_position() {
        let flight = SimulatedFlight::new(&config_with_traffic());
        let traffic = flight.traffic_at(Duration::ZERO);

        assert_eq!(flight.traffic_count(), 2);
        assert_eq!(traffic.len(), 2);
        assert!((traffic[0].latitude - 37.7749).abs() < EPSILON);
        assert!((traffic[0].longitude - -122.4194).abs() < EPSILON);
        assert_eq!(traffic[0].altitude, 35000);
        assert_eq!(traffic[0].callsign, "UAL123");
        assert_eq!(traffic[0].emitter_category, EmitterCategory::Large);
        assert_eq!(traffic[1].icao_address, 0x100002);
    }

    #[test]
    fn test_traffic_dead_reckons_along_track() {
        let flight = SimulatedFlight::new(&config_with_traffic());
        let traffic = flight.traffic_at(Duration::from_secs(60));

        // 420 kt due north for one minute is 7 nm
        assert!((traffic[0].latitude - (37.7749 + 7.0 / 60.0)).abs() < EPSILON);
        assert!((traffic[0].longitude - -122.4194).abs() < EPSILON);

        // 60 kt due east for one minute, climbing 600 fpm
        assert!((traffic[1].latitude - 37.615).abs() < EPSILON);
        assert!(traffic[1].longitude > -122.375);
        assert_eq!(traffic[1].altitude, 1400);
    }

    #[test]
    fn test_no_traffic_configured() {
        let flight = SimulatedFlight::new(&Config::default());
        assert!(flight.traffic_at(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_offset_position_at_pole_keeps_longitude() {
        let (lat, lon, crossed) = offset_position(90.0, 10.0, -1.0, 5.0);
        assert!((lat - (90.0 - 1.0 / 60.0)).abs() < EPSILON);
        assert_eq!(lon, 10.0);
        assert!(!crossed);
    }

    #[test]
    fn test_offset_position_wraps_longitude() {
        let (_, lon, _) = offset_position(0.0, 179.5, 0.0, 60.0);
        assert!((lon - -179.5).abs() < EPSILON);
    }

    #[test]
    fn test_traffic_over_the_pole_comes_back_down() {
        let mut config = config_with_traffic();
        config.traffic.truncate(1);
        config.traffic[0].latitude = 89.0;
        config.traffic[0].longitude = 10.0;

        let flight = SimulatedFlight::new(&config);

        // 420 nm due north from 89N is 1 degree to the pole and 6 back down
        let traffic = flight.traffic_at(Duration::from_secs(3600));
        assert_eq!(traffic.len(), 1);
        assert!((traffic[0].latitude - 84.0).abs() < EPSILON);
        assert!((traffic[0].longitude - -170.0).abs() < EPSILON);
        assert_eq!(traffic[0].track, 180);
    }

    #[test]
    fn test_long_runs_stay_on_the_globe() {
        let flight = SimulatedFlight::new(&config_with_traffic());

        for hours in [1u64, 10, 50, 100, 1000] {
            for sample in flight.traffic_samples_at(Duration::from_secs(hours * 3600)) {
                assert!((-90.0..=90.0).contains(&sample.latitude), "latitude {}", sample.latitude);
                assert!((-180.0..180.0).contains(&sample.longitude), "longitude {}", sample.longitude);
            }
        }
    }

    #[test]
    fn test_empty_traffic_slot_is_skipped() {
        let mut config = config_with_traffic();
        config.traffic.push(TrafficTargetConfig {
            icao_address: 0x100003,
            callsign: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            altitude_ft: 0,
            ground_speed_kt: 0,
            vertical_speed_fpm: 0,
            track_deg: 0,
            emitter_category: 0,
        });

        let flight = SimulatedFlight::new(&config);
        let traffic = flight.traffic_at(Duration::from_secs(30));

        assert_eq!(flight.traffic_count(), 3);
        assert_eq!(traffic.len(), 2);
        assert!(traffic.iter().all(|t| t.icao_address != 0x100003));
    }

    #[test]
    fn test_implausible_altitude_is_skipped() {
        let mut config = config_with_traffic();
        config.traffic[1].altitude_ft = 400_000;

        let flight = SimulatedFlight::new(&config);
        let traffic = flight.traffic_at(Duration::ZERO);

        assert_eq!(traffic.len(), 1);
        assert_eq!(traffic[0].icao_address, 0x100001);
    }

    #[tokio::test]
    async fn test_source_always_has_ownship() {
        let mut flight = SimulatedFlight::new(&config_with_traffic());

        assert!(flight.ownship().is_some());
        assert_eq!(flight.traffic().len(), 2);
    }
}
