//! # Configuration Module
//!
//! Handles loading, validating and saving configuration from TOML files.

use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Gdl90BridgeError, Result};
use crate::gdl90::protocol::EmitterCategory;

/// Maximum number of traffic targets sent per cycle
pub const MAX_TRAFFIC_TARGETS: usize = 63;

/// Highest message rate accepted for any message kind
const MAX_RATE_HZ: f32 = 50.0;

/// Largest 24-bit participant address
const MAX_ICAO_ADDRESS: u32 = 0xFF_FFFF;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub ownship: OwnshipConfig,

    #[serde(default)]
    pub rates: RatesConfig,

    #[serde(default)]
    pub accuracy: AccuracyConfig,

    #[serde(default)]
    pub debug: DebugConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub traffic: Vec<TrafficTargetConfig>,
}

/// Where GDL-90 datagrams are sent
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_target_ip")]
    pub target_ip: String,

    #[serde(default = "default_target_port")]
    pub target_port: u16,

    #[serde(default = "default_broadcast")]
    pub broadcast: bool,
}

/// Identity reported in the Ownship Report
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OwnshipConfig {
    #[serde(default = "default_icao_address")]
    pub icao_address: u32,

    #[serde(default = "default_callsign")]
    pub callsign: String,

    #[serde(default = "default_emitter_category")]
    pub emitter_category: u8,
}

/// Message rates in Hz
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatesConfig {
    #[serde(default = "default_heartbeat_rate")]
    pub heartbeat_rate: f32,

    #[serde(default = "default_position_rate")]
    pub position_rate: f32,

    #[serde(default = "default_traffic_rate")]
    pub traffic_rate: f32,
}

/// Position integrity and accuracy categories
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AccuracyConfig {
    #[serde(default = "default_nic")]
    pub nic: u8,

    #[serde(default = "default_nacp")]
    pub nacp: u8,
}

/// Logging and capture options
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DebugConfig {
    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default)]
    pub log_messages: bool,

    #[serde(default)]
    pub log_dir: String,

    #[serde(default)]
    pub capture_file: String,
}

/// Simulated ownship flight
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_center_latitude")]
    pub center_latitude: f64,

    #[serde(default = "default_center_longitude")]
    pub center_longitude: f64,

    #[serde(default = "default_altitude_ft")]
    pub altitude_ft: i32,

    #[serde(default = "default_ground_speed_kt")]
    pub ground_speed_kt: u16,

    #[serde(default = "default_orbit_radius_nm")]
    pub orbit_radius_nm: f64,
}

/// One static traffic target
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrafficTargetConfig {
    pub icao_address: u32,

    #[serde(default)]
    pub callsign: String,

    pub latitude: f64,

    pub longitude: f64,

    #[serde(default)]
    pub altitude_ft: i32,

    #[serde(default)]
    pub ground_speed_kt: u16,

    #[serde(default)]
    pub vertical_speed_fpm: i16,

    #[serde(default)]
    pub track_deg: u16,

    #[serde(default = "default_emitter_category")]
    pub emitter_category: u8,
}

// Default value functions
fn default_target_ip() -> String { "192.168.1.100".to_string() }
fn default_target_port() -> u16 { 4000 }
fn default_broadcast() -> bool { true }

fn default_icao_address() -> u32 { 0xABCDEF }
fn default_callsign() -> String { "N12345".to_string() }
fn default_emitter_category() -> u8 { EmitterCategory::Light as u8 }

fn default_heartbeat_rate() -> f32 { 1.0 }
fn default_position_rate() -> f32 { 2.0 }
fn default_traffic_rate() -> f32 { 2.0 }

fn default_nic() -> u8 { 11 }
fn default_nacp() -> u8 { 11 }

fn default_center_latitude() -> f64 { 37.621311 }
fn default_center_longitude() -> f64 { -122.378968 }
fn default_altitude_ft() -> i32 { 1247 }
fn default_ground_speed_kt() -> u16 { 145 }
fn default_orbit_radius_nm() -> f64 { 2.0 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            target_ip: default_target_ip(),
            target_port: default_target_port(),
            broadcast: default_broadcast(),
        }
    }
}

impl Default for OwnshipConfig {
    fn default() -> Self {
        Self {
            icao_address: default_icao_address(),
            callsign: default_callsign(),
            emitter_category: default_emitter_category(),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            heartbeat_rate: default_heartbeat_rate(),
            position_rate: default_position_rate(),
            traffic_rate: default_traffic_rate(),
        }
    }
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            nic: default_nic(),
            nacp: default_nacp(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            center_latitude: default_center_latitude(),
            center_longitude: default_center_longitude(),
            altitude_ft: default_altitude_ft(),
            ground_speed_kt: default_ground_speed_kt(),
            orbit_radius_nm: default_orbit_radius_nm(),
        }
    }
}

impl OwnshipConfig {
    /// Emitter category as a protocol enum
    ///
    /// Falls back to `NoInfo` for codes that validation would reject.
    pub fn emitter(&self) -> EmitterCategory {
        EmitterCategory::try_from(self.emitter_category).unwrap_or_default()
    }
}

impl TrafficTargetConfig {
    /// Emitter category as a protocol enum
    pub fn emitter(&self) -> EmitterCategory {
        EmitterCategory::try_from(self.emitter_category).unwrap_or_default()
    }
}

fn invalid(message: impl std::fmt::Display) -> Gdl90BridgeError {
    Gdl90BridgeError::Config(toml::de::Error::custom(message))
}

fn validate_callsign(name: &str, callsign: &str, allow_empty: bool) -> Result<()> {
    if callsign.is_empty() && !allow_empty {
        return Err(invalid(format!("{} cannot be empty", name)));
    }

    if callsign.len() > 8 || !callsign.is_ascii() {
        return Err(invalid(format!(
            "{} must be at most 8 ASCII characters",
            name
        )));
    }

    Ok(())
}

fn validate_emitter(name: &str, code: u8) -> Result<()> {
    EmitterCategory::try_from(code)
        .map(|_| ())
        .map_err(|_| invalid(format!("{} {} is not a defined emitter category", name, code)))
}

fn validate_coordinates(name: &str, latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid(format!("{} latitude must be between -90 and 90", name)));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(format!(
            "{} longitude must be between -180 and 180",
            name
        )));
    }

    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gdl90_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Network
        if self.network.target_ip.trim().is_empty() {
            return Err(invalid("target_ip cannot be empty"));
        }

        if self.network.target_port == 0 {
            return Err(invalid("target_port must be between 1 and 65535"));
        }

        // Ownship identity
        if self.ownship.icao_address > MAX_ICAO_ADDRESS {
            return Err(invalid("icao_address must fit in 24 bits (max 0xFFFFFF)"));
        }

        validate_callsign("callsign", &self.ownship.callsign, false)?;
        validate_emitter("emitter_category", self.ownship.emitter_category)?;

        // Rates
        for (name, value) in [
            ("heartbeat_rate", self.rates.heartbeat_rate),
            ("position_rate", self.rates.position_rate),
            ("traffic_rate", self.rates.traffic_rate),
        ] {
            if !(value > 0.0 && value <= MAX_RATE_HZ) {
                return Err(invalid(format!(
                    "{} must be greater than 0 and at most {} Hz",
                    name, MAX_RATE_HZ
                )));
            }
        }

        // Accuracy categories are 4-bit fields
        if self.accuracy.nic > 15 {
            return Err(invalid("nic must be between 0 and 15"));
        }

        if self.accuracy.nacp > 15 {
            return Err(invalid("nacp must be between 0 and 15"));
        }

        // Simulation
        validate_coordinates(
            "simulation center",
            self.simulation.center_latitude,
            self.simulation.center_longitude,
        )?;

        if !(self.simulation.orbit_radius_nm > 0.0 && self.simulation.orbit_radius_nm <= 50.0) {
            return Err(invalid("orbit_radius_nm must be greater than 0 and at most 50"));
        }

        // Traffic
        if self.traffic.len() > MAX_TRAFFIC_TARGETS {
            return Err(invalid(format!(
                "at most {} traffic targets are supported",
                MAX_TRAFFIC_TARGETS
            )));
        }

        for (index, target) in self.traffic.iter().enumerate() {
            let name = format!("traffic[{}]", index);

            if target.icao_address > MAX_ICAO_ADDRESS {
                return Err(invalid(format!("{} icao_address must fit in 24 bits", name)));
            }

            validate_callsign(&format!("{} callsign", name), &target.callsign, true)?;
            validate_emitter(&format!("{} emitter_category", name), target.emitter_category)?;
            validate_coordinates(&name, target.latitude, target.longitude)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config {
            network: NetworkConfig::default(),
            ownship: OwnshipConfig::default(),
            rates: RatesConfig::default(),
            accuracy: AccuracyConfig::default(),
            debug: DebugConfig::default(),
            simulation: SimulationConfig::default(),
            traffic: vec![TrafficTargetConfig {
                icao_address: 0x100001,
                callsign: "UAL123".to_string(),
                latitude: 37.7749,
                longitude: -122.4194,
                altitude_ft: 35000,
                ground_speed_kt: 420,
                vertical_speed_fpm: 0,
                track_deg: 45,
                emitter_category: EmitterCategory::Large as u8,
            }],
        }
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.traffic.is_empty());
    }

    #[test]
    fn test_valid_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[network]
target_ip = "127.0.0.1"
target_port = 4000

[ownship]
icao_address = 0xA1B2C3
callsign = "TEST1"
emitter_category = 7

[rates]
heartbeat_rate = 1.0
position_rate = 5.0

[accuracy]
nic = 8
nacp = 9

[[traffic]]
icao_address = 0x100002
callsign = "N737BA"
latitude = 37.615
longitude = -122.375
altitude_ft = 800
ground_speed_kt = 85
vertical_speed_fpm = 500
track_deg = 180
"#;

        let temp_file = write_temp(toml_content);
        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.network.target_ip, "127.0.0.1");
        assert_eq!(config.ownship.icao_address, 0xA1B2C3);
        assert_eq!(config.ownship.emitter(), EmitterCategory::Rotorcraft);
        assert_eq!(config.rates.position_rate, 5.0);
        assert_eq!(config.rates.traffic_rate, default_traffic_rate());
        assert_eq!(config.accuracy.nic, 8);
        assert_eq!(config.traffic.len(), 1);
        assert_eq!(config.traffic[0].callsign, "N737BA");
        assert_eq!(config.traffic[0].emitter(), EmitterCategory::Light);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        let defaults = Config::default();

        assert_eq!(config.network, defaults.network);
        assert_eq!(config.ownship, defaults.ownship);
        assert_eq!(config.rates, defaults.rates);
        assert_eq!(config.accuracy, defaults.accuracy);
        assert_eq!(config.debug, defaults.debug);
        assert_eq!(config.simulation, defaults.simulation);
        assert_eq!(config.traffic.len(), 2);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let temp_file = write_temp("");
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/gdl90-bridge.toml");
        assert!(matches!(result, Err(Gdl90BridgeError::Io(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        let temp_file = write_temp("[network\ntarget_port = ");
        let result = Config::load(temp_file.path());
        assert!(matches!(result, Err(Gdl90BridgeError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_file = write_temp("[accuracy]\nnic = 16\n");
        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let config = create_valid_config();
        let temp_file = NamedTempFile::new().unwrap();

        config.save(temp_file.path()).unwrap();
        let reloaded = Config::load(temp_file.path()).unwrap();

        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_empty_target_ip() {
        let mut config = create_valid_config();
        config.network.target_ip = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_port_zero() {
        let mut config = create_valid_config();
        config.network.target_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_icao_address_too_large() {
        let mut config = create_valid_config();
        config.ownship.icao_address = 0x1000000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_icao_address_max() {
        let mut config = create_valid_config();
        config.ownship.icao_address = 0xFFFFFF;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_callsign() {
        let mut config = create_valid_config();
        config.ownship.callsign = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_callsign_too_long() {
        let mut config = create_valid_config();
        config.ownship.callsign = "ABCDEFGHI".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_callsign_non_ascii() {
        let mut config = create_valid_config();
        config.ownship.callsign = "DÄLT".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reserved_emitter_category() {
        let mut config = create_valid_config();
        config.ownship.emitter_category = 8;
        assert!(config.validate().is_err());

        config.ownship.emitter_category = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_emitter_fallback() {
        let mut ownship = OwnshipConfig::default();
        ownship.emitter_category = 8;
        assert_eq!(ownship.emitter(), EmitterCategory::NoInfo);
    }

    #[test]
    fn test_rate_zero() {
        let mut config = create_valid_config();
        config.rates.heartbeat_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_negative() {
        let mut config = create_valid_config();
        config.rates.position_rate = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_too_high() {
        let mut config = create_valid_config();
        config.rates.traffic_rate = 51.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_nan() {
        let mut config = create_valid_config();
        config.rates.traffic_rate = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nic_out_of_range() {
        let mut config = create_valid_config();
        config.accuracy.nic = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nacp_out_of_range() {
        let mut config = create_valid_config();
        config.accuracy.nacp = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_simulation_center_out_of_range() {
        let mut config = create_valid_config();
        config.simulation.center_latitude = 91.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_orbit_radius_zero() {
        let mut config = create_valid_config();
        config.simulation.orbit_radius_nm = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_traffic_invalid_coordinates() {
        let mut config = create_valid_config();
        config.traffic[0].longitude = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_traffic_empty_callsign_allowed() {
        let mut config = create_valid_config();
        config.traffic[0].callsign = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_traffic_invalid_icao() {
        let mut config = create_valid_config();
        config.traffic[0].icao_address = 0x1000000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_many_traffic_targets() {
        let mut config = create_valid_config();
        let target = config.traffic[0].clone();
        config.traffic = vec![target; MAX_TRAFFIC_TARGETS + 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_target_ip(), "192.168.1.100");
        assert_eq!(default_target_port(), 4000);
        assert!(default_broadcast());
        assert_eq!(default_icao_address(), 0xABCDEF);
        assert_eq!(default_callsign(), "N12345");
        assert_eq!(default_emitter_category(), 1);
        assert_eq!(default_heartbeat_rate(), 1.0);
        assert_eq!(default_position_rate(), 2.0);
        assert_eq!(default_traffic_rate(), 2.0);
        assert_eq!(default_nic(), 11);
        assert_eq!(default_nacp(), 11);
        assert_eq!(default_altitude_ft(), 1247);
        assert_eq!(default_ground_speed_kt(), 145);
        assert_eq!(default_orbit_radius_nm(), 2.0);
    }
}
