//! # GDL90 Bridge Library
//!
//! Stream flight simulator position and traffic to EFB apps over GDL-90.
//!
//! This library encodes ownship and traffic positions into GDL-90 Heartbeat,
//! Ownship Report and Traffic Report messages and broadcasts them over UDP,
//! the way a portable ADS-B receiver would.

pub mod bridge;
pub mod capture;
pub mod config;
pub mod error;
pub mod gdl90;
pub mod logging;
pub mod telemetry;
pub mod transport;
