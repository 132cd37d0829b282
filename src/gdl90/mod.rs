//! # GDL-90 Protocol Module
//!
//! Implementation of the Garmin GDL-90 Data Interface (560-1058-00 Rev A)
//! for streaming ownship and traffic to Electronic Flight Bag apps.
//!
//! This module handles:
//! - Heartbeat (0x00), Ownship Report (0x0A) and Traffic Report (0x14) encoding
//! - Signed fixed-point coordinate, altitude and velocity packing
//! - CRC-16/CCITT checksum calculation
//! - Byte-stuffing and flag framing
//! - Frame decoding and verification

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
