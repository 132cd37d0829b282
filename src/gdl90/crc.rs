//! # CRC-16/CCITT Implementation
//!
//! Frame check sequence for GDL-90 messages.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000
//!
//! GDL-90 feeds each message byte into the low half of the register
//! (`table[crc >> 8] ^ (crc << 8) ^ byte`), which is not the XMODEM ordering.
//! The result is appended to the message low byte first.

/// CRC-16/CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// Precomputed CRC16 lookup table
pub const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the GDL-90 CRC-16 over an unescaped message
///
/// # Arguments
///
/// * `data` - Message ID and payload bytes (no flags, no escapes, no CRC)
///
/// # Returns
///
/// * `u16` - Frame check sequence
///
/// # Examples
///
/// ```
/// use gdl90_bridge::gdl90::crc::crc16_ccitt;
///
/// let heartbeat = [0x00, 0x81, 0x01, 0x00, 0x00, 0x00, 0x00];
/// assert_eq!(crc16_ccitt(&heartbeat), 0x9CBC);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, &byte| {
        CRC16_TABLE[(crc >> 8) as usize] ^ (crc << 8) ^ byte as u16
    })
}

/// Calculate the GDL-90 CRC-16 bit by bit (slow, for verification)
///
/// Shifts the whole register eight times per byte, then mixes the byte
/// into the low half. Used primarily for testing the lookup table.
#[allow(dead_code)]
fn crc16_ccitt_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
        crc ^= byte as u16;
    }

    crc
}
