//! CRC-8 frame checksum.
//!
//! Polynomial 0x07, initial value 0, MSB first, no final XOR (the
//! CRC-8/SMBUS parameter set). The CRC covers the message id, the length
//! byte and the payload; the start marker is excluded.

use crate::constants::{CRC8_INIT, CRC8_POLY};

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC8_TABLE: [u8; 256] = build_table();

/// Fold one byte into a running CRC.
#[inline(always)]
pub fn crc8_update(crc: u8, byte: u8) -> u8 {
    CRC8_TABLE[(crc ^ byte) as usize]
}

/// CRC-8 of a byte slice.
#[inline]
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(CRC8_INIT, |crc, &b| crc8_update(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-serial reference used to cross-check the table.
    fn crc8_bitwise(data: &[u8]) -> u8 {
        let mut crc = CRC8_INIT;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                if crc & 0x80 != 0 {
                    crc = (crc << 1) ^ CRC8_POLY;
                } else {
                    crc <<= 1;
                }
            }
        }
        crc
    }

    #[test]
    fn test_check_value() {
        // Standard check input for CRC-8/SMBUS
        assert_eq!(crc8(b"123456789"), 0xF4);
    }

    #[test]
    fn test_empty() {
        assert_eq!(crc8(&[]), CRC8_INIT);
    }

    #[test]
    fn test_table_matches_bitwise() {
        for b in 0..=255u8 {
            assert_eq!(crc8(&[b]), crc8_bitwise(&[b]), "byte 0x{:02X}", b);
        }
        let data = [0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(crc8(&data), crc8_bitwise(&data));
    }

    #[test]
    fn test_incremental_matches_slice() {
        let data = b"heartbeat";
        let running = data.iter().fold(CRC8_INIT, |crc, &b| crc8_update(crc, b));
        assert_eq!(running, crc8(data));
    }

    #[test]
    fn test_detects_single_bit_flip() {
        let data = [0x02, 0x0C, 0x10, 0x20, 0x30, 0x40];
        let good = crc8(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[i] ^= 1 << bit;
                assert_ne!(crc8(&flipped), good);
            }
        }
    }
}
