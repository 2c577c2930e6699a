//! TinyFrame checksum used by the LD6002 serial protocol.
//!
//! Both the header and the payload are guarded by the same 8-bit checksum:
//! the bitwise complement of the XOR of every byte in the range.

/// Compute `!(b0 ^ b1 ^ … ^ bn-1)`. An empty range yields `0xFF`.
pub fn checksum(data: &[u8]) -> u8 {
    !data.iter().fold(0u8, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::checksum;

    #[test]
    fn empty_range_is_all_ones() {
        assert_eq!(checksum(&[]), 0xFF);
    }

    #[test]
    fn matches_complemented_xor_fold() {
        let samples: [&[u8]; 4] = [
            &[0x00],
            &[0x01, 0x00, 0x00, 0x00, 0x01, 0x0E, 0x02],
            &[0xFF, 0xFF],
            &[0x12, 0x34, 0x56, 0x78, 0x9A],
        ];
        for data in samples {
            let mut xor = 0u8;
            for b in data {
                xor ^= b;
            }
            assert_eq!(checksum(data), !xor, "data={:02x?}", data);
        }
    }

    #[test]
    fn known_fall_status_header() {
        // 01 ^ 00 ^ 00 ^ 00 ^ 01 ^ 0E ^ 02 = 0x0C
        assert_eq!(checksum(&[0x01, 0x00, 0x00, 0x00, 0x01, 0x0E, 0x02]), 0xF3);
        assert_eq!(checksum(&[0x00]), 0xFF);
        assert_eq!(checksum(&[0x01]), 0xFE);
    }
}
