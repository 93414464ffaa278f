use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// A 96-bit signed integer stored as three little-endian 32-bit limbs.
///
/// The type survives for compatibility with the deprecated int96 timestamp
/// encoding. It is opaque to the rest of the core except for its total order,
/// which compares values as signed 96-bit quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Int96(pub [u32; 3]);

impl Int96 {
    /// Reassemble from a little-endian 12-byte representation.
    pub fn from_le_bytes(bytes: [u8; 12]) -> Self {
        let limb = |i: usize| {
            u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };
        Self([limb(0), limb(4), limb(8)])
    }

    /// Little-endian 12-byte representation.
    pub fn to_le_bytes(self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        for (i, limb) in self.0.iter().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&limb.to_le_bytes());
        }
        bytes
    }
}

impl From<i64> for Int96 {
    fn from(value: i64) -> Self {
        // Sign-extend into the high limb.
        let high = if value < 0 { u32::MAX } else { 0 };
        Self([value as u32, (value >> 32) as u32, high])
    }
}

impl Ord for Int96 {
    fn cmp(&self, other: &Self) -> Ordering {
        // The high limb carries the sign, the lower limbs compare unsigned.
        (self.0[2] as i32)
            .cmp(&(other.0[2] as i32))
            .then_with(|| self.0[1].cmp(&other.0[1]))
            .then_with(|| self.0[0].cmp(&other.0[0]))
    }
}

impl PartialOrd for Int96 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Int96 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}{:08x}{:08x}", self.0[2], self.0[1], self.0[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_signed() {
        let minus_one = Int96::from(-1i64);
        let zero = Int96::from(0i64);
        let one = Int96::from(1i64);
        assert!(minus_one < zero);
        assert!(zero < one);
        assert!(minus_one < one);
    }

    #[test]
    fn bytes_round_trip() {
        let value = Int96([0xdead_beef, 0x0123_4567, 0x89ab_cdef]);
        assert_eq!(Int96::from_le_bytes(value.to_le_bytes()), value);
    }

    #[test]
    fn sign_extension_from_i64() {
        assert_eq!(Int96::from(-1i64).0, [u32::MAX, u32::MAX, u32::MAX]);
        assert_eq!(Int96::from(1i64).0, [1, 0, 0]);
    }
}
