//! 30-bit interleaved Morton codes over a `[0, 1]`-normalized cube,
//! used to order BVH leaves for the top-down binary split.

use glam::Vec3;

fn expand_bits(value: u32) -> u32 {
    let value = (value.wrapping_mul(0x0001_0001)) & 0xFF00_00FF;
    let value = (value.wrapping_mul(0x0000_0101)) & 0x0F00_F00F;
    let value = (value.wrapping_mul(0x0000_0011)) & 0xC30C_30C3;
    (value.wrapping_mul(0x0000_0005)) & 0x4924_9249
}

/// Interleaves the 10-bit-quantized components of a point already
/// normalized into `[0, 1]^3` into a 30-bit Morton code.
#[must_use]
pub fn morton(position: Vec3) -> u32 {
    let x = (position.x * 1024.0).clamp(0.0, 1023.0);
    let y = (position.y * 1024.0).clamp(0.0, 1023.0);
    let z = (position.z * 1024.0).clamp(0.0, 1023.0);

    let xx = expand_bits(x as u32);
    let yy = expand_bits(y as u32);
    let zz = expand_bits(z as u32);

    xx * 4 + yy * 2 + zz
}

/// Length of the common prefix, measured from the trailing (low-order)
/// end, of two Morton codes — matches the source's `CommonUpperBits`,
/// which drives the split point search via a trailing-zero count rather
/// than a leading-zero count.
#[must_use]
pub fn common_upper_bits(a: u32, b: u32) -> u32 {
    (a ^ b).trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_zero() {
        assert_eq!(morton(Vec3::ZERO), 0);
    }

    #[test]
    fn identical_codes_have_maximal_common_bits() {
        assert_eq!(common_upper_bits(5, 5), 32);
    }

    #[test]
    fn codes_differing_in_low_bit_share_fewer_bits() {
        assert!(common_upper_bits(0b1000, 0b1001) < common_upper_bits(0b1000, 0b1000_0));
    }
}
