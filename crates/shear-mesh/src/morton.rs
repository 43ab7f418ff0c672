//! Morton (Z-order) encoding of 2-D element indices.
//!
//! x occupies the even bits, y the odd bits. On a `2^L x 2^L` brick the
//! encoding is a bijection onto `0..4^L`, and contiguous ranges of codes
//! are spatially compact, which is what the rank and subdomain cuts rely on.

fn spread(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

fn compact(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

/// Interleave `(ix, iy)` into a Morton code.
pub fn encode(ix: u32, iy: u32) -> u64 {
    spread(ix) | (spread(iy) << 1)
}

/// Split a Morton code back into `(ix, iy)`.
pub fn decode(code: u64) -> (u32, u32) {
    (compact(code), compact(code >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_codes_follow_z_order() {
        let order: Vec<_> = (0..4).map(decode).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(encode(2, 0), 4);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(ix in 0u32..(1 << 20), iy in 0u32..(1 << 20)) {
            prop_assert_eq!(decode(encode(ix, iy)), (ix, iy));
        }
    }
}
