//! Chip-to-byte packing

/// Bit order used when composing bytes from chips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// First chip of each group is the most significant bit
    #[default]
    MsbFirst,
    /// First chip of each group is the least significant bit
    LsbFirst,
}

impl BitOrder {
    /// Map the descriptor's `msb_first` flag onto a bit order
    pub fn from_msb_first(msb_first: bool) -> Self {
        if msb_first {
            Self::MsbFirst
        } else {
            Self::LsbFirst
        }
    }
}

/// Pack 0/1 chips into bytes, zero-padding the tail to a whole byte
///
/// Any non-zero chip value counts as a 1.
pub fn pack(chips: &[u8], order: BitOrder) -> Vec<u8> {
    chips
        .chunks(8)
        .map(|group| {
            let mut byte = 0u8;
            for (i, &chip) in group.iter().enumerate() {
                if chip != 0 {
                    byte |= match order {
                        BitOrder::MsbFirst => 0x80 >> i,
                        BitOrder::LsbFirst => 0x01 << i,
                    };
                }
            }
            byte
        })
        .collect()
}
