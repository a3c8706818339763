//! Packed vector types
//!
//! Normalised and bit-packed vectors found in vertex and texture data. All
//! implement [`Bufferable`] and can be used directly as field types.
//!
//! [`PackedAxes`] describes how floating-point components map onto integer
//! bit ranges:
//! - `Unsigned`: `[0, 1]` maps onto `[0, 2^n - 1]`
//! - `SignExtended`: `[-1, 1]` maps onto two's complement `[-(2^(n-1) - 1), 2^(n-1) - 1]`
//! - `SignShifted`: `[-1, 1]` maps onto `[0, 2^n - 2]`, with zero at the midpoint

use crate::strategy::buffer::Bufferable;

/// How a component's sign is represented in its bit range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMode {
    /// Unsigned normalised
    Unsigned,
    /// Two's complement normalised
    SignExtended,
    /// Offset binary normalised
    SignShifted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitRange {
    offset: u32,
    length: u32,
}

impl BitRange {
    fn length_mask(self) -> u32 {
        ((1u64 << self.length) - 1) as u32
    }

    fn offset_mask(self) -> u32 {
        self.length_mask() << self.offset
    }

    fn sign_mask(self) -> u32 {
        1u32 << (self.offset + self.length - 1)
    }

    fn sign_extend(self) -> u32 {
        if self.length >= 32 {
            0
        } else {
            u32::MAX << self.length
        }
    }

    fn unsigned_scale(self) -> f32 {
        ((1u64 << self.length) - 1) as f32
    }

    fn signed_scale(self) -> f32 {
        ((1u64 << (self.length - 1)) - 1) as f32
    }
}

/// Layout of up to four normalised components within a `u32`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedAxes {
    mode: SignMode,
    axes: [BitRange; 4],
}

impl PackedAxes {
    /// Consecutive bit ranges of the given widths, starting at bit 0
    pub const fn new(mode: SignMode, precision: [u32; 4]) -> Self {
        let mut axes = [BitRange {
            offset: 0,
            length: 0,
        }; 4];
        let mut offset = 0;
        let mut i = 0;
        while i < 4 {
            axes[i] = BitRange {
                offset,
                length: precision[i],
            };
            offset += precision[i];
            i += 1;
        }
        PackedAxes { mode, axes }
    }

    /// One component occupying the low `bits` bits
    pub const fn single(mode: SignMode, bits: u32) -> Self {
        Self::new(mode, [bits, 0, 0, 0])
    }

    fn unsigned_bits(&self, bits: u32, axis: usize) -> u32 {
        let range = self.axes[axis];
        (bits >> range.offset) & range.length_mask()
    }

    fn signed_bits(&self, bits: u32, axis: usize) -> i32 {
        let range = self.axes[axis];
        let extend = if bits & range.sign_mask() != 0 {
            range.sign_extend()
        } else {
            0
        };
        (self.unsigned_bits(bits, axis) | extend) as i32
    }

    /// Component `axis` of `bits`
    pub fn get(&self, bits: u32, axis: usize) -> f32 {
        let range = self.axes[axis];
        match self.mode {
            SignMode::Unsigned => self.unsigned_bits(bits, axis) as f32 / range.unsigned_scale(),
            SignMode::SignExtended => self.signed_bits(bits, axis) as f32 / range.signed_scale(),
            SignMode::SignShifted => {
                self.unsigned_bits(bits, axis) as f32 / range.signed_scale() - 1.0
            }
        }
    }

    /// Replace component `axis` of `bits` with `value`, clamped to the mode's range
    pub fn set(&self, bits: &mut u32, axis: usize, value: f32) {
        let range = self.axes[axis];
        let scaled = match self.mode {
            SignMode::Unsigned => value.clamp(0.0, 1.0) * range.unsigned_scale(),
            SignMode::SignExtended => value.clamp(-1.0, 1.0) * range.signed_scale(),
            SignMode::SignShifted => (value.clamp(-1.0, 1.0) + 1.0) * range.signed_scale(),
        }
        .round();
        let raw = match self.mode {
            SignMode::SignExtended => (scaled as i32 as u32) & range.length_mask(),
            _ => (scaled as u32) & range.length_mask(),
        };
        *bits = (*bits & !range.offset_mask()) | (raw << range.offset);
    }
}

/// Three 32-bit floats
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// Vector from components
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

impl Bufferable for Vector3 {
    const PACK_SIZE: usize = 4;
    const SIZE_OF: usize = 12;

    fn read_from_buffer(buffer: &[u8]) -> Self {
        let f = |i: usize| f32::from_le_bytes([buffer[i], buffer[i + 1], buffer[i + 2], buffer[i + 3]]);
        Vector3::new(f(0), f(4), f(8))
    }

    fn write_to_buffer(&self, buffer: &mut [u8]) {
        buffer[0..4].copy_from_slice(&self.x.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.y.to_le_bytes());
        buffer[8..12].copy_from_slice(&self.z.to_le_bytes());
    }
}

macro_rules! packed_vector4 {
    (
        $(#[$meta:meta])*
        $name:ident, $bits:ty, $helper:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            bits: [$bits; 4],
        }

        impl $name {
            const HELPER: PackedAxes = $helper;

            /// Vector from normalised components
            pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
                let mut v = Self::default();
                v.set(0, x);
                v.set(1, y);
                v.set(2, z);
                v.set(3, w);
                v
            }

            /// Vector from raw component bits
            pub const fn from_bits(bits: [$bits; 4]) -> Self {
                $name { bits }
            }

            /// Raw component bits
            pub const fn bits(&self) -> [$bits; 4] {
                self.bits
            }

            /// Normalised component `axis` (0 to 3)
            pub fn get(&self, axis: usize) -> f32 {
                Self::HELPER.get(self.bits[axis] as u32, 0)
            }

            /// Set normalised component `axis` (0 to 3)
            pub fn set(&mut self, axis: usize, value: f32) {
                let mut raw = self.bits[axis] as u32;
                Self::HELPER.set(&mut raw, 0, value);
                self.bits[axis] = raw as $bits;
            }

            /// X component
            pub fn x(&self) -> f32 {
                self.get(0)
            }

            /// Y component
            pub fn y(&self) -> f32 {
                self.get(1)
            }

            /// Z component
            pub fn z(&self) -> f32 {
                self.get(2)
            }

            /// W component
            pub fn w(&self) -> f32 {
                self.get(3)
            }
        }

        impl Bufferable for $name {
            const PACK_SIZE: usize = std::mem::size_of::<$bits>();
            const SIZE_OF: usize = 4 * std::mem::size_of::<$bits>();

            fn read_from_buffer(buffer: &[u8]) -> Self {
                const WIDTH: usize = std::mem::size_of::<$bits>();
                let mut bits = [0 as $bits; 4];
                for (i, chunk) in buffer[..4 * WIDTH].chunks_exact(WIDTH).enumerate() {
                    let mut raw = [0u8; WIDTH];
                    raw.copy_from_slice(chunk);
                    bits[i] = <$bits>::from_le_bytes(raw);
                }
                $name { bits }
            }

            fn write_to_buffer(&self, buffer: &mut [u8]) {
                const WIDTH: usize = std::mem::size_of::<$bits>();
                for (i, chunk) in buffer[..4 * WIDTH].chunks_exact_mut(WIDTH).enumerate() {
                    chunk.copy_from_slice(&self.bits[i].to_le_bytes());
                }
            }
        }
    };
}

packed_vector4! {
    /// Four unsigned normalised bytes
    ByteN4, u8, PackedAxes::single(SignMode::Unsigned, 8)
}

packed_vector4! {
    /// Four unsigned normalised 16-bit components
    UInt16N4, u16, PackedAxes::single(SignMode::Unsigned, 16)
}

packed_vector4! {
    /// Four signed normalised 16-bit components
    Int16N4, u16, PackedAxes::single(SignMode::SignExtended, 16)
}

/// Three signed 10-bit components and one signed 2-bit component in one `u32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecN4 {
    bits: u32,
}

impl DecN4 {
    const HELPER: PackedAxes = PackedAxes::new(SignMode::SignExtended, [10, 10, 10, 2]);

    /// Vector from normalised components
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        let mut bits = 0;
        for (axis, value) in [x, y, z, w].into_iter().enumerate() {
            Self::HELPER.set(&mut bits, axis, value);
        }
        DecN4 { bits }
    }

    /// Vector from its packed representation
    pub const fn from_bits(bits: u32) -> Self {
        DecN4 { bits }
    }

    /// Packed representation
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Normalised component `axis` (0 to 3)
    pub fn get(&self, axis: usize) -> f32 {
        Self::HELPER.get(self.bits, axis)
    }

    /// X component
    pub fn x(&self) -> f32 {
        self.get(0)
    }

    /// Y component
    pub fn y(&self) -> f32 {
        self.get(1)
    }

    /// Z component
    pub fn z(&self) -> f32 {
        self.get(2)
    }

    /// W component
    pub fn w(&self) -> f32 {
        self.get(3)
    }
}

impl Bufferable for DecN4 {
    const PACK_SIZE: usize = 4;
    const SIZE_OF: usize = 4;

    fn read_from_buffer(buffer: &[u8]) -> Self {
        DecN4::from_bits(u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]))
    }

    fn write_to_buffer(&self, buffer: &mut [u8]) {
        buffer[..4].copy_from_slice(&self.bits.to_le_bytes());
    }
}
