//! Host scalar width handling.
//!
//! A negative host integer is decomposed from its two's complement bit
//! pattern, so the accumulated big integer is `value + 2^W` and 2^W has to
//! be taken off again. How that subtraction happens depends on whether 2^W
//! fits a library word; the strategy is picked once per session.
use num_bigint::BigInt;

use crate::native::{self, Word};

/// Integer types the host may hand over as scalars.
pub trait HostScalar: Copy {
    const BITS: u32;

    fn is_negative(self) -> bool;

    /// 32 bit chunk `index` of the two's complement pattern, 0 is least significant.
    fn chunk(self, index: u32) -> u32;
}

macro_rules! host_scalar {
    ($($ty:ty => $unsigned:ty),*) => {
        $(
            impl HostScalar for $ty {
                const BITS: u32 = <$ty>::BITS;

                fn is_negative(self) -> bool {
                    self < 0
                }

                fn chunk(self, index: u32) -> u32 {
                    ((self as $unsigned) >> (32 * index)) as u32
                }
            }
        )*
    };
}

host_scalar!(i32 => u32, i64 => u64, i128 => u128);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WideRange {
    /// 2^W fits a single word.
    Word { bits: u32, modulo: Word },
    /// W equals the word width: 2^W = 1 + WORD_MAX.
    TwoWords { bits: u32, word_max: Word },
    /// W exceeds the word width, 2^W is kept as a big integer.
    Constant { bits: u32, modulo: BigInt },
}

impl WideRange {
    pub fn new(scalar_bits: u32, word_bits: u32) -> Self {
        debug_assert!(word_bits <= native::WORD_BITS);
        if scalar_bits < word_bits {
            WideRange::Word {
                bits: scalar_bits,
                modulo: 1 << scalar_bits,
            }
        } else if scalar_bits == word_bits {
            WideRange::TwoWords {
                bits: scalar_bits,
                word_max: Word::MAX >> (native::WORD_BITS - word_bits),
            }
        } else {
            let mut modulo = BigInt::default();
            native::set_word(&mut modulo, 1);
            native::lshift(&mut modulo, scalar_bits as usize);
            WideRange::Constant {
                bits: scalar_bits,
                modulo,
            }
        }
    }

    pub fn for_scalar<S: HostScalar>(word_bits: u32) -> Self {
        Self::new(S::BITS, word_bits)
    }

    pub fn scalar_bits(&self) -> u32 {
        match self {
            WideRange::Word { bits, .. }
            | WideRange::TwoWords { bits, .. }
            | WideRange::Constant { bits, .. } => *bits,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, WideRange::Constant { .. })
    }

    /// `r -= 2^W`
    pub fn compensate(&self, r: &mut BigInt) {
        match self {
            WideRange::Word { modulo, .. } => native::sub_word(r, *modulo),
            WideRange::TwoWords { word_max, .. } => {
                native::sub_word(r, 1);
                native::sub_word(r, *word_max);
            }
            WideRange::Constant { modulo, .. } => {
                *r = native::sub(r, modulo);
            }
        }
    }
}

/// Builds the big integer for a host scalar one 32 bit chunk at a time,
/// most significant first.
pub fn decompose<S: HostScalar>(value: S, range: &WideRange) -> BigInt {
    debug_assert_eq!(range.scalar_bits(), S::BITS);
    let mut r = BigInt::default();
    for index in (0..S::BITS / 32).rev() {
        let chunk = value.chunk(index) as Word;
        if !native::is_zero(&r) {
            native::lshift(&mut r, 32);
            native::add_word(&mut r, chunk);
        } else if chunk != 0 {
            native::set_word(&mut r, chunk);
        }
    }
    if value.is_negative() {
        range.compensate(&mut r);
    }
    r
}
