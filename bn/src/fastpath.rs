//! Single word shortcuts for operations with one scalar operand.
use std::num::NonZeroU64;

use num_bigint::BigInt;

use crate::{
    Handle, Value,
    coerce::split_literal,
    native::{self, NativeError, Word},
};

/// A nonzero scalar whose magnitude fits one library word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WordOperand {
    magnitude: NonZeroU64,
    negative: bool,
}

impl WordOperand {
    pub fn new(magnitude: Word, negative: bool) -> Option<Self> {
        let magnitude = NonZeroU64::new(magnitude)?;
        Some(Self {
            magnitude,
            negative,
        })
    }

    pub fn magnitude(self) -> Word {
        self.magnitude.get()
    }

    pub fn is_negative(self) -> bool {
        self.negative
    }
}

#[derive(Debug, Clone)]
pub enum Operand {
    Handle(Handle),
    Word(WordOperand),
    /// needs coercion before the general path
    Other,
}

impl Operand {
    pub fn classify(value: &Value, word_max: Word) -> Self {
        if let Value::BigNum(handle) = value {
            return Operand::Handle(handle.clone());
        }
        match word_operand(value, word_max) {
            Some(word) => Operand::Word(word),
            None => Operand::Other,
        }
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, Operand::Handle(_))
    }
}

/// Returns the scalar as a word operand, `None` for zero and for values
/// outside `[-word_max, word_max]`.
pub fn word_operand(value: &Value, word_max: Word) -> Option<WordOperand> {
    let (magnitude, negative) = match value {
        Value::Int(i) => (i.unsigned_abs(), *i < 0),
        Value::Float(d) => {
            let magnitude = d.abs();
            // 2^64
            if !(magnitude < 18_446_744_073_709_551_616.0) {
                return None;
            }
            let word = magnitude as Word;
            if word as f64 != magnitude {
                return None;
            }
            (word, d.is_sign_negative())
        }
        Value::Str(s) => {
            let literal = split_literal(s)?;
            let word = Word::from_str_radix(literal.digits, literal.radix.base())
                .ok()?;
            (word, literal.negative)
        }
        _ => return None,
    };
    if magnitude > word_max {
        return None;
    }
    WordOperand::new(magnitude, negative)
}

/// `b + d`
pub fn add(b: &BigInt, d: WordOperand) -> BigInt {
    let mut r = b.clone();
    if d.negative {
        native::sub_word(&mut r, d.magnitude());
    } else {
        native::add_word(&mut r, d.magnitude());
    }
    r
}

/// `b - d`, or `d - b` when the scalar is the left operand.
pub fn sub(b: &BigInt, d: WordOperand, scalar_on_left: bool) -> BigInt {
    let mut r = b.clone();
    if d.negative {
        native::add_word(&mut r, d.magnitude());
    } else {
        native::sub_word(&mut r, d.magnitude());
    }
    if scalar_on_left {
        native::negate(&mut r);
    }
    r
}

pub fn mul(b: &BigInt, d: WordOperand) -> BigInt {
    let mut r = b.clone();
    if d.negative {
        native::negate(&mut r);
    }
    native::mul_word(&mut r, d.magnitude());
    r
}

/// Truncating `b / d`.
pub fn div(b: &BigInt, d: WordOperand) -> Result<BigInt, NativeError> {
    let mut r = b.clone();
    if d.negative {
        native::negate(&mut r);
    }
    native::div_word(&mut r, d.magnitude())?;
    Ok(r)
}

/// Truncating `b % d`, the result carries the sign of `b`.
pub fn rem(b: &BigInt, d: WordOperand) -> Result<BigInt, NativeError> {
    let mut r = BigInt::default();
    native::set_word(&mut r, native::mod_word(b, d.magnitude())?);
    native::set_negative(&mut r, native::is_negative(b));
    Ok(r)
}

pub fn eq(b: &BigInt, d: WordOperand) -> bool {
    native::is_negative(b) == d.negative && native::abs_is_word(b, d.magnitude())
}
