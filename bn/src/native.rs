//! Narrow capability layer over the arbitrary precision backend.
//!
//! Everything the adapter needs from `num-bigint` goes through here, shaped
//! like a classic C bignum library: word sized primitives, a scratch context
//! for the multi-word algorithms and failure returns carrying an error code
//! plus an optional reason string.
use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// The library's unsigned machine word.
pub type Word = u64;

pub const WORD_BITS: u32 = Word::BITS;

// scratch values kept alive between operations
const POOL_LIMIT: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NativeError {
    DivisionByZero,
    NegativeExponent,
    ExponentTooLarge,
    ModulusNotPositive,
    InvalidDigit,
    BufferTooSmall,
}

impl NativeError {
    pub fn code(self) -> u32 {
        match self {
            NativeError::DivisionByZero => 103,
            NativeError::NegativeExponent => 104,
            NativeError::ExponentTooLarge => 105,
            NativeError::ModulusNotPositive => 106,
            NativeError::InvalidDigit => 107,
            NativeError::BufferTooSmall => 108,
        }
    }

    pub fn reason(self) -> Option<&'static str> {
        let reason = match self {
            NativeError::DivisionByZero => "division by zero",
            NativeError::NegativeExponent => "negative exponent",
            NativeError::ExponentTooLarge => "exponent too large",
            NativeError::ModulusNotPositive => "modulus must be positive",
            NativeError::InvalidDigit => "invalid digit",
            NativeError::BufferTooSmall => "buffer too small",
        };
        Some(reason)
    }
}

/// Scratch space for multiply, divide, modular and gcd primitives.
#[derive(Debug, Default)]
pub struct ArithContext {
    pool: Vec<BigInt>,
    in_use: usize,
    operations: u64,
}

impl ArithContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scratch values currently handed out.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }

    fn with_temp<R>(&mut self, f: impl FnOnce(&mut BigInt) -> R) -> R {
        self.operations += 1;
        self.in_use += 1;
        let mut temp = self.pool.pop().unwrap_or_default();
        let res = f(&mut temp);
        temp.set_zero();
        self.in_use -= 1;
        if self.pool.len() < POOL_LIMIT {
            self.pool.push(temp);
        }
        res
    }
}

pub fn is_zero(a: &BigInt) -> bool {
    a.is_zero()
}

pub fn is_one(a: &BigInt) -> bool {
    a.is_one()
}

pub fn is_odd(a: &BigInt) -> bool {
    a.is_odd()
}

pub fn is_negative(a: &BigInt) -> bool {
    a.is_negative()
}

/// `|a| == w` without building a temporary.
pub fn abs_is_word(a: &BigInt, w: Word) -> bool {
    let mut digits = a.magnitude().iter_u64_digits();
    match (digits.next(), digits.next()) {
        (None, _) => w == 0,
        (Some(d), None) => d == w,
        _ => false,
    }
}

pub fn set_word(r: &mut BigInt, w: Word) {
    *r = BigInt::from(w);
}

/// Sets the sign of a nonzero value, zero stays zero.
pub fn set_negative(r: &mut BigInt, negative: bool) {
    if r.is_zero() || r.is_negative() == negative {
        return;
    }
    negate(r);
}

pub fn negate(r: &mut BigInt) {
    let value = std::mem::take(r);
    *r = -value;
}

pub fn cmp(a: &BigInt, b: &BigInt) -> Ordering {
    a.cmp(b)
}

pub fn ucmp(a: &BigInt, b: &BigInt) -> Ordering {
    a.magnitude().cmp(b.magnitude())
}

pub fn add(a: &BigInt, b: &BigInt) -> BigInt {
    a + b
}

pub fn sub(a: &BigInt, b: &BigInt) -> BigInt {
    a - b
}

pub fn lshift(r: &mut BigInt, bits: usize) {
    *r <<= bits;
}

pub fn add_word(r: &mut BigInt, w: Word) {
    *r += w;
}

pub fn sub_word(r: &mut BigInt, w: Word) {
    *r -= w;
}

pub fn mul_word(r: &mut BigInt, w: Word) {
    *r *= w;
}

/// Divides `r` in place by `w`, truncating, and returns `|r| mod w`.
pub fn div_word(r: &mut BigInt, w: Word) -> Result<Word, NativeError> {
    let rem = mod_word(r, w)?;
    *r /= w;
    Ok(rem)
}

/// `|a| mod w`.
pub fn mod_word(a: &BigInt, w: Word) -> Result<Word, NativeError> {
    if w == 0 {
        return Err(NativeError::DivisionByZero);
    }
    let digits: Vec<u64> = a.magnitude().iter_u64_digits().collect();
    let mut rem = 0u128;
    for &digit in digits.iter().rev() {
        rem = ((rem << 64) | digit as u128) % w as u128;
    }
    Ok(rem as Word)
}

pub fn mul(a: &BigInt, b: &BigInt, ctx: &mut ArithContext) -> BigInt {
    ctx.with_temp(|t| {
        t.clone_from(a);
        *t *= b;
        t.clone()
    })
}

pub fn sqr(a: &BigInt, ctx: &mut ArithContext) -> BigInt {
    mul(a, a, ctx)
}

/// Truncating division, the remainder takes the sign of the dividend.
pub fn div_rem(
    a: &BigInt,
    b: &BigInt,
    ctx: &mut ArithContext,
) -> Result<(BigInt, BigInt), NativeError> {
    if b.is_zero() {
        return Err(NativeError::DivisionByZero);
    }
    ctx.operations += 1;
    Ok(a.div_rem(b))
}

pub fn exp(
    a: &BigInt,
    p: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    if p.is_negative() {
        return Err(NativeError::NegativeExponent);
    }
    ctx.operations += 1;
    if p.is_zero() {
        return Ok(BigInt::one());
    }
    if a.is_zero() || a.is_one() {
        return Ok(a.clone());
    }
    if a.magnitude().is_one() {
        // a == -1
        return Ok(if p.is_odd() { a.clone() } else { BigInt::one() });
    }
    let Some(p) = p.to_u32() else {
        return Err(NativeError::ExponentTooLarge);
    };
    Ok(a.pow(p))
}

pub fn gcd(a: &BigInt, b: &BigInt, ctx: &mut ArithContext) -> BigInt {
    ctx.operations += 1;
    a.gcd(b)
}

/// Reduces `a` into `[0, |m|)`.
pub fn nnmod(
    a: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    if m.is_zero() {
        return Err(NativeError::DivisionByZero);
    }
    ctx.operations += 1;
    Ok(a.mod_floor(&m.abs()))
}

pub fn mod_add(
    a: &BigInt,
    b: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    let sum = add(a, b);
    nnmod(&sum, m, ctx)
}

pub fn mod_sub(
    a: &BigInt,
    b: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    let diff = sub(a, b);
    nnmod(&diff, m, ctx)
}

pub fn mod_mul(
    a: &BigInt,
    b: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    if m.is_zero() {
        return Err(NativeError::DivisionByZero);
    }
    let modulus = m.abs();
    Ok(ctx.with_temp(|t| {
        t.clone_from(a);
        *t *= b;
        t.mod_floor(&modulus)
    }))
}

pub fn mod_sqr(
    a: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    mod_mul(a, a, m, ctx)
}

pub fn mod_exp(
    a: &BigInt,
    p: &BigInt,
    m: &BigInt,
    ctx: &mut ArithContext,
) -> Result<BigInt, NativeError> {
    if m.is_zero() {
        return Err(NativeError::DivisionByZero);
    }
    if m.is_negative() {
        return Err(NativeError::ModulusNotPositive);
    }
    if p.is_negative() {
        return Err(NativeError::NegativeExponent);
    }
    Ok(ctx.with_temp(|base| {
        *base = a.mod_floor(m);
        base.modpow(p, m)
    }))
}

pub fn from_dec(digits: &str) -> Result<BigInt, NativeError> {
    from_radix(digits, 10)
}

pub fn from_hex(digits: &str) -> Result<BigInt, NativeError> {
    from_radix(digits, 16)
}

// parse_bytes tolerates '_' separators, the library format does not
fn from_radix(digits: &str, radix: u32) -> Result<BigInt, NativeError> {
    let (negative, digits) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(NativeError::InvalidDigit);
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or(NativeError::InvalidDigit)?;
    Ok(if negative { -magnitude } else { magnitude })
}

pub fn to_dec(a: &BigInt) -> Vec<u8> {
    a.to_str_radix(10).into_bytes()
}

pub fn to_hex(a: &BigInt) -> Vec<u8> {
    a.to_str_radix(16).to_ascii_uppercase().into_bytes()
}

/// Length of the big endian magnitude encoding, zero encodes as no bytes.
pub fn num_bytes(a: &BigInt) -> usize {
    a.bits().div_ceil(8) as usize
}

/// Writes the big endian magnitude of `a` into the front of `out`.
pub fn bn2bin(a: &BigInt, out: &mut [u8]) -> Result<usize, NativeError> {
    let len = num_bytes(a);
    if out.len() < len {
        return Err(NativeError::BufferTooSmall);
    }
    let mut end = len;
    for digit in a.magnitude().iter_u64_digits() {
        for byte in digit.to_le_bytes() {
            if end == 0 {
                break;
            }
            end -= 1;
            out[end] = byte;
        }
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(s: &str) -> BigInt {
        from_dec(s).expect("valid literal")
    }

    #[test]
    fn word_division_truncates_toward_zero() {
        let mut r = big("-7");
        let rem = div_word(&mut r, 2).unwrap();
        assert_eq!(r, big("-3"));
        assert_eq!(rem, 1);
    }

    #[test]
    fn mod_word_uses_magnitude() {
        let a = big("-340282366920938463463374607431768211457");
        assert_eq!(mod_word(&a, 10).unwrap(), 7);
        assert_eq!(mod_word(&a, 0), Err(NativeError::DivisionByZero));
    }

    #[test]
    fn abs_is_word_ignores_sign() {
        assert!(abs_is_word(&big("-42"), 42));
        assert!(abs_is_word(&big("0"), 0));
        assert!(!abs_is_word(&big("18446744073709551616"), 0));
    }

    #[test]
    fn set_negative_leaves_zero_alone() {
        let mut r = BigInt::zero();
        set_negative(&mut r, true);
        assert!(!is_negative(&r));
        let mut r = big("5");
        set_negative(&mut r, true);
        assert_eq!(r, big("-5"));
    }

    #[test]
    fn division_by_zero_is_a_failure_return() {
        let mut ctx = ArithContext::new();
        let err = div_rem(&big("1"), &BigInt::zero(), &mut ctx).unwrap_err();
        assert_eq!(err.reason(), Some("division by zero"));
    }

    #[test]
    fn nnmod_is_non_negative() {
        let mut ctx = ArithContext::new();
        assert_eq!(nnmod(&big("-7"), &big("5"), &mut ctx).unwrap(), big("3"));
        assert_eq!(nnmod(&big("-7"), &big("-5"), &mut ctx).unwrap(), big("3"));
    }

    #[test]
    fn mod_exp_matches_known_value() {
        let mut ctx = ArithContext::new();
        let r = mod_exp(&big("4"), &big("13"), &big("497"), &mut ctx).unwrap();
        assert_eq!(r, big("445"));
        assert_eq!(ctx.in_use(), 0);
    }

    #[test]
    fn mod_exp_rejects_bad_modulus() {
        let mut ctx = ArithContext::new();
        let res = mod_exp(&big("4"), &big("13"), &big("-497"), &mut ctx);
        assert_eq!(res, Err(NativeError::ModulusNotPositive));
    }

    #[test]
    fn exp_handles_unit_bases() {
        let mut ctx = ArithContext::new();
        let huge = big("100000000000000000000");
        assert_eq!(exp(&big("-1"), &huge, &mut ctx).unwrap(), big("1"));
        assert_eq!(
            exp(&big("2"), &huge, &mut ctx),
            Err(NativeError::ExponentTooLarge)
        );
        assert_eq!(
            exp(&big("2"), &big("-1"), &mut ctx),
            Err(NativeError::NegativeExponent)
        );
    }

    #[test]
    fn from_radix_rejects_separators() {
        assert_eq!(from_dec("1_000"), Err(NativeError::InvalidDigit));
        assert_eq!(from_hex(""), Err(NativeError::InvalidDigit));
        assert_eq!(from_hex("-ff").unwrap(), big("-255"));
    }

    #[test]
    fn bn2bin_writes_big_endian_magnitude() {
        let a = big("-65536");
        let mut out = [0u8; 8];
        let len = bn2bin(&a, &mut out).unwrap();
        assert_eq!(&out[..len], &[1, 0, 0]);
        assert_eq!(num_bytes(&BigInt::zero()), 0);
    }

    #[test]
    fn temps_return_to_pool() {
        let mut ctx = ArithContext::new();
        let r = mul(&big("3"), &big("-4"), &mut ctx);
        assert_eq!(r, big("-12"));
        assert_eq!(ctx.in_use(), 0);
        assert_eq!(ctx.operations(), 1);
        assert_eq!(ctx.pool.len(), 1);

        // the scratch value is handed back and reused, not moved out
        let r = sqr(&big("99999999999999999999"), &mut ctx);
        assert_eq!(r, big("9999999999999999999800000000000000000001"));
        assert_eq!(ctx.pool.len(), 1);
        assert!(ctx.pool[0].is_zero());
    }
}
