//! Conversion of host values into bn.number handles.
use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::{Error, Handle, Radix, Session, Value, native, width::decompose};

pub const COERCIBLE: &str = "number, string or bn.number";

/// A textual literal split into sign, radix and digits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Literal<'a> {
    pub negative: bool,
    pub radix: Radix,
    pub digits: &'a str,
}

/// `[-][0](x|X)hexdigits` or `[-]decdigits`, surrounding whitespace ignored.
pub fn split_literal(text: &str) -> Option<Literal<'_>> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    // the 0 before the hex marker is optional
    let marker = rest.strip_prefix('0').unwrap_or(rest);
    let (radix, digits) = match marker.strip_prefix(['x', 'X']) {
        Some(hex) => (Radix::Hex, hex),
        None => (Radix::Decimal, rest),
    };
    let base = radix.base();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(base)) {
        return None;
    }
    Some(Literal {
        negative,
        radix,
        digits,
    })
}

pub fn parse_literal(text: &str) -> Result<BigInt, Error> {
    let literal = split_literal(text).ok_or_else(|| Error::parse(text))?;
    let parsed = match literal.radix {
        Radix::Decimal => native::from_dec(literal.digits),
        Radix::Hex => native::from_hex(literal.digits),
    };
    let mut value = parsed.map_err(|_| Error::parse(text))?;
    native::set_negative(&mut value, literal.negative);
    Ok(value)
}

enum Scalar {
    Int(i64),
    Float(f64),
    Str(std::rc::Rc<str>),
}

/// Converts `arguments[index]` into a handle.
///
/// Scalars are replaced in the slot by a fresh handle before any conversion
/// work starts, so a failed conversion leaves nothing but an unreachable
/// handle behind. Handles are returned as they are.
pub fn to_bignum(
    session: &Session,
    arguments: &mut [Value],
    index: usize,
) -> Result<Handle, Error> {
    let scalar = match &arguments[index] {
        Value::BigNum(handle) => return Ok(handle.clone()),
        Value::Int(i) => Scalar::Int(*i),
        Value::Float(d) => Scalar::Float(*d),
        Value::Str(s) => Scalar::Str(s.clone()),
        other => {
            return Err(Error::type_error(
                index + 1,
                COERCIBLE,
                other.type_name(),
            ));
        }
    };

    let handle = session.new_bignum()?;
    arguments[index] = Value::BigNum(handle.clone());

    let value = match scalar {
        Scalar::Int(i) => decompose(i, session.wide_range()),
        Scalar::Float(d) => float_to_bigint(session, d, index)?,
        Scalar::Str(s) => parse_literal(&s)?,
    };
    handle.set(value);
    Ok(handle)
}

// i64 bounds as exact f64 values
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn float_to_bigint(
    session: &Session,
    d: f64,
    index: usize,
) -> Result<BigInt, Error> {
    if !d.is_finite() {
        return Err(Error::type_error(index + 1, "integral number", "inf or nan"));
    }
    if d.fract() != 0.0 {
        return Err(Error::type_error(
            index + 1,
            "integral number",
            "fractional number",
        ));
    }
    if (I64_LOWER..I64_UPPER).contains(&d) {
        return Ok(decompose(d as i64, session.wide_range()));
    }
    BigInt::from_f64(d)
        .ok_or_else(|| Error::internal(format!("float {d} did not convert")))
}
