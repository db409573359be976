use crate::{Error, Handle, PrimitiveContext, native};

/// Picks the destination for `r = op(a, b)` where the library allows `r`
/// to alias an operand: a coerced scalar slot is reused, two handles get a
/// new result.
fn three_address(
    ctx: &mut PrimitiveContext,
) -> Result<(Handle, Handle, Handle), Error> {
    if !ctx.arguments[1].is_handle() {
        let a = ctx.coerce(0)?;
        let b = ctx.coerce(1)?;
        Ok((b.clone(), a, b))
    } else if !ctx.arguments[0].is_handle() {
        let a = ctx.coerce(0)?;
        let b = ctx.handle(1)?;
        Ok((a.clone(), a, b))
    } else {
        Ok((ctx.new_bignum()?, ctx.handle(0)?, ctx.handle(1)?))
    }
}

pub fn gcd(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let (r, a, b) = three_address(ctx)?;
    let value = ctx.arith("bn.gcd", |arith| {
        Ok(native::gcd(&a.value(), &b.value(), arith))
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

pub fn modmul(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let (r, a, b) = three_address(ctx)?;
    let m = ctx.coerce(2)?;
    let value = ctx.arith("bn.modmul", |arith| {
        native::mod_mul(&a.value(), &b.value(), &m.value(), arith)
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

type ModOp = fn(
    &num_bigint::BigInt,
    &num_bigint::BigInt,
    &num_bigint::BigInt,
    &mut native::ArithContext,
) -> Result<num_bigint::BigInt, native::NativeError>;

// fresh result, then every operand coerced left to right
fn modular3(
    ctx: &mut PrimitiveContext,
    operation: &str,
    op: ModOp,
) -> Result<(), Error> {
    let r = ctx.new_bignum()?;
    let a = ctx.coerce(0)?;
    let b = ctx.coerce(1)?;
    let m = ctx.coerce(2)?;
    let value = ctx.arith(operation, |arith| {
        op(&a.value(), &b.value(), &m.value(), arith)
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

pub fn modadd(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    modular3(ctx, "bn.modadd", native::mod_add)
}

pub fn modsub(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    modular3(ctx, "bn.modsub", native::mod_sub)
}

pub fn modpow(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    modular3(ctx, "bn.modpow", native::mod_exp)
}

pub fn modsqr(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let r = ctx.new_bignum()?;
    let a = ctx.coerce(0)?;
    let m = ctx.coerce(1)?;
    let value = ctx.arith("bn.modsqr", |arith| {
        native::mod_sqr(&a.value(), &m.value(), arith)
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

pub fn nnmod(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let r = ctx.new_bignum()?;
    let a = ctx.coerce(0)?;
    let m = ctx.coerce(1)?;
    let value = ctx.arith("bn.nnmod", |arith| {
        native::nnmod(&a.value(), &m.value(), arith)
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Error, Session, SessionCreateInfo, Value};

    fn session() -> Session {
        Session::new(SessionCreateInfo::default()).unwrap()
    }

    fn call(s: &Session, name: &str, args: &mut [Value]) -> String {
        s.call(name, args).unwrap()[0].to_string()
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int(v)).collect()
    }

    #[test]
    fn modpow_known_value() {
        let s = session();
        assert_eq!(call(&s, "modpow", &mut ints(&[4, 13, 497])), "445");
    }

    #[test]
    fn modular_results_are_non_negative() {
        let s = session();
        assert_eq!(call(&s, "modadd", &mut ints(&[-10, 3, 5])), "3");
        assert_eq!(call(&s, "modsub", &mut ints(&[3, 10, 5])), "3");
        assert_eq!(call(&s, "modmul", &mut ints(&[-3, 4, 5])), "3");
        assert_eq!(call(&s, "modsqr", &mut ints(&[-4, 7])), "2");
        assert_eq!(call(&s, "nnmod", &mut ints(&[-7, -5])), "3");
    }

    #[test]
    fn zero_modulus_is_division_by_zero() {
        let s = session();
        for name in ["modadd", "modsub", "modmul", "modpow"] {
            let err = s.call(name, &mut ints(&[1, 2, 0])).unwrap_err();
            assert!(err.is_division_by_zero(), "{name}");
        }
        let err = s.call("nnmod", &mut ints(&[1, 0])).unwrap_err();
        assert_eq!(err.to_string(), "bn.nnmod: division by zero");
    }

    #[test]
    fn modpow_rejects_negative_modulus_and_exponent() {
        let s = session();
        let err = s.call("modpow", &mut ints(&[4, 13, -497])).unwrap_err();
        assert_eq!(err.to_string(), "bn.modpow: modulus must be positive");
        let err = s.call("modpow", &mut ints(&[4, -1, 497])).unwrap_err();
        assert_eq!(err.to_string(), "bn.modpow: negative exponent");
    }

    #[test]
    fn gcd_reuses_coerced_slot() {
        let s = session();
        let mut args = ints(&[12, 18]);
        let result = s.call("gcd", &mut args).unwrap();
        assert_eq!(result[0].to_string(), "6");
        assert!(result[0].as_handle().unwrap().ptr_eq(args[1].as_handle().unwrap()));

        let a = s.call("number", &mut ints(&[-12])).unwrap().remove(0);
        let b = s.call("number", &mut ints(&[18])).unwrap().remove(0);
        let result = s.call("gcd", &mut [a.clone(), b]).unwrap();
        assert_eq!(result[0].to_string(), "6");
        assert_eq!(a.to_string(), "-12");
    }

    #[test]
    fn failed_coercion_releases_the_result() {
        let s = Session::new(SessionCreateInfo {
            max_handles: Some(2),
            ..Default::default()
        })
        .unwrap();
        let h = s.call("number", &mut ints(&[4])).unwrap().remove(0);

        // the result takes the last slot, coercing the exponent fails
        let mut args = [h.clone(), Value::Int(13), Value::Int(497)];
        let res = s.call("modpow", &mut args);
        assert!(matches!(res, Err(Error::Allocation { what: "bn.number" })));
        assert!(matches!(args[1..], [Value::Int(13), Value::Int(497)]));
        assert_eq!(s.live_handles(), 1);

        drop(h);
        drop(args);
        assert_eq!(s.live_handles(), 0);
    }
}
