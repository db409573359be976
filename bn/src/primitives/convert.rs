use crate::{Error, PrimitiveContext, Radix};

pub fn number(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    ctx.coerce(0)?;
    ctx.result[0] = ctx.arguments[0].clone();
    Ok(())
}

fn text(ctx: &mut PrimitiveContext, radix: Radix) -> Result<(), Error> {
    let bn = ctx.handle(0)?;
    let session = ctx.session;
    let value = bn.materialize_text(radix, |bytes| session.push_string(bytes))?;
    ctx.result[0] = value;
    Ok(())
}

pub fn tostring(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    text(ctx, Radix::Decimal)
}

pub fn tohex(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    text(ctx, Radix::Hex)
}

pub fn tobin(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let bn = ctx.handle(0)?;
    let session = ctx.session;
    let value = bn.materialize_bytes(|bytes| session.push_bytes(bytes))?;
    ctx.result[0] = value;
    Ok(())
}

pub fn swap(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let a = ctx.handle(0)?;
    let b = ctx.handle(1)?;
    a.swap(&b);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Error, Session, SessionCreateInfo, Value};

    fn session() -> Session {
        Session::new(SessionCreateInfo::default()).unwrap()
    }

    fn number(s: &Session, value: Value) -> Value {
        s.call("number", &mut [value]).unwrap().remove(0)
    }

    #[test]
    fn decimal_round_trip() {
        let s = session();
        for text in ["0", "-1", "12345", "-340282366920938463463374607431768211457"] {
            let bn = number(&s, Value::string(text));
            let out = s.call("tostring", &mut [bn]).unwrap();
            assert_eq!(out[0].to_string(), text);
        }
        let bn = number(&s, Value::string("-0"));
        assert_eq!(s.call("__tostring", &mut [bn]).unwrap()[0].to_string(), "0");
    }

    #[test]
    fn hex_round_trip() {
        let s = session();
        let bn = number(&s, Value::string("0xDEADBEEFCAFEBABE0123"));
        let hex = s.call("tohex", &mut [bn]).unwrap().remove(0);
        assert_eq!(hex.to_string(), "DEADBEEFCAFEBABE0123");
        let again = number(&s, Value::string(&format!("0x{hex}")));
        assert_eq!(again.to_string(), "1051570404360395033542947");
    }

    #[test]
    fn tobin_is_big_endian_magnitude() {
        let s = session();
        let bn = number(&s, Value::Int(-0x0102));
        let out = s.call("tobin", &mut [bn]).unwrap().remove(0);
        assert!(matches!(out, Value::Bytes(ref b) if b[..] == [1, 2]));
        assert_eq!(s.live_buffers(), 0);

        let zero = number(&s, Value::Int(0));
        let out = s.call("tobin", &mut [zero]).unwrap().remove(0);
        assert!(matches!(out, Value::Bytes(ref b) if b.is_empty()));
    }

    #[test]
    fn text_requires_a_handle() {
        let s = session();
        let err = s.call("tostring", &mut [Value::Int(1)]).unwrap_err();
        assert_eq!(err, Error::type_error(1, "bn.number", "number"));
        assert!(s.call("tobin", &mut [Value::string("1")]).is_err());
    }

    #[test]
    fn oversized_text_leaves_no_buffer() {
        let s = Session::new(SessionCreateInfo {
            max_string_len: 4,
            ..Default::default()
        })
        .unwrap();
        let bn = number(&s, Value::Int(123456));
        let err = s.call("tostring", &mut [bn.clone()]).unwrap_err();
        assert_eq!(err, Error::Allocation { what: "string" });
        assert!(!bn.as_handle().unwrap().has_cached_buffer());
        assert_eq!(s.live_buffers(), 0);
    }

    #[test]
    fn swap_exchanges_values() {
        let s = session();
        let a = number(&s, Value::Int(1));
        let b = number(&s, Value::Int(2));
        let c = number(&s, Value::Int(3));
        s.call("swap", &mut [a.clone(), b.clone()]).unwrap();
        assert_eq!(a.to_string(), "2");
        assert_eq!(b.to_string(), "1");
        s.call("swap", &mut [a.clone(), b.clone()]).unwrap();
        assert_eq!(a.to_string(), "1");
        assert_eq!(b.to_string(), "2");
        assert_eq!(c.to_string(), "3");
        s.call("swap", &mut [a.clone(), a.clone()]).unwrap();
        assert_eq!(a.to_string(), "1");

        let err = s.call("swap", &mut [a, Value::Int(2)]).unwrap_err();
        assert_eq!(err, Error::type_error(2, "bn.number", "number"));
    }
}
