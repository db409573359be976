use std::cmp::Ordering;

use num_bigint::BigInt;

use crate::{
    Error, PrimitiveContext, Value,
    fastpath::{self, Operand},
    native,
    primitives::CallKind,
};

fn predicate(
    ctx: &mut PrimitiveContext,
    test: fn(&BigInt) -> bool,
) -> Result<(), Error> {
    let bn = ctx.coerce(0)?;
    let res = test(&bn.value());
    ctx.set_result(res);
    Ok(())
}

pub fn isneg(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    predicate(ctx, native::is_negative)
}

pub fn iseven(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    predicate(ctx, |bn| !native::is_odd(bn))
}

pub fn isodd(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    predicate(ctx, native::is_odd)
}

pub fn isone(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    predicate(ctx, native::is_one)
}

pub fn iszero(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    predicate(ctx, native::is_zero)
}

fn compare(
    ctx: &mut PrimitiveContext,
    order: fn(&BigInt, &BigInt) -> Ordering,
) -> Result<Ordering, Error> {
    let a = ctx.coerce(0)?;
    let b = ctx.coerce(1)?;
    let res = order(&a.value(), &b.value());
    Ok(res)
}

fn ordering_value(ordering: Ordering) -> Value {
    Value::Int(ordering as i64)
}

pub fn cmp(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let ordering = compare(ctx, native::cmp)?;
    ctx.set_result(ordering_value(ordering));
    Ok(())
}

pub fn ucmp(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let ordering = compare(ctx, native::ucmp)?;
    ctx.set_result(ordering_value(ordering));
    Ok(())
}

pub fn op_lt(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let ordering = compare(ctx, native::cmp)?;
    ctx.set_result(ordering == Ordering::Less);
    Ok(())
}

pub fn op_le(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let ordering = compare(ctx, native::cmp)?;
    ctx.set_result(ordering != Ordering::Greater);
    Ok(())
}

fn equal(ctx: &mut PrimitiveContext, kind: CallKind) -> Result<(), Error> {
    let word_max = ctx.session.word_max();
    let mut operands = [
        Operand::classify(&ctx.arguments[0], word_max),
        Operand::classify(&ctx.arguments[1], word_max),
    ];
    if !operands.iter().any(Operand::is_handle) {
        if kind == CallKind::Operator {
            return Err(Error::internal(format!(
                "{} called without a bn.number operand",
                kind.operation("eq")
            )));
        }
        operands[1] = Operand::Handle(ctx.coerce(1)?);
    }

    let res = match operands {
        [Operand::Handle(a), Operand::Handle(b)] => {
            native::cmp(&a.value(), &b.value()) == Ordering::Equal
        }
        [Operand::Handle(h), Operand::Word(d)]
        | [Operand::Word(d), Operand::Handle(h)] => {
            fastpath::eq(&h.value(), d)
        }
        _ => {
            let a = ctx.coerce(0)?;
            let b = ctx.coerce(1)?;
            native::cmp(&a.value(), &b.value()) == Ordering::Equal
        }
    };
    ctx.set_result(res);
    Ok(())
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    equal(ctx, CallKind::Function)
}

pub fn op_eq(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    equal(ctx, CallKind::Operator)
}
