use num_bigint::BigInt;

use crate::{
    Error, Handle, PrimitiveContext,
    fastpath::{self, Operand, WordOperand},
    native::{self, NativeError},
    primitives::CallKind,
};

type GeneralOp =
    fn(&PrimitiveContext, &str, &BigInt, &BigInt) -> Result<BigInt, Error>;

// the bool is set when the scalar was the left operand
type WordOp = fn(&BigInt, WordOperand, bool) -> Result<BigInt, NativeError>;

struct BinaryOp {
    name: &'static str,
    general: GeneralOp,
    word: WordOp,
    /// the word path also applies to `scalar op handle`
    word_left: bool,
    /// a freshly coerced operand slot doubles as the result
    reuse: bool,
    /// operand coerced first when neither is a handle
    anchor: usize,
}

const ADD: BinaryOp = BinaryOp {
    name: "add",
    general: add_general,
    word: add_word,
    word_left: true,
    reuse: true,
    anchor: 0,
};

const SUB: BinaryOp = BinaryOp {
    name: "sub",
    general: sub_general,
    word: sub_word,
    word_left: true,
    reuse: true,
    anchor: 0,
};

const MUL: BinaryOp = BinaryOp {
    name: "mul",
    general: mul_general,
    word: mul_word,
    word_left: true,
    reuse: true,
    anchor: 1,
};

// the library's division may not write into an operand
const DIV: BinaryOp = BinaryOp {
    name: "div",
    general: div_general,
    word: div_word,
    word_left: false,
    reuse: false,
    anchor: 0,
};

const MOD: BinaryOp = BinaryOp {
    name: "mod",
    general: rem_general,
    word: rem_word,
    word_left: false,
    reuse: false,
    anchor: 0,
};

fn add_general(
    _: &PrimitiveContext,
    _: &str,
    a: &BigInt,
    b: &BigInt,
) -> Result<BigInt, Error> {
    Ok(native::add(a, b))
}

fn sub_general(
    _: &PrimitiveContext,
    _: &str,
    a: &BigInt,
    b: &BigInt,
) -> Result<BigInt, Error> {
    Ok(native::sub(a, b))
}

fn mul_general(
    ctx: &PrimitiveContext,
    operation: &str,
    a: &BigInt,
    b: &BigInt,
) -> Result<BigInt, Error> {
    ctx.arith(operation, |arith| Ok(native::mul(a, b, arith)))
}

fn div_general(
    ctx: &PrimitiveContext,
    operation: &str,
    a: &BigInt,
    b: &BigInt,
) -> Result<BigInt, Error> {
    ctx.arith(operation, |arith| {
        native::div_rem(a, b, arith).map(|(q, _)| q)
    })
}

fn rem_general(
    ctx: &PrimitiveContext,
    operation: &str,
    a: &BigInt,
    b: &BigInt,
) -> Result<BigInt, Error> {
    ctx.arith(operation, |arith| {
        native::div_rem(a, b, arith).map(|(_, r)| r)
    })
}

fn add_word(
    b: &BigInt,
    d: WordOperand,
    _: bool,
) -> Result<BigInt, NativeError> {
    Ok(fastpath::add(b, d))
}

fn sub_word(
    b: &BigInt,
    d: WordOperand,
    scalar_on_left: bool,
) -> Result<BigInt, NativeError> {
    Ok(fastpath::sub(b, d, scalar_on_left))
}

fn mul_word(
    b: &BigInt,
    d: WordOperand,
    _: bool,
) -> Result<BigInt, NativeError> {
    Ok(fastpath::mul(b, d))
}

fn div_word(
    b: &BigInt,
    d: WordOperand,
    _: bool,
) -> Result<BigInt, NativeError> {
    fastpath::div(b, d)
}

fn rem_word(
    b: &BigInt,
    d: WordOperand,
    _: bool,
) -> Result<BigInt, NativeError> {
    fastpath::rem(b, d)
}

fn no_operand(operation: &str) -> Error {
    Error::internal(format!("{operation} called without a bn.number operand"))
}

fn binary(
    ctx: &mut PrimitiveContext,
    kind: CallKind,
    op: &BinaryOp,
) -> Result<(), Error> {
    let operation = kind.operation(op.name);
    let word_max = ctx.session.word_max();
    let mut operands = [
        Operand::classify(&ctx.arguments[0], word_max),
        Operand::classify(&ctx.arguments[1], word_max),
    ];

    if !operands.iter().any(Operand::is_handle) {
        if kind == CallKind::Operator {
            return Err(no_operand(&operation));
        }
        operands[op.anchor] = Operand::Handle(ctx.coerce(op.anchor)?);
    }

    let [a, b] = operands;
    let result = match (a, b) {
        (Operand::Handle(a), Operand::Handle(b)) => {
            let r = ctx.new_bignum()?;
            r.set((op.general)(ctx, &operation, &a.value(), &b.value())?);
            r
        }
        (Operand::Handle(h), Operand::Word(d)) => {
            let r = ctx.new_bignum()?;
            r.set(ctx.check(&operation, (op.word)(&h.value(), d, false))?);
            r
        }
        (Operand::Word(d), Operand::Handle(h)) if op.word_left => {
            let r = ctx.new_bignum()?;
            r.set(ctx.check(&operation, (op.word)(&h.value(), d, true))?);
            r
        }
        (a, _) => {
            // exactly one handle, the other operand is coerced in place
            let index = if a.is_handle() { 1 } else { 0 };
            let coerced = ctx.coerce(index)?;
            let r = if op.reuse {
                coerced
            } else {
                ctx.new_bignum()?
            };
            let (lhs, rhs) = (ctx.handle(0)?, ctx.handle(1)?);
            let value = (op.general)(ctx, &operation, &lhs.value(), &rhs.value())?;
            r.set(value);
            r
        }
    };
    ctx.set_result(result);
    Ok(())
}

pub fn add(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Function, &ADD)
}

pub fn op_add(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Operator, &ADD)
}

pub fn sub(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Function, &SUB)
}

pub fn op_sub(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Operator, &SUB)
}

pub fn mul(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Function, &MUL)
}

pub fn op_mul(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Operator, &MUL)
}

pub fn div(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Function, &DIV)
}

pub fn op_div(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Operator, &DIV)
}

pub fn rem(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Function, &MOD)
}

pub fn op_rem(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    binary(ctx, CallKind::Operator, &MOD)
}

// neg and sqr: a handle operand gets a new result, a coerced one is
// updated in place
fn unary_target(
    ctx: &mut PrimitiveContext,
    kind: CallKind,
    operation: &str,
) -> Result<(Handle, Handle), Error> {
    if let Ok(handle) = ctx.handle(0) {
        return Ok((handle, ctx.new_bignum()?));
    }
    if kind == CallKind::Operator {
        return Err(no_operand(operation));
    }
    let handle = ctx.coerce(0)?;
    Ok((handle.clone(), handle))
}

fn negate(ctx: &mut PrimitiveContext, kind: CallKind) -> Result<(), Error> {
    let operation = kind.operation("unm");
    let (operand, r) = unary_target(ctx, kind, &operation)?;
    let mut value = operand.copy_value();
    native::negate(&mut value);
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

pub fn neg(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    negate(ctx, CallKind::Function)
}

pub fn op_neg(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    negate(ctx, CallKind::Operator)
}

pub fn sqr(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    let operation = CallKind::Function.operation("sqr");
    let (operand, r) = unary_target(ctx, CallKind::Function, &operation)?;
    let value = ctx.arith(&operation, |arith| {
        Ok(native::sqr(&operand.value(), arith))
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

fn power(ctx: &mut PrimitiveContext, kind: CallKind) -> Result<(), Error> {
    let operation = kind.operation("pow");
    if kind == CallKind::Operator
        && !ctx.arguments.iter().any(|arg| arg.is_handle())
    {
        return Err(no_operand(&operation));
    }
    // no word variant and no aliasing of operands
    let r = ctx.new_bignum()?;
    let base = ctx.coerce(0)?;
    let exponent = ctx.coerce(1)?;
    let value = ctx.arith(&operation, |arith| {
        native::exp(&base.value(), &exponent.value(), arith)
    })?;
    r.set(value);
    ctx.set_result(r);
    Ok(())
}

pub fn pow(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    power(ctx, CallKind::Function)
}

pub fn op_pow(ctx: &mut PrimitiveContext) -> Result<(), Error> {
    power(ctx, CallKind::Operator)
}
