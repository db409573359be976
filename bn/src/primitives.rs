use num_bigint::BigInt;

use crate::{
    Error, Handle, Session, Value, coerce,
    native::{ArithContext, NativeError},
};

mod arith;
mod compare;
mod convert;
mod modular;

pub type PrimitiveFunction = fn(&mut PrimitiveContext) -> Result<(), Error>;

// arguments are positional, there is no receiver
// e.g. `3 5 add` has inputs: 2
#[derive(Debug, Copy, Clone)]
pub struct PrimitiveMessage<'a> {
    pub name: &'a str,
    pub inputs: usize,
    pub outputs: usize,
    pub ptr: PrimitiveFunction,
}

impl<'a> PrimitiveMessage<'a> {
    pub const fn new(
        name: &'a str,
        inputs: usize,
        outputs: usize,
        ptr: PrimitiveFunction,
    ) -> Self {
        Self {
            name,
            inputs,
            outputs,
            ptr,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// How a primitive was reached, decides error prefixes and whether
/// scalar-only operands are acceptable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// `bn.add(a, b)`, any operand kinds
    Function,
    /// `a + b`, the host guarantees a bn.number operand
    Operator,
}

impl CallKind {
    pub fn operation(self, name: &str) -> String {
        match self {
            CallKind::Function => format!("bn.{name}"),
            CallKind::Operator => format!("bn.number.__{name}"),
        }
    }
}

pub struct PrimitiveContext<'s, 'arg> {
    pub session: &'s Session,
    // coercion rewrites these in place
    pub arguments: &'arg mut [Value],
    pub result: &'arg mut [Value],
}

impl<'s, 'arg> PrimitiveContext<'s, 'arg> {
    pub fn new(
        session: &'s Session,
        arguments: &'arg mut [Value],
        result: &'arg mut [Value],
    ) -> Self {
        Self {
            session,
            arguments,
            result,
        }
    }

    pub fn coerce(&mut self, index: usize) -> Result<Handle, Error> {
        coerce::to_bignum(self.session, self.arguments, index)
    }

    /// The handle at `index`, without coercion.
    pub fn handle(&self, index: usize) -> Result<Handle, Error> {
        let value = &self.arguments[index];
        value.as_handle().cloned().ok_or_else(|| {
            Error::type_error(index + 1, crate::BN_TYPE_NAME, value.type_name())
        })
    }

    pub fn new_bignum(&self) -> Result<Handle, Error> {
        self.session.new_bignum()
    }

    /// Runs a library operation with the shared context, failures are
    /// reported under `operation`.
    pub fn arith<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut ArithContext) -> Result<R, NativeError>,
    ) -> Result<R, Error> {
        let session = self.session;
        session.with_context(|ctx| {
            f(ctx).map_err(|err| session.fail(operation, err))
        })
    }

    pub fn check(
        &self,
        operation: &str,
        res: Result<BigInt, NativeError>,
    ) -> Result<BigInt, Error> {
        res.map_err(|err| self.session.fail(operation, err))
    }

    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.result[0] = value.into();
    }
}

pub const PRIMITIVES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("number", 1, 1, convert::number),
    PrimitiveMessage::new("tostring", 1, 1, convert::tostring),
    PrimitiveMessage::new("tohex", 1, 1, convert::tohex),
    PrimitiveMessage::new("tobin", 1, 1, convert::tobin),
    PrimitiveMessage::new("isneg", 1, 1, compare::isneg),
    PrimitiveMessage::new("iseven", 1, 1, compare::iseven),
    PrimitiveMessage::new("isodd", 1, 1, compare::isodd),
    PrimitiveMessage::new("isone", 1, 1, compare::isone),
    PrimitiveMessage::new("iszero", 1, 1, compare::iszero),
    PrimitiveMessage::new("cmp", 2, 1, compare::cmp),
    PrimitiveMessage::new("ucmp", 2, 1, compare::ucmp),
    PrimitiveMessage::new("eq", 2, 1, compare::eq),
    PrimitiveMessage::new("swap", 2, 0, convert::swap),
    PrimitiveMessage::new("add", 2, 1, arith::add),
    PrimitiveMessage::new("sub", 2, 1, arith::sub),
    PrimitiveMessage::new("mul", 2, 1, arith::mul),
    PrimitiveMessage::new("div", 2, 1, arith::div),
    PrimitiveMessage::new("mod", 2, 1, arith::rem),
    PrimitiveMessage::new("neg", 1, 1, arith::neg),
    PrimitiveMessage::new("pow", 2, 1, arith::pow),
    PrimitiveMessage::new("sqr", 1, 1, arith::sqr),
    PrimitiveMessage::new("gcd", 2, 1, modular::gcd),
    PrimitiveMessage::new("modadd", 3, 1, modular::modadd),
    PrimitiveMessage::new("modsub", 3, 1, modular::modsub),
    PrimitiveMessage::new("modmul", 3, 1, modular::modmul),
    PrimitiveMessage::new("modsqr", 2, 1, modular::modsqr),
    PrimitiveMessage::new("modpow", 3, 1, modular::modpow),
    PrimitiveMessage::new("nnmod", 2, 1, modular::nnmod),
    PrimitiveMessage::new("__add", 2, 1, arith::op_add),
    PrimitiveMessage::new("__sub", 2, 1, arith::op_sub),
    PrimitiveMessage::new("__mul", 2, 1, arith::op_mul),
    PrimitiveMessage::new("__div", 2, 1, arith::op_div),
    PrimitiveMessage::new("__mod", 2, 1, arith::op_rem),
    PrimitiveMessage::new("__pow", 2, 1, arith::op_pow),
    PrimitiveMessage::new("__unm", 1, 1, arith::op_neg),
    PrimitiveMessage::new("__eq", 2, 1, compare::op_eq),
    PrimitiveMessage::new("__lt", 2, 1, compare::op_lt),
    PrimitiveMessage::new("__le", 2, 1, compare::op_le),
    PrimitiveMessage::new("__tostring", 1, 1, convert::tostring),
];

pub fn find_primitive(name: &str) -> Option<PrimitiveMessage<'static>> {
    PRIMITIVES.iter().find(|p| p.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_are_unique() {
        for (i, a) in PRIMITIVES.iter().enumerate() {
            for b in &PRIMITIVES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn operators_are_binary_or_unary() {
        for p in PRIMITIVES.iter().filter(|p| p.is_operator()) {
            assert!(p.inputs == 1 || p.inputs == 2, "{}", p.name);
            assert_eq!(p.outputs, 1);
        }
    }

    #[test]
    fn call_kind_prefixes() {
        assert_eq!(CallKind::Function.operation("div"), "bn.div");
        assert_eq!(CallKind::Operator.operation("div"), "bn.number.__div");
    }
}
