mod coerce;
mod error;
pub mod fastpath;
mod handle;
mod interpreter;
pub mod native;
mod primitives;
mod session;
mod value;
mod width;

pub use coerce::{COERCIBLE, Literal, parse_literal, split_literal, to_bignum};
pub use error::Error;
pub use handle::{BigNum, Handle, Radix, Resources, STACK_BUFFER_SIZE};
pub use interpreter::{EvalError, Interpreter};
pub use primitives::*;
pub use session::*;
pub use value::*;
pub use width::{HostScalar, WideRange, decompose};
