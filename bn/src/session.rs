use std::rc::Rc;

use log::debug;
use parking_lot::Mutex;

use crate::{
    Error, Handle, PrimitiveContext, Resources, Value, WideRange,
    find_primitive,
    native::{self, ArithContext, NativeError, Word},
};

#[derive(Debug, Clone)]
pub struct SessionCreateInfo {
    /// width of the fast path word, 32 or 64
    pub word_bits: u32,
    /// longest string or byte string the host accepts
    pub max_string_len: usize,
    pub max_handles: Option<usize>,
    /// attach the library's reason strings to arithmetic errors
    pub error_strings: bool,
}

impl Default for SessionCreateInfo {
    fn default() -> Self {
        Self {
            word_bits: native::WORD_BITS,
            max_string_len: 1 << 24,
            max_handles: None,
            error_strings: true,
        }
    }
}

/// State shared by every bn call made from one host execution context.
pub struct Session {
    word_max: Word,
    max_string_len: usize,
    error_strings: bool,
    resources: Rc<Resources>,
    // created on first use
    context: Mutex<Option<ArithContext>>,
    wide: WideRange,
}

impl Session {
    pub fn new(info: SessionCreateInfo) -> Result<Self, Error> {
        if info.word_bits != 32 && info.word_bits != native::WORD_BITS {
            return Err(Error::internal(format!(
                "unsupported word width {}",
                info.word_bits
            )));
        }
        let wide = WideRange::for_scalar::<i64>(info.word_bits);
        debug!(
            "bn session: {} bit words, {:?} host integer compensation",
            info.word_bits, wide
        );
        Ok(Self {
            word_max: Word::MAX >> (native::WORD_BITS - info.word_bits),
            max_string_len: info.max_string_len,
            error_strings: info.error_strings,
            resources: Rc::new(Resources::new(info.max_handles)),
            context: Mutex::new(None),
            wide,
        })
    }

    pub fn word_max(&self) -> Word {
        self.word_max
    }

    pub fn wide_range(&self) -> &WideRange {
        &self.wide
    }

    pub fn live_handles(&self) -> usize {
        self.resources.live_handles()
    }

    pub fn live_buffers(&self) -> usize {
        self.resources.live_buffers()
    }

    pub fn new_bignum(&self) -> Result<Handle, Error> {
        Handle::create(&self.resources)
    }

    /// Borrows the arithmetic context for the duration of `f`.
    pub fn with_context<R>(
        &self,
        f: impl FnOnce(&mut ArithContext) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let Some(mut guard) = self.context.try_lock() else {
            return Err(Error::internal("arithmetic context already in use"));
        };
        let ctx = guard.get_or_insert_with(|| {
            debug!("creating arithmetic context");
            ArithContext::new()
        });
        f(ctx)
    }

    pub fn context_created(&self) -> bool {
        self.context.try_lock().is_some_and(|ctx| ctx.is_some())
    }

    /// Wraps a library failure with the name of the failing operation.
    pub fn fail(&self, operation: &str, err: NativeError) -> Error {
        let mut error = Error::native(operation, err);
        if !self.error_strings {
            if let Error::Arithmetic { reason, .. } = &mut error {
                *reason = None;
            }
        }
        debug!("{error}");
        error
    }

    pub fn push_string(&self, bytes: &[u8]) -> Result<Value, Error> {
        if bytes.len() > self.max_string_len {
            return Err(Error::Allocation { what: "string" });
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::internal("library produced non utf-8 text"))?;
        Ok(Value::string(text))
    }

    pub fn push_bytes(&self, bytes: &[u8]) -> Result<Value, Error> {
        if bytes.len() > self.max_string_len {
            return Err(Error::Allocation { what: "string" });
        }
        Ok(Value::Bytes(Rc::from(bytes)))
    }

    /// Calls the primitive `name`, coercions may rewrite `arguments` in place.
    pub fn call(
        &self,
        name: &str,
        arguments: &mut [Value],
    ) -> Result<Vec<Value>, Error> {
        let Some(primitive) = find_primitive(name) else {
            return Err(Error::internal(format!("unknown primitive {name}")));
        };
        if arguments.len() != primitive.inputs {
            return Err(Error::internal(format!(
                "{name} takes {} arguments, got {}",
                primitive.inputs,
                arguments.len()
            )));
        }
        let mut result = vec![Value::Nil; primitive.outputs];
        let mut ctx = PrimitiveContext::new(self, arguments, &mut result);
        (primitive.ptr)(&mut ctx)?;
        Ok(result)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(ctx) = self.context.get_mut().take() {
            debug!(
                "releasing arithmetic context after {} operations",
                ctx.operations()
            );
        }
    }
}
