//! bn.number handles
//!
//! A [`Handle`] is the host visible reference to one big integer. The host
//! may hold any number of references, the value and its cached output buffer
//! are released exactly once when the last one is dropped.
use std::{
    cell::{Cell, Ref, RefCell},
    fmt,
    rc::Rc,
};

use log::trace;
use num_bigint::BigInt;

use crate::{Error, native};

/// `tobin` results up to this size never touch the heap buffer.
pub const STACK_BUFFER_SIZE: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Decimal => 10,
            Radix::Hex => 16,
        }
    }
}

/// Per session accounting of live native resources.
#[derive(Debug, Default)]
pub struct Resources {
    handles: Cell<usize>,
    buffers: Cell<usize>,
    handle_limit: Option<usize>,
}

impl Resources {
    pub fn new(handle_limit: Option<usize>) -> Self {
        Self {
            handles: Cell::new(0),
            buffers: Cell::new(0),
            handle_limit,
        }
    }

    pub fn live_handles(&self) -> usize {
        self.handles.get()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.get()
    }

    fn acquire_handle(&self) -> Result<(), Error> {
        let live = self.handles.get();
        if self.handle_limit.is_some_and(|limit| live >= limit) {
            return Err(Error::Allocation { what: "bn.number" });
        }
        self.handles.set(live + 1);
        Ok(())
    }
}

pub struct BigNum {
    value: BigInt,
    // only Some between materialization and the push to the host
    buffer: Option<Box<[u8]>>,
    resources: Rc<Resources>,
}

impl BigNum {
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    fn materialize_text<R>(
        &mut self,
        radix: Radix,
        push: impl FnOnce(&[u8]) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let text = match radix {
            Radix::Decimal => native::to_dec(&self.value),
            Radix::Hex => native::to_hex(&self.value),
        };
        let cached = CachedBuffer::fill(
            &mut self.buffer,
            &self.resources,
            text.into_boxed_slice(),
        );
        push(cached.bytes())
    }

    fn materialize_bytes<R>(
        &mut self,
        push: impl FnOnce(&[u8]) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let len = native::num_bytes(&self.value);
        if len <= STACK_BUFFER_SIZE {
            let mut stack = [0u8; STACK_BUFFER_SIZE];
            let len = native::bn2bin(&self.value, &mut stack)
                .map_err(|err| Error::native("bn.tobin", err))?;
            return push(&stack[..len]);
        }

        let mut heap = vec![0u8; len].into_boxed_slice();
        let len = native::bn2bin(&self.value, &mut heap)
            .map_err(|err| Error::native("bn.tobin", err))?;
        let cached = CachedBuffer::fill(&mut self.buffer, &self.resources, heap);
        push(&cached.bytes()[..len])
    }
}

impl Drop for BigNum {
    fn drop(&mut self) {
        if self.buffer.take().is_some() {
            self.resources.buffers.set(self.resources.buffers.get() - 1);
        }
        let live = self.resources.handles.get() - 1;
        self.resources.handles.set(live);
        trace!("bn.number released, {live} live");
    }
}

/// Scope guard around the cached buffer slot of a [`BigNum`].
///
/// Filling releases whatever was cached before, dropping the guard releases
/// the new buffer. Every exit from a materialization, including a failed push,
/// leaves the slot empty.
struct CachedBuffer<'a> {
    slot: &'a mut Option<Box<[u8]>>,
    resources: &'a Resources,
}

impl<'a> CachedBuffer<'a> {
    fn fill(
        slot: &'a mut Option<Box<[u8]>>,
        resources: &'a Resources,
        bytes: Box<[u8]>,
    ) -> Self {
        if slot.replace(bytes).is_none() {
            resources.buffers.set(resources.buffers.get() + 1);
        }
        Self { slot, resources }
    }

    fn bytes(&self) -> &[u8] {
        self.slot.as_deref().unwrap_or(&[])
    }
}

impl Drop for CachedBuffer<'_> {
    fn drop(&mut self) {
        if self.slot.take().is_some() {
            self.resources
                .buffers
                .set(self.resources.buffers.get() - 1);
        }
    }
}

/// Shared reference to a [`BigNum`], cloning shares the same storage.
#[derive(Clone)]
pub struct Handle(Rc<RefCell<BigNum>>);

impl Handle {
    /// A new zero valued handle.
    pub(crate) fn create(resources: &Rc<Resources>) -> Result<Self, Error> {
        resources.acquire_handle()?;
        trace!("bn.number created, {} live", resources.live_handles());
        let bn = BigNum {
            value: BigInt::default(),
            buffer: None,
            resources: resources.clone(),
        };
        Ok(Self(Rc::new(RefCell::new(bn))))
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn value(&self) -> Ref<'_, BigInt> {
        Ref::map(self.0.borrow(), |bn| &bn.value)
    }

    pub fn copy_value(&self) -> BigInt {
        self.value().clone()
    }

    pub fn set(&self, value: BigInt) {
        self.0.borrow_mut().value = value;
    }

    /// Exchanges the values of two handles in place.
    pub fn swap(&self, other: &Handle) {
        if self.ptr_eq(other) {
            return;
        }
        let mut a = self.0.borrow_mut();
        let mut b = other.0.borrow_mut();
        std::mem::swap(&mut a.value, &mut b.value);
    }

    pub fn has_cached_buffer(&self) -> bool {
        self.0.borrow().has_buffer()
    }

    pub fn materialize_text<R>(
        &self,
        radix: Radix,
        push: impl FnOnce(&[u8]) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.0.borrow_mut().materialize_text(radix, push)
    }

    pub fn materialize_bytes<R>(
        &self,
        push: impl FnOnce(&[u8]) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.0.borrow_mut().materialize_bytes(push)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(bn) => write!(f, "bn.number({})", bn.value),
            Err(_) => write!(f, "bn.number(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> Rc<Resources> {
        Rc::new(Resources::new(None))
    }

    #[test]
    fn create_starts_at_zero() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        assert_eq!(*h.value(), BigInt::default());
        assert_eq!(res.live_handles(), 1);
    }

    #[test]
    fn drop_releases_once() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        let alias = h.clone();
        drop(h);
        assert_eq!(res.live_handles(), 1);
        drop(alias);
        assert_eq!(res.live_handles(), 0);
    }

    #[test]
    fn handle_limit_is_an_allocation_error() {
        let res = Rc::new(Resources::new(Some(1)));
        let _h = Handle::create(&res).unwrap();
        let err = Handle::create(&res).unwrap_err();
        assert_eq!(err, Error::Allocation { what: "bn.number" });
        assert_eq!(res.live_handles(), 1);
    }

    #[test]
    fn text_buffer_released_after_push() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        h.set(BigInt::from(-255));
        let text = h
            .materialize_text(Radix::Decimal, |bytes| {
                assert_eq!(res.live_buffers(), 1);
                Ok(String::from_utf8_lossy(bytes).into_owned())
            })
            .unwrap();
        assert_eq!(text, "-255");
        assert!(!h.has_cached_buffer());
        assert_eq!(res.live_buffers(), 0);

        let hex = h
            .materialize_text(Radix::Hex, |bytes| Ok(bytes.to_vec()))
            .unwrap();
        assert_eq!(hex, b"-FF");
    }

    #[test]
    fn text_buffer_released_after_failed_push() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        let err = h
            .materialize_text(Radix::Decimal, |_| -> Result<(), Error> {
                Err(Error::Allocation { what: "string" })
            })
            .unwrap_err();
        assert_eq!(err, Error::Allocation { what: "string" });
        assert!(!h.has_cached_buffer());
        assert_eq!(res.live_buffers(), 0);
    }

    #[test]
    fn large_bytes_go_through_heap_buffer() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        h.set(BigInt::from(1) << (8 * STACK_BUFFER_SIZE));
        let bytes = h
            .materialize_bytes(|bytes| {
                assert_eq!(res.live_buffers(), 1);
                Ok(bytes.to_vec())
            })
            .unwrap();
        assert_eq!(bytes.len(), STACK_BUFFER_SIZE + 1);
        assert_eq!(bytes[0], 1);
        assert!(bytes[1..].iter().all(|&b| b == 0));
        assert_eq!(res.live_buffers(), 0);
    }

    #[test]
    fn small_bytes_stay_on_stack() {
        let res = resources();
        let h = Handle::create(&res).unwrap();
        h.set(BigInt::from(0x0102_0304));
        let bytes = h
            .materialize_bytes(|bytes| {
                assert_eq!(res.live_buffers(), 0);
                Ok(bytes.to_vec())
            })
            .unwrap();
        assert_eq!(bytes, [1, 2, 3, 4]);
    }

    #[test]
    fn swap_twice_restores() {
        let res = resources();
        let a = Handle::create(&res).unwrap();
        let b = Handle::create(&res).unwrap();
        a.set(BigInt::from(1));
        b.set(BigInt::from(2));
        a.swap(&b);
        assert_eq!(*a.value(), BigInt::from(2));
        a.swap(&b);
        assert_eq!(*a.value(), BigInt::from(1));
        assert_eq!(*b.value(), BigInt::from(2));
        a.swap(&a.clone());
        assert_eq!(*a.value(), BigInt::from(1));
    }
}
