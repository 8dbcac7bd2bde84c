//! In-process stand-in for the ray tracing runtime: typed buffers that live in
//! an arena owned by the session, and bulk-parallel 1D/2D launches.
//!
//! A launch only ever reads the arena. Its results come back as a fresh vector
//! which the host then writes into the target buffer, so a buffer is never read
//! and written within the same dispatch.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use rayon::prelude::*;
use tracing::trace;

use crate::error::{Error, Result};

/// Stable handle to a buffer in a [`Device`] arena.
pub struct Buffer<T> {
    id: u64,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Buffer<T> {}

impl<T> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer<{}>#{}[{}]", type_name::<T>(), self.id, self.len)
    }
}

impl<T> Buffer<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

type Slot = Option<Box<dyn Any + Send + Sync>>;

#[derive(Default)]
pub struct Device {
    slots: Vec<Slot>,
}

impl Device {
    pub fn new() -> Device {
        Device::default()
    }

    /// Allocates `count` elements, copied from `init` when given.
    pub fn allocate<T>(&mut self, count: usize, init: Option<&[T]>) -> Result<Buffer<T>>
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        let data = match init {
            Some(values) if values.len() != count => {
                return Err(Error::LengthMismatch { expected: count, actual: values.len() });
            }
            Some(values) => values.to_vec(),
            None => vec![T::default(); count],
        };

        let id = self.slots.len() as u64;
        self.slots.push(Some(Box::new(data)));
        trace!(id, count, ty = type_name::<T>(), "allocated buffer");

        Ok(Buffer { id, len: count, _marker: PhantomData })
    }

    /// Read access to a buffer's contents.
    pub fn get<T: 'static>(&self, buf: Buffer<T>) -> Result<&[T]> {
        let slot = self
            .slots
            .get(buf.id as usize)
            .and_then(|s| s.as_ref())
            .ok_or(Error::InvalidHandle(buf.id))?;
        slot.downcast_ref::<Vec<T>>()
            .map(|v| v.as_slice())
            .ok_or(Error::TypeMismatch { handle: buf.id, expected: type_name::<T>() })
    }

    /// Host-side write access, used to populate a buffer before a dispatch.
    pub fn host_mut<T: 'static>(&mut self, buf: Buffer<T>) -> Result<&mut [T]> {
        let slot = self
            .slots
            .get_mut(buf.id as usize)
            .and_then(|s| s.as_mut())
            .ok_or(Error::InvalidHandle(buf.id))?;
        slot.downcast_mut::<Vec<T>>()
            .map(|v| v.as_mut_slice())
            .ok_or(Error::TypeMismatch { handle: buf.id, expected: type_name::<T>() })
    }

    /// Replaces the contents of `buf` with the output of a finished dispatch.
    pub fn write<T: 'static>(&mut self, buf: Buffer<T>, data: Vec<T>) -> Result<()> {
        if data.len() != buf.len {
            return Err(Error::LengthMismatch { expected: buf.len, actual: data.len() });
        }
        let dst = self.host_mut(buf)?;
        for (d, s) in dst.iter_mut().zip(data) {
            *d = s;
        }
        Ok(())
    }

    /// Opaque handle for embedding in per-launch records and logs.
    pub fn device_handle<T>(&self, buf: Buffer<T>) -> Result<u64> {
        match self.slots.get(buf.id as usize) {
            Some(Some(_)) => Ok(buf.id),
            _ => Err(Error::InvalidHandle(buf.id)),
        }
    }

    pub fn release<T>(&mut self, buf: Buffer<T>) -> Result<()> {
        match self.slots.get_mut(buf.id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => Err(Error::InvalidHandle(buf.id)),
        }
    }

    /// Runs `kernel` once per index in `0..count`, in parallel, and returns the
    /// results in index order. Returns only once every invocation finished.
    pub fn launch_1d<T, K>(&self, count: usize, kernel: K) -> Vec<T>
    where
        T: Send,
        K: Fn(usize) -> T + Sync + Send,
    {
        (0..count).into_par_iter().map(kernel).collect()
    }

    /// Runs `kernel` once per pixel `(x, y)`; results are row-major.
    pub fn launch_2d<T, K>(&self, width: u32, height: u32, kernel: K) -> Vec<T>
    where
        T: Send,
        K: Fn(u32, u32) -> T + Sync + Send,
    {
        let w = width as usize;
        let count = w * height as usize;
        (0..count)
            .into_par_iter()
            .map(|i| kernel((i % w) as u32, (i / w) as u32))
            .collect()
    }
}
