//! Symbolic event names.
//!
//! Hardware event encodings differ between CPU models, so opening a counter
//! by name needs an external encoder such as libpfm4. The encoder is a
//! collaborator passed in by the caller: [`Counter::open_by_name_with`]
//! accepts any [`Resolver`], and the `libpfm` feature provides a process-wide
//! one backed by the real library.
//!
//! [`Counter::open_by_name_with`]: crate::count::Counter::open_by_name_with

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
mod test;

use std::ffi::{CStr, CString};

use crate::attr;
use crate::error::{Error, Result};
use crate::ffi::Attr;

mod once;
#[cfg(feature = "libpfm")]
pub mod pfm;

pub use once::*;

/// An external library translating event names into attrs.
pub trait Encoder {
    /// One-time library setup. Called at most once per [`Resolver`].
    fn initialize(&self) -> bool;

    /// Fills the hardware-specific fields of `attr` for `name`, monitoring
    /// user space only. Only called after a successful [`Encoder::initialize`].
    fn encode(&self, name: &CStr, attr: &mut Attr) -> bool;
}

/// An [`Encoder`] guarded by its one-time initialization.
pub struct Resolver<E> {
    encoder: E,
    guard: InitGuard,
}

impl<E> Resolver<E> {
    pub const fn new(encoder: E) -> Self {
        Self {
            encoder,
            guard: InitGuard::new(),
        }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn state(&self) -> InitState {
        self.guard.state()
    }
}

impl<E: Encoder> Resolver<E> {
    /// Initializes the encoder unless some caller already has.
    pub fn ensure_initialized(&self) -> Result<()> {
        let state = self.guard.ensure(|| {
            let ok = self.encoder.initialize();
            log::debug!("event encoder initialized: {}", ok);
            ok
        });
        match state {
            InitState::Succeeded => Ok(()),
            _ => Err(Error::Uninitialized),
        }
    }

    /// Translates `name` into an attr ready for the counter policy.
    pub fn translate(&self, name: &str) -> Result<Attr> {
        self.ensure_initialized()?;

        let encode_err = || Error::Encode(name.to_owned());
        let c_name = CString::new(name).map_err(|_| encode_err())?;

        let mut attr = attr::bare();
        match self.encoder.encode(&c_name, &mut attr) {
            true => Ok(attr),
            false => Err(encode_err()),
        }
    }
}
