use std::ffi::CStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use super::Encoder;
use crate::ffi::Attr;

/// Encodes a fixed table of names and counts initializations.
pub struct FakeEncoder {
    init_ok: bool,
    events: &'static [(&'static str, u32, u64)],
    inits: AtomicUsize,
    encodes: AtomicUsize,
}

impl FakeEncoder {
    pub const EVENTS: &'static [(&'static str, u32, u64)] =
        &[("INST_RETIRED:ANY_P", 4, 0x00c0), ("CYCLES", 0, 0)];

    pub fn new() -> Self {
        Self::with_init(true)
    }

    pub fn broken() -> Self {
        Self::with_init(false)
    }

    fn with_init(init_ok: bool) -> Self {
        Self {
            init_ok,
            events: Self::EVENTS,
            inits: AtomicUsize::new(0),
            encodes: AtomicUsize::new(0),
        }
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }
}

impl Encoder for FakeEncoder {
    fn initialize(&self) -> bool {
        self.inits.fetch_add(1, Ordering::SeqCst);
        // Keep late callers waiting on the in-progress state.
        thread::sleep(Duration::from_millis(20));
        self.init_ok
    }

    fn encode(&self, name: &CStr, attr: &mut Attr) -> bool {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        let Some(&(_, ty, config)) = self
            .events
            .iter()
            .find(|(it, ..)| it.as_bytes() == name.to_bytes())
        else {
            return false;
        };
        attr.type_ = ty;
        attr.config = config;
        attr.set_exclude_kernel(1);
        attr.set_exclude_hv(1);
        true
    }
}
