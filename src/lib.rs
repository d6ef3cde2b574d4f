//! Minimal performance counter handles on top of `perf_event_open`.
//!
//! A [`Counter`][count::Counter] pairs a counter descriptor with the
//! read-only metadata page the kernel keeps updated for it. Counters measure
//! the calling process on any CPU, start disabled, and can be grouped so
//! that enabling the leader starts all members at once.
//!
//! ## Example
//!
//! Count user-space instructions and cycles of a fibonacci calculation as a group.
//!
//! ```rust
//! use perf_counter::count::{Counter, Group};
//! use perf_counter::sys::bindings as b;
//!
//! let ty = b::PERF_TYPE_HARDWARE;
//! let cycles = Counter::open_by_id(ty, b::PERF_COUNT_HW_CPU_CYCLES as _, Group::NONE);
//! let instrs = Counter::open_by_id(ty, b::PERF_COUNT_HW_INSTRUCTIONS as _, cycles.group());
//!
//! // Failures leave the counter closed, e.g. when `perf_event_paranoid` forbids access.
//! if cycles.is_open() && instrs.is_open() {
//!     cycles.enable().unwrap(); // Start both counters.
//!     fn fib(n: usize) -> usize {
//!         match n {
//!             0 => 0,
//!             1 => 1,
//!             n => fib(n - 1) + fib(n - 2),
//!         }
//!     }
//!     std::hint::black_box(fib(20));
//!     cycles.disable().unwrap(); // Stop both counters.
//! }
//! ```
//!
//! ## Event names
//!
//! With the `libpfm` feature, [`Counter::open_by_name`][count::Counter::open_by_name]
//! resolves names such as `"INST_RETIRED:ANY_P"` through libpfm4, loaded at
//! runtime. Any other encoder can be plugged in through
//! [`Counter::open_by_name_with`][count::Counter::open_by_name_with].

mod attr;
pub mod count;
mod error;
mod ffi;
pub mod kernel;
pub mod name;

pub use error::{Error, Result};
pub use ffi::{Attr, Metadata};
pub use perf_event_open_sys as sys;
