pub mod syscall;

pub use perf_event_open_sys::bindings;

pub type Attr = bindings::perf_event_attr;
pub type Metadata = bindings::perf_event_mmap_page;
