
use std::fmt;
use std::os::fd::{AsRawFd, RawFd};
use std::ptr::NonNull;

use crate::attr;
use crate::error::{Error, Result};
use crate::ffi::{bindings as b, Attr, Metadata};
use crate::kernel::{Control, Kernel, Linux};
use crate::name::{Encoder, Resolver};

mod group;

pub use group::*;

/// An open performance counter of the calling process, on any CPU.
///
/// A counter owns two kernel resources: the descriptor returned by
/// `perf_event_open` and the read-only metadata page mapped from it.
/// Either both are held or neither is. A counter whose open failed is
/// simply closed; [`Counter::is_open`] tells the two apart, and the
/// `try_` constructors report why.
///
/// Counters start disabled. Dropping a counter closes it.
///
/// # Examples
///
/// ```rust
/// use perf_counter::count::{Counter, Group};
/// use perf_counter::sys::bindings as b;
///
/// let ty = b::PERF_TYPE_HARDWARE;
/// let config = b::PERF_COUNT_HW_INSTRUCTIONS as u64;
///
/// let mut counter = Counter::open_by_id(ty, config, Group::NONE);
/// if counter.is_open() {
///     counter.enable().unwrap();
///     std::hint::black_box((0..1000).sum::<u64>());
///     counter.disable().unwrap();
/// }
///
/// counter.close();
/// assert!(!counter.is_open());
/// ```
pub struct Counter<K: Kernel = Linux> {
    kernel: K,
    fd: RawFd,
    metadata: Option<NonNull<Metadata>>,
}

impl Counter {
    /// Opens a counter from a fully populated attr.
    pub fn open(attr: &Attr, group: Group) -> Self {
        Self::open_with(Linux, attr, group)
    }

    pub fn try_open(attr: &Attr, group: Group) -> Result<Self> {
        Self::try_open_with(Linux, attr, group)
    }

    /// Opens a user-space-only counter for a numeric event.
    ///
    /// The counter is pinned when `group` is [`Group::NONE`], and always
    /// starts disabled with kernel and hypervisor execution excluded.
    pub fn open_by_id(ty: u32, config: u64, group: Group) -> Self {
        Self::open_by_id_with(Linux, ty, config, group)
    }

    pub fn try_open_by_id(ty: u32, config: u64, group: Group) -> Result<Self> {
        Self::try_open_by_id_with(Linux, ty, config, group)
    }

    /// Opens a counter for a symbolic event name encoded by libpfm.
    ///
    /// libpfm is loaded and initialized on first use, once per process.
    /// If that fails, every later call returns a closed counter without
    /// trying again.
    #[cfg(feature = "libpfm")]
    pub fn open_by_name(name: &str, group: Group) -> Self {
        Self::open_by_name_with(Linux, crate::name::pfm::resolver(), name, group)
    }

    #[cfg(feature = "libpfm")]
    pub fn try_open_by_name(name: &str, group: Group) -> Result<Self> {
        Self::try_open_by_name_with(Linux, crate::name::pfm::resolver(), name, group)
    }
}

impl<K: Kernel> Counter<K> {
    /// A closed counter.
    pub fn closed(kernel: K) -> Self {
        Self {
            kernel,
            fd: -1,
            metadata: None,
        }
    }

    pub fn open_with(kernel: K, attr: &Attr, group: Group) -> Self {
        let res = acquire(&kernel, attr, group);
        Self::settle(kernel, res)
    }

    pub fn try_open_with(kernel: K, attr: &Attr, group: Group) -> Result<Self> {
        let (fd, metadata) = acquire(&kernel, attr, group)?;
        Ok(Self::from_parts(kernel, fd, metadata))
    }

    pub fn open_by_id_with(kernel: K, ty: u32, config: u64, group: Group) -> Self {
        Self::open_with(kernel, &attr::by_id(ty, config, group), group)
    }

    pub fn try_open_by_id_with(kernel: K, ty: u32, config: u64, group: Group) -> Result<Self> {
        Self::try_open_with(kernel, &attr::by_id(ty, config, group), group)
    }

    /// Opens a counter for an event name translated by `resolver`.
    ///
    /// Nothing reaches the kernel unless the resolver is initialized and
    /// the name has a valid encoding.
    pub fn open_by_name_with<E: Encoder>(
        kernel: K,
        resolver: &Resolver<E>,
        name: &str,
        group: Group,
    ) -> Self {
        let res = by_name(resolver, name, group).and_then(|attr| acquire(&kernel, &attr, group));
        Self::settle(kernel, res)
    }

    pub fn try_open_by_name_with<E: Encoder>(
        kernel: K,
        resolver: &Resolver<E>,
        name: &str,
        group: Group,
    ) -> Result<Self> {
        let attr = by_name(resolver, name, group)?;
        Self::try_open_with(kernel, &attr, group)
    }

    fn from_parts(kernel: K, fd: RawFd, metadata: NonNull<Metadata>) -> Self {
        Self {
            kernel,
            fd,
            metadata: Some(metadata),
        }
    }

    fn settle(kernel: K, res: Result<(RawFd, NonNull<Metadata>)>) -> Self {
        match res {
            Ok((fd, metadata)) => Self::from_parts(kernel, fd, metadata),
            Err(e) => {
                log::debug!("returning closed counter: {}", e);
                Self::closed(kernel)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.fd != -1
    }

    /// Raw descriptor of the counter, `-1` once closed.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// The group led by this counter, for opening members into it.
    pub fn group(&self) -> Group {
        Group::leader(self)
    }

    /// The kernel-maintained metadata page.
    ///
    /// The kernel updates the page concurrently; readers need the seqlock
    /// protocol described in `perf_event_open(2)` to get a consistent view.
    pub fn metadata(&self) -> Option<&Metadata> {
        // The page stays mapped until `close`, which needs `&mut self`.
        self.metadata.map(|page| unsafe { page.as_ref() })
    }

    /// Starts counting, together with every member if this is a group leader.
    pub fn enable(&self) -> std::io::Result<()> {
        self.control(Control::Enable)
    }

    /// Stops counting, together with every member if this is a group leader.
    pub fn disable(&self) -> std::io::Result<()> {
        self.control(Control::Disable)
    }

    /// Zeroes the count, together with every member if this is a group leader.
    pub fn reset(&self) -> std::io::Result<()> {
        self.control(Control::Reset)
    }

    fn control(&self, op: Control) -> std::io::Result<()> {
        self.kernel.control(self.fd, op, b::PERF_IOC_FLAG_GROUP as _)
    }

    /// Unmaps the metadata page and releases the descriptor.
    ///
    /// Closing a closed counter does nothing.
    pub fn close(&mut self) {
        if let Some(page) = self.metadata.take() {
            self.kernel.unmap_metadata(page);
        }
        if self.fd != -1 {
            self.kernel.close(self.fd);
            self.fd = -1;
        }
    }
}

impl<K: Kernel> Drop for Counter<K> {
    fn drop(&mut self) {
        self.close();
    }
}

// The page is owned by the counter and only read through `&self`.
unsafe impl<K: Kernel + Send> Send for Counter<K> {}

impl<K: Kernel> AsRawFd for Counter<K> {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl<K: Kernel> fmt::Debug for Counter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("fd", &self.fd)
            .field("metadata", &self.metadata)
            .finish()
    }
}

// Descriptor and page are released together, so a mapping failure
// must not leak the descriptor.
fn acquire<K: Kernel>(
    kernel: &K,
    attr: &Attr,
    group: Group,
) -> Result<(RawFd, NonNull<Metadata>)> {
    let fd = kernel.open(attr, group).map_err(Error::Open)?;
    match kernel.map_metadata(fd) {
        Ok(page) => Ok((fd, page)),
        Err(e) => {
            kernel.close(fd);
            Err(Error::Map(e))
        }
    }
}

fn by_name<E: Encoder>(resolver: &Resolver<E>, name: &str, group: Group) -> Result<Attr> {
    resolver.ensure_initialized()?;
    let mut attr = resolver.translate(name)?;
    // The encoding already carries the privilege level.
    attr::apply_policy(&mut attr, group);
    Ok(attr)
}
