#[cfg(test)]
pub(crate) mod fake;

use std::io::Result;
use std::os::fd::{AsRawFd, RawFd};
use std::os::raw::c_uint;
use std::ptr::NonNull;

use perf_event_open_sys::ioctls;

use crate::count::Group;
use crate::ffi::syscall::{self, ioctl_arg, mmap, munmap, page_size, perf_event_open, Ioctl};
use crate::ffi::{bindings as b, Attr, Metadata};

/// Group control verbs understood by the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Enable,
    Disable,
    Reset,
}

/// The kernel calls a [`Counter`][crate::count::Counter] is built from.
///
/// [`Linux`] issues the real system calls. Other implementations exist to
/// observe what a counter asks of the kernel without touching it.
pub trait Kernel {
    /// Opens a counter for the calling process on any CPU.
    fn open(&self, attr: &Attr, group: Group) -> Result<RawFd>;

    /// Maps the read-only metadata page of `fd`.
    fn map_metadata(&self, fd: RawFd) -> Result<NonNull<Metadata>>;

    /// Releases a page returned by [`Kernel::map_metadata`].
    ///
    /// Teardown has no failure channel, so this is best-effort.
    fn unmap_metadata(&self, page: NonNull<Metadata>);

    /// Releases a descriptor returned by [`Kernel::open`], best-effort.
    fn close(&self, fd: RawFd);

    /// Issues a control request on `fd`.
    fn control(&self, fd: RawFd, op: Control, flags: c_uint) -> Result<()>;
}

/// The running Linux kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct Linux;

impl Kernel for Linux {
    fn open(&self, attr: &Attr, group: Group) -> Result<RawFd> {
        // pid 0 and cpu -1: the calling process on any CPU.
        let flags = b::PERF_FLAG_FD_CLOEXEC as u64;
        perf_event_open(attr, 0, -1, group.as_raw_fd(), flags)
    }

    fn map_metadata(&self, fd: RawFd) -> Result<NonNull<Metadata>> {
        let len = page_size()?;
        unsafe { mmap(len, libc::PROT_READ, libc::MAP_SHARED, fd, 0) }
    }

    fn unmap_metadata(&self, page: NonNull<Metadata>) {
        // Unmapping a guessed length could take neighbouring mappings with it,
        // so a failed query leaks the page instead.
        let len = match page_size() {
            Ok(len) => len,
            Err(e) => {
                log::warn!("skipping unmap of metadata page {:p}: {}", page, e);
                return;
            }
        };
        if let Err(e) = unsafe { munmap(page, len) } {
            log::warn!("failed to unmap metadata page {:p}: {}", page, e);
        }
    }

    fn close(&self, fd: RawFd) {
        if let Err(e) = syscall::close(fd) {
            log::warn!("failed to close counter fd {}: {}", fd, e);
        }
    }

    fn control(&self, fd: RawFd, op: Control, flags: c_uint) -> Result<()> {
        let op: Ioctl = match op {
            Control::Enable => ioctls::ENABLE,
            Control::Disable => ioctls::DISABLE,
            Control::Reset => ioctls::RESET,
        };
        ioctl_arg(fd, op, flags)?;
        Ok(())
    }
}
