use std::io::{Error, Result};
use std::os::fd::RawFd;
use std::os::raw::c_uint;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use super::{Control, Kernel};
use crate::count::Group;
use crate::ffi::{Attr, Metadata};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Open(Group),
    Map(RawFd),
    Unmap,
    Close(RawFd),
    Control(RawFd, Control, c_uint),
}

#[derive(Default)]
struct State {
    next_fd: RawFd,
    fail_open: bool,
    fail_map: bool,
    calls: Vec<Call>,
    attrs: Vec<Attr>,
    live_fds: usize,
    live_pages: usize,
}

/// Records every request instead of reaching the kernel.
#[derive(Clone, Default)]
pub struct FakeKernel(Arc<Mutex<State>>);

impl FakeKernel {
    pub fn failing_open() -> Self {
        let kernel = Self::default();
        kernel.0.lock().unwrap().fail_open = true;
        kernel
    }

    pub fn failing_map() -> Self {
        let kernel = Self::default();
        kernel.0.lock().unwrap().fail_map = true;
        kernel
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    /// Attrs passed to `open`, in order.
    pub fn attrs(&self) -> Vec<Attr> {
        self.0.lock().unwrap().attrs.clone()
    }

    pub fn opens(&self) -> usize {
        self.attrs().len()
    }

    pub fn live_fds(&self) -> usize {
        self.0.lock().unwrap().live_fds
    }

    pub fn live_pages(&self) -> usize {
        self.0.lock().unwrap().live_pages
    }
}

impl Kernel for FakeKernel {
    fn open(&self, attr: &Attr, group: Group) -> Result<RawFd> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(Call::Open(group));
        state.attrs.push(*attr);
        if state.fail_open {
            return Err(Error::from_raw_os_error(libc::EACCES));
        }
        let fd = 3 + state.next_fd;
        state.next_fd += 1;
        state.live_fds += 1;
        Ok(fd)
    }

    fn map_metadata(&self, fd: RawFd) -> Result<NonNull<Metadata>> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(Call::Map(fd));
        if state.fail_map {
            return Err(Error::from_raw_os_error(libc::ENOMEM));
        }
        state.live_pages += 1;
        let page = Box::new(unsafe { std::mem::zeroed::<Metadata>() });
        Ok(NonNull::from(Box::leak(page)))
    }

    fn unmap_metadata(&self, page: NonNull<Metadata>) {
        let mut state = self.0.lock().unwrap();
        state.calls.push(Call::Unmap);
        state.live_pages -= 1;
        drop(unsafe { Box::from_raw(page.as_ptr()) });
    }

    fn close(&self, fd: RawFd) {
        let mut state = self.0.lock().unwrap();
        state.calls.push(Call::Close(fd));
        state.live_fds -= 1;
    }

    fn control(&self, fd: RawFd, op: Control, flags: c_uint) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(Call::Control(fd, op, flags));
        match fd {
            0.. => Ok(()),
            _ => Err(Error::from_raw_os_error(libc::EBADF)),
        }
    }
}
