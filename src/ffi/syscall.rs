use std::io::{Error, Result};
use std::os::fd::RawFd;
use std::os::raw::{c_int, c_uint};
use std::ptr::{null_mut, NonNull};

use super::Attr;

pub type Ioctl = unsafe fn(c_int, c_uint) -> c_int;

pub fn perf_event_open(
    attr: &Attr,
    pid: i32,
    cpu: i32,
    group_fd: i32,
    flags: u64,
) -> Result<RawFd> {
    let num = libc::SYS_perf_event_open;
    let fd = unsafe { libc::syscall(num, attr as *const Attr, pid, cpu, group_fd, flags) };
    if fd != -1 {
        Ok(fd as _)
    } else {
        Err(Error::last_os_error())
    }
}

pub fn ioctl_arg(fd: RawFd, op: Ioctl, arg: c_uint) -> Result<i32> {
    let result = unsafe { op(fd, arg) };
    if result != -1 {
        Ok(result)
    } else {
        Err(Error::last_os_error())
    }
}

// Not cached: teardown has to see a failing query rather than a stale size.
pub fn page_size() -> Result<usize> {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match size {
        1.. => Ok(size as _),
        -1 => Err(Error::last_os_error()),
        _ => Err(Error::other(format!("invalid page size: {}", size))),
    }
}

pub unsafe fn mmap<T>(
    len: usize,
    prot: i32,
    flags: i32,
    fd: RawFd,
    offset: i64,
) -> Result<NonNull<T>> {
    let ptr = libc::mmap(null_mut(), len, prot, flags, fd, offset);
    match ptr != libc::MAP_FAILED {
        true => NonNull::new(ptr as *mut T).ok_or_else(|| Error::other("mmap returned null")),
        false => Err(Error::last_os_error()),
    }
}

pub unsafe fn munmap<T>(ptr: NonNull<T>, len: usize) -> Result<()> {
    let result = libc::munmap(ptr.as_ptr() as _, len);
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

pub fn close(fd: RawFd) -> Result<()> {
    let result = unsafe { libc::close(fd) };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}
