use std::os::fd::{AsRawFd, RawFd};

use super::Counter;
use crate::kernel::Kernel;

/// Group leader of a counter, by descriptor.
///
/// An event group is scheduled onto the CPU as a unit, and enabling or
/// disabling the leader starts or stops every member with it, so member
/// counts cover the same set of executed instructions.
///
/// A `Group` does not own or borrow the leader. The leader must stay open
/// at least as long as the counters that joined it.
///
/// # Examples
///
/// ```rust
/// use perf_counter::count::{Counter, Group};
/// use perf_counter::sys::bindings as b;
///
/// let ty = b::PERF_TYPE_HARDWARE;
/// let leader = Counter::open_by_id(ty, b::PERF_COUNT_HW_CPU_CYCLES as _, Group::NONE);
/// let member = Counter::open_by_id(ty, b::PERF_COUNT_HW_INSTRUCTIONS as _, leader.group());
///
/// if leader.is_open() && member.is_open() {
///     leader.enable().unwrap(); // Starts both counters.
///     leader.disable().unwrap(); // Stops both counters.
/// }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Group(RawFd);

impl Group {
    /// The counter is opened on its own and leads its own group.
    pub const NONE: Group = Group(-1);

    /// Joins the group led by `counter`.
    ///
    /// A closed leader yields [`Group::NONE`].
    pub fn leader<K: Kernel>(counter: &Counter<K>) -> Self {
        Self(counter.fd())
    }

    /// Joins the group led by the counter behind `fd`.
    ///
    /// Negative values mean no group.
    pub fn from_raw_fd(fd: RawFd) -> Self {
        match fd {
            fd if fd < 0 => Self::NONE,
            fd => Self(fd),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl AsRawFd for Group {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::NONE
    }
}
