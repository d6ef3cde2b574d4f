use crate::count::Group;
use crate::ffi::Attr;

// `perf_event_attr` is non-exhaustive, so no struct expression.
pub(crate) fn bare() -> Attr {
    let mut attr = Attr::default();
    attr.size = size_of::<Attr>() as _;
    attr
}

/// Builds the attr for a numeric `(type, config)` event, restricted to
/// user space.
pub(crate) fn by_id(ty: u32, config: u64, group: Group) -> Attr {
    let mut attr = bare();
    attr.type_ = ty;
    attr.config = config;

    apply_policy(&mut attr, group);
    attr.set_exclude_kernel(1);
    attr.set_exclude_hv(1);

    attr
}

/// Scheduling policy shared by every counter this crate opens.
pub(crate) fn apply_policy(attr: &mut Attr, group: Group) {
    // A standalone counter always holds a hardware slot instead of
    // being time-shared. Group members follow their leader.
    if group.is_none() {
        attr.set_pinned(1);
    }
    // Counting starts with `Counter::enable`.
    attr.set_disabled(1);
}
