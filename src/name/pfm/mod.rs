//! libpfm4, loaded at runtime.


use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::null_mut;
use std::sync::OnceLock;

use dlopen2::wrapper::{Container, WrapperApi};
use libc::size_t;

use super::{Encoder, Resolver};
use crate::ffi::Attr;

const LIBRARY: &str = "libpfm.so.4";

const PFM_SUCCESS: c_int = 0;
// Privilege level 3: user space.
const PFM_PLM3: c_int = 0x8;
const PFM_OS_PERF_EVENT_EXT: c_int = 2;

// pfm_perf_encode_arg_t
#[repr(C)]
struct PerfEncodeArg {
    attr: *mut Attr,
    fstr: *mut *mut c_char,
    size: size_t,
    idx: c_int,
    cpu: c_int,
    flags: c_int,
    pad0: c_int,
}

#[derive(WrapperApi)]
struct PfmApi {
    pfm_initialize: unsafe extern "C" fn() -> c_int,
    pfm_strerror: unsafe extern "C" fn(code: c_int) -> *const c_char,
    pfm_get_os_event_encoding: unsafe extern "C" fn(
        name: *const c_char,
        dfl_plm: c_int,
        os: c_int,
        arg: *mut c_void,
    ) -> c_int,
}

static LIBPFM: Resolver<Libpfm> = Resolver::new(Libpfm::new());

/// The process-wide libpfm resolver.
pub fn resolver() -> &'static Resolver<Libpfm> {
    &LIBPFM
}

/// libpfm4 event encoder.
///
/// The shared library is opened during [`Encoder::initialize`]. A host
/// without libpfm fails initialization like any other setup error.
///
/// libpfm must be initialized once per process, so the only instance is
/// the one behind [`resolver`].
pub struct Libpfm {
    api: OnceLock<Container<PfmApi>>,
}

impl Libpfm {
    pub(crate) const fn new() -> Self {
        Self {
            api: OnceLock::new(),
        }
    }

    fn strerror(api: &Container<PfmApi>, code: c_int) -> String {
        let ptr = unsafe { api.pfm_strerror(code) };
        match ptr.is_null() {
            true => format!("error {}", code),
            false => unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned(),
        }
    }
}

impl Encoder for Libpfm {
    fn initialize(&self) -> bool {
        let api = match unsafe { Container::<PfmApi>::load(LIBRARY) } {
            Ok(api) => api,
            Err(e) => {
                log::debug!("failed to load {}: {}", LIBRARY, e);
                return false;
            }
        };

        let ret = unsafe { api.pfm_initialize() };
        if ret != PFM_SUCCESS {
            log::debug!("pfm_initialize: {}", Self::strerror(&api, ret));
            return false;
        }

        self.api.set(api).is_ok()
    }

    fn encode(&self, name: &CStr, attr: &mut Attr) -> bool {
        let Some(api) = self.api.get() else {
            return false;
        };

        let mut arg = PerfEncodeArg {
            attr: attr as *mut Attr,
            fstr: null_mut(),
            size: size_of::<PerfEncodeArg>(),
            idx: 0,
            cpu: 0,
            flags: 0,
            pad0: 0,
        };
        let ret = unsafe {
            api.pfm_get_os_event_encoding(
                name.as_ptr(),
                PFM_PLM3,
                PFM_OS_PERF_EVENT_EXT,
                &mut arg as *mut PerfEncodeArg as *mut c_void,
            )
        };

        if ret != PFM_SUCCESS {
            log::debug!("cannot encode {:?}: {}", name, Self::strerror(api, ret));
            return false;
        }
        true
    }
}
