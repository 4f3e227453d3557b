//! C entry points for call interposers.
//!
//! Ops are passed as their index in [`Op`] declaration order: READ 0,
//! WRITE 1, UNLINK 2, MKDIR 3, SYMLINK 4, LINK 5, EXEC 6.

use crate::{global, Finalize};
use cmdaudit_audit_types::Op;
use std::ffi::{c_char, c_int, CStr};
use strum::IntoEnumIterator;
use tracing::warn;

/// Map a raw op index to an [`Op`].
pub fn op_from_raw(raw: c_int) -> Option<Op> {
    usize::try_from(raw).ok().and_then(|i| Op::iter().nth(i))
}

/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn opt_str<'a>(ptr: *const c_char) -> Option<std::borrow::Cow<'a, str>> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy())
    }
}

/// Initialize auditing for this process image.
#[no_mangle]
pub extern "C" fn cmdaudit_init() {
    global::start();
}

/// Request recording for this process.
#[no_mangle]
pub extern "C" fn cmdaudit_set_active() {
    global::set_active();
}

/// Stop recording for this process.
#[no_mangle]
pub extern "C" fn cmdaudit_set_inactive() {
    global::set_inactive();
}

/// Record one intercepted call.
///
/// # Safety
/// `call` and `path` must be valid NUL-terminated strings; `extra` must be
/// null or one.
#[no_mangle]
pub unsafe extern "C" fn cmdaudit_record(
    call: *const c_char,
    path: *const c_char,
    extra: *const c_char,
    fd: c_int,
    op: c_int,
) {
    let Some(op) = op_from_raw(op) else {
        warn!(op, "unknown op index");
        return;
    };
    let (Some(call), Some(path)) = (opt_str(call), opt_str(path)) else {
        return;
    };
    let extra = opt_str(extra);
    global::record(&call, &path, extra.as_deref(), fd, op);
}

/// The process is exiting with `status`.
#[no_mangle]
pub extern "C" fn cmdaudit_exit(status: c_int) {
    global::finish(Finalize::Exiting { status });
}

/// The process is about to exec.
#[no_mangle]
pub extern "C" fn cmdaudit_before_exec() {
    global::finish(Finalize::Reexecing);
}

extern "C" fn atfork_prepare() {
    if let Some(auditor) = global::get() {
        if let Err(e) = auditor.atfork_prepare() {
            global::die(&e);
        }
    }
}

extern "C" fn atfork_parent() {
    if let Some(auditor) = global::get() {
        // SAFETY: paired with atfork_prepare, which left the lock held.
        unsafe { auditor.atfork_parent() };
    }
}

extern "C" fn atfork_child() {
    if let Some(auditor) = global::get() {
        // SAFETY: paired with atfork_prepare, which left the lock held.
        if let Err(e) = unsafe { auditor.atfork_child() } {
            global::die(&e);
        }
    }
}

/// Register fork handlers that keep parent and child records apart.
///
/// Returns 0 on success or an errno value.
#[no_mangle]
pub extern "C" fn cmdaudit_register_atfork() -> c_int {
    // SAFETY: the handlers are plain functions valid for the process
    // lifetime.
    unsafe { libc::pthread_atfork(Some(atfork_prepare), Some(atfork_parent), Some(atfork_child)) }
}
