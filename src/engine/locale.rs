//! Process-wide numeric locale lease.
//!
//! The C numeric locale is global state: switching it affects every thread. The lease is a
//! process-wide reference count. The first acquisition switches `LC_NUMERIC` to `"C"`, nested
//! acquisitions on any thread only bump the count, and the last release restores the saved
//! locale.

use std::cell::Cell;
use std::ffi::CString;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

struct LeaseState {
    depth: usize,
    saved: Option<CString>,
}

static LEASE: Mutex<LeaseState> = Mutex::new(LeaseState {
    depth: 0,
    saved: None,
});

thread_local! {
    /// Leases held by this thread; guards are `!Send`, so acquire and drop share a thread.
    static HELD_HERE: Cell<usize> = const { Cell::new(0) };
}

/// Guard for the numeric locale override. `!Send`: it is released on the thread that took it.
pub struct LocaleLease {
    _not_send: PhantomData<*const ()>,
}

impl LocaleLease {
    /// Take a reference on the override, installing it if nobody holds one. Never blocks on
    /// other holders, so a parser running under the coordinator's lease may take its own.
    pub fn acquire() -> Self {
        let mut state = LEASE.lock().unwrap_or_else(PoisonError::into_inner);
        if state.depth == 0 {
            state.saved = switch_numeric_locale();
            log::debug!("locale lease acquired");
        }
        state.depth += 1;
        HELD_HERE.with(|n| n.set(n.get() + 1));
        LocaleLease {
            _not_send: PhantomData,
        }
    }

    /// Whether any thread holds the lease right now.
    pub fn is_held() -> bool {
        LEASE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .depth
            > 0
    }

    pub fn held_by_current_thread() -> bool {
        HELD_HERE.with(|n| n.get() > 0)
    }
}

impl Drop for LocaleLease {
    fn drop(&mut self) {
        HELD_HERE.with(|n| n.set(n.get().saturating_sub(1)));
        let mut state = LEASE.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth -= 1;
        if state.depth == 0 {
            restore_numeric_locale(state.saved.take());
            log::debug!("locale lease released");
        }
    }
}

/// Current `LC_NUMERIC` name, if the platform reports one.
#[cfg(unix)]
pub fn current_numeric_locale() -> Option<String> {
    // SAFETY: a null locale only queries; the returned string is copied before any other call.
    unsafe {
        let current = libc::setlocale(libc::LC_NUMERIC, std::ptr::null());
        (!current.is_null()).then(|| std::ffi::CStr::from_ptr(current).to_string_lossy().into_owned())
    }
}

#[cfg(not(unix))]
pub fn current_numeric_locale() -> Option<String> {
    None
}

#[cfg(unix)]
fn switch_numeric_locale() -> Option<CString> {
    // SAFETY: only called with LEASE locked; the previous name is copied before the switch.
    unsafe {
        let current = libc::setlocale(libc::LC_NUMERIC, std::ptr::null());
        let saved = (!current.is_null()).then(|| std::ffi::CStr::from_ptr(current).to_owned());
        libc::setlocale(libc::LC_NUMERIC, c"C".as_ptr());
        saved
    }
}

#[cfg(not(unix))]
fn switch_numeric_locale() -> Option<CString> {
    None
}

#[cfg(unix)]
fn restore_numeric_locale(saved: Option<CString>) {
    if let Some(name) = saved {
        // SAFETY: only called with LEASE locked; `name` outlives the call.
        unsafe {
            libc::setlocale(libc::LC_NUMERIC, name.as_ptr());
        }
    }
}

#[cfg(not(unix))]
fn restore_numeric_locale(_saved: Option<CString>) {}
