// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Buffers for the spooler's size-query-then-fill calls, and UTF-16 helpers.

use windows_sys::Win32::Foundation::{ERROR_INSUFFICIENT_BUFFER, GetLastError};

/// Upper bound on fill attempts when the queue grows between calls.
const MAX_ATTEMPTS: usize = 4;

/// Byte buffer aligned for the spooler's info structures.
pub(super) struct SpoolBuffer {
    words: Vec<u64>,
    count: usize,
}

impl SpoolBuffer {
    /// Run `call(buf, size, needed, returned)` until it fits.
    ///
    /// The first call passes an empty buffer to learn the size. Returns the
    /// Win32 error code on failure.
    pub(super) fn fill<F>(mut call: F) -> Result<Self, u32>
    where
        F: FnMut(*mut u8, u32, &mut u32, &mut u32) -> i32,
    {
        let mut words: Vec<u64> = Vec::new();
        for _ in 0..MAX_ATTEMPTS {
            let size = u32::try_from(words.len() * 8).unwrap_or(u32::MAX);
            let mut needed: u32 = 0;
            let mut returned: u32 = 0;
            let ptr = if words.is_empty() {
                std::ptr::null_mut()
            } else {
                words.as_mut_ptr().cast::<u8>()
            };
            if call(ptr, size, &mut needed, &mut returned) != 0 {
                let count = if words.is_empty() { 0 } else { returned as usize };
                return Ok(Self { words, count });
            }
            // SAFETY: reads thread-local state only.
            let code = unsafe { GetLastError() };
            if code != ERROR_INSUFFICIENT_BUFFER || needed == 0 {
                return Err(code);
            }
            words = vec![0u64; (needed as usize).div_ceil(8)];
        }
        Err(ERROR_INSUFFICIENT_BUFFER)
    }

    /// The records the spooler packed at the start of the buffer.
    ///
    /// # Safety
    ///
    /// `T` must be the structure type the filling call wrote.
    pub(super) unsafe fn records<T>(&self) -> &[T] {
        if self.count == 0 {
            return &[];
        }
        // SAFETY: caller guarantees `count` records of `T` were written;
        // `u64` storage satisfies their alignment.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast::<T>(), self.count) }
    }
}

/// NUL-terminated UTF-16 copy of `s`.
pub(super) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a NUL-terminated UTF-16 string; `None` for null or empty.
///
/// # Safety
///
/// `p` must be null or point at a NUL-terminated UTF-16 string.
pub(super) unsafe fn from_wide(p: *const u16) -> Option<String> {
    if p.is_null() {
        return None;
    }
    let mut len = 0;
    // SAFETY: the string is NUL-terminated.
    while unsafe { *p.add(len) } != 0 {
        len += 1;
    }
    if len == 0 {
        return None;
    }
    // SAFETY: `len` units were just read.
    let units = unsafe { std::slice::from_raw_parts(p, len) };
    Some(String::from_utf16_lossy(units))
}
