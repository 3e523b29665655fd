//! FFI module for native hosts
//!
//! C-compatible functions over a rendered result handle. Null pointers are
//! treated as "no content"; strings handed out must be released with
//! `htmltext_string_free`.

use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_uchar, CStr, CString};
use std::ptr;
use std::slice;

use crate::linearize::{Linearized, StyleSpan};
use crate::options::RenderOptions;
use crate::runs::{AttributedText, StyledRun};
use crate::{render_with_options, RunKind};

/// Rendered runs plus their linearization
pub struct AttributedTextHandle {
    text: AttributedText,
    linear: Linearized,
}

impl AttributedTextHandle {
    fn new(text: AttributedText) -> Self {
        let linear = text.linearize();
        Self { text, linear }
    }

    fn run(&self, index: u32) -> Option<&StyledRun> {
        self.text.runs().get(index as usize)
    }

    fn span(&self, index: u32) -> Option<&StyleSpan> {
        self.linear.spans.get(index as usize)
    }
}

fn into_handle(html: Option<&str>, options: &RenderOptions) -> *mut AttributedTextHandle {
    let text = render_with_options(html, options);
    Box::into_raw(Box::new(AttributedTextHandle::new(text)))
}

/// Owned C string; interior NULs become U+FFFD
fn to_c_string(s: &str) -> *mut c_char {
    let s = if s.contains('\0') {
        Cow::Owned(s.replace('\0', "\u{FFFD}"))
    } else {
        Cow::Borrowed(s)
    };
    match CString::new(s.as_bytes()) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the library (installs the logger once)
#[no_mangle]
pub extern "C" fn htmltext_init() {
    let _ = env_logger::try_init();
}

/// Get library version
#[no_mangle]
pub extern "C" fn htmltext_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a NUL-terminated HTML fragment. Never returns null.
#[no_mangle]
pub extern "C" fn htmltext_render(html: *const c_char) -> *mut AttributedTextHandle {
    htmltext_render_with_options(html, 0, 0)
}

/// Render with a depth cap (0 keeps the default) and whitespace collapsing
#[no_mangle]
pub extern "C" fn htmltext_render_with_options(
    html: *const c_char,
    max_depth: u32,
    collapse_whitespace: c_int,
) -> *mut AttributedTextHandle {
    let mut options = RenderOptions::default().with_collapse_whitespace(collapse_whitespace != 0);
    if max_depth > 0 {
        options = options.with_max_depth(max_depth as usize);
    }

    if html.is_null() {
        return into_handle(None, &options);
    }
    let html = unsafe { CStr::from_ptr(html) }.to_string_lossy();
    into_handle(Some(&*html), &options)
}

/// Render a UTF-8 buffer of `length` bytes
#[no_mangle]
pub extern "C" fn htmltext_render_bytes(
    data: *const c_uchar,
    length: usize,
) -> *mut AttributedTextHandle {
    if data.is_null() || length == 0 {
        return into_handle(None, &RenderOptions::default());
    }
    let bytes = unsafe { slice::from_raw_parts(data, length) };
    into_handle(Some(&*String::from_utf8_lossy(bytes)), &RenderOptions::default())
}

/// Free a result handle
#[no_mangle]
pub extern "C" fn htmltext_result_free(result: *mut AttributedTextHandle) {
    if !result.is_null() {
        unsafe {
            drop(Box::from_raw(result));
        }
    }
}

/// Free a string returned by this library
#[no_mangle]
pub extern "C" fn htmltext_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

// ============================================================================
// Run accessors
// ============================================================================

#[no_mangle]
pub extern "C" fn htmltext_result_run_count(result: *const AttributedTextHandle) -> u32 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).text.len() as u32 }
}

/// Run kind (0 text, 1 line break, 2 paragraph break)
#[no_mangle]
pub extern "C" fn htmltext_result_run_kind(result: *const AttributedTextHandle, index: u32) -> u8 {
    if result.is_null() {
        return RunKind::Text as u8;
    }
    unsafe { (*result).run(index).map_or(RunKind::Text as u8, |run| run.kind as u8) }
}

/// Style bit mask (bold 1, italic 2, underline 4, strikethrough 8)
#[no_mangle]
pub extern "C" fn htmltext_result_run_flags(result: *const AttributedTextHandle, index: u32) -> u8 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).run(index).map_or(0, |run| run.flags.bits()) }
}

/// Run text; null when out of range
#[no_mangle]
pub extern "C" fn htmltext_result_run_text(
    result: *const AttributedTextHandle,
    index: u32,
) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        match (*result).run(index) {
            Some(run) => to_c_string(&run.text),
            None => ptr::null_mut(),
        }
    }
}

/// Link target; null when the run is not a link
#[no_mangle]
pub extern "C" fn htmltext_result_run_href(
    result: *const AttributedTextHandle,
    index: u32,
) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        match (*result).run(index).and_then(|run| run.href.as_deref()) {
            Some(href) => to_c_string(href),
            None => ptr::null_mut(),
        }
    }
}

/// Text with breaks rendered as newlines
#[no_mangle]
pub extern "C" fn htmltext_result_plain_text(result: *const AttributedTextHandle) -> *mut c_char {
    if result.is_null() {
        return ptr::null_mut();
    }
    unsafe { to_c_string(&(*result).linear.text) }
}

// ============================================================================
// Span accessors (UTF-16 offsets into the plain text)
// ============================================================================

#[no_mangle]
pub extern "C" fn htmltext_result_span_count(result: *const AttributedTextHandle) -> u32 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).linear.spans.len() as u32 }
}

#[no_mangle]
pub extern "C" fn htmltext_result_span_start(result: *const AttributedTextHandle, index: u32) -> u32 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).span(index).map_or(0, |span| span.start as u32) }
}

#[no_mangle]
pub extern "C" fn htmltext_result_span_end(result: *const AttributedTextHandle, index: u32) -> u32 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).span(index).map_or(0, |span| span.end as u32) }
}

#[no_mangle]
pub extern "C" fn htmltext_result_span_flags(result: *const AttributedTextHandle, index: u32) -> u8 {
    if result.is_null() {
        return 0;
    }
    unsafe { (*result).span(index).map_or(0, |span| span.flags.bits()) }
}

// ============================================================================
// Binary tape
// ============================================================================

/// Write the runs as a binary tape into a malloc'd buffer
#[no_mangle]
pub extern "C" fn htmltext_result_write_binary(
    result: *const AttributedTextHandle,
    buffer: *mut *mut c_uchar,
    length: *mut u32,
) -> c_int {
    if result.is_null() || buffer.is_null() || length.is_null() {
        return 0;
    }

    unsafe {
        let bytes = (*result).text.write_binary();

        let ptr = libc::malloc(bytes.len()) as *mut c_uchar;
        if ptr.is_null() {
            return 0;
        }

        ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *buffer = ptr;
        *length = bytes.len() as u32;
        1
    }
}

/// Free a buffer allocated by htmltext_result_write_binary
#[no_mangle]
pub extern "C" fn htmltext_binary_buffer_free(buffer: *mut c_uchar) {
    if !buffer.is_null() {
        unsafe {
            libc::free(buffer as *mut libc::c_void);
        }
    }
}
