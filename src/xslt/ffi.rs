//! Raw declarations for the parts of libxml2 and libxslt used by [`super`].
//!
//! Only pointers to these structures are ever handled, except for [`XmlError`]
//! whose fields are read by the structured error handler. Both libraries are
//! linked from `build.rs`, after the generic error shim that depends on them.
#![allow(non_camel_case_types, dead_code)]

use std::ffi::{c_char, c_int, c_uchar, c_void};

#[repr(C)]
pub struct xmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct xmlOutputBuffer {
    _private: [u8; 0],
}

#[repr(C)]
pub struct xsltStylesheet {
    _private: [u8; 0],
}

/// Mirror of libxml2's `struct _xmlError`.
#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *mut c_char,
    pub level: c_int,
    pub file: *mut c_char,
    pub line: c_int,
    pub str1: *mut c_char,
    pub str2: *mut c_char,
    pub str3: *mut c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type xmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut XmlError)>;

/// Target of `src/xslt/generic_error.c`, which formats the printf-style generic
/// error callbacks of both libraries and passes each piece of text to `sink`.
#[repr(C)]
pub struct GenericErrorSink {
    pub sink: Option<unsafe extern "C" fn(data: *mut c_void, message: *const c_char)>,
    pub data: *mut c_void,
}

/// Forbid network access while loading documents.
pub const XML_PARSE_NONET: c_int = 1 << 11;

unsafe extern "C" {
    pub fn evtx_transform_set_generic_error_sink(target: *mut GenericErrorSink);
}

unsafe extern "C" {
    pub fn xmlInitParser();

    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut xmlDoc;

    pub fn xmlFreeDoc(doc: *mut xmlDoc);

    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: xmlStructuredErrorFunc);

    pub fn xmlAllocOutputBuffer(encoder: *mut c_void) -> *mut xmlOutputBuffer;

    pub fn xmlOutputBufferGetContent(out: *mut xmlOutputBuffer) -> *const c_uchar;

    pub fn xmlOutputBufferGetSize(out: *mut xmlOutputBuffer) -> usize;

    pub fn xmlOutputBufferClose(out: *mut xmlOutputBuffer) -> c_int;
}

unsafe extern "C" {
    pub fn xsltParseStylesheetFile(filename: *const c_uchar) -> *mut xsltStylesheet;

    pub fn xsltFreeStylesheet(style: *mut xsltStylesheet);

    pub fn xsltApplyStylesheet(
        style: *mut xsltStylesheet,
        doc: *mut xmlDoc,
        params: *const *const c_char,
    ) -> *mut xmlDoc;

    pub fn xsltSaveResultTo(
        buf: *mut xmlOutputBuffer,
        result: *mut xmlDoc,
        style: *mut xsltStylesheet,
    ) -> c_int;
}
