//! XSLT 1.0 transforms backed by libxslt.
//!
//! [`Stylesheet`] and [`XmlDocument`] own their libxml2 allocations and free them on drop.
//! Neither type is `Send`; a stylesheet is compiled and used on a single thread.

mod ffi;

use crate::err::StylesheetError;

use log::{debug, warn};
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

static LIBXML_INIT: Once = Once::new();

fn ensure_libxml_initialized() {
    // SAFETY: `xmlInitParser` has no preconditions and is only called once.
    LIBXML_INIT.call_once(|| unsafe { ffi::xmlInitParser() });
}

/// Error messages reported by libxml2 / libxslt during a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDiagnostics {
    messages: Vec<String>,
}

impl XmlDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Not every failure goes through the structured error channel, make sure
    /// there is at least something to report.
    fn or_message(mut self, message: &str) -> Self {
        if self.messages.is_empty() {
            self.messages.push(message.to_owned());
        }
        self
    }
}

impl fmt::Display for XmlDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

/// Messages collected while an [`ErrorCapture`] is installed.
#[derive(Default)]
struct Collected {
    messages: Vec<String>,
    /// Generic error output arrives in pieces; a message ends at a line break.
    pending: String,
}

impl Collected {
    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() {
            self.messages.push(line.to_owned());
        }
    }

    fn push_fragment(&mut self, text: &str) {
        self.pending.push_str(text);
        while let Some(end) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=end).collect();
            self.push_line(&line);
        }
    }

    fn into_messages(mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.pending);
        self.push_line(&rest);
        self.messages
    }
}

/// libxslt keeps its generic error handler in a process-wide global, so only one
/// capture may be installed at a time.
static CAPTURE_LOCK: Mutex<()> = Mutex::new(());

/// Routes the errors libxml2 and libxslt raise on this thread into [`Collected`]
/// while alive: structured libxml2 errors directly, and the printf-style generic
/// errors (stylesheet compilation, transform errors, `xsl:message`) through the
/// C shim.
///
/// Both boxes stay at a fixed address while the libraries hold pointers to them.
struct ErrorCapture {
    collected: Box<Collected>,
    _generic: Box<ffi::GenericErrorSink>,
    _lock: MutexGuard<'static, ()>,
}

impl ErrorCapture {
    fn install() -> Self {
        let lock = CAPTURE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let mut collected = Box::new(Collected::default());
        let data = &mut *collected as *mut Collected as *mut c_void;
        let mut generic = Box::new(ffi::GenericErrorSink {
            sink: Some(collect_generic_error),
            data,
        });

        // SAFETY: `data` and `generic` point into boxes owned by the returned value,
        // and both handlers are removed in `Drop` before the boxes are freed.
        unsafe {
            ffi::xmlSetStructuredErrorFunc(data, Some(collect_error));
            ffi::evtx_transform_set_generic_error_sink(&mut *generic);
        }

        ErrorCapture {
            collected,
            _generic: generic,
            _lock: lock,
        }
    }

    fn finish(mut self) -> XmlDiagnostics {
        Self::uninstall();
        XmlDiagnostics {
            messages: std::mem::take(&mut *self.collected).into_messages(),
        }
    }

    fn uninstall() {
        // SAFETY: resetting to the default handlers is always valid.
        unsafe {
            ffi::xmlSetStructuredErrorFunc(ptr::null_mut(), None);
            ffi::evtx_transform_set_generic_error_sink(ptr::null_mut());
        }
    }
}

impl Drop for ErrorCapture {
    fn drop(&mut self) {
        Self::uninstall();
    }
}

unsafe extern "C" fn collect_error(user_data: *mut c_void, error: *mut ffi::XmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }

    // SAFETY: `user_data` is the `Collected` registered by `ErrorCapture::install`,
    // and libxml2 passes a valid error record for the duration of the callback.
    let (collected, error) = unsafe { (&mut *(user_data as *mut Collected), &*error) };

    if error.message.is_null() {
        return;
    }

    // SAFETY: libxml2 error messages are NUL-terminated C strings.
    let text = unsafe { CStr::from_ptr(error.message) }.to_string_lossy();

    if error.line > 0 {
        collected.push_line(&format!("line {}: {}", error.line, text.trim_end()));
    } else {
        collected.push_line(&text);
    }
}

unsafe extern "C" fn collect_generic_error(data: *mut c_void, message: *const c_char) {
    if data.is_null() || message.is_null() {
        return;
    }

    // SAFETY: `data` is the `Collected` registered by `ErrorCapture::install`, and the
    // shim passes a NUL-terminated string it owns for the duration of the call.
    let (collected, text) = unsafe {
        (
            &mut *(data as *mut Collected),
            CStr::from_ptr(message).to_string_lossy(),
        )
    };

    collected.push_fragment(&text);
}

/// A parsed XML document.
pub struct XmlDocument {
    ptr: NonNull<ffi::xmlDoc>,
}

impl XmlDocument {
    /// Parses a complete XML document held in memory. Network access is disabled.
    pub fn parse(xml: &str) -> Result<XmlDocument, XmlDiagnostics> {
        ensure_libxml_initialized();

        let size = c_int::try_from(xml.len()).map_err(|_| XmlDiagnostics {
            messages: vec![format!("document of {} bytes is too large", xml.len())],
        })?;

        let capture = ErrorCapture::install();
        // SAFETY: `xml` is valid for `size` bytes; libxml2 copies what it needs.
        let doc = unsafe {
            ffi::xmlReadMemory(
                xml.as_ptr().cast(),
                size,
                ptr::null(),
                ptr::null(),
                ffi::XML_PARSE_NONET,
            )
        };
        let diagnostics = capture.finish();

        match NonNull::new(doc) {
            Some(ptr) => Ok(XmlDocument { ptr }),
            None => Err(diagnostics.or_message("document is not well-formed")),
        }
    }
}

impl Drop for XmlDocument {
    fn drop(&mut self) {
        // SAFETY: we own the document and nothing else references it.
        unsafe { ffi::xmlFreeDoc(self.ptr.as_ptr()) };
    }
}

/// libxml2 in-memory output buffer.
struct OutputBuffer {
    ptr: NonNull<ffi::xmlOutputBuffer>,
}

impl OutputBuffer {
    fn new() -> Option<Self> {
        // SAFETY: a null encoder selects UTF-8 output.
        NonNull::new(unsafe { ffi::xmlAllocOutputBuffer(ptr::null_mut()) })
            .map(|ptr| OutputBuffer { ptr })
    }

    fn content(&self) -> &[u8] {
        // SAFETY: the content pointer stays valid for `size` bytes until the buffer
        // is written to or closed, neither of which can happen while `self` is borrowed.
        unsafe {
            let content = ffi::xmlOutputBufferGetContent(self.ptr.as_ptr());
            let size = ffi::xmlOutputBufferGetSize(self.ptr.as_ptr());
            if content.is_null() || size == 0 {
                return &[];
            }
            std::slice::from_raw_parts(content, size)
        }
    }
}

impl Drop for OutputBuffer {
    fn drop(&mut self) {
        // SAFETY: the buffer has no close callback, closing only frees it.
        unsafe { ffi::xmlOutputBufferClose(self.ptr.as_ptr()) };
    }
}

/// A compiled XSLT stylesheet.
pub struct Stylesheet {
    ptr: NonNull<ffi::xsltStylesheet>,
    path: PathBuf,
}

impl Stylesheet {
    /// Loads and compiles the stylesheet at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Stylesheet, StylesheetError> {
        ensure_libxml_initialized();

        let path = path.as_ref();
        let c_path = path
            .to_str()
            .and_then(|p| CString::new(p).ok())
            .ok_or_else(|| StylesheetError::InvalidPath {
                path: path.to_path_buf(),
            })?;

        let capture = ErrorCapture::install();
        // SAFETY: `c_path` is NUL-terminated and outlives the call.
        let style = unsafe { ffi::xsltParseStylesheetFile(c_path.as_ptr().cast()) };
        let diagnostics = capture.finish();

        match NonNull::new(style) {
            Some(ptr) => {
                if !diagnostics.is_empty() {
                    warn!(
                        "stylesheet `{}` compiled with warnings: {}",
                        path.display(),
                        diagnostics
                    );
                }
                debug!("compiled stylesheet `{}`", path.display());
                Ok(Stylesheet {
                    ptr,
                    path: path.to_path_buf(),
                })
            }
            None => Err(StylesheetError::Compile {
                path: path.to_path_buf(),
                diagnostics: diagnostics.or_message("libxslt rejected the stylesheet"),
            }),
        }
    }

    /// Applies the stylesheet to `document`, appending the serialized result to `out`.
    ///
    /// The result is written as a fragment: an XML declaration, if the output method
    /// produces one, is dropped along with trailing line breaks. `out` is not cleared.
    pub fn transform_into(
        &self,
        document: &XmlDocument,
        out: &mut String,
    ) -> Result<(), XmlDiagnostics> {
        let capture = ErrorCapture::install();

        // SAFETY: the stylesheet and the document are both alive for the call;
        // a null parameter list is accepted by libxslt.
        let result = unsafe {
            ffi::xsltApplyStylesheet(self.ptr.as_ptr(), document.ptr.as_ptr(), ptr::null())
        };
        let Some(result) = NonNull::new(result) else {
            return Err(capture
                .finish()
                .or_message("stylesheet did not produce a result document"));
        };
        let result = XmlDocument { ptr: result };

        let Some(buffer) = OutputBuffer::new() else {
            return Err(capture
                .finish()
                .or_message("failed to allocate an output buffer"));
        };

        // SAFETY: all three pointers are owned by live wrappers.
        let written = unsafe {
            ffi::xsltSaveResultTo(buffer.ptr.as_ptr(), result.ptr.as_ptr(), self.ptr.as_ptr())
        };
        let diagnostics = capture.finish();

        if written < 0 {
            return Err(diagnostics.or_message("failed to serialize the transform result"));
        }

        let start = out.len();
        out.push_str(&String::from_utf8_lossy(buffer.content()));
        trim_fragment(out, start);

        Ok(())
    }
}

impl Drop for Stylesheet {
    fn drop(&mut self) {
        // SAFETY: we own the stylesheet; this also frees its source document.
        unsafe { ffi::xsltFreeStylesheet(self.ptr.as_ptr()) };
    }
}

impl fmt::Debug for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stylesheet").field("path", &self.path).finish()
    }
}

/// Turns serializer output starting at `start` into a single-line fragment.
fn trim_fragment(buffer: &mut String, start: usize) {
    if buffer[start..].starts_with("<?xml ") {
        if let Some(end) = buffer[start..].find("?>") {
            let declaration_end = start + end + 2;
            let body = buffer[declaration_end..].trim_start_matches(['\r', '\n']);
            let body_start = buffer.len() - body.len();
            buffer.drain(start..body_start);
        }
    }

    let trimmed = buffer.trim_end_matches(['\r', '\n']).len().max(start);
    buffer.truncate(trimmed);
}
