//! Direct libxml2 FFI wrapper for XSD schema validation.
//!
//! Grounded on the teacher's `libxml2.rs`: same opaque structs, same
//! `Once`-guarded global init, same Arc+Drop RAII schema pointer, same
//! structured-error callback. Extended here with `xmlReadMemory` and
//! `xmlSchemaValidateDoc` bindings so validation can run against an
//! in-memory byte buffer rather than only a file path, which is what the
//! engine needs: files inside a dataset archive are never unpacked to disk.

use std::ffi::CString;
use std::marker::PhantomData;
use std::sync::{Arc, Once};

use libc::{c_char, c_int};

use super::{SchemaValidator, StructuralError};

static LIBXML2_INIT: Once = Once::new();

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();
    fn xmlInitGlobals();

    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);

    fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut libc::c_void,
    );
    fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;

    /// Parses an in-memory XML buffer into a document tree, without ever
    /// touching the filesystem.
    fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    fn xmlFreeDoc(doc: *mut XmlDoc);
}

#[repr(C)]
struct xmlError {
    domain: c_int,
    code: c_int,
    message: *const c_char,
    level: c_int,
    file: *const c_char,
    line: c_int,
    str1: *const c_char,
    str2: *const c_char,
    str3: *const c_char,
    int1: c_int,
    int2: c_int,
    ctxt: *mut libc::c_void,
    node: *mut libc::c_void,
}

type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut libc::c_void, error: *mut xmlError)>;

unsafe extern "C" fn structured_error_callback(user_data: *mut libc::c_void, error: *mut xmlError) {
    let errors = unsafe { &mut *(user_data as *mut Vec<StructuralError>) };
    if error.is_null() {
        return;
    }
    let line = unsafe { (*error).line };
    let msg_ptr = unsafe { (*error).message };
    let message = if msg_ptr.is_null() {
        "schema validation error".to_string()
    } else {
        let c_str = unsafe { std::ffi::CStr::from_ptr(msg_ptr) };
        c_str.to_str().unwrap_or("schema validation error").trim().to_string()
    };
    let mut structural = StructuralError::new(message);
    if line > 0 {
        structural = structural.with_line(line as u32);
    }
    errors.push(structural);
}

#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    /// `ptr` must be a valid `xmlSchema*` returned by `xmlSchemaParse`, owned
    /// exclusively by the returned wrapper.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        Some(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Parses and owns a compiled NetEX XSD, producing [`LibXml2SchemaValidator`]
/// instances that validate raw document bytes against it.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema: XmlSchemaPtr,
}

impl CompiledSchema {
    pub fn parse(schema_bytes: &[u8]) -> Result<Self, String> {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(
                schema_bytes.as_ptr() as *const c_char,
                schema_bytes.len() as c_int,
            );
            if parser_ctxt.is_null() {
                return Err("failed to allocate schema parser context".to_string());
            }
            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            let schema = XmlSchemaPtr::from_raw(schema_ptr)
                .ok_or_else(|| "schema failed to parse".to_string())?;
            Ok(CompiledSchema { schema })
        }
    }
}

/// The default [`SchemaValidator`]: a direct libxml2 FFI wrapper extended to
/// validate an in-memory byte buffer (not only a file path).
#[derive(Debug, Clone)]
pub struct LibXml2SchemaValidator {
    schema: CompiledSchema,
}

impl LibXml2SchemaValidator {
    pub fn new(schema: CompiledSchema) -> Self {
        Self { schema }
    }

    /// Validates `bytes` as a standalone XML document against the compiled
    /// schema, parsing it in memory via `xmlReadMemory`. `file_name` is used
    /// only for the synthetic base URI libxml2 attaches to parse errors.
    fn validate_memory(&self, file_name: &str, bytes: &[u8]) -> Vec<StructuralError> {
        let url = CString::new(file_name).unwrap_or_else(|_| CString::new("<memory>").unwrap());

        let doc = unsafe {
            xmlReadMemory(
                bytes.as_ptr() as *const c_char,
                bytes.len() as c_int,
                url.as_ptr(),
                std::ptr::null(),
                0,
            )
        };
        if doc.is_null() {
            return vec![StructuralError::new(format!(
                "'{file_name}' is not well-formed XML"
            ))];
        }

        let result = unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(self.schema.schema.as_ptr());
            if valid_ctxt.is_null() {
                xmlFreeDoc(doc);
                return vec![StructuralError::new(
                    "failed to allocate schema validation context",
                )];
            }

            let mut errors: Vec<StructuralError> = Vec::new();
            let errors_ptr = &mut errors as *mut Vec<StructuralError> as *mut libc::c_void;
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                errors_ptr,
            );

            let code = xmlSchemaValidateDoc(valid_ctxt, doc);
            xmlSchemaFreeValidCtxt(valid_ctxt);

            if code == 0 {
                Vec::new()
            } else if !errors.is_empty() {
                errors
            } else {
                vec![StructuralError::new(format!(
                    "schema validation failed with code {code}"
                ))]
            }
        };

        unsafe {
            xmlFreeDoc(doc);
        }
        result
    }
}

impl SchemaValidator for LibXml2SchemaValidator {
    fn validate(&self, file_name: &str, bytes: &[u8]) -> Vec<StructuralError> {
        self.validate_memory(file_name, bytes)
    }
}
