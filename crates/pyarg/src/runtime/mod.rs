use core::ffi::{c_char, c_int, c_void, CStr};

use crate::{
    error::{ArgError, ArgResult},
    object::PyObject,
    value::BuildCell,
};

mod config;
mod cpython;
mod libffi_helper;

pub use self::config::{RuntimeConfig, LIBRARY_ENV_VAR};
pub use self::cpython::CPython;
pub use self::libffi_helper::{ffi_status_assert, VariadicCif, FFI_STATUS_NAMES};

/**
    The native entry points argument marshaling is built on.

    Implemented by [`CPython`] for a real interpreter. Every method
    performs exactly one native call and does not retain any of the
    pointers it was given once it returns.

    # Safety

    Callers must hold whatever execution lock the runtime requires
    (the GIL for [`CPython`]) and pass live handles and pointers.
*/
pub trait Runtime {
    /**
        `PyArg_ParseTuple(args, format, cells...)`

        Returns the native status code, zero on failure.
    */
    unsafe fn parse_tuple(
        &self,
        args: *mut PyObject,
        format: &CStr,
        cells: &[*mut c_void],
    ) -> ArgResult<c_int>;

    /**
        `PyArg_ParseTupleAndKeywords(args, kwargs, format, keywords, cells...)`

        `keywords` is a null terminated array of names. `kwargs` may be null.
        Returns the native status code, zero on failure.
    */
    unsafe fn parse_tuple_and_keywords(
        &self,
        args: *mut PyObject,
        kwargs: *mut PyObject,
        format: &CStr,
        keywords: *const *const c_char,
        cells: &[*mut c_void],
    ) -> ArgResult<c_int>;

    /**
        `Py_BuildValue(format, values...)`

        Returns a new reference, or null on failure.
    */
    unsafe fn build_value(
        &self,
        format: &CStr,
        cells: &[BuildCell],
    ) -> ArgResult<*mut PyObject>;

    /**
        Takes the pending native error, leaving no error pending.

        Must be called right after a call that reported failure.
    */
    fn exception(&self) -> ArgError;
}
