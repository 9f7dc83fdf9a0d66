use core::ffi::{c_char, c_int, c_void, CStr};
use std::{mem, ptr};

use dlopen2::raw::Library;
use libffi::{low::CodePtr, middle::Type};
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use super::{config::RuntimeConfig, libffi_helper::VariadicCif, Runtime};
use crate::{
    error::{ArgError, ArgResult},
    object::PyObject,
    value::BuildCell,
};

type ErrOccurredFn = unsafe extern "C" fn() -> *mut PyObject;
type ErrFetchFn = unsafe extern "C" fn(*mut *mut PyObject, *mut *mut PyObject, *mut *mut PyObject);
type ErrClearFn = unsafe extern "C" fn();
type ObjectStrFn = unsafe extern "C" fn(*mut PyObject) -> *mut PyObject;
type GetAttrStringFn = unsafe extern "C" fn(*mut PyObject, *const c_char) -> *mut PyObject;
type AsUtf8Fn = unsafe extern "C" fn(*mut PyObject) -> *const c_char;
type DecRefFn = unsafe extern "C" fn(*mut PyObject);

const NO_EXCEPTION_MESSAGE: &str = "python call failed without setting an exception";

static GLOBAL: OnceCell<CPython> = OnceCell::new();

struct Api {
    // Variadic, called through libffi
    parse_tuple: CodePtr,
    parse_tuple_and_keywords: CodePtr,
    build_value: CodePtr,
    // Fixed arity, called directly
    err_occurred: ErrOccurredFn,
    err_fetch: ErrFetchFn,
    err_clear: ErrClearFn,
    object_str: ObjectStrFn,
    get_attr_string: GetAttrStringFn,
    as_utf8: AsUtf8Fn,
    dec_ref: DecRefFn,
}

unsafe fn find_symbol(library: &Library, name: &str) -> ArgResult<*const ()> {
    library
        .symbol::<*const ()>(name)
        .map_err(|err| ArgError::Library(format!("missing symbol '{name}' - {err}")))
}

impl Api {
    unsafe fn load(library: &Library) -> ArgResult<Self> {
        macro_rules! code {
            ($name:literal) => {
                CodePtr::from_ptr(find_symbol(library, $name)?.cast::<c_void>())
            };
        }
        macro_rules! function {
            ($name:literal as $ty:ty) => {
                mem::transmute::<*const (), $ty>(find_symbol(library, $name)?)
            };
        }

        Ok(Self {
            parse_tuple: code!("PyArg_ParseTuple"),
            parse_tuple_and_keywords: code!("PyArg_ParseTupleAndKeywords"),
            build_value: code!("Py_BuildValue"),
            err_occurred: function!("PyErr_Occurred" as ErrOccurredFn),
            err_fetch: function!("PyErr_Fetch" as ErrFetchFn),
            err_clear: function!("PyErr_Clear" as ErrClearFn),
            object_str: function!("PyObject_Str" as ObjectStrFn),
            get_attr_string: function!("PyObject_GetAttrString" as GetAttrStringFn),
            as_utf8: function!("PyUnicode_AsUTF8" as AsUtf8Fn),
            dec_ref: function!("Py_DecRef" as DecRefFn),
        })
    }
}

/**
    A python runtime whose C API is resolved at load time.

    Arguments to the variadic parsing and building functions
    are laid out per call with libffi.
*/
pub struct CPython {
    api: Api,
    // Keeps every resolved symbol mapped
    _library: Library,
}

// Only immutable function addresses are held, the library is never unloaded while shared
unsafe impl Send for CPython {}
unsafe impl Sync for CPython {}

impl CPython {
    /**
        Opens the configured python library and resolves the C API it needs.

        # Errors

        Errors with [`ArgError::Library`] if the library cannot be
        opened or if any of the required symbols is missing.
    */
    pub fn load(config: &RuntimeConfig) -> ArgResult<Self> {
        let library = match config.library() {
            Some(path) => {
                debug!(path = %path.display(), "opening python library");
                Library::open(path)
            }
            None => {
                debug!("resolving python symbols from the current process");
                Library::open_self()
            }
        }
        .map_err(|err| ArgError::Library(format!("{err}")))?;

        let api = unsafe { Api::load(&library)? };

        Ok(Self {
            api,
            _library: library,
        })
    }

    /**
        Returns the process wide runtime, loading it from
        [`RuntimeConfig::from_env`] on first use.

        # Errors

        Errors if loading fails. A failed load is retried on the next call.
    */
    pub fn global() -> ArgResult<&'static Self> {
        GLOBAL.get_or_try_init(|| Self::load(&RuntimeConfig::from_env()))
    }

    // Copies the text of a python str and releases the reference to it
    unsafe fn take_utf8(&self, object: *mut PyObject) -> Option<String> {
        if object.is_null() {
            return None;
        }
        let text = (self.api.as_utf8)(object);
        let result = if text.is_null() {
            (self.api.err_clear)();
            None
        } else {
            Some(CStr::from_ptr(text).to_string_lossy().into_owned())
        };
        (self.api.dec_ref)(object);
        result
    }

    unsafe fn render(&self, object: *mut PyObject) -> Option<String> {
        if object.is_null() {
            return None;
        }
        let text = (self.api.object_str)(object);
        if text.is_null() {
            (self.api.err_clear)();
            return None;
        }
        self.take_utf8(text)
    }

    unsafe fn class_name(&self, class: *mut PyObject) -> Option<String> {
        if class.is_null() {
            return None;
        }
        let name = (self.api.get_attr_string)(class, c"__name__".as_ptr());
        if name.is_null() {
            (self.api.err_clear)();
            return None;
        }
        self.take_utf8(name)
    }
}

impl Runtime for CPython {
    unsafe fn parse_tuple(
        &self,
        args: *mut PyObject,
        format: &CStr,
        cells: &[*mut c_void],
    ) -> ArgResult<c_int> {
        let mut cif = VariadicCif::new(
            vec![Type::pointer(), Type::pointer()],
            cells.iter().map(|_| Type::pointer()),
            Type::c_int(),
        )?;

        let mut args = args;
        let mut format = format.as_ptr();
        let mut cells = cells.to_vec();

        let mut values = Vec::with_capacity(cif.arg_count());
        values.push(ptr::from_mut(&mut args).cast::<c_void>());
        values.push(ptr::from_mut(&mut format).cast::<c_void>());
        values.extend(cells.iter_mut().map(|cell| ptr::from_mut(cell).cast::<c_void>()));

        trace!(cells = cells.len(), "calling PyArg_ParseTuple");
        Ok(cif.call_int(self.api.parse_tuple, &mut values))
    }

    unsafe fn parse_tuple_and_keywords(
        &self,
        args: *mut PyObject,
        kwargs: *mut PyObject,
        format: &CStr,
        keywords: *const *const c_char,
        cells: &[*mut c_void],
    ) -> ArgResult<c_int> {
        let mut cif = VariadicCif::new(
            vec![
                Type::pointer(),
                Type::pointer(),
                Type::pointer(),
                Type::pointer(),
            ],
            cells.iter().map(|_| Type::pointer()),
            Type::c_int(),
        )?;

        let mut args = args;
        let mut kwargs = kwargs;
        let mut format = format.as_ptr();
        let mut keywords = keywords;
        let mut cells = cells.to_vec();

        let mut values = Vec::with_capacity(cif.arg_count());
        values.push(ptr::from_mut(&mut args).cast::<c_void>());
        values.push(ptr::from_mut(&mut kwargs).cast::<c_void>());
        values.push(ptr::from_mut(&mut format).cast::<c_void>());
        values.push(ptr::from_mut(&mut keywords).cast::<c_void>());
        values.extend(cells.iter_mut().map(|cell| ptr::from_mut(cell).cast::<c_void>()));

        trace!(cells = cells.len(), "calling PyArg_ParseTupleAndKeywords");
        Ok(cif.call_int(self.api.parse_tuple_and_keywords, &mut values))
    }

    unsafe fn build_value(
        &self,
        format: &CStr,
        cells: &[BuildCell],
    ) -> ArgResult<*mut PyObject> {
        let mut cif = VariadicCif::new(
            vec![Type::pointer()],
            cells.iter().map(|cell| cell.promoted().middle_type()),
            Type::pointer(),
        )?;

        let mut format = format.as_ptr();

        // Build cells already point at their staged values
        let mut values = Vec::with_capacity(cif.arg_count());
        values.push(ptr::from_mut(&mut format).cast::<c_void>());
        values.extend(cells.iter().map(BuildCell::as_ptr));

        trace!(cells = cells.len(), "calling Py_BuildValue");
        Ok(cif.call_pointer(self.api.build_value, &mut values))
    }

    fn exception(&self) -> ArgError {
        unsafe {
            if (self.api.err_occurred)().is_null() {
                return ArgError::foreign(None, NO_EXCEPTION_MESSAGE);
            }

            let mut class: *mut PyObject = ptr::null_mut();
            let mut value: *mut PyObject = ptr::null_mut();
            let mut traceback: *mut PyObject = ptr::null_mut();
            (self.api.err_fetch)(&mut class, &mut value, &mut traceback);

            let category = self.class_name(class);
            let message = self.render(value);

            // Py_DecRef accepts null
            (self.api.dec_ref)(class);
            (self.api.dec_ref)(value);
            (self.api.dec_ref)(traceback);

            let message = message
                .filter(|message| !message.is_empty())
                .or_else(|| category.clone())
                .unwrap_or_else(|| NO_EXCEPTION_MESSAGE.to_string());

            ArgError::foreign(category, message)
        }
    }
}
