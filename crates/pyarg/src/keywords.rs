use core::ffi::c_char;
use std::{
    ffi::{CStr, CString},
    ptr,
};

use crate::error::{ArgError, ArgResult};

/**
    A null terminated array of keyword names, as expected by
    `PyArg_ParseTupleAndKeywords`.

    Every name is staged as its own C string and released together
    with the array, on whichever path the surrounding call leaves by.
*/
#[derive(Debug)]
pub struct KeywordNames {
    names: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl KeywordNames {
    /**
        Stages the given names.

        # Errors

        Errors with [`ArgError::InvalidArgument`] if a name contains a nul byte.
    */
    pub fn new<S: AsRef<str>>(names: &[S]) -> ArgResult<Self> {
        let names = names
            .iter()
            .map(|name| {
                CString::new(name.as_ref()).map_err(|_| {
                    ArgError::invalid(format!(
                        "keyword name '{}' contains a nul byte",
                        name.as_ref().escape_debug()
                    ))
                })
            })
            .collect::<ArgResult<Vec<_>>>()?;

        let pointers = names
            .iter()
            .map(|name| name.as_ptr())
            .chain([ptr::null()])
            .collect();

        Ok(Self { names, pointers })
    }

    // Number of names, not counting the terminator
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> {
        self.names.iter().map(CString::as_c_str)
    }

    /**
        Pointer to the first entry of the array, never null.

        The array always holds at least the terminating null entry.
    */
    #[inline]
    pub fn as_ptr(&self) -> *const *const c_char {
        self.pointers.as_ptr()
    }
}
