use std::ptr;

/**
    Opaque CPython object, only ever handled behind a pointer.
*/
#[repr(C)]
pub struct PyObject {
    _private: [u8; 0],
}

/**
    A raw handle to an object owned by the python runtime.

    Reference counting is left to whoever owns the handle: handles
    written into slots by the parser are borrowed from the parsed
    arguments, handles returned by [`build_value`](crate::build_value)
    carry a new reference that now belongs to the caller.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Object(*mut PyObject);

impl Object {
    #[must_use]
    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    #[must_use]
    pub const fn from_raw(raw: *mut PyObject) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut PyObject {
        self.0
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::null()
    }
}

// Positional argument container (a python tuple)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuple(Object);

impl Tuple {
    #[must_use]
    pub const fn from_raw(raw: *mut PyObject) -> Self {
        Self(Object::from_raw(raw))
    }

    #[must_use]
    pub const fn as_object(self) -> Object {
        self.0
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut PyObject {
        self.0.as_ptr()
    }
}

// Keyword argument container (a python dict)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dict(Object);

impl Dict {
    #[must_use]
    pub const fn from_raw(raw: *mut PyObject) -> Self {
        Self(Object::from_raw(raw))
    }

    #[must_use]
    pub const fn as_object(self) -> Object {
        self.0
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut PyObject {
        self.0.as_ptr()
    }
}
