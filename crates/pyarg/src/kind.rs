use core::ffi::{c_char, c_double, c_int};
use std::fmt;

use libffi::middle::Type;

use crate::object::PyObject;

/**
    The closed set of primitive kinds that can cross the python boundary.

    Each kind maps to exactly one C representation. Anything outside of
    this set is rejected before any native call is made.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Str,
    Object,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl Kind {
    pub fn all() -> &'static [Self] {
        &[
            Self::Str,
            Self::Object,
            Self::I8,
            Self::I16,
            Self::I32,
            Self::I64,
            Self::Isize,
            Self::U8,
            Self::U16,
            Self::U32,
            Self::U64,
            Self::Usize,
            Self::F32,
            Self::F64,
        ]
    }

    // Name of the C type this kind is staged as
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Str => "const char *",
            Self::Object => "PyObject *",
            Self::I8 => "int8_t",
            Self::I16 => "int16_t",
            Self::I32 => "int32_t",
            Self::I64 => "int64_t",
            Self::Isize => "Py_ssize_t",
            Self::U8 => "uint8_t",
            Self::U16 => "uint16_t",
            Self::U32 => "uint32_t",
            Self::U64 => "uint64_t",
            Self::Usize => "size_t",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /**
        Size in bytes of the value the native engine writes for this kind.
    */
    pub fn size(self) -> usize {
        match self {
            Self::Str => size_of::<*const c_char>(),
            Self::Object => size_of::<*mut PyObject>(),
            Self::I8 => size_of::<i8>(),
            Self::I16 => size_of::<i16>(),
            Self::I32 => size_of::<i32>(),
            Self::I64 => size_of::<i64>(),
            Self::Isize => size_of::<libc::ssize_t>(),
            Self::U8 => size_of::<u8>(),
            Self::U16 => size_of::<u16>(),
            Self::U32 => size_of::<u32>(),
            Self::U64 => size_of::<u64>(),
            Self::Usize => size_of::<libc::size_t>(),
            Self::F32 => size_of::<f32>(),
            Self::F64 => size_of::<f64>(),
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::Isize | Self::F32 | Self::F64
        )
    }

    /**
        The libffi type of a value of this kind, as stored in a cell.
    */
    pub fn middle_type(self) -> Type {
        match self {
            Self::Str | Self::Object => Type::pointer(),
            Self::I8 => Type::i8(),
            Self::I16 => Type::i16(),
            Self::I32 => Type::i32(),
            Self::I64 => Type::i64(),
            Self::Isize => Type::isize(),
            Self::U8 => Type::u8(),
            Self::U16 => Type::u16(),
            Self::U32 => Type::u32(),
            Self::U64 => Type::u64(),
            Self::Usize => Type::usize(),
            Self::F32 => Type::f32(),
            Self::F64 => Type::f64(),
        }
    }

    /**
        The kind a value of this kind is passed as through `...`.

        C applies the default argument promotions to variadic arguments,
        so anything narrower than `int` travels as `int` and `float`
        travels as `double`. Build cells are staged in the promoted kind.
    */
    pub fn promoted(self) -> Promoted {
        match self {
            Self::I8 | Self::I16 | Self::U8 | Self::U16 => Promoted::Int,
            Self::F32 => Promoted::Double,
            kind => Promoted::Same(kind),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/**
    Representation of a variadic argument after default promotions.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promoted {
    Int,
    Double,
    Same(Kind),
}

impl Promoted {
    pub fn middle_type(self) -> Type {
        match self {
            Self::Int => Type::c_int(),
            Self::Double => Type::f64(),
            Self::Same(kind) => kind.middle_type(),
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Int => size_of::<c_int>(),
            Self::Double => size_of::<c_double>(),
            Self::Same(kind) => kind.size(),
        }
    }
}
