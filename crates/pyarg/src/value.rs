use core::ffi::c_void;
use std::{
    any::{type_name, Any},
    ffi::{CStr, CString},
    ptr,
};

use num::cast::AsPrimitive;

use crate::{
    cell::CellValue,
    error::{ArgError, ArgResult},
    kind::{Kind, Promoted},
    object::Object,
};

/**
    An immediate value handed to the value builder.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Str(&'a str),
    Object(Object),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Unsupported(&'static str),
}

macro_rules! value_from_any {
    ($value:ident, [$($variant:ident => $ty:ty),* $(,)?]) => {
        $(
            if let Some(v) = $value.downcast_ref::<$ty>() {
                return Value::$variant(*v);
            }
        )*
    };
}

macro_rules! impl_from_primitive {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive!(
    Object => Object,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    Isize => isize,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    Usize => usize,
    F32 => f32,
    F64 => f64,
);

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(value.as_str())
    }
}

impl<'a> Value<'a> {
    /**
        Creates a value from a reference to any type, based on its type.

        Types outside of the supported set become [`Value::Unsupported`].
    */
    pub fn of<T: Any>(value: &'a T) -> Self {
        let any: &'a dyn Any = value;
        if let Some(s) = any.downcast_ref::<String>() {
            return Value::Str(s.as_str());
        }
        if let Some(s) = any.downcast_ref::<&'static str>() {
            return Value::Str(*s);
        }
        value_from_any!(any, [
            Object => Object,
            I8 => i8,
            I16 => i16,
            I32 => i32,
            I64 => i64,
            Isize => isize,
            U8 => u8,
            U16 => u16,
            U32 => u32,
            U64 => u64,
            Usize => usize,
            F32 => f32,
            F64 => f64,
        ]);
        Value::Unsupported(type_name::<T>())
    }

    /**
        Returns the kind of this value.

        # Errors

        Errors with [`ArgError::UnsupportedType`] for unsupported values.
    */
    pub fn kind(&self) -> ArgResult<Kind> {
        Ok(match self {
            Self::Str(_) => Kind::Str,
            Self::Object(_) => Kind::Object,
            Self::I8(_) => Kind::I8,
            Self::I16(_) => Kind::I16,
            Self::I32(_) => Kind::I32,
            Self::I64(_) => Kind::I64,
            Self::Isize(_) => Kind::Isize,
            Self::U8(_) => Kind::U8,
            Self::U16(_) => Kind::U16,
            Self::U32(_) => Kind::U32,
            Self::U64(_) => Kind::U64,
            Self::Usize(_) => Kind::Usize,
            Self::F32(_) => Kind::F32,
            Self::F64(_) => Kind::F64,
            Self::Unsupported(name) => return Err(ArgError::UnsupportedType(*name)),
        })
    }
}

/**
    Builds an array of [`Value`]s, resolving each expression by its type.

    ```ignore
    let object = pyarg::build_value("(si)", &pyarg::values!["answer", 42i32])?;
    ```
*/
#[macro_export]
macro_rules! values {
    ($($value:expr),* $(,)?) => {
        [$($crate::Value::of(&$value)),*]
    };
}

/**
    A staged variadic argument for the value builder: the libffi
    type it is passed as, plus a pointer to the staged value.
*/
#[derive(Debug, Clone, Copy)]
pub struct BuildCell {
    kind: Kind,
    value: *mut c_void,
}

impl BuildCell {
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn promoted(&self) -> Promoted {
        self.kind.promoted()
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut c_void {
        self.value
    }

    /**
        Reads the staged value as its promoted C type.
    */
    pub unsafe fn read<T: Copy>(&self) -> T {
        self.value.cast::<T>().read()
    }
}

/**
    Host owned copies of every value passed to a single build call.

    Staged strings and primitives are released when this drops,
    which must only happen after the native call has returned.
*/
#[derive(Debug)]
pub struct BuildCells {
    kinds: Box<[Kind]>,
    values: Box<[CellValue]>,
    strings: Vec<CString>,
}

impl BuildCells {
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // Text staged for string values, in value order
    pub fn strings(&self) -> impl Iterator<Item = &CStr> {
        self.strings.iter().map(CString::as_c_str)
    }

    /**
        Returns one build cell per staged value, in value order.
    */
    pub fn cells(&mut self) -> Vec<BuildCell> {
        self.kinds
            .iter()
            .zip(self.values.iter_mut())
            .map(|(kind, value)| BuildCell {
                kind: *kind,
                value: ptr::from_mut(value).cast(),
            })
            .collect()
    }
}

/**
    Stages a copy of every value, after checking that all of them are supported.

    # Errors

    Errors with [`ArgError::UnsupportedType`] if any value is unsupported,
    before anything is staged, or with [`ArgError::InvalidArgument`] if a
    string contains an interior nul byte.
*/
pub fn stage_values(values: &[Value<'_>]) -> ArgResult<BuildCells> {
    let kinds = values
        .iter()
        .map(Value::kind)
        .collect::<ArgResult<Box<[Kind]>>>()?;

    let mut strings = Vec::new();
    let mut staged = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let mut cell = CellValue::zeroed();
        match *value {
            Value::Str(text) => {
                let text = CString::new(text).map_err(|_| {
                    ArgError::invalid(format!("string value {index} contains a nul byte"))
                })?;
                // The CString heap buffer does not move when the vec grows
                cell.ptr = text.as_ptr().cast_mut().cast::<c_void>();
                strings.push(text);
            }
            Value::Object(object) => cell.ptr = object.as_ptr().cast(),
            Value::I8(v) => cell.c_int = v.as_(),
            Value::I16(v) => cell.c_int = v.as_(),
            Value::U8(v) => cell.c_int = v.as_(),
            Value::U16(v) => cell.c_int = v.as_(),
            Value::I32(v) => cell.i32 = v,
            Value::I64(v) => cell.i64 = v,
            Value::Isize(v) => cell.isize = v,
            Value::U32(v) => cell.u32 = v,
            Value::U64(v) => cell.u64 = v,
            Value::Usize(v) => cell.usize = v,
            Value::F32(v) => cell.f64 = f64::from(v),
            Value::F64(v) => cell.f64 = v,
            Value::Unsupported(name) => return Err(ArgError::UnsupportedType(name)),
        }
        staged.push(cell);
    }

    Ok(BuildCells {
        kinds,
        values: staged.into_boxed_slice(),
        strings,
    })
}
