use std::any::{type_name, Any};

use crate::{
    error::{ArgError, ArgResult},
    kind::Kind,
    object::Object,
};

/**
    A destination the parser writes one value into.

    The variant is picked from the static type of the destination, see
    [`Slot::of`]. Destinations outside of the supported set become
    [`Slot::Unsupported`] and make packing fail with the type name.
*/
#[derive(Debug)]
pub enum Slot<'a> {
    Str(&'a mut String),
    Object(&'a mut Object),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Unsupported(&'static str),
}

// Each branch only borrows `dest` once it is known to be taken,
// otherwise the conditional return would keep it borrowed for the rest
macro_rules! slot_from_any {
    ($dest:ident, $name:ident, [$($variant:ident => $ty:ty),* $(,)?]) => {
        $(
            if $dest.is::<$ty>() {
                return $dest
                    .downcast_mut::<$ty>()
                    .map_or(Slot::Unsupported($name), Slot::$variant);
            }
        )*
    };
}

impl<'a> Slot<'a> {
    /**
        Creates a slot for the given destination, based on its type.
    */
    pub fn of<T: Any>(dest: &'a mut T) -> Self {
        let name = type_name::<T>();
        let dest: &'a mut dyn Any = dest;
        slot_from_any!(dest, name, [
            Str => String,
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
        Slot::Unsupported(name)
    }

    /**
        Returns the kind of value this slot receives.

        # Errors

        Errors with [`ArgError::UnsupportedType`] for unsupported slots.
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
    Builds an array of [`Slot`]s from mutable references.

    ```ignore
    let mut name = String::new();
    let mut count = 0i32;
    pyarg::parse_tuple(args, "si", &mut pyarg::slots![&mut name, &mut count])?;
    ```
*/
#[macro_export]
macro_rules! slots {
    ($($dest:expr),* $(,)?) => {
        [$($crate::Slot::of($dest)),*]
    };
}
