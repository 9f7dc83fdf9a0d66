use core::ffi::{c_char, c_int, c_void, CStr};
use std::{fmt, mem, ptr};

use crate::{
    error::{ArgError, ArgResult},
    kind::Kind,
    object::{Object, PyObject},
    slot::Slot,
};

/**
    Untyped storage for one value crossing the python boundary.

    Every field starts at offset zero, so a pointer to the union is a
    valid destination for any of the supported C types.
*/
#[repr(C)]
#[derive(Clone, Copy)]
pub union CellValue {
    pub ptr: *mut c_void,
    pub c_int: c_int,
    pub i8: i8,
    pub i16: i16,
    pub i32: i32,
    pub i64: i64,
    pub isize: isize,
    pub u8: u8,
    pub u16: u16,
    pub u32: u32,
    pub u64: u64,
    pub usize: usize,
    pub f32: f32,
    pub f64: f64,
}

impl CellValue {
    pub fn zeroed() -> Self {
        // All fields are plain data, all zero bytes is valid for each of them
        unsafe { mem::zeroed() }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellValue({:#018x})", unsafe { self.u64 })
    }
}

/**
    A zero initialized, kind tagged cell.
*/
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    kind: Kind,
    value: CellValue,
}

impl Cell {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            value: CellValue::zeroed(),
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.kind.size()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        ptr::from_mut(&mut self.value).cast()
    }

    // Copy text out of the cell, the engine owns the buffer it points at
    fn read_string(&self) -> String {
        let text = unsafe { self.value.ptr }.cast::<c_char>().cast_const();
        if text.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(text) }
                .to_string_lossy()
                .into_owned()
        }
    }

    fn read_object(&self) -> Object {
        Object::from_raw(unsafe { self.value.ptr }.cast::<PyObject>())
    }

    /**
        Writes the value held by this cell into the given slot.

        # Errors

        Errors if the slot is unsupported, or if the slot does
        not receive values of the same kind as this cell holds.
    */
    pub fn write_into(&self, slot: &mut Slot<'_>) -> ArgResult<()> {
        let kind = slot.kind()?;
        if kind != self.kind {
            return Err(ArgError::invalid(format!(
                "cell holds {}, slot expects {}",
                self.kind, kind
            )));
        }

        let value = &self.value;
        unsafe {
            match slot {
                Slot::Str(dest) => **dest = self.read_string(),
                Slot::Object(dest) => **dest = self.read_object(),
                Slot::I8(dest) => **dest = value.i8,
                Slot::I16(dest) => **dest = value.i16,
                Slot::I32(dest) => **dest = value.i32,
                Slot::I64(dest) => **dest = value.i64,
                Slot::Isize(dest) => **dest = value.isize,
                Slot::U8(dest) => **dest = value.u8,
                Slot::U16(dest) => **dest = value.u16,
                Slot::U32(dest) => **dest = value.u32,
                Slot::U64(dest) => **dest = value.u64,
                Slot::Usize(dest) => **dest = value.usize,
                Slot::F32(dest) => **dest = value.f32,
                Slot::F64(dest) => **dest = value.f64,
                Slot::Unsupported(name) => return Err(ArgError::UnsupportedType(*name)),
            }
        }

        Ok(())
    }
}

/**
    The cells staged for a single native parse call, one per slot.

    Cells live in a boxed slice that is never resized, so the
    pointers handed to the engine stay valid until the arena drops.
*/
#[derive(Debug)]
pub struct Cells {
    cells: Box<[Cell]>,
}

impl Cells {
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn kinds(&self) -> Vec<Kind> {
        self.cells.iter().map(Cell::kind).collect()
    }

    /**
        Returns one pointer per cell, in slot order, for the engine to write through.

        Anything written through these pointers must be a valid value
        of the cell kind: a null or nul-terminated string pointer for
        [`Kind::Str`], a null or object pointer for [`Kind::Object`].
    */
    pub fn pointers(&mut self) -> Vec<*mut c_void> {
        self.cells.iter_mut().map(Cell::as_mut_ptr).collect()
    }
}

/**
    Allocates one zeroed cell per slot, sized for the slot kind.

    # Errors

    Errors with [`ArgError::UnsupportedType`] on the first unsupported
    slot, in which case no cells are returned.
*/
pub fn pack_values(slots: &[Slot<'_>]) -> ArgResult<Cells> {
    let cells = slots
        .iter()
        .map(|slot| slot.kind().map(Cell::new))
        .collect::<ArgResult<Box<[Cell]>>>()?;
    Ok(Cells { cells })
}

/**
    Copies the value of each cell back into its slot.

    # Errors

    Errors if the number of cells and slots differ, if a slot is
    unsupported, or if a slot kind does not match its cell.
*/
pub fn unpack_values(cells: &Cells, slots: &mut [Slot<'_>]) -> ArgResult<()> {
    if cells.len() != slots.len() {
        return Err(ArgError::invalid(format!(
            "expected one slot per cell ({}), got {} slots",
            cells.len(),
            slots.len()
        )));
    }

    for (cell, slot) in cells.iter().zip(slots.iter_mut()) {
        cell.write_into(slot)?;
    }

    Ok(())
}
