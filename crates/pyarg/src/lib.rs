#![allow(clippy::cargo_common_metadata)]

/*!
    Argument parsing and value building through the CPython C API.

    Destinations and values are described by a closed set of primitive
    kinds. Each call stages one cell per destination or value, makes a
    single call into the variadic `PyArg_ParseTuple`,
    `PyArg_ParseTupleAndKeywords` or `Py_BuildValue`, then copies
    results back and releases everything it staged.
*/

mod args;
mod cell;
mod error;
mod keywords;
mod kind;
mod object;
mod slot;
mod value;

pub mod runtime;

pub use self::{
    args::{
        build_value, build_value_with, parse_tuple, parse_tuple_and_keywords,
        parse_tuple_and_keywords_with, parse_tuple_with,
    },
    cell::{pack_values, unpack_values, Cell, CellValue, Cells},
    error::{ArgError, ArgResult},
    keywords::KeywordNames,
    kind::{Kind, Promoted},
    object::{Dict, Object, PyObject, Tuple},
    runtime::{CPython, Runtime, RuntimeConfig},
    slot::Slot,
    value::{stage_values, BuildCell, BuildCells, Value},
};
