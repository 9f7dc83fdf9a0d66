use std::{ffi::CString, ptr};

use tracing::instrument;

use crate::{
    cell::{pack_values, unpack_values},
    error::{ArgError, ArgResult},
    keywords::KeywordNames,
    object::{Dict, Object, Tuple},
    runtime::{CPython, Runtime},
    slot::Slot,
    value::{stage_values, Value},
};

fn format_string(format: &str) -> ArgResult<CString> {
    CString::new(format).map_err(|_| {
        ArgError::invalid(format!(
            "format string '{}' contains a nul byte",
            format.escape_debug()
        ))
    })
}

fn ensure_args(args: Tuple) -> ArgResult<()> {
    if args.as_ptr().is_null() {
        Err(ArgError::invalid("args container is null"))
    } else {
        Ok(())
    }
}

/**
    Parses a tuple of positional arguments into the given slots,
    using the python runtime loaded by [`CPython::global`].

    See [`parse_tuple_with`].

    # Safety

    The GIL must be held and `args` must be null or a live tuple.

    # Errors

    Errors as [`parse_tuple_with`] does. Arguments are checked before
    the runtime is loaded, so a runtime that can not be loaded is only
    reported for otherwise valid calls.
*/
pub unsafe fn parse_tuple(args: Tuple, format: &str, slots: &mut [Slot<'_>]) -> ArgResult<()> {
    parse_tuple_in(CPython::global, args, format, slots)
}

/**
    Parses a tuple of positional arguments into the given slots.

    The format string is handed to the runtime as is, and must ask
    for exactly one value per slot, of the C type matching the slot.

    Slots are only written when parsing succeeds, their contents
    should not be relied on after an error.

    # Safety

    The runtime must be usable from this thread (for python, the GIL
    must be held) and `args` must be null or a live tuple.

    # Errors

    - [`ArgError::InvalidArgument`] if `args` is null or `format` contains a nul byte
    - [`ArgError::UnsupportedType`] if any slot is unsupported, before calling the runtime
    - [`ArgError::ForeignFailure`] if the runtime rejects the arguments
*/
pub unsafe fn parse_tuple_with<R: Runtime + ?Sized>(
    runtime: &R,
    args: Tuple,
    format: &str,
    slots: &mut [Slot<'_>],
) -> ArgResult<()> {
    parse_tuple_in(|| Ok(runtime), args, format, slots)
}

#[instrument(level = "trace", skip_all, fields(format = format, slots = slots.len()))]
unsafe fn parse_tuple_in<'r, R: Runtime + ?Sized + 'r>(
    runtime: impl FnOnce() -> ArgResult<&'r R>,
    args: Tuple,
    format: &str,
    slots: &mut [Slot<'_>],
) -> ArgResult<()> {
    ensure_args(args)?;

    let mut cells = pack_values(slots)?;
    let format = format_string(format)?;
    let pointers = cells.pointers();

    let runtime = runtime()?;
    let status = runtime.parse_tuple(args.as_ptr(), &format, &pointers)?;
    if status == 0 {
        return Err(runtime.exception());
    }

    unpack_values(&cells, slots)
}

/**
    Parses positional and keyword arguments into the given slots,
    using the python runtime loaded by [`CPython::global`].

    See [`parse_tuple_and_keywords_with`].

    # Safety

    The GIL must be held, `args` must be null or a live tuple,
    and `kwargs` must be `None` or a live dict.

    # Errors

    Errors as [`parse_tuple_and_keywords_with`] does. Arguments are
    checked before the runtime is loaded.
*/
pub unsafe fn parse_tuple_and_keywords<S: AsRef<str>>(
    args: Tuple,
    kwargs: Option<Dict>,
    format: &str,
    names: &[S],
    slots: &mut [Slot<'_>],
) -> ArgResult<()> {
    parse_tuple_and_keywords_in(CPython::global, args, kwargs, format, names, slots)
}

/**
    Parses positional and keyword arguments into the given slots.

    `names` lists the keyword names accepted by the format string, in
    order. Which container supplies each value is decided by the runtime.
    Staged names are released once the runtime call returns, whether it
    succeeded or not.

    # Safety

    The runtime must be usable from this thread (for python, the GIL
    must be held), `args` must be null or a live tuple, and `kwargs`
    must be `None` or a live dict.

    # Errors

    - [`ArgError::InvalidArgument`] if `args` is null, or if `format`
      or one of the names contains a nul byte
    - [`ArgError::UnsupportedType`] if any slot is unsupported, before calling the runtime
    - [`ArgError::ForeignFailure`] if the runtime rejects the arguments
*/
pub unsafe fn parse_tuple_and_keywords_with<R: Runtime + ?Sized, S: AsRef<str>>(
    runtime: &R,
    args: Tuple,
    kwargs: Option<Dict>,
    format: &str,
    names: &[S],
    slots: &mut [Slot<'_>],
) -> ArgResult<()> {
    parse_tuple_and_keywords_in(|| Ok(runtime), args, kwargs, format, names, slots)
}

#[instrument(level = "trace", skip_all, fields(format = format, slots = slots.len()))]
unsafe fn parse_tuple_and_keywords_in<'r, R: Runtime + ?Sized + 'r, S: AsRef<str>>(
    runtime: impl FnOnce() -> ArgResult<&'r R>,
    args: Tuple,
    kwargs: Option<Dict>,
    format: &str,
    names: &[S],
    slots: &mut [Slot<'_>],
) -> ArgResult<()> {
    ensure_args(args)?;

    let mut cells = pack_values(slots)?;
    let format = format_string(format)?;
    let names = KeywordNames::new(names)?;
    let pointers = cells.pointers();

    let runtime = runtime()?;
    let kwargs = kwargs.map_or(ptr::null_mut(), Dict::as_ptr);
    let status = runtime.parse_tuple_and_keywords(
        args.as_ptr(),
        kwargs,
        &format,
        names.as_ptr(),
        &pointers,
    )?;
    if status == 0 {
        return Err(runtime.exception());
    }

    unpack_values(&cells, slots)
}

/**
    Builds a new object from the given values,
    using the python runtime loaded by [`CPython::global`].

    See [`build_value_with`].

    # Safety

    The GIL must be held and every [`Value::Object`] must be a live object.

    # Errors

    Errors as [`build_value_with`] does. Values are checked before
    the runtime is loaded.
*/
pub unsafe fn build_value(format: &str, values: &[Value<'_>]) -> ArgResult<Object> {
    build_value_in(CPython::global, format, values)
}

/**
    Builds a new object from the given values.

    Each value is copied before the runtime is called, and the copies
    are released once it returns. The returned object is a new
    reference owned by the caller.

    # Safety

    The runtime must be usable from this thread (for python, the GIL
    must be held) and every [`Value::Object`] must be a live object.

    # Errors

    - [`ArgError::UnsupportedType`] if any value is unsupported, before anything is staged
    - [`ArgError::InvalidArgument`] if `format` or a string value contains a nul byte
    - [`ArgError::ForeignFailure`] if the runtime fails to build the object
*/
pub unsafe fn build_value_with<R: Runtime + ?Sized>(
    runtime: &R,
    format: &str,
    values: &[Value<'_>],
) -> ArgResult<Object> {
    build_value_in(|| Ok(runtime), format, values)
}

#[instrument(level = "trace", skip_all, fields(format = format, values = values.len()))]
unsafe fn build_value_in<'r, R: Runtime + ?Sized + 'r>(
    runtime: impl FnOnce() -> ArgResult<&'r R>,
    format: &str,
    values: &[Value<'_>],
) -> ArgResult<Object> {
    let mut staged = stage_values(values)?;
    let format = format_string(format)?;
    let cells = staged.cells();

    let runtime = runtime()?;
    let object = runtime.build_value(&format, &cells)?;
    if object.is_null() {
        return Err(runtime.exception());
    }

    Ok(Object::from_raw(object))
}
