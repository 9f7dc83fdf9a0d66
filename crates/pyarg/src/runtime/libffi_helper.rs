use core::ffi::{c_int, c_uint, c_void};
use std::ptr;

use libffi::{
    low::{self, CodePtr},
    middle::Type,
    raw,
};

use crate::error::{ArgError, ArgResult};

// Converts ffi status into &str for formatting
pub const FFI_STATUS_NAMES: [&str; 4] = [
    "ffi_status_FFI_OK",
    "ffi_status_FFI_BAD_TYPEDEF",
    "ffi_status_FFI_BAD_ABI",
    "ffi_status_FFI_BAD_ARGTYPE",
];

// Check ffi_result is OK
pub fn ffi_status_assert(result: raw::ffi_status) -> ArgResult<()> {
    if result == raw::ffi_status_FFI_OK {
        Ok(())
    } else {
        let name = FFI_STATUS_NAMES
            .get(result as usize)
            .copied()
            .unwrap_or("unknown ffi_status");
        Err(ArgError::foreign(
            Some(String::from("libffi")),
            format!(
                "ffi_status assertion failed. expected result {}, got {name}",
                FFI_STATUS_NAMES[0]
            ),
        ))
    }
}

/**
    A call interface for a C variadic function, prepared with
    `ffi_prep_cif_var` for one specific list of argument types.
*/
pub struct VariadicCif {
    cif: low::ffi_cif,
    // Owned so the type pointers in the cif stay valid
    _types: Vec<Type>,
    _result: Type,
    _raw_types: Vec<*mut raw::ffi_type>,
}

impl VariadicCif {
    pub fn new(
        fixed: Vec<Type>,
        variadic: impl IntoIterator<Item = Type>,
        result: Type,
    ) -> ArgResult<Self> {
        let fixed_len = fixed.len();
        let types = fixed.into_iter().chain(variadic).collect::<Vec<_>>();
        let mut raw_types = types.iter().map(Type::as_raw_ptr).collect::<Vec<_>>();

        let fixed_count = c_uint::try_from(fixed_len)
            .map_err(|_| ArgError::invalid("too many fixed arguments"))?;
        let total_count = c_uint::try_from(raw_types.len())
            .map_err(|_| ArgError::invalid(format!("too many arguments ({})", raw_types.len())))?;

        let mut cif = low::ffi_cif::default();
        let status = unsafe {
            raw::ffi_prep_cif_var(
                ptr::from_mut(&mut cif),
                raw::ffi_abi_FFI_DEFAULT_ABI,
                fixed_count,
                total_count,
                result.as_raw_ptr(),
                raw_types.as_mut_ptr(),
            )
        };
        ffi_status_assert(status)?;

        Ok(Self {
            cif,
            _types: types,
            _result: result,
            _raw_types: raw_types,
        })
    }

    #[inline]
    pub fn arg_count(&self) -> usize {
        self.cif.nargs as usize
    }

    /**
        Calls a function returning a C `int`.

        Every entry of `args` must point at a value of the matching type.
    */
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn call_int(&mut self, code: CodePtr, args: &mut [*mut c_void]) -> c_int {
        debug_assert_eq!(args.len(), self.arg_count());
        // Integral results narrower than a register are widened into ffi_arg
        let mut result: raw::ffi_arg = 0;
        raw::ffi_call(
            ptr::from_mut(&mut self.cif),
            Some(*code.as_safe_fun()),
            ptr::from_mut(&mut result).cast::<c_void>(),
            args.as_mut_ptr(),
        );
        result as c_int
    }

    /**
        Calls a function returning a pointer.

        Every entry of `args` must point at a value of the matching type.
    */
    pub unsafe fn call_pointer<T>(&mut self, code: CodePtr, args: &mut [*mut c_void]) -> *mut T {
        debug_assert_eq!(args.len(), self.arg_count());
        let mut result: *mut c_void = ptr::null_mut();
        raw::ffi_call(
            ptr::from_mut(&mut self.cif),
            Some(*code.as_safe_fun()),
            ptr::from_mut(&mut result).cast::<c_void>(),
            args.as_mut_ptr(),
        );
        result.cast()
    }
}
