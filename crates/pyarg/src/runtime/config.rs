use std::{
    env::var_os,
    path::{Path, PathBuf},
};

/**
    Environment variable holding the path of the python shared library to load.
*/
pub const LIBRARY_ENV_VAR: &str = "PYARG_LIBPYTHON";

/**
    Where the python runtime symbols are resolved from.

    Without a library path, symbols are looked up in the current
    process image, which is the case for hosts that embed python
    or for extension modules loaded by the interpreter itself.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    library: Option<PathBuf>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Reads the configuration from the process environment.

        An empty `PYARG_LIBPYTHON` is treated the same as an unset one.
    */
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            library: var_os(LIBRARY_ENV_VAR)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    #[must_use]
    pub fn library(&self) -> Option<&Path> {
        self.library.as_deref()
    }
}
