//! Python toolchain support: locating the interpreter that runs the daemon.

pub mod env;

pub use env::{resolve_python, PythonEnv, PythonEnvError, ResolutionOptions, ResolutionSource};
