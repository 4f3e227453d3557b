//! Shared fixtures for cmdaudit tests: a scripted monitor, scratch
//! directories and result assertions.

mod monitor;

pub use monitor::{unused_port, MonitorDouble};

use tempfile::TempDir;

/// A scratch directory removed on drop.
pub fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("cmdaudit-")
        .tempdir()
        .expect("scratch directory")
}

/// Unwrap an `Ok`, panicking with the error otherwise.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err({:?})", e),
        }
    };
}

/// Unwrap an `Err`, panicking with the value otherwise.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("expected Err, got Ok({:?})", v),
            Err(e) => e,
        }
    };
}
