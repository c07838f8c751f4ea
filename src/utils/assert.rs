/// Asserts that a `Result` is `Ok` and yields the contained value.
#[macro_export]
macro_rules! assert_ok {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => panic!("assertion failed: expected Ok, got Err({:?})", err),
        }
    };
}

/// Asserts that a `Result` is `Err` and yields the contained error.
#[macro_export]
macro_rules! assert_err {
    ($e:expr) => {
        match $e {
            Ok(_) => panic!("assertion failed: expected Err, got Ok"),
            Err(err) => err,
        }
    };
}

pub use crate::{assert_err, assert_ok};
