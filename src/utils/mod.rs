pub mod assert;
mod units;

pub use units::*;
