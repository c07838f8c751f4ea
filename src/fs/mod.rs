mod errors;
mod path;
mod reliable;

pub use errors::*;
pub use path::*;
pub use reliable::*;
