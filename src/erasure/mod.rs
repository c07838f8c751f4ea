mod builder;
mod info;
mod quorum;
mod set;

pub use builder::*;
pub use info::*;
pub use quorum::*;
pub use set::*;
