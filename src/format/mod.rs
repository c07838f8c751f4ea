mod erasure;
mod init;
mod meta;

pub use erasure::*;
pub use init::*;
pub use meta::*;
