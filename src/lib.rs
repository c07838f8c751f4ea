pub mod config;
pub mod disk;
pub mod endpoint;
pub mod erasure;
pub mod errors;
pub mod format;
pub mod fs;
pub mod globals;
pub mod logger;
pub mod storage;
pub mod utils;
pub mod xl_storage;
