use std::time::Duration;

pub const SLASH_SEPARATOR: &str = "/";

// Reserved volume on every disk holding internal metadata.
pub const SYSTEM_META_BUCKET: &str = ".hulk.sys";

// Temporary files are staged here before being renamed into place.
pub const SYSTEM_META_TMP_BUCKET: &str = ".hulk.sys/tmp";

// Maximum number of disks in one erasure set, bounded by the
// Reed-Solomon shard limit of the codec.
pub const MAX_SET_DRIVE_COUNT: usize = 256;

// Default time a single disk gets to answer a probe.
pub const DEFAULT_DISK_PROBE_TIMEOUT: Duration = crate::utils::seconds(10);
