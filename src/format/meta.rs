use serde::{Deserialize, Serialize};

// Format config file carries backend format specific details.
pub const FORMAT_CONFIG_FILE: &str = "format.json";

// Version of the FormatMetaV1
pub const FORMAT_META_VERSION_V1: u32 = 1;

// Represents Erasure backend.
pub const FORMAT_BACKEND_ERASURE: &str = "xl";

// format.json currently has the format:
// {
//   "version": 1,
//   "format": "xl",
//   "id": "<volume id>",
//   "xl": {
//
//   }
// }
// The "xl" section is described by ErasureV1.

// Ideally we will never have a situation where we will have to change the
// fields of this struct and deal with related migration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FormatMetaV1 {
    pub version: u32,   // Version of the format config.
    pub format: String, // The backend format type, only 'xl' is supported.
    pub id: String,     // The identifier for the volume.
}

impl FormatMetaV1 {
    pub fn new(id: String) -> Self {
        FormatMetaV1 {
            version: FORMAT_META_VERSION_V1,
            format: FORMAT_BACKEND_ERASURE.to_owned(),
            id,
        }
    }
}
