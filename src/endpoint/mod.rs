use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use path_absolutize::Absolutize;

use crate::errors::XlError;
use crate::globals::{MAX_SET_DRIVE_COUNT, SLASH_SEPARATOR};

/// Identity of one disk: its absolute, cleaned path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    path: String,
}

impl Endpoint {
    pub fn new(arg: &str) -> Result<Self, XlError> {
        let arg = arg.trim();
        if arg.is_empty() || arg == SLASH_SEPARATOR {
            return Err(XlError::InvalidArgument(
                "empty or root path is not supported in disk endpoint".to_owned(),
            ));
        }
        if arg.contains("://") {
            return Err(XlError::InvalidArgument(format!(
                "remote disk endpoint '{}' is not supported",
                arg
            )));
        }

        // Disallow relative paths, figure out absolute paths.
        let path = Path::new(arg).absolutize().map_err(|err| {
            XlError::InvalidArgument(format!("invalid disk endpoint '{}': {}", arg, err))
        })?;
        let path = path.to_str().ok_or_else(|| {
            XlError::InvalidArgument(format!("disk endpoint '{}' is not valid UTF-8", arg))
        })?;
        if path == SLASH_SEPARATOR {
            return Err(XlError::InvalidArgument(
                "empty or root path is not supported in disk endpoint".to_owned(),
            ));
        }
        Ok(Endpoint {
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// The ordered disk endpoints of one erasure set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints(Vec<Endpoint>);

impl Endpoints {
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Self, XlError> {
        if args.is_empty() {
            return Err(XlError::InvalidArgument("no disks supplied".to_owned()));
        }
        if args.len() > MAX_SET_DRIVE_COUNT {
            return Err(XlError::InvalidArgument(format!(
                "{} disks supplied, at most {} are supported in one set",
                args.len(),
                MAX_SET_DRIVE_COUNT
            )));
        }

        let mut endpoints = Vec::with_capacity(args.len());
        let mut seen = HashSet::with_capacity(args.len());
        for arg in args {
            let endpoint = Endpoint::new(arg.as_ref())?;
            if !seen.insert(endpoint.path.clone()) {
                return Err(XlError::InvalidArgument(format!(
                    "duplicate disk endpoint '{}'",
                    endpoint
                )));
            }
            endpoints.push(endpoint);
        }
        Ok(Endpoints(endpoints))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.0.get(index)
    }

    /// Resolves `args` to slot indices, dropping entries that are not part of the set.
    pub fn indices_of<S: AsRef<str>>(&self, args: &[S]) -> Vec<usize> {
        let mut indices: Vec<usize> = args
            .iter()
            .filter_map(|arg| Endpoint::new(arg.as_ref()).ok())
            .filter_map(|endpoint| self.0.iter().position(|e| *e == endpoint))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl IntoIterator for Endpoints {
    type Item = Endpoint;
    type IntoIter = std::vec::IntoIter<Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
