mod reducible_errors;
mod storage_errors;
mod xl_errors;

pub use reducible_errors::*;
pub use storage_errors::*;
pub use xl_errors::*;

pub trait AsError {
    fn as_error<E: std::error::Error + 'static>(&self) -> Option<&E>;
}

impl AsError for anyhow::Error {
    fn as_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        for cause in self.chain() {
            if let Some(err) = cause.downcast_ref::<E>() {
                return Some(err);
            }
        }
        None
    }
}

impl AsError for std::io::Error {
    fn as_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        if let Some(err) = self.get_ref() {
            if let Some(err) = err.as_error::<E>() {
                return Some(err);
            }
        }
        None
    }
}

impl AsError for dyn std::error::Error + Send + Sync + 'static {
    fn as_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = cause {
            if let Some(err) = err.downcast_ref::<E>() {
                return Some(err);
            }
            cause = err.source();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_error_walks_anyhow_chain() {
        let err = anyhow::Error::new(XlError::NotFormatted).context("building erasure set");
        assert!(matches!(
            err.as_error::<XlError>(),
            Some(XlError::NotFormatted)
        ));
        assert!(err.as_error::<StorageError>().is_none());
    }

    #[test]
    fn test_as_error_unwraps_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, StorageError::FaultyDisk);
        assert_eq!(
            err.as_error::<StorageError>(),
            Some(&StorageError::FaultyDisk)
        );
    }
}
