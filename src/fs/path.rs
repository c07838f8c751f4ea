use crate::errors::StorageError;

pub fn check_path_length(path_name: &str) -> Result<(), StorageError> {
    // Apple OS X path length is limited to 1016.
    if cfg!(target_os = "macos") && path_name.len() > 1016 {
        return Err(StorageError::FileNameTooLong);
    }

    // Disallow more than 1024 characters on windows, there
    // are no known name_max limits on Windows.
    if cfg!(windows) && path_name.len() > 1024 {
        return Err(StorageError::FileNameTooLong);
    }

    // On Unix we reject paths if they are just '.', '..' or '/'.
    if path_name == "." || path_name == ".." || path_name == crate::globals::SLASH_SEPARATOR {
        return Err(StorageError::FileAccessDenied);
    }

    // Check each path segment length is > 255 on all Unix
    // platforms, look for this value as NAME_MAX in
    // /usr/include/linux/limits.h
    let mut count = 0;
    for p in path_name.chars() {
        match p {
            '/' => {
                count = 0;
            }
            '\\' => {
                if cfg!(windows) {
                    count = 0;
                }
            }
            _ => {
                count += 1;
                if count > 255 {
                    return Err(StorageError::FileNameTooLong);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_path_length() {
        assert_eq!(check_path_length("."), Err(StorageError::FileAccessDenied));
        assert_eq!(check_path_length("/"), Err(StorageError::FileAccessDenied));
        assert_eq!(check_path_length(".hulk.sys/format.json"), Ok(()));

        let long = "a".repeat(256);
        assert_eq!(
            check_path_length(&format!("bucket/{}", long)),
            Err(StorageError::FileNameTooLong)
        );
    }
}
