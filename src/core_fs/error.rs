use thiserror::Error;

/// Failure taxonomy of the filesystem facade. The verb layer turns these
/// into FTP reply lines with [`FsError::to_ftp_response`].
#[derive(Debug, Error)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not a directory")]
    NotADirectory,

    #[error("Is a directory")]
    IsADirectory,

    #[error("File exists")]
    AlreadyExists,

    #[error("Directory not empty")]
    NotEmpty,

    #[error("File name too long")]
    NameTooLong,

    #[error("I/O error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            ErrorKind::PermissionDenied => FsError::PermissionDenied,
            ErrorKind::AlreadyExists => FsError::AlreadyExists,
            _ => match e.raw_os_error() {
                Some(20) => FsError::NotADirectory, // ENOTDIR
                Some(21) => FsError::IsADirectory,  // EISDIR
                Some(36) => FsError::NameTooLong,   // ENAMETOOLONG
                Some(39) => FsError::NotEmpty,      // ENOTEMPTY
                _ => FsError::Io(e),
            },
        }
    }
}

impl FsError {
    pub fn to_ftp_response(&self) -> String {
        format!("550 {}.\r\n", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn io_kinds_map_to_variants() {
        assert!(matches!(
            FsError::from(Error::new(ErrorKind::NotFound, "x")),
            FsError::NotFound
        ));
        assert!(matches!(
            FsError::from(Error::new(ErrorKind::PermissionDenied, "x")),
            FsError::PermissionDenied
        ));
        assert!(matches!(
            FsError::from(Error::from_raw_os_error(39)),
            FsError::NotEmpty
        ));
    }

    #[test]
    fn responses_are_550_lines() {
        let reply = FsError::NotFound.to_ftp_response();
        assert!(reply.starts_with("550 "));
        assert!(reply.ends_with("\r\n"));
    }
}
