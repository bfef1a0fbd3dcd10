use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("only 'tar' and 'tar.gz' image formats are supported: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("corrupt image manifest: {reason}")]
    CorruptManifest { reason: String },

    #[error("path not found in container image: {src}")]
    PathNotFound { src: String },

    #[error("specified destination is not a directory: {dest}")]
    InvalidDestination { dest: PathBuf },

    #[error("existing destination does not match the archive entry kind: {dest}")]
    DestinationTypeMismatch { dest: PathBuf },

    #[error("entry is neither a file nor a directory: {name}")]
    InvalidMemberKind { name: String },

    #[error("owner '{0}' not found in password database")]
    UnknownOwner(String),

    #[error("group '{0}' not found in group database")]
    UnknownGroup(String),

    #[error("failed to change ownership of {path} [operation not permitted]")]
    PermissionDenied { path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
