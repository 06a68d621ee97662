use std::fmt;
use std::io;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The input cannot be encrypted (unsupported format, empty,
    /// oversize, malformed passphrase).
    Input(String),
    /// The container bytes do not follow the expected layout.
    Format(String),
    /// The container was produced by a different format version than
    /// the key bundle declares.
    Version { container: String, bundle: String },
    /// An integrity check failed. Opaque on purpose; the caller is not
    /// told which sub-check rejected the artifact.
    Integrity,
    /// Key material is missing, malformed, or locked behind a wrong
    /// passphrase.
    Key(String),
    /// Underlying read/write failure.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(reason) => write!(f, "Invalid input: {reason}."),
            Self::Format(reason) => write!(f, "Invalid file format: {reason}."),
            Self::Version { container, bundle } => write!(
                f,
                "Incompatible version: file is {container}, key bundle is {bundle}."
            ),
            Self::Integrity => write!(
                f,
                "\
Integrity check failed.
The file is corrupted, tampered with, or does not match the key bundle."
            ),
            Self::Key(reason) => write!(f, "Key error: {reason}."),
            Self::Io(reason) => write!(f, "Could not read or write: {reason}."),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
