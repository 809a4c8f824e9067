use crate::asset::ImportError;
use std::{error, fmt};

/// Unified error type
///
/// Most problems inside the animation core are handled where they occur
/// (skipped channels, missing clips, degenerate keyframes) and never reach
/// the caller as an error. Loading is the exception: a caller needs to know
/// whether it got a usable character at all.
///
/// Some error types from other crates are very large so are boxed.
#[derive(Debug)]
pub enum MnError {
    ClipNotFound(String),
    StdIoError(std::io::Error),
    GltfError(Box<gltf::Error>),
    SerdeYamlError(Box<serde_yaml::Error>),
    ImportError(ImportError),
}

impl error::Error for MnError {}

impl fmt::Display for MnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ClipNotFound(name) => {
                write!(f, "animation clip \"{name}\" not found")
            }
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::GltfError(e) => write!(f, "gltf Error: {e}"),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<std::io::Error> for MnError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<gltf::Error> for MnError {
    fn from(e: gltf::Error) -> Self {
        Self::GltfError(Box::new(e))
    }
}

impl From<serde_yaml::Error> for MnError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<ImportError> for MnError {
    fn from(e: ImportError) -> Self {
        Self::ImportError(e)
    }
}
