//! Package metadata for the relocation pipeline.
//!
//! The [`PackageResolver`] trait is the seam between the relocation algorithm and the host
//! toolchain. [`GoListResolver`] answers queries by running `go list -json -e`, while
//! [`StaticResolver`] serves a fixed set of records from memory.
use std::fmt::Debug;
use std::path::Path;
use std::process::ExitStatus;

mod go_list;
mod package;
mod static_resolver;

pub use go_list::{GoListResolver, decode_packages};
pub use package::{Module, Package, PackageError};
pub use static_resolver::StaticResolver;

/// Errors that stop a metadata query from producing any result
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read output of `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode package record from `{command}`: {source}{stderr}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
        stderr: Stderr,
    },

    #[error("`{command}` failed with {status}{stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: Stderr,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Diagnostic output captured from a child process.
///
/// Renders as nothing when empty, otherwise as the captured text on the lines following the
/// error message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stderr(String);

impl Stderr {
    pub fn new(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).trim_end().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Stderr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, "\n{}", self.0)
        }
    }
}

/// Answers package metadata queries.
///
/// Implementations must tolerate queries for packages that cannot be loaded by returning a
/// record with its `error` set rather than failing the whole call.
pub trait PackageResolver: Debug + Send + Sync + 'static {
    /// Resolve the package patterns in `args` against the tree rooted at `search_root`.
    fn resolve(&self, search_root: &Path, args: &[String]) -> Result<Vec<Package>>;
}
