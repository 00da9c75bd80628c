//! Config for the `go` command used to query packages.
use std::path::{Path, PathBuf};

use copystd_resolver::GoListResolver;

/// Locates the `go` command.
#[derive(Debug, Clone, clap::Parser)]
pub struct ToolchainConfig {
    /// The `go` command used to list packages and locate GOROOT
    #[clap(long = "go-binary", env = "COPYSTD_GO", default_value = GoListResolver::DEFAULT_GO_BINARY)]
    pub go_binary: PathBuf,
}

impl ToolchainConfig {
    pub fn resolver(&self) -> GoListResolver {
        GoListResolver::new(&self.go_binary)
    }

    /// `explicit` if given, otherwise the `src` directory of the toolchain's GOROOT.
    pub fn source_root(&self, explicit: Option<&Path>) -> copystd_resolver::Result<PathBuf> {
        match explicit {
            Some(src) => Ok(src.to_path_buf()),
            None => Ok(self.resolver().goroot()?.join("src")),
        }
    }
}
