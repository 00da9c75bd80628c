//! Records emitted by `go list -json`.
//!
//! Only the attributes the relocation pipeline reads are decoded; unknown keys in the record are
//! ignored, and list-valued keys that `go list` omits when empty decode to an empty list.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One importable unit as reported by the package metadata query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Package {
    /// Directory containing the package sources
    pub dir: PathBuf,
    /// Import path of the package in `dir`
    pub import_path: String,
    /// Package name as declared in the sources
    pub name: String,
    /// Whether the package lives in the Go root
    pub goroot: bool,
    /// Whether the package is part of the standard library
    pub standard: bool,
    /// The module containing the package, if any
    pub module: Option<Module>,

    /// `.go` source files, excluding cgo and test files
    pub go_files: Vec<String>,
    /// `_test.go` files in the package
    pub test_go_files: Vec<String>,
    /// `_test.go` files of the external test package
    pub x_test_go_files: Vec<String>,
    /// `.go` files excluded by build constraints
    pub ignored_go_files: Vec<String>,

    /// Import paths used by the package
    pub imports: Vec<String>,
    /// Imports from `test_go_files`
    pub test_imports: Vec<String>,
    /// Imports from `x_test_go_files`
    pub x_test_imports: Vec<String>,

    /// This package or one of its dependencies failed to load
    pub incomplete: bool,
    /// Error loading this package
    pub error: Option<PackageError>,
    /// Errors loading dependencies
    pub deps_errors: Vec<PackageError>,
}

impl Package {
    /// All file names of the package, by role: regular, in-package test, external test, then
    /// files excluded by build constraints.
    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.go_files
            .iter()
            .chain(&self.test_go_files)
            .chain(&self.x_test_go_files)
            .chain(&self.ignored_go_files)
            .map(String::as_str)
    }

    /// Whether the record points at a source directory that exists on this machine.
    ///
    /// `go list -e` reports unresolvable packages with an empty `Dir`, and synthetic or
    /// platform-specific packages may name a directory that is absent from the tree.
    pub fn has_source_dir(&self) -> bool {
        !self.dir.as_os_str().is_empty() && self.dir.is_dir()
    }
}

/// Module information attached to a package record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Module {
    pub path: String,
    pub version: String,
    pub main: bool,
    pub dir: Option<PathBuf>,
    pub go_mod: Option<PathBuf>,
    pub go_version: String,
}

/// A per-package load error reported inline by `go list -e`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageError {
    /// Shortest path from the package named on the command line to this one
    pub import_stack: Vec<String>,
    /// Position of the error as `file:line:col`, if known
    pub pos: String,
    pub err: String,
}

impl std::fmt::Display for PackageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pos.is_empty() {
            write!(f, "{}", self.err)
        } else {
            write!(f, "{}: {}", self.pos, self.err)
        }
    }
}
