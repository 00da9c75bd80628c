//! Fake Go source trees for tests.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use copystd_resolver::{Package, StaticResolver};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use crate::{RelocationContext, RelocationTable};

pub(crate) const MODULE: &str = "example.com/x";

/// A temporary source root holding packages, plus the metadata a resolver would report for
/// them.
#[derive(Debug)]
pub(crate) struct GoTree {
    src: TempDir,
    dst: TempDir,
    packages: Vec<Package>,
}

impl GoTree {
    pub(crate) fn new() -> Self {
        Self {
            src: TempDir::new().unwrap(),
            dst: TempDir::new().unwrap(),
            packages: Vec::new(),
        }
    }

    pub(crate) fn src(&self) -> &Path {
        self.src.path()
    }

    pub(crate) fn dst(&self) -> &Path {
        self.dst.path()
    }

    pub(crate) fn dir(&self, import_path: &str) -> PathBuf {
        self.src.path().join(import_path)
    }

    /// Add a package with one regular file per `(name, body)` pair.
    pub(crate) fn package(
        &mut self,
        import_path: &str,
        imports: &[&str],
        files: &[(&str, &str)],
    ) -> &mut Self {
        self.add(
            Package {
                import_path: import_path.to_owned(),
                imports: imports.iter().map(|s| s.to_string()).collect(),
                go_files: files.iter().map(|(name, _)| name.to_string()).collect(),
                ..Default::default()
            },
            files,
        )
    }

    /// Add a package record as is, creating its directory and writing `files` into it. The
    /// record's `dir` is filled in from its import path.
    pub(crate) fn add(&mut self, mut package: Package, files: &[(&str, &str)]) -> &mut Self {
        let dir = self.dir(&package.import_path);
        std::fs::create_dir_all(&dir).unwrap();
        for (name, body) in files {
            std::fs::write(dir.join(name), body).unwrap();
        }
        package.dir = dir;
        self.packages.push(package);
        self
    }

    /// Register a record whose directory is never created.
    pub(crate) fn phantom(&mut self, import_path: &str) -> &mut Self {
        self.packages.push(Package {
            import_path: import_path.to_owned(),
            dir: self.dir(import_path),
            go_files: vec!["a.go".to_owned()],
            ..Default::default()
        });
        self
    }

    pub(crate) fn resolver(&self) -> StaticResolver {
        StaticResolver::new(self.packages.clone())
    }

    pub(crate) fn context(&self) -> RelocationContext {
        RelocationContext::new(MODULE, self.src(), self.dst(), RelocationTable::go_std()).unwrap()
    }
}

/// A simple Go file in package `name` importing `imports`.
pub(crate) fn go_file(name: &str, imports: &[&str]) -> String {
    let mut body = format!("package {name}\n");
    if !imports.is_empty() {
        body.push_str("\nimport (\n");
        for import in imports {
            body.push_str(&format!("\t\"{import}\"\n"));
        }
        body.push_str(")\n");
    }
    body
}

/// SHA-256 of every file below `root`, keyed by relative path.
pub(crate) fn tree_digest(root: &Path) -> BTreeMap<PathBuf, String> {
    fn walk(root: &Path, dir: &Path, digests: &mut BTreeMap<PathBuf, String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, digests);
            } else {
                let digest = hex::encode(Sha256::digest(std::fs::read(&path).unwrap()));
                digests.insert(path.strip_prefix(root).unwrap().to_path_buf(), digest);
            }
        }
    }

    let mut digests = BTreeMap::new();
    walk(root, root, &mut digests);
    digests
}

/// Modification times of every file below `root`, keyed by relative path.
pub(crate) fn tree_mtimes(root: &Path) -> BTreeMap<PathBuf, std::time::SystemTime> {
    tree_digest(root)
        .into_keys()
        .map(|relative| {
            let modified = std::fs::metadata(root.join(&relative))
                .unwrap()
                .modified()
                .unwrap();
            (relative, modified)
        })
        .collect()
}
