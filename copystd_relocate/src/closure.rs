//! Expansion of a root package into the closed set of restricted packages it depends on.
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use copystd_resolver::{Package, PackageResolver};
use indexmap::IndexMap;
use observability_deps::tracing::{debug, info, warn};

use crate::context::RelocationContext;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to resolve {query:?}: {source}")]
    Resolve {
        query: String,
        #[source]
        source: copystd_resolver::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The packages to copy for one root, keyed by import path in discovery order.
///
/// No import path and no source directory appears twice.
#[derive(Debug, Clone, Default)]
pub struct ClosureSet {
    packages: IndexMap<String, Package>,
    dirs: HashSet<PathBuf>,
}

impl ClosureSet {
    /// Add `package` unless its import path or directory is already present. Returns whether
    /// it was added.
    pub fn insert(&mut self, package: Package) -> bool {
        if self.contains(&package.import_path) || self.dirs.contains(&package.dir) {
            return false;
        }
        self.dirs.insert(package.dir.clone());
        self.packages.insert(package.import_path.clone(), package);
        true
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.packages.contains_key(import_path)
    }

    pub fn contains_dir(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn get(&self, import_path: &str) -> Option<&Package> {
        self.packages.get(import_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }
}

impl IntoIterator for ClosureSet {
    type Item = Package;
    type IntoIter = indexmap::map::IntoValues<String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.into_values()
    }
}

/// Computes the [`ClosureSet`] of a root query by following restricted import edges only.
#[derive(Debug, Clone, Copy)]
pub struct ClosureExpander<'a> {
    resolver: &'a dyn PackageResolver,
    ctx: &'a RelocationContext,
}

impl<'a> ClosureExpander<'a> {
    pub fn new(resolver: &'a dyn PackageResolver, ctx: &'a RelocationContext) -> Self {
        Self { resolver, ctx }
    }

    /// Resolve `root_query`, follow its restricted imports transitively, then re-resolve every
    /// member by directory so the returned descriptors are the authoritative ones.
    ///
    /// Imports outside the restricted subtrees are not followed: the public module keeps
    /// depending on them as they are. Packages without sources on disk are skipped.
    pub fn expand(&self, root_query: &str) -> Result<ClosureSet> {
        let mut pending: VecDeque<Package> = self.resolve(root_query)?.into();
        let mut requested: HashSet<String> = HashSet::from([root_query.to_owned()]);
        let mut closure = ClosureSet::default();

        while let Some(package) = pending.pop_front() {
            if !package.has_source_dir() {
                warn_missing(&package);
                continue;
            }
            if closure.contains(&package.import_path) || closure.contains_dir(&package.dir) {
                debug!(import_path = %package.import_path, "already in closure");
                continue;
            }

            let from = package.import_path.clone();
            let edges = self.edges(&package);
            closure.insert(package);

            for import in edges {
                if !self.ctx.table().is_restricted(&import) {
                    info!(%import, %from, "not following unrestricted import");
                    continue;
                }
                if closure.contains(&import) || !requested.insert(import.clone()) {
                    continue;
                }
                debug!(%import, %from, "following restricted import");
                pending.extend(self.resolve(&import)?);
            }
        }

        info!(
            root = root_query,
            packages = closure.len(),
            "expanded restricted closure"
        );
        self.refresh(closure)
    }

    /// Re-query every member by its directory.
    fn refresh(&self, closure: ClosureSet) -> Result<ClosureSet> {
        let mut refreshed = ClosureSet::default();
        for package in closure {
            let query = package.dir.to_string_lossy().into_owned();
            for fresh in self.resolve(&query)? {
                if !fresh.has_source_dir() {
                    warn_missing(&fresh);
                    continue;
                }
                refreshed.insert(fresh);
            }
        }
        Ok(refreshed)
    }

    /// Direct dependency edges of `package`, without duplicates.
    fn edges(&self, package: &Package) -> Vec<String> {
        let mut edges: Vec<&String> = package.imports.iter().collect();
        if self.ctx.include_test_imports() {
            edges.extend(&package.test_imports);
            edges.extend(&package.x_test_imports);
        }

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .filter(|import| seen.insert(import.as_str()))
            .cloned()
            .collect()
    }

    fn resolve(&self, query: &str) -> Result<Vec<Package>> {
        self.resolver
            .resolve(self.ctx.src_root(), &[query.to_owned()])
            .map_err(|source| Error::Resolve {
                query: query.to_owned(),
                source,
            })
    }
}

fn warn_missing(package: &Package) {
    match &package.error {
        Some(error) => warn!(
            import_path = %package.import_path,
            %error,
            "package has no source directory, skipping"
        ),
        None => warn!(
            import_path = %package.import_path,
            dir = %package.dir.display(),
            "package source directory does not exist, skipping"
        ),
    }
}
