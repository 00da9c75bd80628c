use std::path::Path;

use parking_lot::Mutex;

use crate::{Package, PackageError, PackageResolver, Result};

/// Serves a fixed set of package records, matching each query argument against the records'
/// import paths and directories.
///
/// Arguments that match nothing yield an error-annotated record with an empty directory, which
/// is how `go list -e` reports packages it cannot find. Every call is recorded so callers can
/// inspect which queries were made.
#[derive(Debug, Default)]
pub struct StaticResolver {
    packages: Vec<Package>,
    queries: Mutex<Vec<Vec<String>>>,
}

impl StaticResolver {
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        Self {
            packages: packages.into_iter().collect(),
            queries: Default::default(),
        }
    }

    /// The argument lists of every call made so far, in order
    pub fn queries(&self) -> Vec<Vec<String>> {
        self.queries.lock().clone()
    }

    fn lookup(&self, search_root: &Path, arg: &str) -> Package {
        let as_dir = search_root.join(arg);
        self.packages
            .iter()
            .find(|p| p.import_path == arg || p.dir == Path::new(arg) || p.dir == as_dir)
            .cloned()
            .unwrap_or_else(|| Package {
                import_path: arg.to_owned(),
                incomplete: true,
                error: Some(PackageError {
                    import_stack: vec![arg.to_owned()],
                    pos: String::new(),
                    err: format!("cannot find package {arg:?}"),
                }),
                ..Default::default()
            })
    }
}

impl PackageResolver for StaticResolver {
    fn resolve(&self, search_root: &Path, args: &[String]) -> Result<Vec<Package>> {
        self.queries.lock().push(args.to_vec());
        Ok(args.iter().map(|arg| self.lookup(search_root, arg)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn package(import_path: &str, dir: &str) -> Package {
        Package {
            import_path: import_path.to_owned(),
            dir: dir.into(),
            ..Default::default()
        }
    }

    #[test]
    fn matches_import_path_or_dir() {
        let resolver = StaticResolver::new([
            package("internal/foo", "/go/src/internal/foo"),
            package("internal/bar", "/go/src/internal/bar"),
        ]);

        let by_path = resolver
            .resolve(Path::new("/go/src"), &["internal/bar".to_string()])
            .unwrap();
        assert_eq!(by_path, [package("internal/bar", "/go/src/internal/bar")]);

        let by_dir = resolver
            .resolve(Path::new("/go/src"), &["/go/src/internal/foo".to_string()])
            .unwrap();
        assert_eq!(by_dir, [package("internal/foo", "/go/src/internal/foo")]);

        assert_eq!(
            resolver.queries(),
            [
                vec!["internal/bar".to_string()],
                vec!["/go/src/internal/foo".to_string()]
            ]
        );
    }

    #[test]
    fn unknown_query_is_an_annotated_record() {
        let resolver = StaticResolver::default();
        let packages = resolver
            .resolve(Path::new("/go/src"), &["internal/nope".to_string()])
            .unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].import_path, "internal/nope");
        assert!(!packages[0].has_source_dir());
        assert!(packages[0].error.is_some());
    }
}
