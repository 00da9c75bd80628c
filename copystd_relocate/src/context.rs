use std::path::{Path, PathBuf};

use crate::mapping::{PathMapper, RelocationRule, RelocationTable};

/// How a re-run treats output that already exists in the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Idempotence {
    /// Compare the SHA-256 digest of every formatted file with the file already at its
    /// destination and only write files whose content differs.
    #[default]
    ContentHash,
    /// Skip every package whose destination directory exists and is not empty.
    PackageDir,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("destination module path must not be empty")]
    EmptyModule,

    #[error("relocation table has no rules")]
    EmptyTable,

    #[error(
        "destination module path {module:?} is matched by relocation rule `{rule}`, \
        so relocated import paths would be relocated again"
    )]
    RestrictedModule {
        module: String,
        rule: RelocationRule,
    },

    #[error(
        "relocation rule `{rule}` restricts a path inside destination module {module:?}, \
        so relocated import paths would be relocated again"
    )]
    RuleInsideModule {
        module: String,
        rule: RelocationRule,
    },

    #[error(
        "relocation rule `{rule}` relocates to {mapped:?}, which rule `{remapped_by}` \
        would relocate again"
    )]
    RemappedRule {
        rule: RelocationRule,
        mapped: String,
        remapped_by: RelocationRule,
    },
}

/// Everything one relocation run needs to know about where packages come from and where they
/// go. It is passed explicitly through the closure expander, the path mapper and the file
/// rewriter.
#[derive(Debug, Clone)]
pub struct RelocationContext {
    module: String,
    src_root: PathBuf,
    dst_root: PathBuf,
    table: RelocationTable,
    idempotence: Idempotence,
    include_test_imports: bool,
}

impl RelocationContext {
    pub fn new(
        module: impl Into<String>,
        src_root: impl Into<PathBuf>,
        dst_root: impl Into<PathBuf>,
        table: RelocationTable,
    ) -> Result<Self, Error> {
        let module = module.into().trim_matches('/').to_owned();
        if module.is_empty() {
            return Err(Error::EmptyModule);
        }
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        if let Some((rule, _)) = table.lookup(&module) {
            return Err(Error::RestrictedModule {
                module,
                rule: rule.clone(),
            });
        }

        let ctx = Self {
            module,
            src_root: src_root.into(),
            dst_root: dst_root.into(),
            table,
            idempotence: Idempotence::default(),
            include_test_imports: false,
        };
        ctx.check_single_mapping()?;
        Ok(ctx)
    }

    pub fn with_idempotence(mut self, idempotence: Idempotence) -> Self {
        self.idempotence = idempotence;
        self
    }

    /// Also follow restricted imports of the package's test files.
    pub fn with_test_imports(mut self, include_test_imports: bool) -> Self {
        self.include_test_imports = include_test_imports;
        self
    }

    /// Import path prefix of the public module; also the local-prefix hint for formatting
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn src_root(&self) -> &Path {
        &self.src_root
    }

    pub fn dst_root(&self) -> &Path {
        &self.dst_root
    }

    pub fn table(&self) -> &RelocationTable {
        &self.table
    }

    pub fn idempotence(&self) -> Idempotence {
        self.idempotence
    }

    pub fn include_test_imports(&self) -> bool {
        self.include_test_imports
    }

    pub fn mapper(&self) -> PathMapper<'_> {
        PathMapper::new(self)
    }

    /// Every mapped path is `<module>/<public>/<rest>`. No rule may match one: neither a
    /// rule's own mapped prefix nor anything below the module.
    fn check_single_mapping(&self) -> Result<(), Error> {
        let module = RelocationRule::new(self.module.as_str(), "");
        for rule in self.table.rules() {
            if let Some(mapped) = self.mapper().map_import_path(rule.restricted()) {
                if let Some((remapped_by, _)) = self.table.lookup(&mapped) {
                    return Err(Error::RemappedRule {
                        rule: rule.clone(),
                        mapped,
                        remapped_by: remapped_by.clone(),
                    });
                }
            }
            if module.strip(rule.restricted()).is_some() {
                return Err(Error::RuleInsideModule {
                    module: self.module.clone(),
                    rule: rule.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_module_matched_by_table() {
        let err = RelocationContext::new("internal/x", "/go/src", ".", RelocationTable::go_std())
            .unwrap_err();
        assert!(matches!(err, Error::RestrictedModule { .. }), "{err}");
        assert_eq!(
            err.to_string(),
            "destination module path \"internal/x\" is matched by relocation rule `internal=`, \
            so relocated import paths would be relocated again"
        );
    }

    #[test]
    fn rejects_rule_below_module() {
        let table = RelocationTable::new([
            RelocationRule::new("a", ""),
            RelocationRule::new("example.com/x/b", "c"),
        ]);
        let err = RelocationContext::new("example.com/x", "/go/src", ".", table).unwrap_err();
        let Error::RuleInsideModule { rule, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(rule, &RelocationRule::new("example.com/x/b", "c"));
    }

    #[test]
    fn rejects_rule_whose_output_is_remapped() {
        let table = RelocationTable::new([
            RelocationRule::new("a", "b"),
            RelocationRule::new("example.com/x/b", "c"),
        ]);
        let err = RelocationContext::new("example.com/x", "/go/src", ".", table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "relocation rule `a=b` relocates to \"example.com/x/b\", which rule \
            `example.com/x/b=c` would relocate again"
        );
    }

    #[test]
    fn accepted_tables_map_once() {
        let tables = [
            RelocationTable::go_std(),
            RelocationTable::new([
                RelocationRule::new("vendor/golang.org/x", "x"),
                RelocationRule::new("internal", "std"),
            ]),
        ];
        for table in tables {
            let ctx = RelocationContext::new("example.com/x", "/go/src", ".", table).unwrap();
            let mapper = ctx.mapper();
            for rule in ctx.table().rules() {
                let path = format!("{}/q/r", rule.restricted());
                let once = mapper.map_import_path(&path).unwrap();
                assert_eq!(mapper.map_import_path(&once), None, "{path} -> {once}");
            }
        }
    }

    #[test]
    fn rejects_empty_module_and_table() {
        assert!(matches!(
            RelocationContext::new("/", "/go/src", ".", RelocationTable::go_std()),
            Err(Error::EmptyModule)
        ));
        assert!(matches!(
            RelocationContext::new("example.com/x", "/go/src", ".", RelocationTable::new([])),
            Err(Error::EmptyTable)
        ));
    }

    #[test]
    fn defaults() {
        let ctx = RelocationContext::new("example.com/x/", "/go/src", ".", Default::default())
            .unwrap();
        assert_eq!(ctx.module(), "example.com/x");
        assert_eq!(ctx.idempotence(), Idempotence::ContentHash);
        assert!(!ctx.include_test_imports());
    }
}
