//! Sequencing of resolve, expand, map and rewrite for each requested root.
use std::path::PathBuf;
use std::sync::Arc;

use copystd_resolver::PackageResolver;
use observability_deps::tracing::info;

use crate::closure::{self, ClosureExpander, ClosureSet};
use crate::context::RelocationContext;
use crate::format::SourceFormatter;
use crate::rewrite::{self, FileRewriter, PackageOutcome, WriteStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expanding {root:?}: {source}")]
    Expand {
        root: String,
        #[source]
        source: closure::Error,
    },

    #[error("relocating {import_path:?} (from root {root:?}): {source}")]
    Rewrite {
        root: String,
        import_path: String,
        #[source]
        source: rewrite::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// How processing of one root ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    /// At least one package of the closure was materialized
    Rewritten,
    /// The closure was empty, or every package in it was skipped
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    pub root: String,
    pub state: RootState,
    pub packages: Vec<PackageOutcome>,
}

/// Summary of a [`Relocator::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub roots: Vec<RootReport>,
}

impl RunReport {
    pub fn files(&self, status: WriteStatus) -> usize {
        self.roots
            .iter()
            .flat_map(|root| &root.packages)
            .map(|package| package.count(status))
            .sum()
    }
}

/// Where one closure member would be relocated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPackage {
    pub root: String,
    pub import_path: String,
    pub source_dir: PathBuf,
    /// `None` when no relocation rule covers the package
    pub destination_dir: Option<PathBuf>,
    pub destination_import_path: Option<String>,
}

/// Relocates restricted packages and their restricted dependencies into the public module.
///
/// Roots are processed one after another; the first error aborts the run.
#[derive(Debug, Clone)]
pub struct Relocator {
    resolver: Arc<dyn PackageResolver>,
    formatter: Arc<dyn SourceFormatter>,
    ctx: RelocationContext,
}

impl Relocator {
    pub fn new(
        resolver: Arc<dyn PackageResolver>,
        formatter: Arc<dyn SourceFormatter>,
        ctx: RelocationContext,
    ) -> Self {
        Self {
            resolver,
            formatter,
            ctx,
        }
    }

    pub fn context(&self) -> &RelocationContext {
        &self.ctx
    }

    pub fn run<I, S>(&self, roots: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = RunReport::default();
        for root in roots {
            report.roots.push(self.relocate_root(root.as_ref())?);
        }
        info!(
            roots = report.roots.len(),
            written = report.files(WriteStatus::Written),
            unchanged = report.files(WriteStatus::Unchanged),
            "relocation complete"
        );
        Ok(report)
    }

    /// Expand `root` and rewrite every package of its closure.
    pub fn relocate_root(&self, root: &str) -> Result<RootReport> {
        let closure = self.expand(root)?;
        let rewriter = FileRewriter::new(&self.ctx, self.formatter.as_ref());

        let packages = closure
            .iter()
            .map(|package| {
                rewriter
                    .rewrite_package(package)
                    .map_err(|source| Error::Rewrite {
                        root: root.to_owned(),
                        import_path: package.import_path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let state = if packages
            .iter()
            .any(|p| matches!(p, PackageOutcome::Rewritten { .. }))
        {
            RootState::Rewritten
        } else {
            RootState::Skipped
        };
        info!(root, ?state, packages = packages.len(), "finished root");

        Ok(RootReport {
            root: root.to_owned(),
            state,
            packages,
        })
    }

    /// Resolve and expand every root without touching the destination tree.
    pub fn plan<I, S>(&self, roots: I) -> Result<Vec<PlannedPackage>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mapper = self.ctx.mapper();
        let mut planned = Vec::new();
        for root in roots {
            let root = root.as_ref();
            for package in self.expand(root)? {
                planned.push(PlannedPackage {
                    root: root.to_owned(),
                    destination_dir: mapper.map_destination(&package.dir),
                    destination_import_path: mapper.map_import_path(&package.import_path),
                    import_path: package.import_path,
                    source_dir: package.dir,
                });
            }
        }
        Ok(planned)
    }

    fn expand(&self, root: &str) -> Result<ClosureSet> {
        ClosureExpander::new(self.resolver.as_ref(), &self.ctx)
            .expand(root)
            .map_err(|source| Error::Expand {
                root: root.to_owned(),
                source,
            })
    }
}
