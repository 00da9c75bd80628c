//! Materialization of relocated packages in the destination tree.
use std::path::{Path, PathBuf};

use copystd_resolver::Package;
use observability_deps::tracing::{debug, info};
use sha2::{Digest, Sha256};

use crate::context::{Idempotence, RelocationContext};
use crate::format::{self, SourceFormatter};

/// Generated by the toolchain bootstrap; the destination must generate its own.
pub const BOOTSTRAP_SENTINEL: &str = "zbootstrap.go";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to inspect destination {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] format::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Whether a destination file was touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// The destination already held exactly this content
    Unchanged,
}

/// One relocated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub destination: PathBuf,
    pub content: Vec<u8>,
    pub status: WriteStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten(RewriteResult),
    /// The bootstrap sentinel, never copied
    Sentinel,
    /// No relocation rule covers the package directory
    Unmapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Rewritten {
        import_path: String,
        destination: PathBuf,
        files: Vec<FileOutcome>,
    },
    /// With [`Idempotence::PackageDir`], a destination that already has content
    AlreadyPopulated {
        import_path: String,
        destination: PathBuf,
    },
    Unmapped {
        import_path: String,
    },
}

impl PackageOutcome {
    pub fn import_path(&self) -> &str {
        match self {
            Self::Rewritten { import_path, .. }
            | Self::AlreadyPopulated { import_path, .. }
            | Self::Unmapped { import_path } => import_path,
        }
    }

    /// Number of files with the given status
    pub fn count(&self, status: WriteStatus) -> usize {
        match self {
            Self::Rewritten { files, .. } => files
                .iter()
                .filter(|f| matches!(f, FileOutcome::Rewritten(r) if r.status == status))
                .count(),
            _ => 0,
        }
    }
}

/// Copies the files of a package to their relocated destination with import literals rewritten
/// and the result formatted.
#[derive(Debug, Clone, Copy)]
pub struct FileRewriter<'a> {
    ctx: &'a RelocationContext,
    formatter: &'a dyn SourceFormatter,
}

impl<'a> FileRewriter<'a> {
    pub fn new(ctx: &'a RelocationContext, formatter: &'a dyn SourceFormatter) -> Self {
        Self { ctx, formatter }
    }

    /// Rewrite every file of `package`, in role order: regular, test, external test, ignored.
    pub fn rewrite_package(&self, package: &Package) -> Result<PackageOutcome> {
        let import_path = package.import_path.clone();
        let Some(destination) = self.ctx.mapper().map_destination(&package.dir) else {
            info!(
                %import_path,
                dir = %package.dir.display(),
                "no relocation rule for package, not copying"
            );
            return Ok(PackageOutcome::Unmapped { import_path });
        };

        if self.ctx.idempotence() == Idempotence::PackageDir && is_populated(&destination)? {
            info!(
                %import_path,
                destination = %destination.display(),
                "destination already populated, skipping package"
            );
            return Ok(PackageOutcome::AlreadyPopulated {
                import_path,
                destination,
            });
        }

        let files = package
            .source_files()
            .map(|file_name| self.rewrite_file(package, file_name))
            .collect::<Result<Vec<_>>>()?;

        let outcome = PackageOutcome::Rewritten {
            import_path,
            destination,
            files,
        };
        info!(
            import_path = %outcome.import_path(),
            written = outcome.count(WriteStatus::Written),
            unchanged = outcome.count(WriteStatus::Unchanged),
            "relocated package"
        );
        Ok(outcome)
    }

    /// Rewrite a single file of `package` to its destination.
    pub fn rewrite_file(&self, package: &Package, file_name: &str) -> Result<FileOutcome> {
        if file_name == BOOTSTRAP_SENTINEL {
            debug!(import_path = %package.import_path, "skipping bootstrap sentinel");
            return Ok(FileOutcome::Sentinel);
        }
        let mapper = self.ctx.mapper();
        let Some(dir) = mapper.map_destination(&package.dir) else {
            return Ok(FileOutcome::Unmapped);
        };

        let source_path = package.dir.join(file_name);
        let body = std::fs::read(&source_path).map_err(|source| Error::Read {
            path: source_path.clone(),
            source,
        })?;
        let body = mapper.rewrite_source(&body);

        std::fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let destination = dir.join(file_name);
        let content = self
            .formatter
            .format(&destination, self.ctx.module(), &body)?;

        let status = match self.ctx.idempotence() {
            Idempotence::ContentHash => write_if_changed(&destination, &content)?,
            Idempotence::PackageDir => {
                write(&destination, &content)?;
                WriteStatus::Written
            }
        };
        debug!(
            source = %source_path.display(),
            destination = %destination.display(),
            ?status,
            "rewrote file"
        );

        Ok(FileOutcome::Rewritten(RewriteResult {
            destination,
            content,
            status,
        }))
    }
}

fn is_populated(dir: &Path) -> Result<bool> {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::Inspect {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

fn write_if_changed(path: &Path, content: &[u8]) -> Result<WriteStatus> {
    let existing = match std::fs::read(path) {
        Ok(existing) => Some(existing),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(Error::Inspect {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let digest = Sha256::digest(content);
    if existing.is_some_and(|existing| Sha256::digest(existing) == digest) {
        debug!(path = %path.display(), sha256 = %hex::encode(digest), "content unchanged");
        return Ok(WriteStatus::Unchanged);
    }

    write(path, content)?;
    Ok(WriteStatus::Written)
}

fn write(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}
