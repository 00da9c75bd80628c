//! Config for how relocated files are written.
use std::path::PathBuf;
use std::sync::Arc;

use copystd_relocate::{
    GofmtFormatter, GoimportsFormatter, Idempotence, PassthroughFormatter, SourceFormatter,
};

/// Picks the formatter applied to relocated files and how reruns treat existing output.
#[derive(Debug, Clone, clap::Parser)]
pub struct OutputConfig {
    /// Formatter applied to every relocated file
    #[clap(long = "formatter", env = "COPYSTD_FORMATTER", default_value = "goimports")]
    pub formatter: FormatterKind,

    #[clap(
        long = "goimports-binary",
        env = "COPYSTD_GOIMPORTS",
        default_value = GoimportsFormatter::DEFAULT_BINARY
    )]
    pub goimports_binary: PathBuf,

    #[clap(
        long = "gofmt-binary",
        env = "COPYSTD_GOFMT",
        default_value = GofmtFormatter::DEFAULT_BINARY
    )]
    pub gofmt_binary: PathBuf,

    /// How reruns detect destination files that are already up to date
    #[clap(
        long = "idempotence",
        env = "COPYSTD_IDEMPOTENCE",
        default_value = "content-hash"
    )]
    pub idempotence: IdempotenceMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatterKind {
    /// Format and group imports, keeping the target module's imports separate
    #[default]
    Goimports,
    /// Format without touching imports
    Gofmt,
    /// Write files exactly as rewritten
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum IdempotenceMode {
    /// Skip files whose destination already holds identical content
    #[default]
    ContentHash,
    /// Skip packages whose destination directory is not empty
    PackageDir,
}

impl From<IdempotenceMode> for Idempotence {
    fn from(mode: IdempotenceMode) -> Self {
        match mode {
            IdempotenceMode::ContentHash => Self::ContentHash,
            IdempotenceMode::PackageDir => Self::PackageDir,
        }
    }
}

impl OutputConfig {
    pub fn formatter(&self) -> Arc<dyn SourceFormatter> {
        match self.formatter {
            FormatterKind::Goimports => Arc::new(GoimportsFormatter::new(&self.goimports_binary)),
            FormatterKind::Gofmt => Arc::new(GofmtFormatter::new(&self.gofmt_binary)),
            FormatterKind::None => Arc::new(PassthroughFormatter),
        }
    }

    pub fn idempotence(&self) -> Idempotence {
        self.idempotence.into()
    }
}
