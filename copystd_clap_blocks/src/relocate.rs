//! Config for what gets relocated and where.
use std::path::PathBuf;

use copystd_relocate::{RelocationContext, RelocationRule, RelocationTable, context};

use crate::list::SeparatedList;

/// Selects the root packages, the public module they move into and the layout of the copy.
#[derive(Debug, Clone, clap::Parser)]
pub struct RelocateConfig {
    /// Comma separated import paths of the restricted packages to relocate, for example
    /// `internal/trace,cmd/internal/objabi`
    #[clap(short = 'p', long = "packages", env = "COPYSTD_PACKAGES")]
    pub packages: SeparatedList<String>,

    /// Import path of the module that receives the relocated packages
    #[clap(short = 'm', long = "module", env = "COPYSTD_MODULE")]
    pub module: String,

    /// Root of the source tree to copy from, defaults to `$GOROOT/src`
    #[clap(long = "src", env = "COPYSTD_SRC")]
    pub src: Option<PathBuf>,

    /// Root of the module the packages are copied into
    #[clap(long = "dst", env = "COPYSTD_DST", default_value = ".")]
    pub dst: PathBuf,

    /// A relocation rule `restricted=public`. May be repeated; rules are tried in order and
    /// replace the built-in standard library table
    #[clap(long = "rule")]
    pub rules: Vec<RelocationRule>,

    /// Also follow imports that only the packages' tests make
    #[clap(long = "include-test-imports", env = "COPYSTD_INCLUDE_TEST_IMPORTS")]
    pub include_test_imports: bool,
}

impl RelocateConfig {
    pub fn table(&self) -> RelocationTable {
        if self.rules.is_empty() {
            RelocationTable::go_std()
        } else {
            RelocationTable::new(self.rules.iter().cloned())
        }
    }

    /// Build the relocation context, copying from `src_root`.
    pub fn context(&self, src_root: PathBuf) -> Result<RelocationContext, context::Error> {
        Ok(
            RelocationContext::new(&self.module, src_root, &self.dst, self.table())?
                .with_test_imports(self.include_test_imports),
        )
    }
}
