use std::sync::Arc;

use clap::Parser;
use copystd_clap_blocks::{relocate::RelocateConfig, toolchain::ToolchainConfig};
use copystd_relocate::{Idempotence, Relocator, SourceFormatter, context};
use observability_deps::tracing::info;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("cannot locate the source tree, pass --src or set GOROOT: {0}")]
    SourceRoot(#[source] copystd_resolver::Error),

    #[error("invalid destination module: {0}")]
    Context(#[from] context::Error),
}

/// Arguments shared by every command that walks the package closure.
#[derive(Debug, Parser)]
pub(crate) struct RelocationArgs {
    #[clap(flatten)]
    pub(crate) relocate: RelocateConfig,

    #[clap(flatten)]
    pub(crate) toolchain: ToolchainConfig,
}

impl RelocationArgs {
    /// Build the relocator; `formatter` and `idempotence` only matter to commands that write.
    pub(crate) fn relocator(
        &self,
        formatter: Arc<dyn SourceFormatter>,
        idempotence: Idempotence,
    ) -> Result<Relocator, Error> {
        let src_root = self
            .toolchain
            .source_root(self.relocate.src.as_deref())
            .map_err(Error::SourceRoot)?;
        let ctx = self.relocate.context(src_root)?.with_idempotence(idempotence);
        info!(
            module = ctx.module(),
            src = %ctx.src_root().display(),
            dst = %ctx.dst_root().display(),
            idempotence = ?ctx.idempotence(),
            ?formatter,
            "relocation configured"
        );

        Ok(Relocator::new(
            Arc::new(self.toolchain.resolver()),
            formatter,
            ctx,
        ))
    }

    pub(crate) fn roots(&self) -> &[String] {
        &self.relocate.packages
    }
}
