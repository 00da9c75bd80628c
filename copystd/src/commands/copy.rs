use clap::Parser;
use copystd_clap_blocks::output::OutputConfig;
use copystd_relocate::{PackageOutcome, RootState, WriteStatus, relocator};

use super::common::{self, RelocationArgs};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Setup(#[from] common::Error),

    #[error(transparent)]
    Relocate(#[from] relocator::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Parser)]
#[clap(visible_alias = "c")]
pub(crate) struct Config {
    #[clap(flatten)]
    args: RelocationArgs,

    #[clap(flatten)]
    output: OutputConfig,

    #[clap(flatten)]
    pub(crate) logging_config: trogging::cli::LoggingConfig,
}

pub(crate) fn command(config: Config) -> Result<()> {
    let relocator = config
        .args
        .relocator(config.output.formatter(), config.output.idempotence())?;
    let report = relocator.run(config.args.roots())?;

    for root in &report.roots {
        let copied = root
            .packages
            .iter()
            .filter(|p| matches!(p, PackageOutcome::Rewritten { .. }))
            .count();
        match root.state {
            RootState::Rewritten => println!("{}: {copied} package(s) copied", root.root),
            RootState::Skipped => println!("{}: nothing to copy", root.root),
        }
    }
    println!(
        "{} file(s) written, {} already up to date",
        report.files(WriteStatus::Written),
        report.files(WriteStatus::Unchanged)
    );

    Ok(())
}
