use std::sync::Arc;

use clap::Parser;

use copystd_relocate::{Idempotence, PassthroughFormatter, relocator};

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
pub(crate) struct Config {
    #[clap(flatten)]
    args: RelocationArgs,

    #[clap(flatten)]
    pub(crate) logging_config: trogging::cli::LoggingConfig,
}

pub(crate) fn command(config: Config) -> Result<()> {
    let relocator = config
        .args
        .relocator(Arc::new(PassthroughFormatter), Idempotence::default())?;

    for planned in relocator.plan(config.args.roots())? {
        match (&planned.destination_import_path, &planned.destination_dir) {
            (Some(import_path), Some(dir)) => println!(
                "{} -> {import_path} ({})",
                planned.import_path,
                dir.display()
            ),
            _ => println!("{} -> not relocated", planned.import_path),
        }
    }

    Ok(())
}
