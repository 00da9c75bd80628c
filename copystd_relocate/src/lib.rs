//! Relocation of restricted Go standard library packages into a public module.
//!
//! A [`Relocator`] takes each requested root package, expands it into the closure of restricted
//! packages it transitively imports ([`ClosureExpander`]), maps every member onto the public
//! module ([`PathMapper`]) and writes rewritten, formatted copies into the destination tree
//! ([`FileRewriter`]).

pub mod closure;
pub mod context;
pub mod format;
mod literal;
pub mod mapping;
pub mod relocator;
pub mod rewrite;

#[cfg(test)]
mod test_util;

pub use closure::{ClosureExpander, ClosureSet};
pub use context::{Idempotence, RelocationContext};
pub use format::{GofmtFormatter, GoimportsFormatter, PassthroughFormatter, SourceFormatter};
pub use mapping::{PathMapper, RelocationRule, RelocationTable, RuleParseError};
pub use relocator::{PlannedPackage, Relocator, RootReport, RootState, RunReport};
pub use rewrite::{
    BOOTSTRAP_SENTINEL, FileOutcome, FileRewriter, PackageOutcome, RewriteResult, WriteStatus,
};
