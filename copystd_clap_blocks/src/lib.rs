//! Building blocks for [`clap`]-driven configs.
pub mod list;
pub mod output;
pub mod relocate;
pub mod toolchain;
