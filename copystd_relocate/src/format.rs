//! Formatting and import organization of rewritten sources.
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use observability_deps::tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to communicate with {program:?}: {source}")]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program:?} could not format {}: {stderr}", filename.display())]
    Failed {
        program: PathBuf,
        filename: PathBuf,
        stderr: String,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reformats a Go source file and organizes its import block.
pub trait SourceFormatter: Debug + Send + Sync + 'static {
    /// Format `source`, which will be written to `filename`. Imports starting with
    /// `local_prefix` are grouped separately from third-party imports.
    fn format(&self, filename: &Path, local_prefix: &str, source: &[u8]) -> Result<Vec<u8>>;
}

/// Pipes sources through `goimports`.
#[derive(Debug, Clone)]
pub struct GoimportsFormatter {
    binary: PathBuf,
}

impl GoimportsFormatter {
    pub const DEFAULT_BINARY: &'static str = "goimports";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for GoimportsFormatter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BINARY)
    }
}

impl SourceFormatter for GoimportsFormatter {
    fn format(&self, filename: &Path, local_prefix: &str, source: &[u8]) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.binary);
        if !local_prefix.is_empty() {
            cmd.arg("-local").arg(local_prefix);
        }
        // goimports resolves missing imports relative to the directory the file will live in
        if let Some(dir) = filename.parent().filter(|d| d.is_dir()) {
            cmd.arg("-srcdir").arg(dir);
        }
        pipe_through(cmd, &self.binary, filename, source)
    }
}

/// Pipes sources through `gofmt`, which formats but leaves imports as they are.
#[derive(Debug, Clone)]
pub struct GofmtFormatter {
    binary: PathBuf,
}

impl GofmtFormatter {
    pub const DEFAULT_BINARY: &'static str = "gofmt";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for GofmtFormatter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BINARY)
    }
}

impl SourceFormatter for GofmtFormatter {
    fn format(&self, filename: &Path, _local_prefix: &str, source: &[u8]) -> Result<Vec<u8>> {
        pipe_through(Command::new(&self.binary), &self.binary, filename, source)
    }
}

/// Writes sources exactly as rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFormatter;

impl SourceFormatter for PassthroughFormatter {
    fn format(&self, _filename: &Path, _local_prefix: &str, source: &[u8]) -> Result<Vec<u8>> {
        Ok(source.to_vec())
    }
}

fn pipe_through(
    mut cmd: Command,
    program: &Path,
    filename: &Path,
    source: &[u8],
) -> Result<Vec<u8>> {
    debug!(program = %program.display(), filename = %filename.display(), "formatting");
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    // feed stdin from another thread; the formatter may start writing before it has read
    // everything, and both pipes have bounded buffers
    let feeder = child.stdin.take().map(|mut stdin| {
        let input = source.to_vec();
        std::thread::spawn(move || stdin.write_all(&input))
    });

    let output = child.wait_with_output().map_err(|source| Error::Io {
        program: program.to_path_buf(),
        source,
    })?;
    let fed = feeder.map(|handle| handle.join());

    if !output.status.success() {
        return Err(Error::Failed {
            program: program.to_path_buf(),
            filename: filename.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
        });
    }
    if let Some(Ok(Err(source))) = fed {
        return Err(Error::Io {
            program: program.to_path_buf(),
            source,
        });
    }

    Ok(output.stdout)
}
