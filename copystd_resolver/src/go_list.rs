use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use observability_deps::tracing::debug;

use crate::{Error, Package, PackageResolver, Result, Stderr};

/// Resolves packages with `go list -json -e`.
///
/// Because `-e` is passed, packages that fail to load are reported as records with their
/// `error` set, and the call itself only fails when no JSON result could be obtained at all:
/// the `go` command is missing, the arguments are invalid, or the output is malformed.
#[derive(Debug, Clone)]
pub struct GoListResolver {
    go_binary: PathBuf,
}

impl GoListResolver {
    pub const DEFAULT_GO_BINARY: &'static str = "go";

    pub fn new(go_binary: impl Into<PathBuf>) -> Self {
        Self {
            go_binary: go_binary.into(),
        }
    }

    pub fn go_binary(&self) -> &Path {
        &self.go_binary
    }

    /// The root of the Go installation, honouring an explicit `GOROOT` in the environment
    /// before asking `go env`.
    pub fn goroot(&self) -> Result<PathBuf> {
        if let Some(goroot) = std::env::var_os("GOROOT").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(goroot));
        }

        let mut cmd = Command::new(&self.go_binary);
        cmd.args(["env", "GOROOT"]);
        let command = describe(&cmd);

        let output = cmd.output().map_err(|source| Error::Spawn {
            command: command.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(Error::Exit {
                command,
                status: output.status,
                stderr: Stderr::new(&output.stderr),
            });
        }

        Ok(PathBuf::from(
            String::from_utf8_lossy(&output.stdout).trim(),
        ))
    }
}

impl Default for GoListResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GO_BINARY)
    }
}

impl PackageResolver for GoListResolver {
    fn resolve(&self, search_root: &Path, args: &[String]) -> Result<Vec<Package>> {
        let mut cmd = Command::new(&self.go_binary);
        cmd.args(["list", "-json", "-e"])
            .args(args)
            .current_dir(search_root)
            .env("PWD", search_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let command = describe(&cmd);
        debug!(%command, search_root = %search_root.display(), "resolving packages");

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            command: command.clone(),
            source,
        })?;
        let stderr_drain = drain_stderr(&mut child);

        let decoded = match child.stdout.take() {
            Some(stdout) => decode_packages(BufReader::new(stdout)),
            None => Ok(Vec::new()),
        };
        if decoded.is_err() {
            // the child may be blocked writing the rest of a record nobody will read
            let _ = child.kill();
        }

        let status = child.wait().map_err(|source| Error::Io {
            command: command.clone(),
            source,
        })?;
        let stderr = Stderr::new(&stderr_drain.join().unwrap_or_default());

        let packages = decoded.map_err(|source| Error::Decode {
            command: command.clone(),
            source,
            stderr: stderr.clone(),
        })?;
        if !status.success() {
            return Err(Error::Exit {
                command,
                status,
                stderr,
            });
        }

        debug!(%command, packages = packages.len(), "resolved packages");
        Ok(packages)
    }
}

/// Decode a stream of concatenated JSON package records until end of input.
pub fn decode_packages<R: Read>(reader: R) -> Result<Vec<Package>, serde_json::Error> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<Package>()
        .collect()
}

/// Collect the child's stderr on a separate thread so that a full stderr pipe can never stall
/// the decoding of stdout.
fn drain_stderr(child: &mut Child) -> JoinHandle<Vec<u8>> {
    let stderr = child.stderr.take();
    std::thread::spawn(move || stderr.map(read_stderr).unwrap_or_default())
}

/// Everything readable from `stderr`. A read error ends the capture and is noted in the text
/// so a truncated message is recognisable as such.
fn read_stderr<R: Read>(mut stderr: R) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut buf) {
        debug!(%e, captured = buf.len(), "failed to read stderr of go command");
        if !buf.is_empty() && !buf.ends_with(b"\n") {
            buf.push(b'\n');
        }
        buf.extend_from_slice(format!("[stderr truncated: {e}]").as_bytes());
    }
    buf
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
