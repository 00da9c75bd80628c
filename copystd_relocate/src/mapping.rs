//! Mapping of restricted source locations and import paths onto the public module.
use std::borrow::Cow;
use std::fmt::Display;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::context::RelocationContext;
use crate::literal::{is_import_path, rewrite_import_literals};

/// Moves everything below `restricted` to the same relative location below `public`.
///
/// Matching is segment aware: `internal` matches `internal` and `internal/abi`, never
/// `internalx`. An empty `public` prefix places the subtree directly at the module root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelocationRule {
    restricted: String,
    public: String,
}

impl RelocationRule {
    pub fn new(restricted: impl Into<String>, public: impl Into<String>) -> Self {
        Self {
            restricted: trim_slashes(restricted.into()),
            public: trim_slashes(public.into()),
        }
    }

    pub fn restricted(&self) -> &str {
        &self.restricted
    }

    pub fn public(&self) -> &str {
        &self.public
    }

    /// The part of `path` below the restricted prefix, or `None` if the rule does not apply.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.restricted.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

impl Display for RelocationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.restricted, self.public)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("relocation rule {0:?} must be of the form RESTRICTED=PUBLIC")]
    MissingSeparator(String),

    #[error("relocation rule {0:?} has an empty restricted prefix")]
    EmptyRestricted(String),
}

impl FromStr for RelocationRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (restricted, public) = s
            .split_once('=')
            .ok_or_else(|| RuleParseError::MissingSeparator(s.to_owned()))?;
        let rule = Self::new(restricted.trim(), public.trim());
        if rule.restricted.is_empty() {
            return Err(RuleParseError::EmptyRestricted(s.to_owned()));
        }
        Ok(rule)
    }
}

/// Ordered list of [`RelocationRule`]s. The first rule that matches a path wins; a path that no
/// rule matches is not relocated at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTable {
    rules: Vec<RelocationRule>,
}

impl RelocationTable {
    pub fn new(rules: impl IntoIterator<Item = RelocationRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// The table for the Go standard library tree.
    ///
    /// The `internal` directories of the individual commands get a subtree of their own so
    /// that, for example, `cmd/compile/internal/ssa` and `cmd/link/internal/ld` cannot collide
    /// with each other or with `cmd/internal/obj`.
    pub fn go_std() -> Self {
        Self::new([
            RelocationRule::new("cmd/asm/internal", "asm"),
            RelocationRule::new("cmd/compile/internal", "compile"),
            RelocationRule::new("cmd/go/internal", "go"),
            RelocationRule::new("cmd/link/internal", "link"),
            RelocationRule::new("cmd/internal", ""),
            RelocationRule::new("internal", ""),
        ])
    }

    pub fn rules(&self) -> &[RelocationRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first rule matching `path`, with the remainder of `path` below its prefix.
    pub fn lookup<'p>(&self, path: &'p str) -> Option<(&RelocationRule, &'p str)> {
        self.rules
            .iter()
            .find_map(|rule| rule.strip(path).map(|rest| (rule, rest)))
    }

    /// Whether `import_path` names a restricted package that should be relocated.
    pub fn is_restricted(&self, import_path: &str) -> bool {
        self.lookup(import_path).is_some()
    }
}

impl Default for RelocationTable {
    fn default() -> Self {
        Self::go_std()
    }
}

/// Applies a [`RelocationContext`]'s table to directories and import paths.
///
/// Both mappings go through the same rule lookup, so a package copied to
/// `<dst>/<public>/<rest>` is always imported as `<module>/<public>/<rest>`.
#[derive(Debug, Clone, Copy)]
pub struct PathMapper<'a> {
    ctx: &'a RelocationContext,
}

impl<'a> PathMapper<'a> {
    pub(crate) fn new(ctx: &'a RelocationContext) -> Self {
        Self { ctx }
    }

    /// The import path a restricted package has in the public module.
    pub fn map_import_path(&self, import_path: &str) -> Option<String> {
        let (rule, rest) = self.ctx.table().lookup(import_path)?;
        Some(self.public_path(rule, rest))
    }

    /// The replacement for a string literal found in source. Only a well-formed import path
    /// strictly below a rule's prefix maps, so literals such as `"internal"` or `"internal/"`
    /// that name the prefix itself keep their meaning.
    pub fn map_import_literal(&self, literal: &str) -> Option<String> {
        if !is_import_path(literal) {
            return None;
        }
        let (rule, rest) = self.ctx.table().lookup(literal)?;
        (!rest.is_empty()).then(|| self.public_path(rule, rest))
    }

    fn public_path(&self, rule: &RelocationRule, rest: &str) -> String {
        [self.ctx.module(), rule.public(), rest]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Where the sources in `source_dir` land below the destination root.
    pub fn map_destination(&self, source_dir: &Path) -> Option<PathBuf> {
        let relative = self.relative_source(source_dir)?;
        let (rule, rest) = self.ctx.table().lookup(&relative)?;

        let mut destination = self.ctx.dst_root().to_path_buf();
        destination.extend(
            rule.public()
                .split('/')
                .chain(rest.split('/'))
                .filter(|s| !s.is_empty()),
        );
        Some(destination)
    }

    /// `source_dir` relative to the source root as a slash separated path, in the same form as
    /// an import path.
    pub fn relative_source(&self, source_dir: &Path) -> Option<String> {
        let relative = strip_root(source_dir, self.ctx.src_root())?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(segments.join("/"))
    }

    /// Rewrite every string literal in `source` that names a restricted import path.
    pub fn rewrite_source<'s>(&self, source: &'s [u8]) -> Cow<'s, [u8]> {
        rewrite_import_literals(source, |literal| self.map_import_literal(literal))
    }
}

fn strip_root(dir: &Path, root: &Path) -> Option<PathBuf> {
    if let Ok(relative) = dir.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }
    // the metadata tool reports resolved paths; the root may have been given through a symlink
    let dir = std::fs::canonicalize(dir).ok()?;
    let root = std::fs::canonicalize(root).ok()?;
    dir.strip_prefix(root).ok().map(Path::to_path_buf)
}

fn trim_slashes(s: String) -> String {
    let trimmed = s.trim_matches('/');
    if trimmed.len() == s.len() {
        s
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> RelocationContext {
        RelocationContext::new(
            "example.com/x",
            "/go/src",
            "/work/x",
            RelocationTable::go_std(),
        )
        .unwrap()
    }

    #[test]
    fn rule_matching_is_segment_aware() {
        let rule = RelocationRule::new("internal", "");
        assert_eq!(rule.strip("internal"), Some(""));
        assert_eq!(rule.strip("internal/abi"), Some("abi"));
        assert_eq!(rule.strip("internal/runtime/atomic"), Some("runtime/atomic"));
        assert_eq!(rule.strip("internalx/abi"), None);
        assert_eq!(rule.strip("mything/internal/foo"), None);
    }

    #[test]
    fn parse_rules() {
        assert_eq!(
            "cmd/go/internal=go".parse::<RelocationRule>().unwrap(),
            RelocationRule::new("cmd/go/internal", "go")
        );
        assert_eq!(
            "/internal/ = ".parse::<RelocationRule>().unwrap(),
            RelocationRule::new("internal", "")
        );
        assert_eq!(
            "internal".parse::<RelocationRule>().unwrap_err(),
            RuleParseError::MissingSeparator("internal".into())
        );
        assert_eq!(
            "=pub".parse::<RelocationRule>().unwrap_err(),
            RuleParseError::EmptyRestricted("=pub".into())
        );
        assert_eq!(RelocationRule::new("cmd/internal", "").to_string(), "cmd/internal=");
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = RelocationTable::go_std();
        let (rule, rest) = table.lookup("cmd/compile/internal/ssa").unwrap();
        assert_eq!(rule, &RelocationRule::new("cmd/compile/internal", "compile"));
        assert_eq!(rest, "ssa");

        let (rule, rest) = table.lookup("cmd/internal/obj/x86").unwrap();
        assert_eq!(rule, &RelocationRule::new("cmd/internal", ""));
        assert_eq!(rest, "obj/x86");

        // a broad rule listed first shadows the narrower one
        let shadowed = RelocationTable::new([
            RelocationRule::new("cmd", "tools"),
            RelocationRule::new("cmd/internal", ""),
        ]);
        assert_eq!(shadowed.lookup("cmd/internal/obj").unwrap().1, "internal/obj");
    }

    #[test]
    fn map_import_paths() {
        let ctx = ctx();
        let mapper = ctx.mapper();
        assert_eq!(
            mapper.map_import_path("internal/foo").as_deref(),
            Some("example.com/x/foo")
        );
        assert_eq!(
            mapper.map_import_path("internal/runtime/atomic").as_deref(),
            Some("example.com/x/runtime/atomic")
        );
        assert_eq!(
            mapper.map_import_path("cmd/go/internal/modload").as_deref(),
            Some("example.com/x/go/modload")
        );
        assert_eq!(
            mapper.map_import_path("cmd/internal/objabi").as_deref(),
            Some("example.com/x/objabi")
        );
        assert_eq!(mapper.map_import_path("fmt"), None);
        assert_eq!(mapper.map_import_path("mything/internal/foo"), None);
    }

    #[test]
    fn mapped_paths_do_not_map_again() {
        let ctx = ctx();
        let mapper = ctx.mapper();
        for path in [
            "internal/foo",
            "cmd/compile/internal/types2",
            "cmd/internal/obj",
            "cmd/link/internal/ld",
        ] {
            let mapped = mapper.map_import_path(path).unwrap();
            assert_eq!(mapper.map_import_path(&mapped), None, "{mapped}");
        }
    }

    #[test]
    fn literals_naming_a_rule_prefix_are_kept() {
        let ctx = ctx();
        let source = r#"func findInternal(path string) (index int, ok bool) {
	switch {
	case path == "internal", path == "cmd/internal",
		strings.HasPrefix(path, "internal/"):
		return 0, true
	}
	return len("internal"), strings.Contains(path, "/internal/")
}
"#;
        assert_eq!(
            String::from_utf8_lossy(&ctx.mapper().rewrite_source(source.as_bytes())),
            source
        );

        let mapper = ctx.mapper();
        assert_eq!(mapper.map_import_literal("internal"), None);
        assert_eq!(mapper.map_import_literal("internal/"), None);
        assert_eq!(mapper.map_import_literal("cmd/go/internal"), None);
        assert_eq!(mapper.map_import_literal("internal//abi"), None);
        assert_eq!(
            mapper.map_import_literal("cmd/go/internal/load").as_deref(),
            Some("example.com/x/go/load")
        );
    }

    #[test]
    fn map_destinations() {
        let ctx = ctx();
        let mapper = ctx.mapper();
        assert_eq!(
            mapper.map_destination(Path::new("/go/src/internal/foo")),
            Some(PathBuf::from("/work/x/foo"))
        );
        assert_eq!(
            mapper.map_destination(Path::new("/go/src/cmd/asm/internal/arch")),
            Some(PathBuf::from("/work/x/asm/arch"))
        );
        assert_eq!(
            mapper.map_destination(Path::new("/go/src/cmd/internal/obj/arm64")),
            Some(PathBuf::from("/work/x/obj/arm64"))
        );
        // outside the restricted subtrees, or outside the source root altogether
        assert_eq!(mapper.map_destination(Path::new("/go/src/fmt")), None);
        assert_eq!(mapper.map_destination(Path::new("/elsewhere/internal/foo")), None);
        assert_eq!(mapper.map_destination(Path::new("/work/x/foo")), None);
    }

    #[test]
    fn relative_source_uses_slashes() {
        let ctx = ctx();
        assert_eq!(
            ctx.mapper()
                .relative_source(Path::new("/go/src/cmd/compile/internal/ssa"))
                .as_deref(),
            Some("cmd/compile/internal/ssa")
        );
        assert_eq!(
            ctx.mapper().relative_source(Path::new("/go/src")).as_deref(),
            Some("")
        );
    }
}
