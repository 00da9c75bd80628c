//! Textual rewriting of import path literals in Go source.
//!
//! The source is not parsed. A small scanner walks the bytes, steps over comments and rune
//! literals, and offers the content of every interpreted (`"..."`) and raw (`` `...` ``) string
//! literal to a mapping function. A literal is replaced only when its whole content maps, so
//! `"internal/foo"` can be rewritten while `"mything/internal/foo"` or an `internal/` that
//! merely appears inside a comment is left alone. The source need not be valid UTF-8; literals
//! that are not are never offered.
use std::borrow::Cow;

pub(crate) fn rewrite_import_literals<'s, F>(source: &'s [u8], mut map: F) -> Cow<'s, [u8]>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut rewritten: Option<Vec<u8>> = None;
    let mut copied = 0;
    let mut i = 0;

    while i < source.len() {
        match source[i] {
            b'/' if source.get(i + 1) == Some(&b'/') => {
                i = find(source, i + 2, b'\n').unwrap_or(source.len());
            }
            b'/' if source.get(i + 1) == Some(&b'*') => {
                i = find_block_comment_end(source, i + 2);
            }
            b'\'' => {
                i = match find_quoted_end(source, i + 1, b'\'') {
                    Some(end) => end + 1,
                    None => find(source, i + 1, b'\n').unwrap_or(source.len()),
                };
            }
            quote @ (b'"' | b'`') => {
                let start = i + 1;
                let end = if quote == b'`' {
                    find(source, start, b'`')
                } else {
                    find_quoted_end(source, start, b'"')
                };
                let Some(end) = end else {
                    // unterminated: resume on the next line
                    i = find(source, start, b'\n').unwrap_or(source.len());
                    continue;
                };

                let mapped = std::str::from_utf8(&source[start..end])
                    .ok()
                    .and_then(|literal| map(literal));
                if let Some(mapped) = mapped {
                    let buf = rewritten.get_or_insert_with(|| Vec::with_capacity(source.len()));
                    buf.extend_from_slice(&source[copied..start]);
                    buf.extend_from_slice(mapped.as_bytes());
                    copied = end;
                }
                i = end + 1;
            }
            _ => i += 1,
        }
    }

    match rewritten {
        Some(mut buf) => {
            buf.extend_from_slice(&source[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(source),
    }
}

/// Whether `literal` has the shape of an import path: non-empty, slash separated segments
/// without empty, `.` or `..` segments, and no whitespace, quotes or backslashes.
pub(crate) fn is_import_path(literal: &str) -> bool {
    !literal.is_empty()
        && literal
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
        && !literal
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '`' | '\\' | '\''))
}

fn find(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| from + pos)
}

fn find_block_comment_end(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .and_then(|rest| rest.windows(2).position(|w| w == b"*/"))
        .map_or(bytes.len(), |pos| from + pos + 2)
}

/// Index of the closing `quote` of an escaped literal starting at `from`. Literals of this kind
/// cannot span lines, so a newline ends the search.
fn find_quoted_end(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn internal_to_example(literal: &str) -> Option<String> {
        literal
            .strip_prefix("internal/")
            .map(|rest| format!("example.com/x/{rest}"))
    }

    fn rewrite(source: &str) -> String {
        let rewritten = rewrite_import_literals(source.as_bytes(), internal_to_example);
        String::from_utf8(rewritten.into_owned()).unwrap()
    }

    #[test]
    fn rewrites_import_declarations() {
        let source = r#"package foo

import "internal/bar"

import (
	"fmt"
	abi "internal/abi"
	_ "internal/cpu"
	"mything/internal/foo"
)
"#;
        let expected = r#"package foo

import "example.com/x/bar"

import (
	"fmt"
	abi "example.com/x/abi"
	_ "example.com/x/cpu"
	"mything/internal/foo"
)
"#;
        assert_eq!(rewrite(source), expected);
    }

    #[test]
    fn raw_string_imports() {
        assert_eq!(
            rewrite("import `internal/bar`\nvar s = `a\ninternal/x`\n"),
            "import `example.com/x/bar`\nvar s = `a\ninternal/x`\n"
        );
    }

    #[test]
    fn comments_and_runes_are_skipped() {
        let source = r#"// see "internal/bar" for details
/* "internal/bar" isn't imported here */
var q = '"'
var e = '\''
import "internal/bar" // don't "internal/baz"
"#;
        let expected = r#"// see "internal/bar" for details
/* "internal/bar" isn't imported here */
var q = '"'
var e = '\''
import "example.com/x/bar" // don't "internal/baz"
"#;
        assert_eq!(rewrite(source), expected);
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let source = "var s = \"say \\\"internal/bar\\\"\"\nimport \"internal/bar\"\n";
        let expected = "var s = \"say \\\"internal/bar\\\"\"\nimport \"example.com/x/bar\"\n";
        assert_eq!(rewrite(source), expected);
    }

    #[test]
    fn unterminated_literal_does_not_stop_the_scan() {
        assert_eq!(
            rewrite("var s = \"broken\nimport \"internal/bar\"\n"),
            "var s = \"broken\nimport \"example.com/x/bar\"\n"
        );
    }

    #[test]
    fn untouched_source_is_borrowed() {
        let source = b"package fmt\n\nimport \"strconv\"\n// internal/bar\n";
        let rewritten = rewrite_import_literals(source, internal_to_example);
        assert!(matches!(rewritten, Cow::Borrowed(s) if s == source));
    }

    #[test]
    fn invalid_utf8_is_carried_through() {
        let source = b"// \xff\xfe latin-1\nimport \"internal/bar\"\nvar b = \"\xe9t\xe9\"\n";
        let rewritten = rewrite_import_literals(source, internal_to_example);
        assert_eq!(
            &*rewritten,
            &b"// \xff\xfe latin-1\nimport \"example.com/x/bar\"\nvar b = \"\xe9t\xe9\"\n"[..]
        );
    }

    #[test]
    fn import_path_shape() {
        for path in ["internal/abi", "example.com/x/foo", "golang.org/x/net/http2", "a"] {
            assert!(is_import_path(path), "{path}");
        }
        for literal in [
            "",
            "internal/",
            "/internal/abi",
            "internal//abi",
            "internal/./abi",
            "internal/a b",
            "internal/\\x",
        ] {
            assert!(!is_import_path(literal), "{literal:?}");
        }
    }
}
