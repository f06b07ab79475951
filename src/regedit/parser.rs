//! Line-oriented parser for registry hive text.

use std::fs;
use std::path::Path;

use crate::error::HiveError;

use super::model::{RegistryHive, RegistryNode};

/// Tolerance policy for lines that match no production of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Skip unmatched lines silently. Real-world hives contain incidental
    /// garbage; callers who need validation check for expected keys after
    /// parsing.
    Permissive,
    /// Reject the first unmatched line. For test fixtures that must assert
    /// full-coverage parsing.
    Strict,
}

/// Read and parse a hive file permissively.
///
/// # Errors
///
/// Returns [`HiveError::Io`] if the file cannot be read, or
/// [`HiveError::Truncated`] if it is missing its two header lines.
pub fn load_hive(path: &Path) -> Result<RegistryHive, HiveError> {
    let content = fs::read_to_string(path).map_err(|source| HiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_hive(&content, ParseMode::Permissive)
}

/// Parse hive text into a [`RegistryHive`].
///
/// Line 0 is the header banner and line 1 the relative-comment line, both
/// stored verbatim. `#arch=` sets the architecture, `[path] timestamp`
/// opens a node, `"name"=value` / `@=value` set values on the open node,
/// and a line starting with two spaces continues the previous value
/// (newline-joined). Blank lines and `;`/`#` comments are ignored.
///
/// # Errors
///
/// Returns [`HiveError::Truncated`] when fewer than two lines are present,
/// and in [`ParseMode::Strict`] a [`HiveError::UnmatchedLine`] for the first
/// line outside the grammar.
pub fn parse_hive(content: &str, mode: ParseMode) -> Result<RegistryHive, HiveError> {
    let mut lines = content.lines();
    let header = lines.next().ok_or(HiveError::Truncated)?.trim();
    let relative = lines.next().ok_or(HiveError::Truncated)?.trim();

    let mut hive = RegistryHive::new(header, relative);
    let mut current_node: Option<String> = None;
    let mut current_value: Option<String> = None;

    for (idx, raw) in lines.enumerate() {
        // Continuation of a multi-line value, leading whitespace preserved.
        if raw.starts_with("  ")
            && let (Some(node), Some(value)) = (&current_node, &current_value)
        {
            if let Some(n) = hive.node_mut(node) {
                n.append_continuation(value, raw);
            }
            continue;
        }

        let line = raw.trim();

        if line.is_empty() {
            current_value = None;
            continue;
        }

        if let Some(arch) = line.strip_prefix("#arch=") {
            hive.arch = arch.trim().to_string();
            current_value = None;
            continue;
        }

        if line.starts_with(';') || line.starts_with('#') {
            current_value = None;
            continue;
        }

        if let Some((path, timestamp)) = parse_node_header(line) {
            let node = RegistryNode::new(path.clone(), timestamp);
            hive.insert(node);
            current_node = Some(path);
            current_value = None;
            continue;
        }

        if let Some(node) = &current_node
            && let Some((name, value)) = parse_value_line(line)
        {
            if let Some(n) = hive.node_mut(node) {
                n.insert_parsed(name.clone(), value);
            }
            current_value = Some(name);
            continue;
        }

        if mode == ParseMode::Strict {
            return Err(HiveError::UnmatchedLine {
                line: idx + 3,
                content: raw.to_string(),
            });
        }
        current_value = None;
    }

    Ok(hive)
}

/// Match `[<path>] <timestamp>`; the path is taken up to the last `]`.
fn parse_node_header(line: &str) -> Option<(String, i64)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.rfind(']')?;
    let path = rest.get(..close)?;
    let tail = rest.get(close + 1..)?;
    if path.is_empty() || !tail.starts_with(char::is_whitespace) {
        return None;
    }
    let digits = tail.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((path.to_string(), digits.parse().ok()?))
}

/// Match `"<name>"=<value>` or `@=<value>`, unescaping `\"` and `\\` in the
/// name. The value is kept raw, encoding marker included.
fn parse_value_line(line: &str) -> Option<(String, String)> {
    if let Some(value) = line.strip_prefix("@=") {
        return Some(("@".to_string(), value.to_string()));
    }

    let rest = line.strip_prefix('"')?;
    let mut name = String::new();
    let mut escaped = false;
    let mut close = None;
    for (i, c) in rest.char_indices() {
        if escaped {
            // Only \" and \\ are escape sequences; anything else is literal.
            match c {
                '"' | '\\' => name.push(c),
                other => {
                    name.push('\\');
                    name.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            close = Some(i);
            break;
        } else {
            name.push(c);
        }
    }

    let after = rest.get(close? + 1..)?;
    let value = after.strip_prefix('=')?;
    Some((name, value.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::regedit::DEFAULT_ARCH;

    const FIXTURE: &str = "WINE REGISTRY Version 2\n\
        ;; All keys relative to \\\\Machine\n\
        \n\
        #arch=win64\n\
        \n\
        [Software\\\\Prefixer\\\\Tests] 1757166416\n\
        @=\"TEST\"\n\
        \"testdword\"=dword:00000000\n\
        \"testhex\"=hex:00,00,00,00\n\
        \"testint\"=\"1\"\n\
        \"teststr\"=\"Test\"\n";

    #[test]
    fn parses_header_arch_and_values() {
        let hive = parse_hive(FIXTURE, ParseMode::Strict).unwrap();
        assert_eq!(hive.header, "WINE REGISTRY Version 2");
        assert_eq!(hive.relative, ";; All keys relative to \\\\Machine");
        assert_eq!(hive.arch, "win64");

        let node = hive.node("Software\\\\Prefixer\\\\Tests").unwrap();
        assert_eq!(node.timestamp, 1_757_166_416);
        assert!(!node.changed);
        assert_eq!(node.get("@"), Some("\"TEST\""));
        assert_eq!(node.get("testint"), Some("\"1\""));
        assert_eq!(node.get("teststr"), Some("\"Test\""));
        assert_eq!(node.get("testdword"), Some("dword:00000000"));
        assert_eq!(node.get("testhex"), Some("hex:00,00,00,00"));
    }

    #[test]
    fn arch_defaults_when_directive_absent() {
        let hive = parse_hive("header\n;; relative\n", ParseMode::Strict).unwrap();
        assert_eq!(hive.arch, DEFAULT_ARCH);
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(matches!(
            parse_hive("only one line", ParseMode::Permissive),
            Err(HiveError::Truncated)
        ));
    }

    #[test]
    fn escaped_quotes_in_value_names() {
        let content = "h\n;; r\n\n[Node] 5\n\"a\\\"b\"=\"x\"\n\"c\\\\d\"=\"y\"\n";
        let hive = parse_hive(content, ParseMode::Strict).unwrap();
        let node = hive.node("Node").unwrap();
        assert_eq!(node.get("a\"b"), Some("\"x\""));
        assert_eq!(node.get("c\\d"), Some("\"y\""));
    }

    #[test]
    fn continuation_lines_are_newline_joined() {
        let content = "h\n;; r\n\n[Node] 5\n\"blob\"=hex:00,01,\\\n  02,03\n";
        let hive = parse_hive(content, ParseMode::Strict).unwrap();
        let node = hive.node("Node").unwrap();
        assert_eq!(node.get("blob"), Some("hex:00,01,\\\n  02,03"));
    }

    #[test]
    fn permissive_mode_skips_garbage() {
        let content = "h\n;; r\n\nthis is noise\n[Node] 5\n\"a\"=\"1\"\n";
        let hive = parse_hive(content, ParseMode::Permissive).unwrap();
        assert_eq!(hive.node("Node").unwrap().get("a"), Some("\"1\""));
    }

    #[test]
    fn strict_mode_rejects_garbage() {
        let content = "h\n;; r\n\nthis is noise\n";
        let err = parse_hive(content, ParseMode::Strict).unwrap_err();
        match err {
            HiveError::UnmatchedLine { line, content } => {
                assert_eq!(line, 4);
                assert_eq!(content, "this is noise");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn value_line_outside_node_is_garbage() {
        let content = "h\n;; r\n\"orphan\"=\"1\"\n";
        assert!(parse_hive(content, ParseMode::Strict).is_err());
        let hive = parse_hive(content, ParseMode::Permissive).unwrap();
        assert!(hive.is_empty());
    }

    #[test]
    fn node_header_requires_timestamp() {
        assert!(parse_node_header("[Path]").is_none());
        assert!(parse_node_header("[Path]123").is_none());
        assert!(parse_node_header("[Path] 12x3").is_none());
        assert_eq!(
            parse_node_header("[Pa]th] 123"),
            Some(("Pa]th".to_string(), 123))
        );
    }
}
