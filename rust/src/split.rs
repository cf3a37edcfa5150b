use std::sync::LazyLock;

use regex::Regex;

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^\s*"([^"]+)"(?:\s(.*))?$"#).expect("valid regex"));
static UNQUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(\S+)(?:\s+(.*))?$").expect("valid regex"));

/// An executable path and the untouched text that followed it on the command line.
///
/// The remainder is never re-tokenized here: it may carry its own quoting, which only
/// the process-creation layer gets to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommandLine {
    pub executable: String,
    pub arguments: String,
}

impl ParsedCommandLine {
    /// Splits `line` into the executable and the argument remainder.
    ///
    /// A leading `"..."` token wins over the plain whitespace split, so executables with
    /// spaces in their path must be quoted. Returns `None` when there is no token at all.
    pub fn parse(line: &str) -> Option<Self> {
        let captures = QUOTED
            .captures(line)
            .or_else(|| UNQUOTED.captures(line))?;
        Some(Self {
            executable: captures[1].to_string(),
            arguments: captures
                .get(2)
                .map(|remainder| remainder.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> (String, String) {
        let parsed = ParsedCommandLine::parse(line).expect("expected a parse");
        (parsed.executable, parsed.arguments)
    }

    #[test]
    fn quoted_executable_keeps_spaces() {
        assert_eq!(
            parse(r#""path with spaces" rest"#),
            ("path with spaces".to_string(), "rest".to_string())
        );
    }

    #[test]
    fn quoted_windows_path_with_flags() {
        assert_eq!(
            parse(r#""C:\tools\app.exe" --flag value"#),
            (r"C:\tools\app.exe".to_string(), "--flag value".to_string())
        );
    }

    #[test]
    fn quoted_executable_without_arguments() {
        assert_eq!(parse(r#""C:\Program Files\x.exe""#).1, "");
        assert_eq!(parse(r#""a b" "#).1, "");
    }

    #[test]
    fn quoted_form_consumes_a_single_separator() {
        assert_eq!(parse(r#""a b"   c"#).1, "  c");
    }

    #[test]
    fn quoted_token_glued_to_text_falls_back_to_whitespace_split() {
        assert_eq!(
            parse(r#""a b"c d"#),
            ("\"a".to_string(), "b\"c d".to_string())
        );
    }

    #[test]
    fn unquoted_token_and_verbatim_remainder() {
        assert_eq!(
            parse(r#"cat -u "some file"  'x'"#),
            ("cat".to_string(), r#"-u "some file"  'x'"#.to_string())
        );
    }

    #[test]
    fn unquoted_skips_whole_whitespace_run() {
        assert_eq!(parse("tool \t  arg"), ("tool".to_string(), "arg".to_string()));
    }

    #[test]
    fn leading_whitespace_is_stripped() {
        assert_eq!(parse("   \tcat"), ("cat".to_string(), String::new()));
        assert_eq!(parse("  \"a b\" c").0, "a b");
    }

    #[test]
    fn remainder_may_span_lines() {
        assert_eq!(parse("sh -c 'echo a\necho b'").1, "-c 'echo a\necho b'");
    }

    #[test]
    fn empty_and_blank_lines_fail() {
        assert_eq!(ParsedCommandLine::parse(""), None);
        assert_eq!(ParsedCommandLine::parse("   "), None);
        assert_eq!(ParsedCommandLine::parse("\t\r\n"), None);
    }
}
