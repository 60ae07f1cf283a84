use super::CountError;
use regex::Regex;
use std::sync::LazyLock;

// `1234+56+7 (3/0/0/0) File: main.tex`, as printed by `texcount -brief`
static TEXCOUNT_BRIEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*([0-9][0-9,]*)\+[0-9]").expect("valid regex"));
static TOTAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\btotal\b[^0-9\n]*([0-9][0-9,]*)").expect("valid regex"));
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9][0-9,]*)\s+(?:words?|characters?|chars?)\b").expect("valid regex")
});
// `wc -w` style: the count leads the line
static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*([0-9][0-9,]*)(?:\s|$)").expect("valid regex"));

const EXCERPT_CHARS: usize = 80;

/// Extracts the count from the counting tool's stdout.
///
/// A configured `pattern` is authoritative: its first capture group is the
/// count and no built-in format is tried. Otherwise the known summary shapes
/// are tried in order and the first match wins.
pub fn parse_count(output: &str, pattern: Option<&Regex>) -> Result<u64, CountError> {
    let captured = match pattern {
        Some(re) => capture(re, output),
        None => [&*TEXCOUNT_BRIEF, &*TOTAL_LINE, &*UNIT_SUFFIX, &*LEADING_INTEGER]
            .into_iter()
            .find_map(|re| capture(re, output)),
    };

    captured
        .and_then(|digits| digits.replace(',', "").parse::<u64>().ok())
        .ok_or_else(|| CountError::Unparseable {
            excerpt: excerpt(output),
        })
}

fn capture<'a>(re: &Regex, output: &'a str) -> Option<&'a str> {
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

pub(super) fn excerpt(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return String::from("(empty output)");
    }
    let mut short: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    if trimmed.chars().count() > EXCERPT_CHARS {
        short.push('…');
    }
    short
}
