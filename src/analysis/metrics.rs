//! Line and function metrics extracted from raw source text.
//!
//! Parsing is line based and deliberately forgiving: each supported language
//! family knows its comment markers, how a function definition starts and how
//! its body is delimited (braces, indentation or an `end` keyword). String
//! literals and comments are blanked before any keyword matching so that
//! `"if"` inside a string never counts as a branch.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines searched after a signature for the opening brace.
const SIGNATURE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Rust,
    CLike,
    JavaScript,
    Go,
    Python,
    Ruby,
    Shell,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyStyle {
    Braces,
    Indentation,
    EndKeyword,
}

impl Family {
    /// Map a language tag (case-insensitive) to its syntax family.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Family::Rust,
            "c" | "h" | "cpp" | "c++" | "cc" | "hpp" | "java" | "csharp" | "c#" | "cs"
            | "kotlin" | "kt" | "swift" | "scala" | "php" | "dart" => Family::CLike,
            "javascript" | "js" | "jsx" | "mjs" | "typescript" | "ts" | "tsx" => {
                Family::JavaScript
            }
            "go" | "golang" => Family::Go,
            "python" | "py" => Family::Python,
            "ruby" | "rb" => Family::Ruby,
            "shell" | "sh" | "bash" | "zsh" => Family::Shell,
            _ => Family::Unknown,
        }
    }

    /// Whether this family has any comment syntax at all.
    pub fn has_comments(self) -> bool {
        !self.line_comments().is_empty()
    }

    fn line_comments(self) -> &'static [&'static str] {
        match self {
            Family::Rust | Family::CLike | Family::JavaScript | Family::Go => &["//"],
            Family::Python | Family::Ruby | Family::Shell => &["#"],
            Family::Unknown => &[],
        }
    }

    fn block_comments(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Family::Rust | Family::CLike | Family::JavaScript | Family::Go => &[("/*", "*/")],
            Family::Python => &[("\"\"\"", "\"\"\""), ("'''", "'''")],
            Family::Ruby => &[("=begin", "=end")],
            Family::Shell | Family::Unknown => &[],
        }
    }

    fn quotes(self) -> &'static [char] {
        match self {
            Family::Rust => &['"', '\''],
            Family::Go | Family::JavaScript => &['"', '\'', '`'],
            Family::CLike | Family::Python | Family::Ruby | Family::Shell => &['"', '\''],
            Family::Unknown => &[],
        }
    }

    fn body_style(self) -> BodyStyle {
        match self {
            Family::Python => BodyStyle::Indentation,
            Family::Ruby => BodyStyle::EndKeyword,
            _ => BodyStyle::Braces,
        }
    }

    fn function_patterns(self) -> &'static [Regex] {
        match self {
            Family::Rust => RUST_FN.as_slice(),
            Family::CLike => CLIKE_FN.as_slice(),
            Family::JavaScript => JS_FN.as_slice(),
            Family::Go => GO_FN.as_slice(),
            Family::Python => PYTHON_FN.as_slice(),
            Family::Ruby => RUBY_FN.as_slice(),
            Family::Shell => SHELL_FN.as_slice(),
            Family::Unknown => &[],
        }
    }

    fn decision_pattern(self) -> Option<&'static Regex> {
        match self {
            Family::Rust => Some(&RUST_DECISIONS),
            Family::CLike | Family::JavaScript | Family::Go => Some(&CLIKE_DECISIONS),
            Family::Python => Some(&PYTHON_DECISIONS),
            Family::Ruby => Some(&RUBY_DECISIONS),
            Family::Shell => Some(&SHELL_DECISIONS),
            Family::Unknown => None,
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("function pattern must compile"))
        .collect()
}

static RUST_FN: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"\bfn\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"]));

static CLIKE_FN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(?:fun|func|function|def)\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(?P<name>[A-Za-z_]\w*)\s*[(<]",
        r"^\s*(?:[\w<>\[\],.*&:?]+\s+)+[*&]*(?P<name>[A-Za-z_~][\w:~]*)\s*\(",
    ])
});

/// Index of the `name = (...) =>` pattern in `JS_FN`.
const JS_ARROW_BINDING: usize = 1;

static JS_FN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bfunction\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\(",
        r"\b(?P<name>[A-Za-z_$][\w$]*)\s*[=:]\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::\s*[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
        r"^\s*(?:(?:public|private|protected|static|async|get|set|override|readonly)\s+)*(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\([^)]*\)\s*(?::\s*[^{]+)?\{",
    ])
});

static GO_FN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"^\s*func\s*(?:\([^)]*\)\s*)?(?P<name>[A-Za-z_]\w*)\s*[\[(]"])
});

static PYTHON_FN: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"^\s*(?:async\s+)?def\s+(?P<name>[A-Za-z_]\w*)"]));

static RUBY_FN: Lazy<Vec<Regex>> =
    Lazy::new(|| compile(&[r"^\s*def\s+(?:self\.)?(?P<name>[A-Za-z_]\w*[?!=]?)"]));

static SHELL_FN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"^\s*function\s+(?P<name>[A-Za-z_][\w-]*)",
        r"^\s*(?P<name>[A-Za-z_][\w-]*)\s*\(\s*\)",
    ])
});

static RUST_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|while|for)\b|=>|&&|\|\|").expect("decision pattern must compile")
});

static CLIKE_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|for|foreach|while|case|catch|when)\b|&&|\|\|")
        .expect("decision pattern must compile")
});

static PYTHON_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|elif|for|while|except|and|or|case)\b")
        .expect("decision pattern must compile")
});

static RUBY_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|elsif|unless|while|until|for|when|rescue|and|or)\b|&&|\|\|")
        .expect("decision pattern must compile")
});

static SHELL_DECISIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|elif|for|while|until|case)\b|&&|\|\|")
        .expect("decision pattern must compile")
});

static RUBY_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:def|class|module|if|unless|while|until|case|begin|for)\b")
        .expect("opener pattern must compile")
});

static RUBY_DO_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bdo\b\s*(?:\|[^|]*\|)?\s*$").expect("do-block pattern must compile")
});

static RUBY_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bend\b").expect("end pattern must compile"));

/// Words that look like a call or signature but never name a function.
const NOT_FUNCTION_NAMES: &[&str] = &[
    "if", "else", "for", "foreach", "while", "switch", "catch", "return", "new", "throw",
    "do", "sizeof", "typeof", "function", "with", "case", "delete", "await", "yield",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Comment,
    Code,
}

/// One source line with literals and comments removed.
#[derive(Debug, Clone)]
struct ScannedLine {
    code: String,
    kind: LineKind,
    indent: usize,
}

/// A function found by the extractor, before risk classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFunction {
    pub name: String,
    pub start_line: usize,
    pub length: usize,
    pub complexity: u32,
}

/// Raw measurements for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeasurements {
    pub line_count: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub comment_ratio: f64,
    pub functions: Vec<RawFunction>,
    /// False when the text could not be treated as source at all
    pub parsed: bool,
}

impl FileMeasurements {
    fn unparsed() -> Self {
        Self {
            line_count: 0,
            code_lines: 0,
            comment_lines: 0,
            comment_ratio: 0.0,
            functions: Vec::new(),
            parsed: false,
        }
    }
}

/// Measure one file. Never fails: text that cannot be parsed yields an
/// unparsed measurement with no functions.
pub fn measure(language: &str, text: &str) -> FileMeasurements {
    if text.contains('\0') {
        return FileMeasurements::unparsed();
    }

    let family = Family::from_tag(language);
    let lines = scan_lines(text, family);

    let code_lines = lines.iter().filter(|l| l.kind == LineKind::Code).count();
    let comment_lines = lines.iter().filter(|l| l.kind == LineKind::Comment).count();
    let line_count = lines.len();

    FileMeasurements {
        line_count,
        code_lines,
        comment_lines,
        comment_ratio: comment_lines as f64 / line_count.max(1) as f64,
        functions: detect_functions(&lines, family),
        parsed: true,
    }
}

fn scan_lines(text: &str, family: Family) -> Vec<ScannedLine> {
    let line_markers = family.line_comments();
    let blocks = family.block_comments();
    let quotes = family.quotes();
    let mut open_block: Option<&'static str> = None;

    text.lines()
        .map(|raw| {
            let indent = raw.len() - raw.trim_start().len();
            let mut code = String::new();
            let mut has_comment = false;
            let mut prev: Option<char> = None;
            let mut rest = raw;

            while !rest.is_empty() {
                if let Some(end) = open_block {
                    has_comment = true;
                    match rest.find(end) {
                        Some(pos) => {
                            rest = &rest[pos + end.len()..];
                            open_block = None;
                        }
                        None => rest = "",
                    }
                    continue;
                }

                let starts_line_comment = line_markers.iter().any(|marker| {
                    // `#` only opens a comment at a word boundary (`$#`, `${#x}` are code)
                    rest.starts_with(marker)
                        && (*marker != "#" || prev.map_or(true, char::is_whitespace))
                });
                if starts_line_comment {
                    has_comment = true;
                    break;
                }

                if let Some((start, end)) = blocks.iter().find(|(start, _)| {
                    rest.starts_with(start) && (*start != "=begin" || rest.len() == raw.len())
                }) {
                    has_comment = true;
                    open_block = Some(end);
                    rest = &rest[start.len()..];
                    continue;
                }

                let Some(c) = rest.chars().next() else { break };
                let is_string = quotes.contains(&c)
                    && !(family == Family::Rust && c == '\'' && !is_rust_char_literal(rest));
                if is_string {
                    code.push(c);
                    code.push(c);
                    rest = &rest[string_end(rest, c)..];
                    prev = Some(c);
                    continue;
                }

                code.push(c);
                prev = Some(c);
                rest = &rest[c.len_utf8()..];
            }

            let kind = if !code.trim().is_empty() {
                LineKind::Code
            } else if has_comment {
                LineKind::Comment
            } else {
                LineKind::Blank
            };
            ScannedLine { code, kind, indent }
        })
        .collect()
}

/// Byte offset just past the closing quote, or the end of `s` if the literal
/// is unterminated on this line.
fn string_end(s: &str, quote: char) -> usize {
    let mut escaped = false;
    for (idx, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return idx + c.len_utf8();
        }
    }
    s.len()
}

/// `'x'` and `'\n'` are char literals; `'a` in `&'a str` is a lifetime.
fn is_rust_char_literal(s: &str) -> bool {
    let mut chars = s.chars().skip(1);
    match chars.next() {
        Some('\\') => true,
        Some(_) => chars.next() == Some('\''),
        None => false,
    }
}

fn detect_functions(lines: &[ScannedLine], family: Family) -> Vec<RawFunction> {
    let patterns = family.function_patterns();
    if patterns.is_empty() {
        return Vec::new();
    }

    let mut functions = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.kind != LineKind::Code {
            continue;
        }
        let Some(signature) = match_function(patterns, &line.code) else {
            continue;
        };
        let arrow = family == Family::JavaScript && signature.pattern == JS_ARROW_BINDING;
        let end = match family.body_style() {
            BodyStyle::Braces => brace_body_end(lines, idx, signature.name_end, family, arrow),
            BodyStyle::Indentation => Some(indented_body_end(lines, idx)),
            BodyStyle::EndKeyword => Some(keyword_body_end(lines, idx)),
        };
        let Some(end) = end else { continue };

        functions.push(RawFunction {
            name: signature.name,
            start_line: idx + 1,
            length: end - idx + 1,
            complexity: complexity(&lines[idx..=end], family),
        });
    }
    functions
}

/// A function signature found on one line.
struct SignatureMatch {
    name: String,
    /// Byte offset just past the name
    name_end: usize,
    /// Index of the pattern that matched
    pattern: usize,
}

fn match_function(patterns: &[Regex], code: &str) -> Option<SignatureMatch> {
    let first_word = code.split_whitespace().next().unwrap_or_default();
    // `function` opens declarations; the other words open statements
    if first_word != "function" && NOT_FUNCTION_NAMES.contains(&first_word) {
        return None;
    }
    patterns.iter().enumerate().find_map(|(pattern, regex)| {
        let name = regex.captures(code)?.name("name")?;
        if NOT_FUNCTION_NAMES.contains(&name.as_str()) {
            return None;
        }
        Some(SignatureMatch {
            name: name.as_str().to_string(),
            name_end: name.end(),
            pattern,
        })
    })
}

/// Last line of a brace-delimited body, or None when the signature turns out
/// to be a declaration without a body.
fn brace_body_end(
    lines: &[ScannedLine],
    start: usize,
    offset: usize,
    family: Family,
    arrow: bool,
) -> Option<usize> {
    let mut depth = 0usize;
    let mut parens = 0i32;
    let mut opened = false;

    for (idx, line) in lines.iter().enumerate().skip(start) {
        if !opened && idx > start + SIGNATURE_WINDOW {
            return None;
        }
        let text = if idx == start { &line.code[offset..] } else { line.code.as_str() };

        // expression-bodied arrow function on a single line
        if idx == start && arrow {
            if let Some(pos) = text.find("=>") {
                if !text[pos..].contains('{') {
                    return Some(start);
                }
            }
        }

        for c in text.chars() {
            if opened {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(idx);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            match c {
                '(' | '[' => parens += 1,
                ')' | ']' => parens -= 1,
                ';' if parens <= 0 => {
                    return (family == Family::JavaScript).then_some(idx);
                }
                '{' if parens <= 0 => {
                    opened = true;
                    depth = 1;
                }
                _ => {}
            }
        }
    }

    opened.then(|| lines.len() - 1)
}

fn indented_body_end(lines: &[ScannedLine], start: usize) -> usize {
    let base = lines[start].indent;

    // multi-line signatures end where the parentheses balance
    let mut signature_end = start;
    let mut parens = 0i32;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        for c in line.code.chars() {
            match c {
                '(' | '[' | '{' => parens += 1,
                ')' | ']' | '}' => parens -= 1,
                _ => {}
            }
        }
        signature_end = idx;
        if parens <= 0 {
            break;
        }
    }

    let mut end = signature_end;
    for (idx, line) in lines.iter().enumerate().skip(signature_end + 1) {
        match line.kind {
            LineKind::Blank | LineKind::Comment => continue,
            LineKind::Code if line.indent > base => end = idx,
            LineKind::Code => break,
        }
    }
    end
}

fn keyword_body_end(lines: &[ScannedLine], start: usize) -> usize {
    let mut depth = 0i32;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        if RUBY_OPENER.is_match(&line.code) {
            depth += 1;
        }
        if RUBY_DO_BLOCK.is_match(&line.code) {
            depth += 1;
        }
        depth -= RUBY_END.find_iter(&line.code).count() as i32;
        if depth <= 0 {
            return idx;
        }
    }
    lines.len() - 1
}

fn complexity(body: &[ScannedLine], family: Family) -> u32 {
    let Some(pattern) = family.decision_pattern() else {
        return 1;
    };
    let branches: usize = body
        .iter()
        .map(|line| pattern.find_iter(&line.code).count())
        .sum();
    1 + branches as u32
}
