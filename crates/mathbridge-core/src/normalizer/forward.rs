//! Forward stages — editor markup toward the parser grammar

use super::subscript_group;

/// Editor-internal spellings and their grammar equivalents
const LITERAL_TOKENS: &[(&str, &str)] = &[(r"\exponentialE", "e"), (r"\differentialD", "d")];

/// Commands that already make a subscript opaque to the parser
const PROTECTIVE_COMMANDS: &[&str] = &[r"\text", r"\mathit", r"\mathrm"];

const OPAQUE_TEXT: &str = r"\mathit";

/// Stage 1: replace editor spellings of `e` and `d`
///
/// Braces: preserved.
pub fn substitute_literal_tokens(input: &str) -> String {
    LITERAL_TOKENS
        .iter()
        .fold(input.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Stage 2: wrap multi-character subscripts in `\mathit{...}`
///
/// `_{rear}` → `_{\mathit{rear}}`, `_{n12m}` → `_{\mathit{n12m}}`;
/// `_{r}` is left alone, as is content starting with a command.
///
/// Braces: adds one matched pair per protected group.
pub fn protect_subscripts(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        match subscript_group(&chars, i) {
            Some(group) => {
                let content: String = chars[group.content_start..group.content_end].iter().collect();
                if needs_protection(&content) {
                    out.push_str("_{");
                    out.push_str(OPAQUE_TEXT);
                    out.push('{');
                    out.push_str(&content);
                    out.push_str("}}");
                } else {
                    out.extend(&chars[i..group.end]);
                }
                i = group.end;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }

    out
}

fn needs_protection(content: &str) -> bool {
    if PROTECTIVE_COMMANDS.iter().any(|cmd| content.starts_with(cmd)) || content.starts_with('\\') {
        return false;
    }
    // Nested groups are out of reach for a first-`}` scan.
    if content.contains('{') {
        return false;
    }
    content.chars().filter(|c| c.is_ascii_alphanumeric()).count() > 1
}

/// Stage 3: delete commas and spaces inside `_{...}` groups that hold a comma
///
/// `r_{sum,j}` → `r_{sumj}`. Lossy: the comma cannot be restored.
///
/// Braces: preserved.
pub fn strip_subscript_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        match subscript_group(&chars, i) {
            Some(group) => {
                let content = &chars[group.content_start..group.content_end];
                if content.contains(&',') {
                    out.push_str("_{");
                    out.extend(content.iter().filter(|&&c| c != ',' && c != ' '));
                    out.push('}');
                } else {
                    out.extend(&chars[i..group.end]);
                }
                i = group.end;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }

    out
}

/// Stage 4: rewrite `e^{-\frac{A}{B}}` and `e^{-(X)}` as `\exp(...)` calls
///
/// `e^{-\frac{A}{B}}` → `\exp(-\frac{A}{B})`, `e^{-(X)}` → `\exp(-(X))`.
/// An `e` that ends a command name (`\ne^{-(x)}`) is not touched.
///
/// Braces: removes the exponent's brace pair.
pub fn rewrite_exponentials(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == 'e' && !ends_command_name(&chars, i) {
            if let Some((replacement, end)) = match_negated_exponent(&chars, i) {
                out.push_str(&replacement);
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// `true` if the letter at `at` belongs to a `\command` name
fn ends_command_name(chars: &[char], at: usize) -> bool {
    let mut start = at;
    while start > 0 && chars[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    start > 0 && chars[start - 1] == '\\'
}

/// Match `e^{-` followed by a fraction or parenthesised group, then `}`
fn match_negated_exponent(chars: &[char], at: usize) -> Option<(String, usize)> {
    let mut cursor = Cursor { chars, pos: at + 1 };
    cursor.expect_str("^{-")?;

    if cursor.expect_str(r"\frac{").is_some() {
        let numerator = cursor.take_until('}')?;
        cursor.expect_str("}{")?;
        let denominator = cursor.take_until('}')?;
        cursor.expect_str("}}")?;
        return Some((
            format!(r"\exp(-\frac{{{}}}{{{}}})", numerator, denominator),
            cursor.pos,
        ));
    }

    cursor.expect_str("(")?;
    let inner = cursor.take_until(')')?;
    cursor.expect_str(")}")?;
    Some((format!(r"\exp(-({}))", inner), cursor.pos))
}

/// Tiny literal matcher over a char slice
struct Cursor<'a> {
    chars: &'a [char],
    pos: usize,
}

impl Cursor<'_> {
    fn expect_str(&mut self, literal: &str) -> Option<()> {
        let mut pos = self.pos;
        for expected in literal.chars() {
            if self.chars.get(pos) != Some(&expected) {
                return None;
            }
            pos += 1;
        }
        self.pos = pos;
        Some(())
    }

    /// Non-empty run of chars before the first `stop`
    fn take_until(&mut self, stop: char) -> Option<String> {
        let len = self.chars[self.pos..].iter().position(|&c| c == stop)?;
        if len == 0 {
            return None;
        }
        let taken = self.chars[self.pos..self.pos + len].iter().collect();
        self.pos += len;
        Some(taken)
    }
}
