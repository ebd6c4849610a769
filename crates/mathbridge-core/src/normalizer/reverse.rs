//! Reverse stages — printer output toward editor markup

use super::outside_opaque_text;
use crate::greek::is_greek;

const CDOT: &str = r" \cdot ";

/// Binary operators and relations; never a factor of an implicit product
const OPERATOR_COMMANDS: &[&str] = &[
    "cdot", "times", "div", "pm", "mp", "ast", "star", "circ", "bullet", "le", "ge", "leq",
    "geq", "neq", "ne", "approx", "equiv", "sim", "simeq", "propto", "to", "rightarrow",
    "leftarrow", "Rightarrow", "Leftarrow", "leftrightarrow", "mapsto", "in", "notin", "subset",
    "subseteq", "cup", "cap", "wedge", "vee", "land", "lor", "mid", "quad", "qquad", "colon",
    "ldots", "cdots", "dots",
];

/// Prefix operators whose argument follows after a space
const FUNCTION_COMMANDS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "arcsin", "arccos", "arctan", "sinh", "cosh",
    "tanh", "log", "ln", "exp", "lim", "sum", "prod", "int", "max", "min", "det", "operatorname",
];

const DELIMITER_COMMANDS: &[&str] = &["left", "right"];

// ── Stage 1: Greek letters ─────────────────────────────────

/// Re-insert the backslash in front of bare Greek letter names
///
/// Only a whole letter run is matched, and only when no backslash precedes
/// it: `Beta_{r}` → `\Beta_{r}`, while `\beta` and `betas` stay as they are.
///
/// Text arguments such as `\mathit{pi2}` are left alone.
///
/// Braces: preserved.
pub fn escape_greek_letters(input: &str) -> String {
    outside_opaque_text(input, escape_greek_runs)
}

fn escape_greek_runs(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_alphabetic() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        let run: String = chars[start..i].iter().collect();
        let escaped = start > 0 && chars[start - 1] == '\\';
        if !escaped && is_greek(&run) {
            out.push('\\');
        }
        out.push_str(&run);
    }

    out
}

// ── Stage 2: explicit multiplication ───────────────────────

/// Replace whitespace between two factors with ` \cdot `
///
/// Each whitespace gap is tested against six rules and marked at most once:
///
/// 1. number, then a letter or a command (`0.5 x`, `2 \beta`)
/// 2. closed group, then a single letter (`e^{x} y`)
/// 3. closed group, then a command other than `\left`/`\right` (`E_{0} \beta`)
/// 4. command, then a letter or digit (`\beta E_0`)
/// 5. `\right)` then `\left(`
/// 6. single letter, then single letter (`E E_0`); never inside `abc`
///
/// A "closed group" is a `}` or the tail of an un-braced script such as
/// `x_nm`, which the next stage braces. Operator commands such as `\cdot`
/// never take part, so the stage does not fire twice on its own output.
///
/// Braces: preserved.
pub fn make_multiplication_explicit(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let gap_start = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let (left, right) = (&chars[..gap_start], &chars[i..]);
        if !left.is_empty() && !right.is_empty() && implies_product(left, right) {
            out.push_str(CDOT);
        } else {
            out.extend(&chars[gap_start..i]);
        }
    }

    out
}

fn implies_product(left: &[char], right: &[char]) -> bool {
    let closed = ends_with_closed_group(left);
    let next_command = leading_command(right);

    if ends_with_number(left) && (starts_with_letter(right) || starts_with_factor_command(right)) {
        return true;
    }
    if closed && starts_with_single_letter(right) {
        return true;
    }
    if closed
        && next_command
            .as_deref()
            .is_some_and(|c| is_factor_command(c) && !is_delimiter(c))
    {
        return true;
    }
    let prev_is_factor = trailing_command(left).is_some_and(|c| {
        is_factor_command(&c) && !FUNCTION_COMMANDS.contains(&c.as_str()) && !is_delimiter(&c)
    });
    if prev_is_factor && right.first().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return true;
    }
    if ends_with_str(left, r"\right)") && starts_with_str(right, r"\left(") {
        return true;
    }
    ends_with_single_letter(left) && starts_with_single_letter(right)
}

fn ends_with_str(chars: &[char], literal: &str) -> bool {
    let literal: Vec<char> = literal.chars().collect();
    chars.ends_with(&literal)
}

fn starts_with_str(chars: &[char], literal: &str) -> bool {
    let literal: Vec<char> = literal.chars().collect();
    chars.starts_with(&literal)
}

fn is_factor_command(name: &str) -> bool {
    !name.is_empty() && !OPERATOR_COMMANDS.contains(&name)
}

fn is_delimiter(name: &str) -> bool {
    DELIMITER_COMMANDS.contains(&name)
}

fn ends_with_number(left: &[char]) -> bool {
    match left {
        [.., d] if d.is_ascii_digit() => true,
        [.., d, '.'] => d.is_ascii_digit(),
        _ => false,
    }
}

fn starts_with_letter(right: &[char]) -> bool {
    right.first().is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_with_single_letter(right: &[char]) -> bool {
    starts_with_letter(right) && !right.get(1).is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_with_factor_command(right: &[char]) -> bool {
    leading_command(right).is_some_and(|c| is_factor_command(&c) && c != "right")
}

fn ends_with_single_letter(left: &[char]) -> bool {
    match left {
        [last] => last.is_ascii_alphabetic(),
        [.., before, last] => {
            last.is_ascii_alphabetic() && !before.is_ascii_alphabetic() && *before != '\\'
        }
        [] => false,
    }
}

/// `}` or the alphanumeric tail of a `_`/`^` script
fn ends_with_closed_group(left: &[char]) -> bool {
    let Some(&last) = left.last() else {
        return false;
    };
    if last == '}' {
        return true;
    }
    if !last.is_ascii_alphanumeric() {
        return false;
    }

    let mut start = left.len() - 1;
    while start > 0 && left[start - 1].is_ascii_alphanumeric() {
        start -= 1;
    }
    match start.checked_sub(1).map(|i| left[i]) {
        Some('_') | Some('^') => true,
        // `x_{a}bc`: a braced script that the next stage merges with `bc`
        Some('}') => {
            let close = start - 1;
            left[..close]
                .iter()
                .rposition(|&c| c == '{')
                .is_some_and(|open| open > 0 && matches!(left[open - 1], '_' | '^'))
        }
        _ => false,
    }
}

/// Name of the `\command` that `right` starts with
fn leading_command(right: &[char]) -> Option<String> {
    if right.first() != Some(&'\\') {
        return None;
    }
    let name: String = right[1..].iter().take_while(|c| c.is_ascii_alphabetic()).collect();
    (!name.is_empty()).then_some(name)
}

/// Name of the `\command` that `left` ends with
fn trailing_command(left: &[char]) -> Option<String> {
    let mut start = left.len();
    while start > 0 && left[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    if start == left.len() || start == 0 || left[start - 1] != '\\' {
        return None;
    }
    Some(left[start..].iter().collect())
}

// ── Stage 3: script encapsulation ──────────────────────────

/// Brace multi-character scripts the editor would otherwise misread
///
/// `x_nm` → `x_{nm}`, `x_n` stays, and `x_{a}bc` merges into `x_{abc}`.
/// A merge that spells a Greek name escapes it: `x_{p}i` → `x_{\pi}`.
///
/// Braces: adds one matched pair per wrapped script; merging moves a `}`.
pub fn encapsulate_scripts(input: &str) -> String {
    outside_opaque_text(input, |markup| merge_trailing_script_chars(&wrap_bare_scripts(markup)))
}

fn is_script_marker(c: char) -> bool {
    c == '_' || c == '^'
}

fn wrap_bare_scripts(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        out.push(chars[i]);
        if !is_script_marker(chars[i]) {
            i += 1;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < chars.len() && chars[end].is_ascii_alphanumeric() {
            end += 1;
        }
        if end - start >= 2 {
            out.push('{');
            out.extend(&chars[start..end]);
            out.push('}');
            i = end;
        } else {
            i += 1;
        }
    }

    out
}

fn merge_trailing_script_chars(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        if is_script_marker(chars[i]) && chars.get(i + 1) == Some(&'{') {
            let content_start = i + 2;
            let close = chars[content_start..]
                .iter()
                .position(|&c| c == '}')
                .map(|p| p + content_start);
            if let Some(close) = close.filter(|&c| c > content_start) {
                let mut tail_end = close + 1;
                while tail_end < chars.len() && chars[tail_end].is_ascii_alphanumeric() {
                    tail_end += 1;
                }
                if tail_end > close + 1 {
                    // Joining can spell a Greek name that stage 1 never saw.
                    let merged: String = chars[content_start..close]
                        .iter()
                        .chain(&chars[close + 1..tail_end])
                        .collect();
                    out.push(chars[i]);
                    out.push('{');
                    out.push_str(&escape_greek_letters(&merged));
                    out.push('}');
                    i = tail_end;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Greek ──────────────────────────────────────────

    #[test]
    fn test_greek_escaped() {
        assert_eq!(escape_greek_letters("Beta_{r} + alpha"), r"\Beta_{r} + \alpha");
    }

    #[test]
    fn test_greek_already_escaped_untouched() {
        assert_eq!(escape_greek_letters(r"\beta + \eta"), r"\beta + \eta");
    }

    #[test]
    fn test_greek_inside_identifier_untouched() {
        assert_eq!(escape_greek_letters("betas + zeta_{1}x"), r"betas + \zeta_{1}x");
        assert_eq!(escape_greek_letters("theta"), r"\theta");
        assert_eq!(escape_greek_letters("ab"), "ab");
    }

    #[test]
    fn test_greek_idempotent() {
        let once = escape_greek_letters("pi r^{2} + Omega");
        assert_eq!(escape_greek_letters(&once), once);
    }

    // ── Multiplication ─────────────────────────────────

    #[test]
    fn test_number_then_letter() {
        assert_eq!(make_multiplication_explicit("0.5 x"), r"0.5 \cdot x");
        assert_eq!(make_multiplication_explicit(r"2 \beta"), r"2 \cdot \beta");
    }

    #[test]
    fn test_no_split_inside_identifier() {
        assert_eq!(make_multiplication_explicit("abc"), "abc");
    }

    #[test]
    fn test_brace_then_single_letter() {
        assert_eq!(make_multiplication_explicit("e^{x} y"), r"e^{x} \cdot y");
        assert_eq!(make_multiplication_explicit("e^{x} yz"), "e^{x} yz");
    }

    #[test]
    fn test_brace_then_command() {
        assert_eq!(make_multiplication_explicit(r"E_{0} \beta"), r"E_{0} \cdot \beta");
        assert_eq!(
            make_multiplication_explicit(r"x^{2} \right)"),
            r"x^{2} \right)"
        );
    }

    #[test]
    fn test_command_then_letter() {
        assert_eq!(make_multiplication_explicit(r"\beta E_0"), r"\beta \cdot E_0");
        assert_eq!(make_multiplication_explicit(r"\gamma 5"), r"\gamma \cdot 5");
        assert_eq!(make_multiplication_explicit(r"\sin x"), r"\sin x");
    }

    #[test]
    fn test_adjacent_parentheses() {
        assert_eq!(
            make_multiplication_explicit(r"\left(a\right) \left(b\right)"),
            r"\left(a\right) \cdot \left(b\right)"
        );
    }

    #[test]
    fn test_single_letters() {
        assert_eq!(make_multiplication_explicit("E E_0"), r"E \cdot E_0");
        assert_eq!(make_multiplication_explicit("x y z"), r"x \cdot y \cdot z");
    }

    #[test]
    fn test_operators_are_not_factors() {
        let input = r"x \cdot y + 2 \times z";
        assert_eq!(make_multiplication_explicit(input), input);
    }

    #[test]
    fn test_script_tail_counts_as_closed_group() {
        assert_eq!(make_multiplication_explicit("x_nm y"), r"x_nm \cdot y");
    }

    #[test]
    fn test_leading_and_trailing_space_kept() {
        assert_eq!(make_multiplication_explicit(" x "), " x ");
    }

    // ── Encapsulation ──────────────────────────────────

    #[test]
    fn test_wrap_multichar_script() {
        assert_eq!(encapsulate_scripts("x_nm"), "x_{nm}");
        assert_eq!(encapsulate_scripts("x^12"), "x^{12}");
    }

    #[test]
    fn test_single_char_script_bare() {
        assert_eq!(encapsulate_scripts("x_n"), "x_n");
        assert_eq!(encapsulate_scripts("x^2 + y"), "x^2 + y");
    }

    #[test]
    fn test_braced_script_untouched() {
        assert_eq!(encapsulate_scripts("x_{already}"), "x_{already}");
    }

    #[test]
    fn test_merge_braced_with_trailing() {
        assert_eq!(encapsulate_scripts("x_{a}bc"), "x_{abc}");
    }

    #[test]
    fn test_merge_escapes_greek_name() {
        assert_eq!(encapsulate_scripts("x_{p}i"), r"x_{\pi}");
        assert_eq!(encapsulate_scripts("y_{e}ta2"), r"y_{\eta2}");
        assert_eq!(encapsulate_scripts(r"z_{\al}pha"), r"z_{\alpha}");
    }

    #[test]
    fn test_encapsulate_idempotent() {
        let once = encapsulate_scripts("x_nm + y_{a}b + z^2");
        assert_eq!(encapsulate_scripts(&once), once);
    }
}
