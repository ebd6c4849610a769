//! Markup normalizer — rewrites editor markup for the parser and back
//!
//! Two fixed pipelines of named rewrite stages:
//!
//! ```text
//! editor markup → literal tokens → protect subscripts → strip subscript commas
//!               → exponential calls                              → parser
//! printer output → escape greek → explicit multiplication
//!                → encapsulate scripts                           → editor
//! ```
//!
//! # Guarantees
//!
//! - **Total**: every stage accepts any string; malformed markup is passed
//!   through best-effort, never rejected
//! - **Deterministic**: same input always produces same output
//! - **Idempotent** (display direction): `display(display(x)) == display(x)`
//!
//! Brace handling is single-level: a stage that looks for a `{...}` group
//! stops at the first `}`. Nested subscripts/superscripts are not rewritten
//! reliably.

mod forward;
mod reverse;

pub use forward::{
    protect_subscripts, rewrite_exponentials, strip_subscript_commas, substitute_literal_tokens,
};
pub use reverse::{encapsulate_scripts, escape_greek_letters, make_multiplication_explicit};

// ── Public API ─────────────────────────────────────────────

/// Normalize editor markup into text the parser accepts
pub fn normalize_for_parsing(raw: &str) -> String {
    Pipeline::forward().apply(raw)
}

/// Normalize printer output into markup the editor displays
pub fn normalize_for_display(printed: &str) -> String {
    Pipeline::reverse().apply(printed)
}

// ── Stages ─────────────────────────────────────────────────

/// How a stage changes the brace structure of balanced input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceEffect {
    /// Brace counts are unchanged
    Preserves,
    /// Only matched `{`/`}` pairs are added
    AddsPairs,
    /// Only matched `{`/`}` pairs are removed
    RemovesPairs,
}

impl BraceEffect {
    /// Check the postcondition for one application of a stage
    ///
    /// Precondition: `before` is balanced with single-level groups.
    pub fn holds(self, before: &str, after: &str) -> bool {
        let (open_before, close_before) = brace_counts(before);
        let (open_after, close_after) = brace_counts(after);
        if !is_balanced(after) {
            return false;
        }
        match self {
            BraceEffect::Preserves => open_before == open_after && close_before == close_after,
            BraceEffect::AddsPairs => open_after >= open_before && close_after >= close_before,
            BraceEffect::RemovesPairs => open_after <= open_before && close_after <= close_before,
        }
    }
}

/// A named, pure, total text rewrite
#[derive(Clone, Copy)]
pub struct RewriteStage {
    pub name: &'static str,
    pub braces: BraceEffect,
    rewrite: fn(&str) -> String,
}

impl RewriteStage {
    pub const fn new(name: &'static str, braces: BraceEffect, rewrite: fn(&str) -> String) -> Self {
        RewriteStage {
            name,
            braces,
            rewrite,
        }
    }

    pub fn apply(&self, input: &str) -> String {
        (self.rewrite)(input)
    }
}

impl std::fmt::Debug for RewriteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteStage")
            .field("name", &self.name)
            .field("braces", &self.braces)
            .finish()
    }
}

pub const FORWARD_STAGES: [RewriteStage; 4] = [
    RewriteStage::new("literal-tokens", BraceEffect::Preserves, substitute_literal_tokens),
    RewriteStage::new("protect-subscripts", BraceEffect::AddsPairs, protect_subscripts),
    RewriteStage::new("strip-subscript-commas", BraceEffect::Preserves, strip_subscript_commas),
    RewriteStage::new("exponential-calls", BraceEffect::RemovesPairs, rewrite_exponentials),
];

pub const REVERSE_STAGES: [RewriteStage; 3] = [
    RewriteStage::new("escape-greek", BraceEffect::Preserves, escape_greek_letters),
    RewriteStage::new("explicit-multiplication", BraceEffect::Preserves, make_multiplication_explicit),
    RewriteStage::new("encapsulate-scripts", BraceEffect::AddsPairs, encapsulate_scripts),
];

// ── Pipeline ───────────────────────────────────────────────

/// Fixed, ordered list of stages; each stage's output feeds the next
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    pub name: &'static str,
    stages: &'static [RewriteStage],
}

impl Pipeline {
    /// Toward the parser
    pub fn forward() -> Self {
        Pipeline {
            name: "forward",
            stages: &FORWARD_STAGES,
        }
    }

    /// Toward the editor
    pub fn reverse() -> Self {
        Pipeline {
            name: "reverse",
            stages: &REVERSE_STAGES,
        }
    }

    pub fn stages(&self) -> &'static [RewriteStage] {
        self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&'static RewriteStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn apply(&self, input: &str) -> String {
        let mut text = input.to_string();
        for stage in self.stages {
            let next = stage.apply(&text);
            tracing::trace!(
                pipeline = self.name,
                stage = stage.name,
                changed = next != text,
                "rewrite stage"
            );
            text = next;
        }
        text
    }
}

// ── Helpers ────────────────────────────────────────────────

/// `true` when braces never close below depth zero and all close at the end
pub fn is_balanced(text: &str) -> bool {
    let mut depth: usize = 0;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

fn brace_counts(text: &str) -> (usize, usize) {
    text.chars().fold((0, 0), |(open, close), c| match c {
        '{' => (open + 1, close),
        '}' => (open, close + 1),
        _ => (open, close),
    })
}

/// A `_{...}` group starting at `at`, closed by the first `}` after it
pub(crate) struct SubscriptGroup {
    pub content_start: usize,
    pub content_end: usize,
    /// One past the closing brace
    pub end: usize,
}

pub(crate) fn subscript_group(chars: &[char], at: usize) -> Option<SubscriptGroup> {
    if chars.get(at) != Some(&'_') || chars.get(at + 1) != Some(&'{') {
        return None;
    }
    let content_start = at + 2;
    let close = chars[content_start..].iter().position(|&c| c == '}')? + content_start;
    Some(SubscriptGroup {
        content_start,
        content_end: close,
        end: close + 1,
    })
}

/// Commands whose brace argument is a literal name rather than markup
const OPAQUE_TEXT_COMMANDS: &[&str] = &[r"\mathit", r"\mathrm", r"\text", r"\operatorname"];

/// Apply `rewrite` to the markup between opaque text arguments
///
/// Each `\mathit{...}` (or `\mathrm`, `\text`, `\operatorname`) is copied
/// through untouched; an unterminated one is treated as plain markup.
pub(crate) fn outside_opaque_text(input: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some((start, end)) = next_opaque_text(rest) {
        out.push_str(&rewrite(&rest[..start]));
        out.push_str(&rest[start..end]);
        rest = &rest[end..];
    }
    out.push_str(&rewrite(rest));
    out
}

/// Byte range of the first complete opaque text command in `text`
fn next_opaque_text(text: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(pos) = text[from..].find('\\') {
        let start = from + pos;
        let tail = &text[start..];
        let argument = OPAQUE_TEXT_COMMANDS
            .iter()
            .find_map(|cmd| tail.strip_prefix(cmd).filter(|after| after.starts_with('{')));
        if let Some(after) = argument {
            let close = after.find('}')?;
            let end = start + (tail.len() - after.len()) + close + 1;
            return Some((start, end));
        }
        from = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_forward_stage_order() {
        let names: Vec<_> = Pipeline::forward().stages().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "literal-tokens",
                "protect-subscripts",
                "strip-subscript-commas",
                "exponential-calls"
            ]
        );
    }

    #[test]
    fn test_reverse_stage_order() {
        let names: Vec<_> = Pipeline::reverse().stages().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["escape-greek", "explicit-multiplication", "encapsulate-scripts"]
        );
    }

    #[test]
    fn test_exponential_example_through_stage_4() {
        let out = normalize_for_parsing(r"e^{-\frac{A}{B}} \cdot x");
        assert_eq!(out, r"\exp(-\frac{A}{B}) \cdot x");
    }

    #[test]
    fn test_forward_full_pipeline() {
        let raw = r"\exponentialE^{-(t)} r_{sum, j} + E_{rear}";
        let out = normalize_for_parsing(raw);
        assert_eq!(out, r"\exp(-(t)) r_{\mathit{sumj}} + E_{\mathit{rear}}");
    }

    #[test]
    fn test_reverse_full_pipeline() {
        let printed = r"0.5 beta_{r} x_nm";
        let out = normalize_for_display(printed);
        assert_eq!(out, r"0.5 \cdot \beta_{r} \cdot x_{nm}");
    }

    #[test]
    fn test_reverse_idempotent_examples() {
        let samples = [
            r"0.5 x",
            r"E E_{0}",
            r"e^{x} y",
            r"\beta E_{0}",
            r"\left(a + b\right) \left(c + d\right)",
            r"2 \frac{1}{2} x_nm y",
            r"x_{a}bc d",
            r"alpha beta gamma",
            r"abc",
            r"x_{p}i",
            r"x_{e}ta y",
            r"2 E_{n}u",
        ];
        for s in samples {
            let once = normalize_for_display(s);
            let twice = normalize_for_display(&once);
            assert_eq!(once, twice, "reverse pipeline not idempotent on {:?}", s);
        }
    }

    #[test]
    fn test_opaque_text_copied_verbatim() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(
            outside_opaque_text(r"a \mathit{pi_x} b \text{q}", upper),
            r"A \mathit{pi_x} B \text{q}"
        );
        assert_eq!(outside_opaque_text(r"a \mathit{b", upper), r"A \MATHIT{B");
        assert_eq!(outside_opaque_text(r"\textstyle x", upper), r"\TEXTSTYLE X");
    }

    #[test]
    fn test_display_leaves_text_names_alone() {
        let printed = r"2 \mathit{pi2} \mathit{a_bc} x_{p}i";
        let once = normalize_for_display(printed);
        assert_eq!(once, r"2 \cdot \mathit{pi2} \cdot \mathit{a_bc} \cdot x_{\pi}");
        assert_eq!(normalize_for_display(&once), once);
    }

    #[test]
    fn test_pipelines_never_fail_on_malformed_input() {
        let malformed = [
            "", "{", "}", "_{", "^", "e^{-", r"\frac{", "_{a,b", "x_", "}}{{", r"\", "e^{-(x}",
        ];
        for s in malformed {
            let _ = normalize_for_parsing(s);
            let _ = normalize_for_display(s);
        }
    }

    #[test]
    fn test_stage_brace_contracts_hold() {
        let samples = [
            r"E_{rear} + r_{sum, j} \cdot e^{-\frac{A}{B}} + e^{-(x y)}",
            r"\exponentialE^{x} \differentialD x",
            r"beta_{r} x_nm 0.5 y x_{a}bc",
            r"\left(x\right) \left(y\right)",
        ];
        for stage in FORWARD_STAGES.iter().chain(REVERSE_STAGES.iter()) {
            for s in samples {
                assert!(is_balanced(s));
                let out = stage.apply(s);
                assert!(
                    stage.braces.holds(s, &out),
                    "stage {} broke its brace contract on {:?} -> {:?}",
                    stage.name,
                    s,
                    out
                );
            }
        }
    }

    #[test]
    fn test_stage_lookup_by_name() {
        let stage = Pipeline::reverse().stage("encapsulate-scripts").unwrap();
        assert_eq!(stage.apply("x_nm"), "x_{nm}");
        assert!(Pipeline::forward().stage("encapsulate-scripts").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("a_{b} + \\frac{c}{d}"));
        assert!(!is_balanced("}{"));
        assert!(!is_balanced("{"));
    }

    #[test]
    fn test_determinism_100_iterations() {
        let raw = r"e^{-\frac{x}{y}} a_{bc, d} \exponentialE";
        let first = normalize_for_parsing(raw);
        for i in 0..100 {
            assert_eq!(first, normalize_for_parsing(raw), "Determinism failure at iteration {}", i);
        }
    }

    fn display_token() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z]".prop_map(|s| s),
            "[a-z]{2,3}".prop_map(|s| s),
            "[0-9]{1,3}(\\.[0-9]{1,2})?".prop_map(|s| s),
            proptest::sample::select(crate::greek::GREEK_LETTERS).prop_map(|s| s.to_string()),
            "[a-zA-Z]_[a-z0-9]{1,3}".prop_map(|s| s),
            "[a-zA-Z]_\\{[a-z0-9]{1,3}\\}".prop_map(|s| s),
            "[a-z]\\^\\{[0-9]\\}".prop_map(|s| s),
            "[a-z]_\\{[a-z]\\}[a-z]{1,4}".prop_map(|s| s),
            Just(r"\cdot".to_string()),
            Just("+".to_string()),
            Just("-".to_string()),
            Just(r"\frac{a}{b}".to_string()),
            Just(r"\left(x + 1\right)".to_string()),
            Just(r"\sin{\left(x\right)}".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_reverse_pipeline_idempotent(tokens in proptest::collection::vec(display_token(), 0..12)) {
            let input = tokens.join(" ");
            let once = normalize_for_display(&input);
            let twice = normalize_for_display(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_reverse_idempotent_on_aliases(count in 0usize..800) {
            let names: Vec<String> = crate::naming::SymbolNameGenerator::new().take(count).collect();
            let input = names.join(" ");
            let once = normalize_for_display(&input);
            prop_assert_eq!(normalize_for_display(&once), once);
        }

        #[test]
        fn prop_protect_noop_without_multichar_subscripts(
            parts in proptest::collection::vec("[a-zA-Z]_\\{[a-zA-Z0-9]\\}|[a-z+ ]{1,4}|\\\\frac\\{1\\}\\{2\\}", 0..10)
        ) {
            let input = parts.concat();
            prop_assert_eq!(protect_subscripts(&input), input);
        }
    }
}
