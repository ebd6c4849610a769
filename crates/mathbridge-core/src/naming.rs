//! Short alias names — `a`, `b`, …, `z`, `aa`, `ab`, …
//!
//! The n-th name is n written in bijective base 26 with the letters
//! `a..=z` as digits, so names grow in length and are lexicographic
//! within one length. A generator never repeats a value and never resets;
//! a fresh generator starts again at `a`.

const ALPHABET_LEN: u64 = 26;

/// Infinite, non-repeating sequence of short lowercase identifiers
#[derive(Debug, Default)]
pub struct SymbolNameGenerator {
    counter: u64,
}

impl SymbolNameGenerator {
    pub fn new() -> Self {
        SymbolNameGenerator { counter: 0 }
    }

    /// Number of names handed out so far
    pub fn issued(&self) -> u64 {
        self.counter
    }

    /// Draw the next name; never blocks, never repeats
    pub fn next_name(&mut self) -> String {
        let name = Self::name_at(self.counter);
        self.counter += 1;
        name
    }

    /// Name at position `index` of the sequence (0-indexed)
    pub fn name_at(index: u64) -> String {
        let mut digits = Vec::new();
        let mut n = index + 1;
        while n > 0 {
            n -= 1;
            digits.push((b'a' + (n % ALPHABET_LEN) as u8) as char);
            n /= ALPHABET_LEN;
        }
        digits.iter().rev().collect()
    }
}

impl Iterator for SymbolNameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_26_are_the_alphabet() {
        let names: Vec<String> = SymbolNameGenerator::new().take(26).collect();
        let expected: Vec<String> = ('a'..='z').map(|c| c.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_27th_is_aa() {
        let mut gen = SymbolNameGenerator::new();
        assert_eq!(gen.nth(26).as_deref(), Some("aa"));
        assert_eq!(gen.next().as_deref(), Some("ab"));
    }

    #[test]
    fn test_length_boundaries() {
        assert_eq!(SymbolNameGenerator::name_at(51), "az");
        assert_eq!(SymbolNameGenerator::name_at(52), "ba");
        assert_eq!(SymbolNameGenerator::name_at(701), "zz");
        assert_eq!(SymbolNameGenerator::name_at(702), "aaa");
    }

    #[test]
    fn test_no_repeats_in_10000_draws() {
        let mut seen = HashSet::new();
        for name in SymbolNameGenerator::new().take(10_000) {
            assert!(seen.insert(name.clone()), "repeated name {}", name);
        }
    }

    #[test]
    fn test_fresh_generator_restarts() {
        let mut first = SymbolNameGenerator::new();
        first.next();
        first.next();
        let mut second = SymbolNameGenerator::new();
        assert_eq!(second.next().as_deref(), Some("a"));
        assert_eq!(first.next().as_deref(), Some("c"));
        assert_eq!(first.issued(), 3);
    }

    #[test]
    fn test_increasing_length_then_lexicographic() {
        let names: Vec<String> = SymbolNameGenerator::new().take(2_000).collect();
        for pair in names.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.len() < b.len() || (a.len() == b.len() && a < b),
                "{} should precede {}",
                a,
                b
            );
        }
    }
}
