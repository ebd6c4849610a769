//! Greek letter names recognised in markup, both cases

pub const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
    "iota", "kappa", "lambda", "mu", "nu", "xi", "omicron", "pi",
    "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi", "omega",
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta",
    "Iota", "Kappa", "Lambda", "Mu", "Nu", "Xi", "Omicron", "Pi",
    "Rho", "Sigma", "Tau", "Upsilon", "Phi", "Chi", "Psi", "Omega",
];

pub fn is_greek(name: &str) -> bool {
    GREEK_LETTERS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_cases_present() {
        assert!(is_greek("omega"));
        assert!(is_greek("Omega"));
        assert!(!is_greek("OMEGA"));
        assert_eq!(GREEK_LETTERS.len(), 48);
    }
}
