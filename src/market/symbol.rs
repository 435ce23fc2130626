//! Ticker canonicalization for CSE symbols.
//!
//! The exchange prints voting shares as `XYZ.N0000` in some tables and
//! `XYZ.N` in others. Both collapse to `XYZ.N`, which is the merge key.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix every voting-share variant collapses to
const VOTING_SUFFIX: &str = ".N";

static NUMBERED_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.N[0-9]{4}$").unwrap());
static BARE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.N$").unwrap());

/// Yahoo exchange suffixes tried for each lookup root
const LOOKUP_SUFFIXES: [&str; 2] = [".CO", ".CM"];

/// Replace a trailing `.N` + four digits (any case) with `.N`
pub fn normalize(raw: &str) -> String {
    NUMBERED_SUFFIX.replace(raw, VOTING_SUFFIX).into_owned()
}

/// Symbol formats to try against the float provider, in order.
///
/// The symbol itself comes first, then its root with the voting suffix removed.
pub fn lookup_candidates(symbol: &str) -> Vec<String> {
    let normalized = normalize(symbol);
    let root = BARE_SUFFIX.replace(&normalized, "");

    let mut candidates: Vec<String> = Vec::with_capacity(6);
    for base in [symbol, &*root] {
        for candidate in LOOKUP_SUFFIXES
            .iter()
            .map(|suffix| format!("{base}{suffix}"))
            .chain(std::iter::once(base.to_string()))
        {
            if !candidate.is_empty() && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}
