//! Canonical aggregation identity for division names.
//!
//! Every component that matches a record, a resolved polygon or a bucket by
//! name goes through [`normalize`]; nothing else may lower-case or trim names
//! on its own.

/// Canonicalize a division name: lower-case, trim, collapse internal whitespace runs to one space.
///
/// Total (the empty string maps to itself) and idempotent.
pub fn normalize(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for word in name.split_whitespace() {
        if !key.is_empty() { key.push(' ') }
        key.extend(word.chars().flat_map(char::to_lowercase));
    }
    key
}
