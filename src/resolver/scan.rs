//! Position-scanning primitives for the expander

/// The character starting at byte offset `i`, if any.
pub(crate) fn char_at(d: &str, i: usize) -> Option<char> {
    d[i..]
        .chars()
        .next()
}

/// Byte offset of the first character at or after `from` that appears in
/// `set`.
pub(crate) fn find_any(d: &str, set: &str, from: usize) -> Option<usize> {
    d[from..]
        .char_indices()
        .find(|(_, c)| set.contains(*c))
        .map(|(i, _)| from + i)
}

/// Byte offset of the first character at or after `from` that does NOT
/// appear in `set`.
pub(crate) fn find_not(d: &str, set: &str, from: usize) -> Option<usize> {
    d[from..]
        .char_indices()
        .find(|(_, c)| !set.contains(*c))
        .map(|(i, _)| from + i)
}
