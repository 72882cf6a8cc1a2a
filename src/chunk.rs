//! Fixed-size chunking that preserves input order.
//!
//! [`grouper`] pads the final group with `None` filler; [`batches`] and
//! [`pages`] drop the filler so callers only ever see real items.

/// Lines shown per page of a listing.
pub const LINES_PER_PAGE: usize = 10;

/// Collect items into groups of exactly `size`, padding the last group with `None`.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn grouper<T>(items: impl IntoIterator<Item = T>, size: usize) -> Vec<Vec<Option<T>>> {
    assert!(size > 0, "group size must be non-zero");
    let mut groups: Vec<Vec<Option<T>>> = Vec::new();
    for item in items {
        match groups.last_mut() {
            Some(group) if group.len() < size => group.push(Some(item)),
            _ => {
                let mut group = Vec::with_capacity(size);
                group.push(Some(item));
                groups.push(group);
            }
        }
    }
    if let Some(last) = groups.last_mut() {
        last.resize_with(size, || None);
    }
    groups
}

/// Groups of at most `size` items with filler removed.
pub fn batches<T>(items: impl IntoIterator<Item = T>, size: usize) -> Vec<Vec<T>> {
    grouper(items, size)
        .into_iter()
        .map(|group| group.into_iter().flatten().collect())
        .collect()
}

/// Join lines into newline-separated pages of at most `size` lines.
pub fn pages(lines: impl IntoIterator<Item = String>, size: usize) -> Vec<String> {
    batches(lines, size)
        .into_iter()
        .map(|page| page.join("\n"))
        .collect()
}
