/// Rows filterable by the list views' search box.
pub trait Searchable {
    /// Display name and external id.
    fn search_keys(&self) -> [&str; 2];
}

/// Case-insensitive substring match on name or id. A blank term keeps
/// everything.
pub fn search<'a, T: Searchable>(items: &'a [T], term: &str) -> Vec<&'a T> {
    let needle = term.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item
                    .search_keys()
                    .iter()
                    .any(|key| key.to_lowercase().contains(&needle))
        })
        .collect()
}

/// One page of rows. Pages are 1-based.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slices `items` into the requested page, clamped to `1..=total_pages`.
/// An empty list still has one (empty) page.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());
    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items: items.len(),
    }
}
