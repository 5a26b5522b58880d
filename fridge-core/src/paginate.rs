//! Splitting display artifacts into platform-legal pages and batches.

/// Consecutive slices of `size` items; the last may be shorter.
///
/// A `size` of zero is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

pub fn page_count(total: usize, size: usize) -> usize {
    total.div_ceil(size.max(1))
}

/// Requested page movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDelta {
    Next,
    Previous,
    /// Zero-based page index
    Absolute(usize),
}

/// Apply a delta to `current` and clamp into `[0, pages - 1]` (0 when empty).
pub fn turn_page(current: usize, delta: PageDelta, total: usize, size: usize) -> usize {
    let last = page_count(total, size).saturating_sub(1);
    let wanted = match delta {
        PageDelta::Next => current.saturating_add(1),
        PageDelta::Previous => current.saturating_sub(1),
        PageDelta::Absolute(page) => page,
    };
    wanted.min(last)
}

/// Where a page sits in the whole list. `start` and `end` are 1-based and
/// inclusive; both are 0 for an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub pages: usize,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

/// The slice shown on `page` (clamped) together with its position metadata.
pub fn page_slice<T>(items: &[T], page: usize, size: usize) -> (&[T], PageWindow) {
    let size = size.max(1);
    let total = items.len();
    let page = turn_page(0, PageDelta::Absolute(page), total, size);
    let from = (page * size).min(total);
    let to = (from + size).min(total);
    let window = PageWindow {
        page,
        pages: page_count(total, size),
        start: if total == 0 { 0 } else { from + 1 },
        end: to,
        total,
    };
    (&items[from..to], window)
}

/// Batches for delivering everything in one reply: at most `max_batches`
/// groups of at most `batch_size`. Items past the cap are dropped.
pub fn batches_for_reply<T: Clone>(items: &[T], batch_size: usize, max_batches: usize) -> Vec<Vec<T>> {
    let mut batches = chunk(items, batch_size);
    batches.truncate(max_batches);
    batches
}

/// Dynamic entries followed by fixed ones, never longer than `max`.
///
/// Dynamic entries are cut first. If the fixed entries alone exceed `max`
/// the trailing fixed entries are cut too.
pub fn build_selector<T: Clone>(dynamic: &[T], fixed: &[T], max: usize) -> Vec<T> {
    let room = max.saturating_sub(fixed.len());
    dynamic
        .iter()
        .take(room)
        .chain(fixed.iter())
        .take(max)
        .cloned()
        .collect()
}
