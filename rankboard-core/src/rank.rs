/// Pagination and rank arithmetic.
///
/// Pure functions over (total members, page, page size). All ranks here are the
/// store's native zero-based ranks unless a function says otherwise; callers
/// convert with `to_one_based()` at the edge.
use crate::constants::DEFAULT_PAGE_SIZE;

/// Replace a zero page size with `DEFAULT_PAGE_SIZE`.
pub fn normalize_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

/// `ceil(total_members / page_size)`, never less than 1.
pub fn total_pages(total_members: u64, page_size: usize) -> u64 {
    let page_size = normalize_page_size(page_size) as u64;
    total_members.div_ceil(page_size).max(1)
}

/// Clamp a caller page number into `1..=total_pages`.
pub fn clamp_page(page: i64, total_pages: u64) -> u64 {
    if page < 1 {
        1
    } else {
        (page as u64).min(total_pages.max(1))
    }
}

/// Inclusive zero-based `(start, end)` rank bounds of a page.
///
/// Out-of-range pages clamp to the first or last page. `end` is not clamped to
/// the member count; range queries on the store already stop at the last member.
pub fn page_bounds(page: i64, total_members: u64, page_size: usize) -> (u64, u64) {
    let page_size = normalize_page_size(page_size) as u64;
    let page = clamp_page(page, total_pages(total_members, page_size as usize));
    let start = (page - 1) * page_size;
    (start, start + page_size - 1)
}

/// Inclusive zero-based bounds of the window centred on `rank`.
///
/// The start is pulled back by `page_size / 2` and floored at 0; the end is
/// `start + page_size - 1` capped at the last member. The window is not
/// re-centred after either clamp, so it shrinks near the bottom of the board.
pub fn around_bounds(rank: u64, total_members: u64, page_size: usize) -> (u64, u64) {
    let page_size = normalize_page_size(page_size) as u64;
    let start = rank.saturating_sub(page_size / 2);
    let end = (start + page_size - 1).min(total_members.saturating_sub(1));
    (start, end)
}

/// Store ranks are zero-based; everything handed to callers is one-based.
pub fn to_one_based(native_rank: u64) -> u64 {
    native_rank + 1
}
