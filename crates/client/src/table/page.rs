//! Pagination arithmetic.

/// One page of rows plus the number of blank rows that keep the page height
/// fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<T> {
    pub rows: Vec<T>,
    pub empty_rows: usize,
}

/// Cut page `page_index` (0-based) of `page_size` rows out of `sorted`.
///
/// A page past the end yields no rows and `page_size` blank rows.
pub fn visible_slice<T>(sorted: Vec<T>, page_index: usize, page_size: usize) -> PageSlice<T> {
    let total = sorted.len();
    let start = page_index.saturating_mul(page_size);
    let remaining = total.saturating_sub(start);
    let rows: Vec<T> = sorted.into_iter().skip(start).take(page_size).collect();

    PageSlice {
        rows,
        empty_rows: page_size - remaining.min(page_size),
    }
}

/// Number of pages needed for `total` rows; zero rows need zero pages.
#[must_use]
pub const fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_partial_page_is_padded() {
        let rows: Vec<u32> = (1..=12).collect();
        let page = visible_slice(rows, 2, 5);

        assert_eq!(page.rows, vec![11, 12]);
        assert_eq!(page.empty_rows, 3);
    }

    #[test]
    fn test_full_page_has_no_padding() {
        let rows: Vec<u32> = (1..=12).collect();
        let page = visible_slice(rows, 1, 5);

        assert_eq!(page.rows, vec![6, 7, 8, 9, 10]);
        assert_eq!(page.empty_rows, 0);
    }

    #[test]
    fn test_page_past_end_is_blank() {
        let rows: Vec<u32> = (1..=3).collect();
        let page = visible_slice(rows, 4, 5);

        assert!(page.rows.is_empty());
        assert_eq!(page.empty_rows, 5);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(12, 5), 3);
        assert_eq!(page_count(12, 25), 1);
    }
}
