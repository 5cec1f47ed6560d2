//! Sortable, selectable, paginated view over a list of records.
//!
//! [`TableController`] owns the records it shows and the view state around
//! them: sort column and direction, selected ids, page index and page size.
//! It is generic over [`TableRecord`], so the same controller drives any
//! record type with an id and comparable columns.

mod page;
mod sort;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::error::ValidationError;

pub use page::{PageSlice, page_count, visible_slice};
pub use sort::{SortDirection, sorted_view};

/// Page sizes offered to the operator.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];

/// Page size a new table starts with.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A row type the table can show.
pub trait TableRecord {
    /// Stable identity, used for selection.
    type Id: Clone + Eq + Ord + Hash + fmt::Debug;
    /// Sortable column.
    type Column: Copy + Eq + fmt::Debug;

    fn id(&self) -> Self::Id;

    /// Compare two records on one column, ascending.
    fn compare(&self, other: &Self, column: Self::Column) -> Ordering;
}

/// State of the header "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    /// Nothing selected.
    None,
    /// Some but not all records selected (indeterminate).
    Some,
    /// Every record selected.
    All,
}

/// View state of a table, independent of its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableViewState<C, I: Eq + Hash> {
    pub sort_key: C,
    pub sort_direction: SortDirection,
    pub selected: HashSet<I>,
    pub page_index: usize,
    pub page_size: usize,
}

/// Records plus the view state the operator manipulates.
pub struct TableController<R: TableRecord> {
    records: Vec<R>,
    state: TableViewState<R::Column, R::Id>,
}

impl<R: TableRecord> fmt::Debug for TableController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableController")
            .field("records", &self.records.len())
            .field("state", &self.state)
            .finish()
    }
}

impl<R: TableRecord> TableController<R> {
    /// Empty table sorted ascending by `sort_key`, first page, default size.
    #[must_use]
    pub fn new(sort_key: R::Column) -> Self {
        Self {
            records: Vec::new(),
            state: TableViewState {
                sort_key,
                sort_direction: SortDirection::Asc,
                selected: HashSet::new(),
                page_index: 0,
                page_size: DEFAULT_PAGE_SIZE,
            },
        }
    }

    /// Records in load order.
    #[must_use]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Current view state.
    #[must_use]
    pub const fn state(&self) -> &TableViewState<R::Column, R::Id> {
        &self.state
    }

    /// Look up a record by id.
    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.records.iter().find(|record| &record.id() == id)
    }

    /// Swap in a freshly fetched record set.
    ///
    /// Selection is cleared, since ids may no longer exist, and the page index
    /// is pulled back onto the last page if the set shrank.
    pub fn replace_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.state.selected.clear();
        self.state.page_index = self.state.page_index.min(self.last_page());
        debug!(
            count = self.records.len(),
            page_index = self.state.page_index,
            "Table records replaced"
        );
    }

    /// Sort by `column`: flips direction if it is already the sort column,
    /// otherwise switches to it ascending.
    pub fn request_sort(&mut self, column: R::Column) {
        if self.state.sort_key == column {
            self.state.sort_direction = self.state.sort_direction.toggled();
        } else {
            self.state.sort_key = column;
            self.state.sort_direction = SortDirection::Asc;
        }
    }

    #[must_use]
    pub const fn sort_key(&self) -> R::Column {
        self.state.sort_key
    }

    #[must_use]
    pub const fn sort_direction(&self) -> SortDirection {
        self.state.sort_direction
    }

    /// All records in the current sort order.
    #[must_use]
    pub fn sorted_view(&self) -> Vec<&R> {
        sorted_view(&self.records, self.state.sort_key, self.state.sort_direction)
    }

    /// Select every record, or clear the selection.
    pub fn toggle_select_all(&mut self, checked: bool) {
        if checked {
            self.state.selected = self.records.iter().map(R::id).collect();
        } else {
            self.state.selected.clear();
        }
    }

    /// Flip one id's membership. Returns whether it is now selected.
    ///
    /// Ids with no matching record are ignored, so the selection is always a
    /// subset of the records.
    pub fn toggle_select(&mut self, id: R::Id) -> bool {
        if self.state.selected.remove(&id) {
            return false;
        }
        if self.find(&id).is_none() {
            debug!(?id, "Ignoring selection of unknown record");
            return false;
        }
        self.state.selected.insert(id);
        true
    }

    #[must_use]
    pub fn is_selected(&self, id: &R::Id) -> bool {
        self.state.selected.contains(id)
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.state.selected.len()
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<R::Id> {
        let mut ids: Vec<R::Id> = self.state.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    #[must_use]
    pub fn select_all_state(&self) -> SelectAllState {
        let selected = self.state.selected.len();
        if selected == 0 {
            SelectAllState::None
        } else if selected == self.records.len() {
            SelectAllState::All
        } else {
            SelectAllState::Some
        }
    }

    /// Go to page `index`, clamped to the last page.
    pub fn set_page(&mut self, index: usize) {
        self.state.page_index = index.min(self.last_page());
    }

    /// Change the page size and go back to the first page.
    ///
    /// # Errors
    ///
    /// `InvalidPageSize` for zero.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        self.state.page_size = page_size;
        self.state.page_index = 0;
        Ok(())
    }

    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.state.page_index
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.state.page_size
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        page_count(self.records.len(), self.state.page_size)
    }

    fn last_page(&self) -> usize {
        self.page_count().saturating_sub(1)
    }

    /// The current page of an already sorted sequence.
    pub fn visible_slice<T>(&self, sorted: Vec<T>) -> PageSlice<T> {
        visible_slice(sorted, self.state.page_index, self.state.page_size)
    }

    /// The current page of records in the current sort order.
    #[must_use]
    pub fn visible_page(&self) -> PageSlice<&R> {
        self.visible_slice(self.sorted_view())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Id,
        Name,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        id: u32,
        name: String,
    }

    impl TableRecord for Row {
        type Id = u32;
        type Column = Col;

        fn id(&self) -> u32 {
            self.id
        }

        fn compare(&self, other: &Self, column: Col) -> Ordering {
            match column {
                Col::Id => self.id.cmp(&other.id),
                Col::Name => self.name.cmp(&other.name),
            }
        }
    }

    fn rows(n: u32) -> Vec<Row> {
        (1..=n)
            .map(|id| Row {
                id,
                name: format!("user{:02}", 100 - id),
            })
            .collect()
    }

    fn table(n: u32) -> TableController<Row> {
        let mut table = TableController::new(Col::Id);
        table.replace_records(rows(n));
        table
    }

    fn page_ids(table: &TableController<Row>) -> Vec<u32> {
        table.visible_page().rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_defaults() {
        let table = table(3);
        assert_eq!(table.sort_key(), Col::Id);
        assert_eq!(table.sort_direction(), SortDirection::Asc);
        assert_eq!(table.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(table.page_index(), 0);
        assert!(PAGE_SIZE_OPTIONS.contains(&table.page_size()));
    }

    #[test]
    fn test_request_sort_toggles_then_switches() {
        let mut table = table(3);

        table.request_sort(Col::Id);
        assert_eq!(table.sort_direction(), SortDirection::Desc);
        assert_eq!(page_ids(&table), vec![3, 2, 1]);

        table.request_sort(Col::Id);
        assert_eq!(table.sort_direction(), SortDirection::Asc);

        table.request_sort(Col::Name);
        assert_eq!(table.sort_key(), Col::Name);
        assert_eq!(table.sort_direction(), SortDirection::Asc);
        assert_eq!(page_ids(&table), vec![3, 2, 1]);
    }

    #[test]
    fn test_twelve_rows_page_three_of_five() {
        let mut table = table(12);
        table.set_page(2);

        let page = table.visible_page();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.empty_rows, 3);
        assert_eq!(table.page_count(), 3);
    }

    #[test]
    fn test_set_page_clamps() {
        let mut table = table(12);
        table.set_page(9);
        assert_eq!(table.page_index(), 2);
    }

    #[test]
    fn test_set_page_size_resets_page() {
        let mut table = table(30);
        table.set_page(3);
        table.set_page_size(10).unwrap();

        assert_eq!(table.page_index(), 0);
        assert_eq!(page_ids(&table), (1..=10).collect::<Vec<_>>());
        assert_eq!(
            table.set_page_size(0),
            Err(ValidationError::InvalidPageSize)
        );
        assert_eq!(table.page_size(), 10);
    }

    #[test]
    fn test_select_all_then_refresh_clears_selection() {
        let mut table = table(4);
        table.toggle_select_all(true);
        assert_eq!(table.selected_count(), 4);
        assert_eq!(table.select_all_state(), SelectAllState::All);

        table.replace_records(rows(6));

        assert_eq!(table.selected_count(), 0);
        assert_eq!(table.select_all_state(), SelectAllState::None);
    }

    #[test]
    fn test_toggle_select() {
        let mut table = table(4);

        assert!(table.toggle_select(2));
        assert!(table.toggle_select(4));
        assert!(table.is_selected(&2));
        assert_eq!(table.select_all_state(), SelectAllState::Some);
        assert_eq!(table.selected_ids(), vec![2, 4]);

        assert!(!table.toggle_select(2));
        assert!(!table.is_selected(&2));
        assert_eq!(table.selected_count(), 1);

        table.toggle_select_all(false);
        assert_eq!(table.selected_count(), 0);
    }

    #[test]
    fn test_unknown_id_is_not_selected() {
        let mut table = table(2);

        assert!(!table.toggle_select(9));
        assert!(table.toggle_select(1));

        assert!(!table.is_selected(&9));
        assert_eq!(table.selected_count(), 1);
        assert_eq!(table.select_all_state(), SelectAllState::Some);
    }

    #[test]
    fn test_refresh_clamps_page_index() {
        let mut table = table(12);
        table.set_page(2);

        table.replace_records(rows(6));
        assert_eq!(table.page_index(), 1);
        assert_eq!(page_ids(&table), vec![6]);

        table.replace_records(Vec::new());
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.visible_page().empty_rows, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_find_by_id() {
        let table = table(3);
        assert_eq!(table.find(&2).map(|r| r.name.as_str()), Some("user98"));
        assert!(table.find(&7).is_none());
    }
}
