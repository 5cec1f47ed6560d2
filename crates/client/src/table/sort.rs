//! Column sorting.

use std::cmp::Ordering;

use super::TableRecord;

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Orient a key comparison.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    /// Short name for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Records ordered by `column` in `direction`.
///
/// Equal keys keep their input order in both directions: only the key
/// comparison is reversed for `Desc`, never the position tie-break.
pub fn sorted_view<R: TableRecord>(
    records: &[R],
    column: R::Column,
    direction: SortDirection,
) -> Vec<&R> {
    let mut decorated: Vec<(usize, &R)> = records.iter().enumerate().collect();
    decorated.sort_by(|(ia, a), (ib, b)| {
        direction
            .apply(a.compare(b, column))
            .then_with(|| ia.cmp(ib))
    });
    decorated.into_iter().map(|(_, record)| record).collect()
}
