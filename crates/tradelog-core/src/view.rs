//! The complete view description: filter, sort and page together.

use crate::criteria::FilterCriteria;
use crate::page::{PageSize, PageState};
use crate::sort::SortSpec;
use serde::Serialize;

/// What the trade list currently shows.
///
/// Treated as an immutable value: every change yields a new `ViewState`,
/// so "nothing changed" is a plain equality check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ViewState {
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    pub page: PageState,
}

impl ViewState {
    pub fn new(criteria: FilterCriteria, sort: SortSpec, page: PageState) -> Self {
        Self {
            criteria,
            sort,
            page,
        }
    }

    /// New criteria. Returns to the first page, since the old page number
    /// refers to a different result set.
    pub fn with_criteria(&self, criteria: FilterCriteria) -> Self {
        if criteria == self.criteria {
            return self.clone();
        }
        Self::new(criteria, self.sort, self.page.first_page())
    }

    /// New sort order. Returns to the first page.
    pub fn with_sort(&self, sort: SortSpec) -> Self {
        if sort == self.sort {
            return self.clone();
        }
        Self::new(self.criteria.clone(), sort, self.page.first_page())
    }

    pub fn with_page(&self, page: PageState) -> Self {
        Self::new(self.criteria.clone(), self.sort, page)
    }

    pub fn with_page_size(&self, size: PageSize) -> Self {
        self.with_page(self.page.with_size(size))
    }
}
