//! Page selection: 1-indexed page number plus an allowed page size.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest page number a [`PageState`] holds. Larger requests are capped
/// here and then clamped to the last real page by pagination.
pub const MAX_PAGE: usize = 1_000_000;

/// Allowed page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    Ten,
    #[default]
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    #[inline]
    pub fn get(&self) -> usize {
        match self {
            Self::Ten => 10,
            Self::TwentyFive => 25,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }

    pub fn from_value(value: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.get() == value)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl TryFrom<usize> for PageSize {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| ValidationError::PageSizeNotAllowed {
            value: value.to_string(),
        })
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

/// Requested page. `page` is always within `1..=MAX_PAGE`; clamping to the
/// last page happens in [`crate::pagination::paginate`] once the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageState {
    page: usize,
    size: PageSize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            size: PageSize::default(),
        }
    }
}

impl PageState {
    pub fn new(page: usize, size: PageSize) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            size,
        }
    }

    #[inline]
    pub fn page(&self) -> usize {
        self.page
    }

    #[inline]
    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn first_page(&self) -> Self {
        Self::new(1, self.size)
    }

    pub fn with_page(&self, page: usize) -> Self {
        Self::new(page, self.size)
    }

    /// Index of the first row on this page.
    #[inline]
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.size.get())
    }

    /// Change the page size while keeping the first visible row on screen.
    pub fn with_size(&self, size: PageSize) -> Self {
        Self::new(self.offset() / size.get() + 1, size)
    }
}
