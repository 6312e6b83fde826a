//! Core domain types for the trade journal view engine.
//!
//! This crate provides the values every other crate exchanges:
//! - `TradeRecord`: A single journal entry (symbol, market, side, emotions, P&L)
//! - `FilterCriteria`, `SortSpec`, `PageState`: The immutable view description
//! - `paginate`: Page boundary math with clamping
//! - `validate`: Sanitizing untyped input (query params, stored payloads) into valid views

pub mod criteria;
pub mod decimal;
pub mod error;
pub mod page;
pub mod pagination;
pub mod params;
pub mod record;
pub mod sort;
pub mod validate;
pub mod view;

pub use criteria::FilterCriteria;
pub use decimal::Pnl;
pub use error::{CoreError, FieldRejection, Result, ValidationError};
pub use page::{PageSize, PageState, MAX_PAGE};
pub use pagination::{paginate, PageWindow};
pub use record::{Market, Side, TradeId, TradeRecord};
pub use sort::{SortDirection, SortField, SortSpec};
pub use validate::{
    validate_criteria, validate_filter_and_sort, validate_view, RawParams, RawValue, Validated,
};
pub use view::ViewState;
