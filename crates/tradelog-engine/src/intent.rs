//! UI intents and how they reduce onto a view.

use chrono::NaiveDate;
use tradelog_core::params::{PAGE, PNL_MAX, PNL_MIN, STRATEGY, SYMBOLS, TO};
use tradelog_core::{
    validate_criteria, CoreError, FieldRejection, FilterCriteria, Market, PageSize, RawParams, RawValue,
    Side, SortField, SortSpec, ValidationError, ViewState,
};
use tradelog_url::decode;

/// Debounce class of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Keystroke-driven input.
    Text,
    /// Toggles, buttons and selections.
    Discrete,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Discrete => "discrete",
        }
    }
}

/// A user action on the trade list.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetCriteria(FilterCriteria),
    ToggleSide(Side),
    ToggleMarket(Market),
    ToggleEmotion(String),
    /// Raw comma-separated symbol input.
    SetSymbolsText(String),
    /// Raw strategy input; empty clears.
    SetStrategy(String),
    /// Raw P&L bound inputs; empty clears.
    SetPnlRange { min: String, max: String },
    SetDateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    ClearFilters,
    SetSort(SortSpec),
    /// Sort by `field`; the current field flips direction.
    ToggleSort(SortField),
    GoToPage(usize),
    SetPageSize(PageSize),
    /// Load the view encoded in a query string, as a new history entry.
    Navigate(String),
    /// Re-run the current view.
    Refresh,
}

/// Next view computed from an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced {
    pub view: ViewState,
    pub rejections: Vec<FieldRejection>,
}

impl Reduced {
    fn clean(view: ViewState) -> Self {
        Self {
            view,
            rejections: Vec::new(),
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::SetSymbolsText(_) | Self::SetStrategy(_) | Self::SetPnlRange { .. } => {
                IntentKind::Text
            }
            _ => IntentKind::Discrete,
        }
    }

    /// Navigation creates a history entry; everything else replaces.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigate(_))
    }

    /// Apply the intent to `current`.
    ///
    /// Raw text goes through the validator; a rejected input leaves the
    /// affected field unchanged and is reported. Filter and sort changes
    /// return to the first page.
    pub fn reduce(&self, current: &ViewState) -> Reduced {
        let criteria = current.criteria.clone();
        match self {
            Self::SetCriteria(c) => Reduced::clean(current.with_criteria(c.clone())),
            Self::ToggleSide(side) => Reduced::clean(current.with_criteria(criteria.toggle_side(*side))),
            Self::ToggleMarket(market) => {
                Reduced::clean(current.with_criteria(criteria.toggle_market(*market)))
            }
            Self::ToggleEmotion(emotion) => {
                Reduced::clean(current.with_criteria(criteria.toggle_emotion(emotion)))
            }
            Self::SetSymbolsText(text) => {
                let validated = validate_criteria(&text_param(SYMBOLS, text));
                let symbols = validated.value.symbols().clone();
                Reduced {
                    view: current.with_criteria(criteria.with_symbols(symbols)),
                    rejections: validated.rejections,
                }
            }
            Self::SetStrategy(text) => {
                let trimmed = text.trim();
                let strategy = (!trimmed.is_empty()).then_some(trimmed);
                match criteria.with_strategy(strategy) {
                    Ok(next) => Reduced::clean(current.with_criteria(next)),
                    Err(e) => Reduced {
                        view: current.clone(),
                        rejections: vec![FieldRejection::new(
                            STRATEGY,
                            validation_error(e, trimmed),
                        )],
                    },
                }
            }
            Self::SetPnlRange { min, max } => {
                let mut params = text_param(PNL_MIN, min);
                params.extend(text_param(PNL_MAX, max));
                let validated = validate_criteria(&params);
                if !validated.is_clean() {
                    return Reduced {
                        view: current.clone(),
                        rejections: validated.rejections,
                    };
                }
                let bounds = (validated.value.pnl_min(), validated.value.pnl_max());
                let next = criteria.clone().with_pnl_range(bounds.0, bounds.1).unwrap_or(criteria);
                Reduced::clean(current.with_criteria(next))
            }
            Self::SetDateRange { from, to } => match criteria.with_date_range(*from, *to) {
                Ok(next) => Reduced::clean(current.with_criteria(next)),
                Err(e) => Reduced {
                    view: current.clone(),
                    rejections: vec![FieldRejection::new(
                        TO,
                        validation_error(e, ""),
                    )],
                },
            },
            Self::ClearFilters => Reduced::clean(current.with_criteria(FilterCriteria::new())),
            Self::SetSort(sort) => Reduced::clean(current.with_sort(*sort)),
            Self::ToggleSort(field) => Reduced::clean(current.with_sort(current.sort.toggled(*field))),
            Self::GoToPage(0) => Reduced {
                view: current.clone(),
                rejections: vec![FieldRejection::new(
                    PAGE,
                    ValidationError::InvalidPage {
                        value: "0".to_string(),
                    },
                )],
            },
            Self::GoToPage(page) => Reduced::clean(current.with_page(current.page.with_page(*page))),
            Self::SetPageSize(size) => Reduced::clean(current.with_page_size(*size)),
            Self::Navigate(query) => {
                let validated = decode(query);
                Reduced {
                    view: validated.value,
                    rejections: validated.rejections,
                }
            }
            Self::Refresh => Reduced::clean(current.clone()),
        }
    }
}

fn text_param(name: &str, value: &str) -> RawParams {
    let mut params = RawParams::new();
    params.insert(name.to_string(), RawValue::Text(value.to_string()));
    params
}

/// Unwrap the validation error inside a core error.
fn validation_error(error: CoreError, value: &str) -> ValidationError {
    match error {
        CoreError::Validation(e) => e,
        other => ValidationError::UnknownValue {
            value: format!("{value}: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradelog_core::{PageState, Pnl};

    fn on_page(page: usize) -> ViewState {
        ViewState::default().with_page(PageState::new(page, PageSize::TwentyFive))
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Intent::SetSymbolsText("B".into()).kind(), IntentKind::Text);
        assert_eq!(Intent::ToggleSide(Side::Buy).kind(), IntentKind::Discrete);
        assert_eq!(Intent::Navigate(String::new()).kind(), IntentKind::Discrete);
        assert!(Intent::Navigate(String::new()).is_navigation());
    }

    #[test]
    fn test_filter_change_resets_page() {
        let reduced = Intent::ToggleSide(Side::Sell).reduce(&on_page(4));
        assert_eq!(reduced.view.page.page(), 1);
        assert!(reduced.view.criteria.sides().contains(&Side::Sell));
    }

    #[test]
    fn test_page_change_keeps_filters() {
        let start = ViewState::default()
            .with_criteria(FilterCriteria::new().with_symbols(["BTC"]));
        let reduced = Intent::GoToPage(3).reduce(&start);
        assert_eq!(reduced.view.page.page(), 3);
        assert_eq!(reduced.view.criteria, start.criteria);
    }

    #[test]
    fn test_go_to_page_zero_rejected() {
        let start = on_page(2);
        let reduced = Intent::GoToPage(0).reduce(&start);
        assert_eq!(reduced.view, start);
        assert_eq!(reduced.rejections[0].field, "page");
    }

    #[test]
    fn test_go_to_huge_page_capped() {
        let reduced = Intent::GoToPage(usize::MAX).reduce(&on_page(2));
        assert!(reduced.rejections.is_empty());
        assert_eq!(reduced.view.page.page(), tradelog_core::MAX_PAGE);

        let resized = Intent::SetPageSize(PageSize::Ten).reduce(&reduced.view);
        assert_eq!(resized.view.page.page(), tradelog_core::MAX_PAGE);
    }

    #[test]
    fn test_symbols_text_partial() {
        let reduced = Intent::SetSymbolsText("btc, ,eth".into()).reduce(&ViewState::default());
        assert!(reduced.rejections.is_empty());
        assert_eq!(reduced.view.criteria.symbols().len(), 2);

        let cleared = Intent::SetSymbolsText("  ".into()).reduce(&reduced.view);
        assert!(cleared.view.criteria.symbols().is_empty());
    }

    #[test]
    fn test_pnl_range_text() {
        let reduced = Intent::SetPnlRange {
            min: "-10".into(),
            max: "".into(),
        }
        .reduce(&ViewState::default());
        assert_eq!(reduced.view.criteria.pnl_min(), Some(Pnl::new(dec!(-10))));
        assert!(reduced.view.criteria.pnl_max().is_none());

        // Half-typed input leaves the previous bounds in place.
        let bad = Intent::SetPnlRange {
            min: "-".into(),
            max: "".into(),
        }
        .reduce(&reduced.view);
        assert_eq!(bad.view, reduced.view);
        assert_eq!(bad.rejections.len(), 1);
    }

    #[test]
    fn test_strategy_text() {
        let reduced = Intent::SetStrategy(" breakout ".into()).reduce(&ViewState::default());
        assert_eq!(reduced.view.criteria.strategy(), Some("breakout"));
        let bad = Intent::SetStrategy("two words".into()).reduce(&reduced.view);
        assert_eq!(bad.view, reduced.view);
        assert_eq!(bad.rejections[0].field, "strategy");
        let cleared = Intent::SetStrategy(String::new()).reduce(&reduced.view);
        assert!(cleared.view.criteria.strategy().is_none());
    }

    #[test]
    fn test_reversed_date_range_rejected() {
        let reduced = Intent::SetDateRange {
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
        }
        .reduce(&on_page(2));
        assert_eq!(reduced.view, on_page(2));
        assert_eq!(reduced.rejections.len(), 1);
    }

    #[test]
    fn test_toggle_sort() {
        let by_pnl = Intent::ToggleSort(SortField::Pnl).reduce(&on_page(3)).view;
        assert_eq!(by_pnl.sort.field, SortField::Pnl);
        assert_eq!(by_pnl.page.page(), 1);
        let flipped = Intent::ToggleSort(SortField::Pnl).reduce(&by_pnl).view;
        assert_eq!(flipped.sort.direction, by_pnl.sort.direction.reversed());
    }

    #[test]
    fn test_navigate_replaces_view() {
        let reduced = Intent::Navigate("?side=Buy&page=2&pageSize=10".into()).reduce(&on_page(5));
        assert_eq!(reduced.view.page, PageState::new(2, PageSize::Ten));
        assert!(reduced.view.criteria.sides().contains(&Side::Buy));
    }

    #[test]
    fn test_refresh_and_clear() {
        let start = ViewState::default()
            .with_criteria(FilterCriteria::new().with_symbols(["SOL"]));
        assert_eq!(Intent::Refresh.reduce(&start).view, start);
        assert!(Intent::ClearFilters
            .reduce(&start)
            .view
            .criteria
            .is_unconstrained());
    }
}
