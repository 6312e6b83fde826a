//! Criteria validator.
//!
//! Turns untyped input into a valid [`ViewState`]. Input comes from two
//! places: parsed query strings (every value is text) and stored payloads
//! (partially typed JSON). Both are first mapped into [`RawParams`].
//!
//! Validation is field-by-field and never fails as a whole. A malformed
//! field is dropped and reported in [`Validated::rejections`]; every other
//! field is kept, so one corrupt parameter cannot blank the whole view.
//! Unknown parameter names are ignored.

use crate::criteria::{check_strategy, normalize_emotion, normalize_symbol, FilterCriteria};
use crate::decimal::Pnl;
use crate::error::{FieldRejection, ValidationError};
use crate::page::{PageSize, PageState, MAX_PAGE};
use crate::params::{
    DATE_FORMAT, EMOTIONS, FROM, MARKETS, PAGE, PAGE_SIZE, PNL_MAX, PNL_MIN, SIDE, SORT, STRATEGY,
    SYMBOLS, TO,
};
use crate::record::{Market, Side};
use crate::sort::SortSpec;
use crate::view::ViewState;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One untyped input value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Free text. Set-valued fields split it on `,`.
    Text(String),
    /// Already-split list (stored payloads).
    List(Vec<String>),
    /// A JSON number, kept as text to preserve exact decimals.
    Number(String),
    Bool(bool),
    /// Anything else (objects, nested arrays), carried only to be rejected.
    Other(&'static str),
}

/// Parameter name to raw value.
pub type RawParams = BTreeMap<String, RawValue>;

impl RawValue {
    /// Map a JSON value. `null` means "absent" and yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.to_string())),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        Value::Number(n) => out.push(n.to_string()),
                        _ => return Some(Self::Other("nested value")),
                    }
                }
                Some(Self::List(out))
            }
            Value::Object(_) => Some(Self::Other("object")),
        }
    }

    /// Build params from a JSON object, ignoring non-object input.
    pub fn params_from_json(value: &serde_json::Value) -> RawParams {
        value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|raw| (k.clone(), raw)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Other(kind) => kind,
        }
    }

    /// Items of a set-valued field, trimmed, empties removed.
    fn items(&self) -> Result<Vec<String>, ValidationError> {
        let items: Vec<String> = match self {
            Self::Text(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
            Self::List(v) => v.iter().map(|p| p.trim().to_string()).collect(),
            Self::Number(n) => vec![n.clone()],
            _ => {
                return Err(ValidationError::WrongType {
                    expected: "list",
                    found: self.type_name(),
                })
            }
        };
        Ok(items.into_iter().filter(|p| !p.is_empty()).collect())
    }

    /// Single scalar value as text.
    fn scalar(&self) -> Result<String, ValidationError> {
        match self {
            Self::Text(s) | Self::Number(s) => Ok(s.trim().to_string()),
            Self::List(v) if v.len() == 1 => Ok(v[0].trim().to_string()),
            _ => Err(ValidationError::WrongType {
                expected: "single value",
                found: self.type_name(),
            }),
        }
    }
}

/// A validated value plus the fields dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub rejections: Vec<FieldRejection>,
}

impl<T> Validated<T> {
    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: f(self.value),
            rejections: self.rejections,
        }
    }

    pub fn into_parts(self) -> (T, Vec<FieldRejection>) {
        (self.value, self.rejections)
    }
}

/// Scalar helper: absent → `None`, malformed → rejection + `None`.
fn scalar<T>(
    params: &RawParams,
    field: &str,
    rejections: &mut Vec<FieldRejection>,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> Option<T> {
    let raw = params.get(field)?;
    let result = raw.scalar().and_then(|s| {
        if s.is_empty() {
            Ok(None)
        } else {
            parse(&s).map(Some)
        }
    });
    match result {
        Ok(v) => v,
        Err(error) => {
            rejections.push(FieldRejection::new(field, error));
            None
        }
    }
}

/// Set helper: each malformed item is rejected on its own.
fn items<T>(
    params: &RawParams,
    field: &str,
    rejections: &mut Vec<FieldRejection>,
    mut parse: impl FnMut(&str) -> Result<T, ValidationError>,
) -> Vec<T> {
    let Some(raw) = params.get(field) else {
        return Vec::new();
    };
    match raw.items() {
        Ok(list) => list
            .iter()
            .filter_map(|item| match parse(item) {
                Ok(v) => Some(v),
                Err(error) => {
                    rejections.push(FieldRejection::new(field, error));
                    None
                }
            })
            .collect(),
        Err(error) => {
            rejections.push(FieldRejection::new(field, error));
            Vec::new()
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| ValidationError::MalformedDate {
        value: s.to_string(),
    })
}

fn parse_pnl(s: &str) -> Result<Pnl, ValidationError> {
    s.parse::<Pnl>().map_err(|_| ValidationError::NonNumeric {
        value: s.to_string(),
    })
}

fn parse_text_item(
    normalize: fn(&str) -> Option<String>,
) -> impl FnMut(&str) -> Result<String, ValidationError> {
    move |s| {
        normalize(s).ok_or_else(|| ValidationError::UnknownValue {
            value: s.to_string(),
        })
    }
}

/// Validate the filter fields of `params`.
pub fn validate_criteria(params: &RawParams) -> Validated<FilterCriteria> {
    let mut rejections = Vec::new();

    let from = scalar(params, FROM, &mut rejections, parse_date);
    let to = scalar(params, TO, &mut rejections, parse_date);
    let (from, to) = match (from, to) {
        (Some(f), Some(t)) if f > t => {
            rejections.push(FieldRejection::new(
                TO,
                ValidationError::ReversedDateRange {
                    from: f.format(DATE_FORMAT).to_string(),
                    to: t.format(DATE_FORMAT).to_string(),
                },
            ));
            (None, None)
        }
        bounds => bounds,
    };

    let pnl_min = scalar(params, PNL_MIN, &mut rejections, parse_pnl);
    let pnl_max = scalar(params, PNL_MAX, &mut rejections, parse_pnl);
    let (pnl_min, pnl_max) = match (pnl_min, pnl_max) {
        (Some(lo), Some(hi)) if lo > hi => {
            rejections.push(FieldRejection::new(
                PNL_MAX,
                ValidationError::MinGreaterThanMax {
                    min: lo.canonical(),
                    max: hi.canonical(),
                },
            ));
            (None, None)
        }
        bounds => bounds,
    };

    let symbols = items(params, SYMBOLS, &mut rejections, parse_text_item(normalize_symbol));
    let emotions = items(params, EMOTIONS, &mut rejections, parse_text_item(normalize_emotion));
    let markets = items(params, MARKETS, &mut rejections, |s| s.parse::<Market>());
    let sides = items(params, SIDE, &mut rejections, |s| s.parse::<Side>());
    let strategy = scalar(params, STRATEGY, &mut rejections, check_strategy);

    let base = FilterCriteria::new()
        .with_symbols(symbols)
        .with_emotions(emotions)
        .with_markets(markets)
        .with_sides(sides);
    // Bounds were ordered above, so these cannot fail; keep the previous
    // value rather than panic if they ever do.
    let base = base.clone().with_date_range(from, to).unwrap_or(base);
    let base = base.clone().with_pnl_range(pnl_min, pnl_max).unwrap_or(base);
    let criteria = base
        .clone()
        .with_strategy(strategy.as_deref())
        .unwrap_or(base);

    Validated {
        value: criteria,
        rejections,
    }
}

fn validate_sort(params: &RawParams, rejections: &mut Vec<FieldRejection>) -> SortSpec {
    scalar(params, SORT, rejections, SortSpec::parse).unwrap_or_default()
}

/// Pages above [`MAX_PAGE`] are capped rather than rejected; pagination then
/// clamps them to the last page.
fn validate_page(params: &RawParams, rejections: &mut Vec<FieldRejection>) -> PageState {
    let page = scalar(params, PAGE, rejections, |s| match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n.min(MAX_PAGE)),
        _ => Err(ValidationError::InvalidPage {
            value: s.to_string(),
        }),
    })
    .unwrap_or(1);

    let size = scalar(params, PAGE_SIZE, rejections, |s| {
        s.parse::<usize>()
            .ok()
            .and_then(PageSize::from_value)
            .ok_or_else(|| ValidationError::PageSizeNotAllowed {
                value: s.to_string(),
            })
    })
    .unwrap_or_default();

    PageState::new(page, size)
}

/// Validate filter and sort, ignoring any page fields.
///
/// Used for stored payloads, where a page number is meaningless.
pub fn validate_filter_and_sort(params: &RawParams) -> Validated<(FilterCriteria, SortSpec)> {
    let Validated {
        value: criteria,
        mut rejections,
    } = validate_criteria(params);
    let sort = validate_sort(params, &mut rejections);
    Validated {
        value: (criteria, sort),
        rejections,
    }
}

/// Validate a complete view: filter, sort and page.
pub fn validate_view(params: &RawParams) -> Validated<ViewState> {
    let Validated {
        value: (criteria, sort),
        mut rejections,
    } = validate_filter_and_sort(params);
    let page = validate_page(params, &mut rejections);
    Validated {
        value: ViewState::new(criteria, sort, page),
        rejections,
    }
}
