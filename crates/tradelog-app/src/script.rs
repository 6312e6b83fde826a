//! Scripted sessions: a JSON list of user actions and pauses.
//!
//! ```json
//! [
//!   { "op": "setSymbols", "text": "BTC, ETH" },
//!   { "op": "wait", "ms": 50 },
//!   { "op": "toggleSide", "side": "Buy" },
//!   { "op": "sort", "spec": "pnl:desc" },
//!   { "op": "page", "page": 2 }
//! ]
//! ```

use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tradelog_core::{Market, PageSize, Side, SortField, SortSpec};
use tradelog_engine::Intent;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    /// Pause between actions, to type slower than the debounce window.
    Wait { ms: u64 },
    SetSymbols { text: String },
    SetStrategy { text: String },
    SetPnlRange {
        #[serde(default)]
        min: String,
        #[serde(default)]
        max: String,
    },
    SetDateRange {
        #[serde(default)]
        from: Option<NaiveDate>,
        #[serde(default)]
        to: Option<NaiveDate>,
    },
    ToggleSide { side: Side },
    ToggleMarket { market: Market },
    ToggleEmotion { emotion: String },
    ClearFilters,
    /// `field:direction`, as in the `sort` query parameter.
    Sort { spec: String },
    ToggleSort { field: String },
    Page { page: usize },
    PageSize { size: usize },
    Navigate { query: String },
    Refresh,
}

/// What a step asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Wait(Duration),
    Dispatch(Intent),
}

impl Step {
    pub fn into_action(self) -> AppResult<Action> {
        let intent = match self {
            Self::Wait { ms } => return Ok(Action::Wait(Duration::from_millis(ms))),
            Self::SetSymbols { text } => Intent::SetSymbolsText(text),
            Self::SetStrategy { text } => Intent::SetStrategy(text),
            Self::SetPnlRange { min, max } => Intent::SetPnlRange { min, max },
            Self::SetDateRange { from, to } => Intent::SetDateRange { from, to },
            Self::ToggleSide { side } => Intent::ToggleSide(side),
            Self::ToggleMarket { market } => Intent::ToggleMarket(market),
            Self::ToggleEmotion { emotion } => Intent::ToggleEmotion(emotion),
            Self::ClearFilters => Intent::ClearFilters,
            Self::Sort { spec } => Intent::SetSort(
                SortSpec::parse(&spec).map_err(|e| AppError::Script(format!("sort {spec:?}: {e}")))?,
            ),
            Self::ToggleSort { field } => Intent::ToggleSort(
                field
                    .parse::<SortField>()
                    .map_err(|e| AppError::Script(format!("sort field {field:?}: {e}")))?,
            ),
            Self::Page { page } => Intent::GoToPage(page),
            Self::PageSize { size } => Intent::SetPageSize(
                PageSize::from_value(size)
                    .ok_or_else(|| AppError::Script(format!("page size {size} not allowed")))?,
            ),
            Self::Navigate { query } => Intent::Navigate(query),
            Self::Refresh => Intent::Refresh,
        };
        Ok(Action::Dispatch(intent))
    }
}

/// Parse a script and convert every step up front, so a bad step fails
/// before anything runs.
pub fn parse_script(json: &str) -> AppResult<Vec<Action>> {
    let steps: Vec<Step> = serde_json::from_str(json)?;
    steps.into_iter().map(Step::into_action).collect()
}

pub fn load_script(path: impl AsRef<Path>) -> AppResult<Vec<Action>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_script(&content)
}
