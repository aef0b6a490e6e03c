//! Configuration entries and directives.
//!
//! The configuration file is a JSON array of entries:
//!
//! ```json
//! [
//!   {
//!     "owner": "acme",
//!     "repos": ["cli"],
//!     "directives": [
//!       { "state": "closed", "daysClosed": 365, "label": "stale", "lock": true }
//!     ]
//!   }
//! ]
//! ```
//!
//! Keys are camelCase; the PascalCase spellings used by older config files
//! (`"Owner"`, `"DaysClosed"`, ...) are accepted as aliases. Entries are not
//! validated here: a blank `owner` is reported by the orchestrator when it
//! reaches that entry.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{JanitorError, StateFilter};

/// One owner and the directives to apply to its repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    #[serde(default, alias = "Owner")]
    pub owner: String,

    /// Explicit repository names. Empty means every repository under `owner`.
    #[serde(default, alias = "Repos")]
    pub repos: Vec<String>,

    /// Applied in declaration order to every selected repository.
    #[serde(default, alias = "Directives")]
    pub directives: Vec<Directive>,
}

/// One selection filter plus the actions to apply to matching issues.
///
/// Zero day counts and empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    /// Search fragment; when present, selection uses search instead of listing.
    #[serde(default, alias = "Query")]
    pub query: Option<String>,

    /// Listing filter. Ignored when `query` is set.
    #[serde(default, alias = "State", deserialize_with = "state_or_blank")]
    pub state: Option<StateFilter>,

    #[serde(default, alias = "DaysClosed")]
    pub days_closed: u32,

    #[serde(default, alias = "DaysNotUpdated")]
    pub days_not_updated: u32,

    #[serde(default, alias = "Label")]
    pub label: Option<String>,

    #[serde(default, alias = "Lock")]
    pub lock: bool,

    #[serde(default, alias = "Close")]
    pub close: bool,

    /// Posted immediately before closing. Ignored unless `close` is set.
    #[serde(default, alias = "CloseComment")]
    pub close_comment: Option<String>,
}

impl Directive {
    /// The search fragment, if one is set and non-blank.
    pub fn query(&self) -> Option<&str> {
        non_blank(self.query.as_deref()).map(str::trim)
    }

    /// The label to apply, if one is set and non-empty.
    pub fn label(&self) -> Option<&str> {
        non_blank(self.label.as_deref())
    }

    /// The closing comment, if one is set and non-empty.
    pub fn close_comment(&self) -> Option<&str> {
        non_blank(self.close_comment.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts `"open" | "closed" | "all"`, and treats `""` or `null` as unset.
fn state_or_blank<'de, D>(deserializer: D) -> Result<Option<StateFilter>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => StateFilter::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(
            &value.to_ascii_lowercase(),
        ))
        .map(Some),
    }
}

/// Parses the JSON configuration document.
pub fn parse_config(json: &str) -> Result<Vec<ConfigEntry>, JanitorError> {
    serde_json::from_str(json)
        .map_err(|e| JanitorError::configuration(format!("invalid configuration: {e}")))
}
