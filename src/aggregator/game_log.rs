//! ESPN athlete game log, as served by
//! `common/v3/sports/{sport}/{league}/athletes/{id}/gamelog`.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{de_opt_string, de_vec_lenient};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLog {
    /// Column names for every entry's `stats`, e.g. `["MIN", "FG", ..., "PTS"]`.
    #[serde(default, deserialize_with = "de_stat_strings")]
    pub labels: Vec<String>,
    /// Game ID to game context.
    #[serde(default, deserialize_with = "de_events")]
    pub events: HashMap<String, GameMetadata>,
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub season_types: Vec<SeasonType>,
}

impl GameLog {
    /// Every game entry across season types and categories, in document order.
    pub fn entries(&self) -> impl Iterator<Item = &GameLogEntry> {
        self.season_types
            .iter()
            .flat_map(|st| st.categories.iter())
            .flat_map(|cat| cat.events.iter())
    }

    pub fn column(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonType {
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub categories: Vec<SeasonCategory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonCategory {
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub events: Vec<GameLogEntry>,
}

/// One game's raw stat strings, positional against [`GameLog::labels`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLogEntry {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "de_stat_strings")]
    pub stats: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMetadata {
    #[serde(default)]
    pub opponent: Opponent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub abbreviation: Option<String>,
}

impl Opponent {
    /// `wanted` must already be trimmed and lowercased. Display names match on
    /// substring, abbreviations only whole.
    pub fn matches(&self, wanted: &str) -> bool {
        let by_name = self
            .display_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(wanted));
        let by_abbreviation = self
            .abbreviation
            .as_deref()
            .is_some_and(|abbr| !wanted.is_empty() && abbr.eq_ignore_ascii_case(wanted));
        by_name || by_abbreviation
    }
}

/// Stat cells are normally strings; numbers are rendered, anything else is blank
/// so column positions stay aligned.
fn de_stat_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Array(cells)) => cells
            .into_iter()
            .map(|cell| match cell {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Event map where entries that fail to decode are skipped.
fn de_events<'de, D>(deserializer: D) -> Result<HashMap<String, GameMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(id, meta)| serde_json::from_value(meta).ok().map(|m| (id, m)))
            .collect(),
        _ => HashMap::new(),
    })
}
