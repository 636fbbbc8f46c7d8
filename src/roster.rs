//! ESPN roster decoding.
//!
//! ESPN returns a team's athletes in one of three shapes depending on the
//! league, and a player's position as either a bare abbreviation or an
//! object. Both are normalized here so callers only ever see
//! `Vec<Athlete>` with a structured [`Position`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{de_opt_lenient, de_opt_string};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub jersey: Option<String>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub headshot: Option<Headshot>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub display_height: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub display_weight: Option<String>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub status: Option<AthleteStatus>,
}

/// Player position. Deserializes from `"QB"` (abbreviation, name and display
/// name all set to it) or from `{"abbreviation": .., "name": .., "displayName": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPosition")]
pub struct Position {
    pub abbreviation: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Abbreviation(String),
    Detailed {
        #[serde(default)]
        abbreviation: String,
        #[serde(default)]
        name: String,
        #[serde(default, rename = "displayName")]
        display_name: String,
    },
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        match raw {
            RawPosition::Abbreviation(abbr) => Position {
                name: abbr.clone(),
                display_name: abbr.clone(),
                abbreviation: abbr,
            },
            RawPosition::Detailed { abbreviation, name, display_name } => Position {
                abbreviation,
                name,
                display_name,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headshot {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteStatus {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

/// `athletes` field of an ESPN roster response, flattened to one list.
#[derive(Debug, Default)]
pub struct AthleteList(pub Vec<Athlete>);

impl<'de> Deserialize<'de> for AthleteList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Value::deserialize(deserializer)?;
        decode_athlete_list(v)
            .map(AthleteList)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub athletes: AthleteList,
}

/// Flatten an ESPN `athletes` value. Shapes are tried in this order:
///
/// 1. array whose first element has an `items` key: position groups, items
///    concatenated in array order (NFL);
/// 2. any other array: a flat athlete list (NBA);
/// 3. object with an `items` array: a single wrapped group.
///
/// `null` is an empty roster. Entries that are not athlete objects or carry
/// no `id` are dropped.
pub fn decode_athlete_list(v: Value) -> Result<Vec<Athlete>> {
    let raw: Vec<Value> = match v {
        Value::Null => Vec::new(),
        Value::Array(items) if is_grouped(&items) => items
            .into_iter()
            .flat_map(|group| match group {
                Value::Object(mut fields) => match fields.remove("items") {
                    Some(Value::Array(inner)) => inner,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            })
            .collect(),
        Value::Array(items) => items,
        Value::Object(mut fields) => match fields.remove("items") {
            Some(Value::Array(inner)) => inner,
            _ => {
                return Err(AppError::UpstreamDecode(serde::de::Error::custom(
                    "roster object has no items array",
                )))
            }
        },
        other => {
            return Err(AppError::UpstreamDecode(serde::de::Error::custom(format!(
                "unexpected roster shape: {other}"
            ))))
        }
    };

    let total = raw.len();
    let athletes: Vec<Athlete> = raw
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Athlete>(item).ok())
        .filter(|a| a.id.as_deref().is_some_and(|id| !id.is_empty()))
        .collect();
    if athletes.len() < total {
        debug!(total, kept = athletes.len(), "dropped roster entries without an id");
    }
    Ok(athletes)
}

fn is_grouped(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("items"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lebron() -> Value {
        json!({"id": "1966", "fullName": "LeBron James", "jersey": "23",
               "position": {"abbreviation": "F", "name": "Forward", "displayName": "Forward"}})
    }

    fn davis() -> Value {
        json!({"id": "6583", "fullName": "Anthony Davis", "position": "F"})
    }

    #[test]
    fn all_three_shapes_decode_to_the_same_list() {
        let flat = decode_athlete_list(json!([lebron(), davis()])).unwrap();
        let grouped = decode_athlete_list(json!([
            {"position": "offense", "items": [lebron()]},
            {"position": "defense", "items": [davis()]}
        ]))
        .unwrap();
        let wrapped = decode_athlete_list(json!({"items": [lebron(), davis()]})).unwrap();

        assert_eq!(flat.len(), 2);
        assert_eq!(flat, grouped);
        assert_eq!(flat, wrapped);
        assert_eq!(flat[0].full_name.as_deref(), Some("LeBron James"));
        assert_eq!(flat[1].id.as_deref(), Some("6583"));
    }

    #[test]
    fn string_and_object_positions_normalize_alike() {
        let from_string: Athlete =
            serde_json::from_value(json!({"id": "1", "position": "QB"})).unwrap();
        let from_object: Athlete = serde_json::from_value(json!({
            "id": "1",
            "position": {"abbreviation": "QB", "name": "QB", "displayName": "QB", "leaf": true}
        }))
        .unwrap();
        assert_eq!(from_string, from_object);
        assert_eq!(from_string.position.unwrap().display_name, "QB");
    }

    #[test]
    fn malformed_position_reads_as_absent() {
        let a: Athlete = serde_json::from_value(json!({"id": "1", "position": 12})).unwrap();
        assert!(a.position.is_none());
    }

    #[test]
    fn entries_without_id_are_dropped() {
        let list = decode_athlete_list(json!([lebron(), {"fullName": "Ghost"}, "junk"])).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn empty_and_null_rosters_are_empty() {
        assert!(decode_athlete_list(json!([])).unwrap().is_empty());
        assert!(decode_athlete_list(Value::Null).unwrap().is_empty());
        let resp: RosterResponse = serde_json::from_str(r#"{"team": {}}"#).unwrap();
        assert!(resp.athletes.0.is_empty());
    }

    #[test]
    fn unexpected_shapes_are_decode_errors() {
        assert!(matches!(
            decode_athlete_list(json!("athletes")),
            Err(AppError::UpstreamDecode(_))
        ));
        assert!(matches!(
            decode_athlete_list(json!({"count": 3})),
            Err(AppError::UpstreamDecode(_))
        ));
    }

    #[test]
    fn roster_response_decodes_grouped_athletes() {
        let raw = json!({
            "athletes": [{"position": "offense", "items": [davis()]}],
            "season": {"year": 2025}
        });
        let resp: RosterResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.athletes.0.len(), 1);
        assert_eq!(resp.athletes.0[0].position.as_ref().unwrap().abbreviation, "F");
    }
}
