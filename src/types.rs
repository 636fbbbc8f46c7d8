use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Gamma market (upstream)
// ---------------------------------------------------------------------------

/// One market as returned by the Gamma API.
///
/// Gamma's payloads vary by market type: numbers arrive as strings, list
/// fields arrive as JSON-encoded strings, group markets carry `title` instead
/// of `question`. Every field is optional and decodes leniently, so a field of
/// the wrong type reads as absent instead of failing the record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub end_date: Option<String>,

    #[serde(default, deserialize_with = "de_opt_f64")]
    pub volume_num: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity_num: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity_clob: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity: Option<f64>,

    /// Outcome labels, parallel to `outcome_prices`.
    #[serde(default, deserialize_with = "de_vec_string_flexible")]
    pub outcomes: Vec<String>,
    /// Outcome prices in [0, 1]. Non-numeric entries are dropped.
    #[serde(default, deserialize_with = "de_vec_f64_flexible")]
    pub outcome_prices: Vec<f64>,

    #[serde(default, deserialize_with = "de_opt_bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_bool")]
    pub closed: Option<bool>,

    /// Parent events; the first one supplies title/image fallbacks.
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub events: Vec<GammaEventRef>,
}

impl GammaMarket {
    pub fn parent_event(&self) -> Option<&GammaEventRef> {
        self.events.first()
    }
}

/// The slice of a Gamma event embedded in a market that we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GammaEventRef {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized market (response)
// ---------------------------------------------------------------------------

/// Front-end facing market shape. `outcomes`, `outcome_prices` and
/// `probabilities` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMarket {
    pub id: String,
    pub slug: Option<String>,
    /// Display text: question, else title, else the parent event's title.
    pub question: String,
    pub description: String,
    pub image: Option<String>,
    pub outcomes: Vec<String>,
    pub outcome_prices: Vec<f64>,
    /// Prices as percentages rounded to one decimal.
    pub probabilities: Vec<f64>,
    pub volume: f64,
    pub volume_formatted: String,
    pub liquidity: f64,
    pub liquidity_formatted: String,
    pub active: bool,
    pub closed: bool,
    pub end_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Gamma encodes list fields either as arrays or as strings holding a JSON array.
fn value_as_list(v: Value) -> Vec<Value> {
    match v {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Accepts a string or a number (rendered as text); anything else is `None`.
pub fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts a number or a numeric string.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref().and_then(value_as_f64))
}

/// Accepts a bool or the strings "true"/"false".
pub fn de_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

/// List of strings from an array or a stringified array; non-string entries are dropped.
pub fn de_vec_string_flexible<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.map(value_as_list)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// List of numbers from an array or a stringified array; entries that are
/// neither numbers nor numeric strings are dropped.
pub fn de_vec_f64_flexible<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.map(value_as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(value_as_f64)
        .collect())
}

/// Array of records where elements that fail to decode are skipped.
pub fn de_vec_lenient<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Single record that reads as `None` when it fails to decode.
pub fn de_opt_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.and_then(|item| serde_json::from_value(item).ok()))
}
