use crate::config::DESCRIPTION_MAX_CHARS;
use crate::types::{GammaMarket, NormalizedMarket};

/// Map one Gamma market onto the stable response shape.
///
/// Never fails: absent or mistyped fields fall back to defaults
/// (`active` true, `closed` false, zero money values, empty text).
pub fn normalize(market: &GammaMarket) -> NormalizedMarket {
    let parent = market.parent_event();

    let volume = market.volume_num.or(market.volume).unwrap_or(0.0);
    let liquidity = [market.liquidity_num, market.liquidity, market.liquidity_clob]
        .into_iter()
        .flatten()
        .find(|v| *v != 0.0)
        .unwrap_or(0.0);

    let mut prices = market.outcome_prices.clone();
    let mut outcomes = market.outcomes.clone();
    if outcomes.is_empty() && prices.len() == 2 {
        outcomes = vec!["Yes".to_string(), "No".to_string()];
    }
    // Keep the lists parallel when the upstream disagrees with itself.
    if !outcomes.is_empty() && !prices.is_empty() && outcomes.len() != prices.len() {
        let n = outcomes.len().min(prices.len());
        outcomes.truncate(n);
        prices.truncate(n);
    }
    let probabilities = prices.iter().copied().map(to_probability).collect();

    let question = non_blank(&market.question)
        .or_else(|| non_blank(&market.title))
        .or_else(|| parent.and_then(|e| non_blank(&e.title)))
        .unwrap_or_default();

    let image = non_blank(&market.image).or_else(|| parent.and_then(|e| non_blank(&e.image)));

    NormalizedMarket {
        id: market.id.clone().unwrap_or_default(),
        slug: market.slug.clone(),
        question,
        description: truncate_description(market.description.as_deref().unwrap_or("")),
        image,
        outcomes,
        outcome_prices: prices,
        probabilities,
        volume,
        volume_formatted: format_money(volume),
        liquidity,
        liquidity_formatted: format_money(liquidity),
        active: market.active.unwrap_or(true),
        closed: market.closed.unwrap_or(false),
        end_date: market.end_date.clone(),
    }
}

/// Price in [0, 1] to a percentage with one decimal, ties away from zero.
pub fn to_probability(price: f64) -> f64 {
    (price * 1000.0).round() / 10.0
}

/// `$2.50M`, `$1.50K`, `$999`.
pub fn format_money(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${value:.0}")
    }
}

/// Trim, then hard-cut at [`DESCRIPTION_MAX_CHARS`] characters. Shorter text is kept whole.
pub fn truncate_description(raw: &str) -> String {
    raw.trim().chars().take(DESCRIPTION_MAX_CHARS).collect()
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
