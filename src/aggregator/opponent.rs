use serde::Serialize;
use tracing::debug;

use crate::aggregator::game_log::{GameLog, GameLogEntry};
use crate::error::{AppError, Result};

/// Per-game averages for one athlete against one opponent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentAverages {
    pub games_played: u32,
    pub avg_points: f64,
    pub avg_rebounds: f64,
    pub avg_assists: f64,
    pub avg_steals: f64,
    pub avg_blocks: f64,
    #[serde(rename = "avgFGPercentage")]
    pub avg_fg_percentage: f64,
}

/// Minutes values meaning the athlete did not play.
const DID_NOT_PLAY: &[&str] = &["0", "--", ""];

struct Columns {
    minutes: usize,
    field_goals: usize,
    points: usize,
    rebounds: Option<usize>,
    assists: Option<usize>,
    steals: Option<usize>,
    blocks: Option<usize>,
}

impl Columns {
    /// MIN, FG and PTS are required; the rest count as 0 when absent.
    fn locate(log: &GameLog) -> Result<Self> {
        let missing: Vec<&str> = ["MIN", "FG", "PTS"]
            .into_iter()
            .filter(|label| log.column(label).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::MissingStatLabels(missing.join(", ")));
        }
        Ok(Self {
            minutes: log.column("MIN").unwrap_or_default(),
            field_goals: log.column("FG").unwrap_or_default(),
            points: log.column("PTS").unwrap_or_default(),
            rebounds: log.column("REB"),
            assists: log.column("AST"),
            steals: log.column("STL"),
            blocks: log.column("BLK"),
        })
    }
}

#[derive(Default)]
struct Totals {
    games: u32,
    points: f64,
    rebounds: f64,
    assists: f64,
    steals: f64,
    blocks: f64,
    fg_made: u64,
    fg_attempted: u64,
}

/// Average an athlete's box score over games against `opponent`.
///
/// A game counts when its metadata exists, the opponent's display name
/// contains `opponent` or its abbreviation equals it (both case-insensitive),
/// the athlete logged minutes and the
/// FG cell parses as `made-attempted` with at least one attempt. No matching
/// games is a valid result with `games_played == 0`.
pub fn averages_vs_opponent(log: &GameLog, opponent: &str) -> Result<OpponentAverages> {
    let cols = Columns::locate(log)?;
    let wanted = opponent.trim().to_lowercase();

    let mut totals = Totals::default();
    for entry in log.entries() {
        let Some(meta) = entry.event_id.as_deref().and_then(|id| log.events.get(id)) else {
            continue;
        };
        if !meta.opponent.matches(&wanted) {
            continue;
        }
        if let Some(line) = read_line(entry, &cols) {
            totals.games += 1;
            totals.points += line.points;
            totals.rebounds += line.rebounds;
            totals.assists += line.assists;
            totals.steals += line.steals;
            totals.blocks += line.blocks;
            totals.fg_made += u64::from(line.fg_made);
            totals.fg_attempted += u64::from(line.fg_attempted);
        }
    }

    debug!(opponent = %wanted, games = totals.games, "aggregated games vs opponent");

    if totals.games == 0 {
        return Ok(OpponentAverages::default());
    }

    let n = f64::from(totals.games);
    let fg_pct = if totals.fg_attempted > 0 {
        totals.fg_made as f64 / totals.fg_attempted as f64 * 100.0
    } else {
        0.0
    };
    Ok(OpponentAverages {
        games_played: totals.games,
        avg_points: totals.points / n,
        avg_rebounds: totals.rebounds / n,
        avg_assists: totals.assists / n,
        avg_steals: totals.steals / n,
        avg_blocks: totals.blocks / n,
        avg_fg_percentage: fg_pct,
    })
}

struct GameLine {
    points: f64,
    rebounds: f64,
    assists: f64,
    steals: f64,
    blocks: f64,
    fg_made: u32,
    fg_attempted: u32,
}

/// `None` when the row stops short of the PTS column, the athlete did not
/// play, or the FG cell is unusable.
fn read_line(entry: &GameLogEntry, cols: &Columns) -> Option<GameLine> {
    entry.stats.get(cols.points)?;
    let minutes = entry.stats.get(cols.minutes)?.trim();
    if DID_NOT_PLAY.contains(&minutes) {
        return None;
    }
    let (fg_made, fg_attempted) = parse_made_attempted(entry.stats.get(cols.field_goals)?)?;
    let points = stat(entry, Some(cols.points));
    Some(GameLine {
        points,
        rebounds: stat(entry, cols.rebounds),
        assists: stat(entry, cols.assists),
        steals: stat(entry, cols.steals),
        blocks: stat(entry, cols.blocks),
        fg_made,
        fg_attempted,
    })
}

/// Unparsable or missing cells count as 0.
fn stat(entry: &GameLogEntry, col: Option<usize>) -> f64 {
    col.and_then(|i| entry.stats.get(i))
        .and_then(|cell| cell.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// `"7-15"` to `(7, 15)`. Zero attempts is rejected.
fn parse_made_attempted(cell: &str) -> Option<(u32, u32)> {
    let (made, attempted) = cell.trim().split_once('-')?;
    let made = made.parse::<u32>().ok()?;
    let attempted = attempted.parse::<u32>().ok()?;
    (attempted > 0).then_some((made, attempted))
}
