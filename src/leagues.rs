//! Static league and team identifier tables.
//!
//! Maps the league key used in request paths to the identifiers each upstream
//! needs: the Gamma tag ID for market queries and the ESPN sport/league path
//! segments for roster and game-log queries.

use crate::error::{AppError, Result};

#[derive(Debug)]
pub struct LeagueIds {
    /// Canonical lowercase key, also ESPN's league segment ("nba").
    pub key: &'static str,
    /// Gamma tag ID used to filter markets belonging to the league.
    pub tag_id: u32,
    /// ESPN sport segment ("basketball").
    pub sport: &'static str,
    teams: &'static [(&'static str, u32)],
}

impl LeagueIds {
    /// ESPN path prefix for site APIs, e.g. `basketball/nba`.
    pub fn sport_path(&self) -> String {
        format!("{}/{}", self.sport, self.key)
    }
}

const NBA_TEAMS: &[(&str, u32)] = &[
    ("hawks", 1),
    ("celtics", 2),
    ("pelicans", 3),
    ("bulls", 4),
    ("cavaliers", 5),
    ("mavericks", 6),
    ("nuggets", 7),
    ("pistons", 8),
    ("warriors", 9),
    ("rockets", 10),
    ("pacers", 11),
    ("clippers", 12),
    ("lakers", 13),
    ("heat", 14),
    ("bucks", 15),
    ("timberwolves", 16),
    ("nets", 17),
    ("knicks", 18),
    ("magic", 19),
    ("76ers", 20),
    ("suns", 21),
    ("trail blazers", 22),
    ("kings", 23),
    ("spurs", 24),
    ("thunder", 25),
    ("jazz", 26),
    ("wizards", 27),
    ("raptors", 28),
    ("grizzlies", 29),
    ("hornets", 30),
];

const NFL_TEAMS: &[(&str, u32)] = &[
    ("falcons", 1),
    ("bills", 2),
    ("bears", 3),
    ("bengals", 4),
    ("browns", 5),
    ("cowboys", 6),
    ("broncos", 7),
    ("lions", 8),
    ("packers", 9),
    ("titans", 10),
    ("colts", 11),
    ("chiefs", 12),
    ("raiders", 13),
    ("rams", 14),
    ("dolphins", 15),
    ("vikings", 16),
    ("patriots", 17),
    ("saints", 18),
    ("giants", 19),
    ("jets", 20),
    ("eagles", 21),
    ("cardinals", 22),
    ("steelers", 23),
    ("chargers", 24),
    ("49ers", 25),
    ("seahawks", 26),
    ("buccaneers", 27),
    ("commanders", 28),
    ("panthers", 29),
    ("jaguars", 30),
    ("ravens", 33),
    ("texans", 34),
];

static LEAGUES: &[LeagueIds] = &[
    LeagueIds { key: "nba", tag_id: 745, sport: "basketball", teams: NBA_TEAMS },
    LeagueIds { key: "nfl", tag_id: 450, sport: "football", teams: NFL_TEAMS },
];

/// Resolve a league name (any case, surrounding whitespace ignored).
pub fn resolve_league(name: &str) -> Result<&'static LeagueIds> {
    let key = name.trim().to_lowercase();
    LEAGUES
        .iter()
        .find(|l| l.key == key)
        .ok_or(AppError::UnknownLeague(key))
}

/// Resolve a team name within a league to its ESPN team ID.
/// `-` and `_` are read as spaces so URL-friendly slugs like `trail-blazers` work.
pub fn resolve_team(league: &LeagueIds, team_name: &str) -> Result<u32> {
    let folded = team_name.trim().to_lowercase().replace(['-', '_'], " ");
    league
        .teams
        .iter()
        .find(|(name, _)| *name == folded)
        .map(|&(_, id)| id)
        .ok_or_else(|| AppError::UnknownTeam {
            league: league.key.to_string(),
            team: folded,
        })
}

/// ESPN sport segment for game-log lookups. Wider than [`LEAGUES`]: a player's
/// game log only needs the sport, not market or team tables.
pub fn sport_for_league(league: &str) -> Result<&'static str> {
    match league.trim().to_lowercase().as_str() {
        "nba" => Ok("basketball"),
        "nfl" => Ok("football"),
        "mlb" => Ok("baseball"),
        "nhl" => Ok("hockey"),
        other => Err(AppError::UnsupportedLeague(other.to_string())),
    }
}
