use tracing::debug;

use crate::aggregator::GameLog;
use crate::error::Result;
use crate::fetcher::UpstreamClient;
use crate::roster::{Athlete, RosterResponse};

/// Client for ESPN's public site and common APIs.
pub struct EspnClient {
    upstream: UpstreamClient,
    base_url: String,
}

impl EspnClient {
    pub fn new(upstream: UpstreamClient, base_url: &str) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `sport_path` is `{sport}/{league}`, e.g. `basketball/nba`.
    pub fn roster_url(&self, sport_path: &str, team_id: u32) -> String {
        format!("{}/site/v2/sports/{}/teams/{}/roster", self.base_url, sport_path, team_id)
    }

    pub fn game_log_url(&self, sport: &str, league: &str, athlete_id: &str) -> String {
        format!(
            "{}/common/v3/sports/{}/{}/athletes/{}/gamelog",
            self.base_url, sport, league, athlete_id
        )
    }

    /// Every athlete on the team, whatever the roster's grouping.
    pub async fn fetch_roster(&self, sport_path: &str, team_id: u32) -> Result<Vec<Athlete>> {
        let resp: RosterResponse = self
            .upstream
            .get_json(&self.roster_url(sport_path, team_id))
            .await?;
        debug!(sport_path, team_id, count = resp.athletes.0.len(), "fetched espn roster");
        Ok(resp.athletes.0)
    }

    pub async fn fetch_game_log(&self, sport: &str, league: &str, athlete_id: &str) -> Result<GameLog> {
        let log: GameLog = self
            .upstream
            .get_json(&self.game_log_url(sport, league, athlete_id))
            .await?;
        debug!(sport, league, athlete_id, games = log.entries().count(), "fetched espn game log");
        Ok(log)
    }
}
