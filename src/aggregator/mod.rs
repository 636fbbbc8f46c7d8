pub mod game_log;
pub mod opponent;

pub use game_log::GameLog;
pub use opponent::{averages_vs_opponent, OpponentAverages};
