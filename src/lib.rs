//! Swiss-system chess tournaments.
//!
//! A [`Tournament`] holds a fixed roster of players and a short sequence of
//! rounds. Each round is paired by the [`Pairer`]: top half against bottom
//! half by rank for the first round, then by score while avoiding rematches.
//! Results recorded on a [`Round`] update the players' scores, and the
//! [`db::Store`] keeps tournaments and the player directory in SQLite.

pub mod data;
pub mod db;
pub mod pairing;
pub mod player;
pub mod round;
pub mod tournament;

pub use pairing::{Pairer, PairingError, TieBreak};
pub use player::{Gender, Player, PlayerError, PlayerId};
pub use round::{Match, Outcome, Round, RoundError};
pub use tournament::{
	MatchView, Standing, TimeControl, Tournament, TournamentError, TournamentState,
};

/// Players a tournament must hold before its first round.
pub const MAX_PLAYER_LIMIT: usize = 8;

/// Rounds played in a tournament.
pub const MAX_ROUND_LIST: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
	pub max_players: usize,
	pub max_rounds: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			max_players: MAX_PLAYER_LIMIT,
			max_rounds: MAX_ROUND_LIST,
		}
	}
}
