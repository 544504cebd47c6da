//! The tournament lifecycle: registration, rounds, closing.
//!
//! ```text
//! Building -> Ready -> InRound -> RoundDone -> InRound -> ... -> Complete -> Closed
//! ```
//!
//! The state is derived from the roster and round list, never stored.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
	pairing::{Pairer, PairingError, TieBreak},
	player::{Player, PlayerId},
	round::{Match, Outcome, Round, RoundError},
	Limits,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TournamentError {
	#[error("tournament: the roster is full ({max} players)")]
	RosterFull { max: usize },
	#[error("tournament: {0} is already registered")]
	DuplicatePlayer(PlayerId),
	#[error("tournament: need {needed} players to pair a round, have {current}")]
	InsufficientPlayers { needed: usize, current: usize },
	#[error("tournament: the current round has to be closed first")]
	RoundInProgress,
	#[error("tournament: all {max} rounds have been created")]
	MaxRoundsReached { max: usize },
	#[error("tournament: no round has been started")]
	NoRoundStarted,
	#[error("tournament: every round has to be played before the tournament ends")]
	TournamentNotFinished,
	#[error(transparent)]
	Pairing(#[from] PairingError),
	#[error(transparent)]
	Round(#[from] RoundError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentState {
	/// Registering players.
	Building,
	/// Roster full, no round yet.
	Ready,
	InRound,
	RoundDone,
	/// Last round closed, no end date yet.
	Complete,
	Closed,
}

impl fmt::Display for TournamentState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self {
			TournamentState::Building => "registering players",
			TournamentState::Ready => "ready",
			TournamentState::InRound => "round in progress",
			TournamentState::RoundDone => "between rounds",
			TournamentState::Complete => "all rounds played",
			TournamentState::Closed => "closed",
		};
		write!(f, "{state}")
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeControl {
	Bullet,
	Blitz,
	Rapid,
}

impl fmt::Display for TimeControl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TimeControl::Bullet => write!(f, "bullet"),
			TimeControl::Blitz => write!(f, "blitz"),
			TimeControl::Rapid => write!(f, "rapid"),
		}
	}
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown time control {0:?}, expected bullet, blitz or rapid")]
pub struct UnknownTimeControl(String);

impl FromStr for TimeControl {
	type Err = UnknownTimeControl;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"bullet" => Ok(TimeControl::Bullet),
			"blitz" => Ok(TimeControl::Blitz),
			"rapid" | "coup rapide" => Ok(TimeControl::Rapid),
			_ => Err(UnknownTimeControl(s.to_string())),
		}
	}
}

/// One line of the standings table.
#[derive(Clone, Debug, PartialEq)]
pub struct Standing {
	pub place: usize,
	pub id: PlayerId,
	pub name: String,
	pub rank: u32,
	pub score: f32,
}

/// A match with the player names resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchView {
	pub number: usize,
	pub first: String,
	pub second: String,
	pub score: [f32; 2],
}

#[derive(Clone, Debug)]
pub struct Tournament {
	name: String,
	location: String,
	time_control: TimeControl,
	description: String,
	start: NaiveDateTime,
	end: Option<NaiveDate>,
	tie_break: TieBreak,
	limits: Limits,
	players: Vec<Player>,
	rounds: Vec<Round>,
}

impl Tournament {
	pub fn new(
		name: &str,
		location: &str,
		time_control: TimeControl,
		description: &str,
		start: NaiveDateTime,
	) -> Self {
		Self {
			name: name.to_string(),
			location: location.to_string(),
			time_control,
			description: description.to_string(),
			start,
			end: None,
			tie_break: TieBreak::default(),
			limits: Limits::default(),
			players: Vec::new(),
			rounds: Vec::new(),
		}
	}

	pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
		self.tie_break = tie_break;
		self
	}

	pub fn with_limits(mut self, limits: Limits) -> Self {
		self.limits = limits;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn location(&self) -> &str {
		&self.location
	}

	pub fn time_control(&self) -> TimeControl {
		self.time_control
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn start(&self) -> NaiveDateTime {
		self.start
	}

	pub fn end(&self) -> Option<NaiveDate> {
		self.end
	}

	pub fn tie_break(&self) -> TieBreak {
		self.tie_break
	}

	pub fn limits(&self) -> Limits {
		self.limits
	}

	pub fn players(&self) -> &[Player] {
		&self.players
	}

	pub fn rounds(&self) -> &[Round] {
		&self.rounds
	}

	pub fn current_round(&self) -> Option<&Round> {
		self.rounds.last()
	}

	pub fn position_of(&self, id: &PlayerId) -> Option<usize> {
		self.players.iter().position(|player| player.id() == id)
	}

	pub fn state(&self) -> TournamentState {
		if self.end.is_some() {
			return TournamentState::Closed;
		}

		match self.rounds.last() {
			None if self.players.len() < self.limits.max_players => TournamentState::Building,
			None => TournamentState::Ready,
			Some(round) if !round.is_closed() => TournamentState::InRound,
			Some(_) if self.rounds.len() < self.limits.max_rounds => TournamentState::RoundDone,
			Some(_) => TournamentState::Complete,
		}
	}

	/// # Errors
	///
	/// If the roster is full or a player with the same key is registered.
	pub fn add_player(&mut self, player: Player) -> Result<(), TournamentError> {
		if self.players.len() >= self.limits.max_players {
			return Err(TournamentError::RosterFull {
				max: self.limits.max_players,
			});
		}
		if self.position_of(player.id()).is_some() {
			return Err(TournamentError::DuplicatePlayer(player.id().clone()));
		}

		info!("{}: registered {}", self.name, player.id());
		self.players.push(player);

		Ok(())
	}

	/// Pairs the next round and makes it the current one.
	///
	/// # Errors
	///
	/// If the roster is not full, the current round is open, or every round
	/// has been created.
	pub fn start_next_round(&mut self, start: NaiveDateTime) -> Result<&Round, TournamentError> {
		self.check_can_start_round()?;

		let pairer = Pairer::new(self.limits.max_players, self.tie_break);
		let matches = pairer.pair(&self.players, &self.rounds)?;
		let round = Round::new(format!("Round {}", self.rounds.len() + 1), start, matches);

		info!("{}: {} started", self.name, round.name());
		self.rounds.push(round);

		Ok(&self.rounds[self.rounds.len() - 1])
	}

	fn check_can_start_round(&self) -> Result<(), TournamentError> {
		if self.players.len() < self.limits.max_players {
			return Err(TournamentError::InsufficientPlayers {
				needed: self.limits.max_players,
				current: self.players.len(),
			});
		}
		if self.rounds.last().is_some_and(|round| !round.is_closed()) {
			return Err(TournamentError::RoundInProgress);
		}
		if self.rounds.len() >= self.limits.max_rounds {
			return Err(TournamentError::MaxRoundsReached {
				max: self.limits.max_rounds,
			});
		}

		Ok(())
	}

	/// Records the result of match `index` (0-based) of the current round.
	///
	/// # Errors
	///
	/// If no round was started, or the round refuses the result.
	pub fn record_result(&mut self, index: usize, outcome: Outcome) -> Result<(), TournamentError> {
		let round = self.rounds.last_mut().ok_or(TournamentError::NoRoundStarted)?;
		round.record_result(index, outcome, &mut self.players)?;

		Ok(())
	}

	/// Closes the current round and returns the resulting state.
	///
	/// # Errors
	///
	/// If no round was started, or some match has no result.
	pub fn close_round(&mut self, end: NaiveDateTime) -> Result<TournamentState, TournamentError> {
		let round = self.rounds.last_mut().ok_or(TournamentError::NoRoundStarted)?;
		round.close(end)?;

		let state = self.state();
		info!("{}: {state}", self.name);

		Ok(state)
	}

	/// # Errors
	///
	/// Unless every round is played and no end date is set yet.
	pub fn end_tournament(&mut self, date: NaiveDate) -> Result<(), TournamentError> {
		if self.state() != TournamentState::Complete {
			return Err(TournamentError::TournamentNotFinished);
		}

		self.end = Some(date);
		info!("{}: ended on {date}", self.name);

		Ok(())
	}

	/// Rebuilds a stored round: pairs as given, results replayed through
	/// [`Round::record_result`], closed when `end` is set.
	pub(crate) fn replay_round(
		&mut self,
		name: &str,
		start: NaiveDateTime,
		games: &[([usize; 2], Option<Outcome>)],
		end: Option<NaiveDateTime>,
	) -> Result<(), TournamentError> {
		self.check_can_start_round()?;

		let matches = games
			.iter()
			.map(|&([first, second], _)| Match::new(first, second))
			.collect();
		let mut round = Round::new(name, start, matches);

		for (index, (_, outcome)) in games.iter().enumerate() {
			if let Some(outcome) = outcome {
				round.record_result(index, *outcome, &mut self.players)?;
			}
		}
		if let Some(end) = end {
			round.close(end)?;
		}

		self.rounds.push(round);

		Ok(())
	}

	pub fn standings(&self) -> Vec<Standing> {
		Pairer::new(self.limits.max_players, self.tie_break)
			.standing_order(&self.players)
			.into_iter()
			.enumerate()
			.map(|(place, index)| {
				let player = &self.players[index];
				Standing {
					place: place + 1,
					id: player.id().clone(),
					name: player.full_name(),
					rank: player.rank(),
					score: player.score(),
				}
			})
			.collect()
	}

	/// Alphabetical by last name, then first name.
	pub fn players_by_name(&self) -> Vec<&Player> {
		let mut players: Vec<&Player> = self.players.iter().collect();
		players.sort_by_cached_key(|player| {
			(
				player.last_name().to_lowercase(),
				player.first_name().to_lowercase(),
			)
		});
		players
	}

	/// Strongest first.
	pub fn players_by_rank(&self) -> Vec<&Player> {
		let mut players: Vec<&Player> = self.players.iter().collect();
		players.sort_by_key(|player| player.rank());
		players
	}

	/// The matches of round `round` (0-based), if it exists.
	pub fn match_views(&self, round: usize) -> Option<Vec<MatchView>> {
		let round = self.rounds.get(round)?;

		Some(
			round
				.matches()
				.iter()
				.enumerate()
				.map(|(index, game)| {
					let [first, second] = game.players();
					MatchView {
						number: index + 1,
						first: self.players[first].full_name(),
						second: self.players[second].full_name(),
						score: game.score(),
					}
				})
				.collect(),
		)
	}
}

impl fmt::Display for Tournament {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let end = self
			.end
			.map_or_else(|| "in progress".to_string(), |end| end.format("%d/%m/%Y").to_string());

		write!(
			f,
			"{} at {} ({}), from {} to {}, {}",
			self.name,
			self.location,
			self.time_control,
			self.start.format("%d/%m/%Y %H:%M"),
			end,
			self.state()
		)
	}
}
