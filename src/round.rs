use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::Player;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoundError {
	#[error("round: {0} is already closed")]
	RoundAlreadyClosed(String),
	#[error("round: there is no match number {index} in {round}")]
	InvalidMatchIndex { round: String, index: usize },
	#[error("round: {undecided} match(es) of {round} still have no result")]
	IncompleteRound { round: String, undecided: usize },
	#[error("round: a match refers to a player outside the roster")]
	RosterMismatch,
	#[error("round: unknown result {0:?}, expected 1, 2 or draw")]
	InvalidOutcome(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
	FirstWins,
	SecondWins,
	Draw,
}

impl Outcome {
	pub fn points(self) -> [f32; 2] {
		match self {
			Outcome::FirstWins => [1.0, 0.0],
			Outcome::SecondWins => [0.0, 1.0],
			Outcome::Draw => [0.5, 0.5],
		}
	}

	/// The outcome a played score pair stands for, if any.
	pub fn from_points(points: [f32; 2]) -> Option<Self> {
		[Outcome::FirstWins, Outcome::SecondWins, Outcome::Draw]
			.into_iter()
			.find(|outcome| outcome.points() == points)
	}
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Outcome::FirstWins => write!(f, "1-0"),
			Outcome::SecondWins => write!(f, "0-1"),
			Outcome::Draw => write!(f, "1/2-1/2"),
		}
	}
}

impl FromStr for Outcome {
	type Err = RoundError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"1" | "p1" | "1-0" => Ok(Outcome::FirstWins),
			"2" | "p2" | "0-1" => Ok(Outcome::SecondWins),
			"draw" | "d" | "=" | "1/2-1/2" => Ok(Outcome::Draw),
			_ => Err(RoundError::InvalidOutcome(s.to_string())),
		}
	}
}

/// Two roster indices and, once played, the outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
	players: [usize; 2],
	outcome: Option<Outcome>,
}

impl Match {
	pub fn new(first: usize, second: usize) -> Self {
		Self {
			players: [first, second],
			outcome: None,
		}
	}

	pub fn players(&self) -> [usize; 2] {
		self.players
	}

	pub fn outcome(&self) -> Option<Outcome> {
		self.outcome
	}

	pub fn is_decided(&self) -> bool {
		self.outcome.is_some()
	}

	/// `[0, 0]` until a result is recorded.
	pub fn score(&self) -> [f32; 2] {
		self.outcome.map_or([0.0, 0.0], Outcome::points)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Round {
	name: String,
	start: NaiveDateTime,
	matches: Vec<Match>,
	end: Option<NaiveDateTime>,
}

impl Round {
	pub fn new(name: impl Into<String>, start: NaiveDateTime, matches: Vec<Match>) -> Self {
		Self {
			name: name.into(),
			start,
			matches,
			end: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn start(&self) -> NaiveDateTime {
		self.start
	}

	pub fn end(&self) -> Option<NaiveDateTime> {
		self.end
	}

	pub fn matches(&self) -> &[Match] {
		&self.matches
	}

	pub fn is_closed(&self) -> bool {
		self.end.is_some()
	}

	/// Writes `outcome` into match `index` and credits both players. A match
	/// that already had a result is corrected: the old points are taken back
	/// first.
	///
	/// # Errors
	///
	/// If the round is closed, `index` is out of range, or the match points
	/// outside `roster`.
	pub fn record_result(
		&mut self,
		index: usize,
		outcome: Outcome,
		roster: &mut [Player],
	) -> Result<(), RoundError> {
		if self.is_closed() {
			return Err(RoundError::RoundAlreadyClosed(self.name.clone()));
		}

		let game = self
			.matches
			.get_mut(index)
			.ok_or_else(|| RoundError::InvalidMatchIndex {
				round: self.name.clone(),
				index,
			})?;

		let [first, second] = game.players;
		if first >= roster.len() || second >= roster.len() || first == second {
			return Err(RoundError::RosterMismatch);
		}

		match game.outcome {
			Some(previous) => {
				let [a, b] = previous.points();
				roster[first].add_points(-a);
				roster[second].add_points(-b);
			}
			None => {
				let first_id = roster[first].id().clone();
				let second_id = roster[second].id().clone();
				roster[first].record_opponent(&second_id);
				roster[second].record_opponent(&first_id);
			}
		}

		let [a, b] = outcome.points();
		roster[first].add_points(a);
		roster[second].add_points(b);
		game.outcome = Some(outcome);

		info!(
			"{} match {}: {} {} {}",
			self.name,
			index + 1,
			roster[first].id(),
			outcome,
			roster[second].id()
		);

		Ok(())
	}

	/// # Errors
	///
	/// If the round is already closed or a match has no result yet.
	pub fn close(&mut self, end: NaiveDateTime) -> Result<(), RoundError> {
		if self.is_closed() {
			return Err(RoundError::RoundAlreadyClosed(self.name.clone()));
		}

		let undecided = self.matches.iter().filter(|game| !game.is_decided()).count();
		if undecided > 0 {
			return Err(RoundError::IncompleteRound {
				round: self.name.clone(),
				undecided,
			});
		}

		self.end = Some(end);
		info!("{} closed", self.name);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use chrono::NaiveDate;

	use super::*;
	use crate::player::Gender;

	fn at(hour: u32) -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2021, 3, 22)
			.unwrap()
			.and_hms_opt(hour, 0, 0)
			.unwrap()
	}

	fn roster() -> Vec<Player> {
		let born = NaiveDate::from_ymd_opt(1985, 9, 29).unwrap();
		["Alpha", "Bravo", "Charlie", "Delta"]
			.iter()
			.zip(1..)
			.map(|(name, rank)| Player::new(name, "Test", born, Gender::Female, rank).unwrap())
			.collect()
	}

	fn round() -> Round {
		Round::new("Round 1", at(14), vec![Match::new(0, 2), Match::new(1, 3)])
	}

	#[test]
	fn results_credit_both_players() {
		let mut players = roster();
		let mut round = round();

		round.record_result(0, Outcome::FirstWins, &mut players).unwrap();
		round.record_result(1, Outcome::Draw, &mut players).unwrap();

		assert_eq!(round.matches()[0].score(), [1.0, 0.0]);
		assert_eq!(round.matches()[1].score(), [0.5, 0.5]);
		assert_eq!(
			players.iter().map(Player::score).collect::<Vec<_>>(),
			vec![1.0, 0.5, 0.0, 0.5]
		);
		assert!(players[0].has_met(players[2].id()));
		assert!(players[2].has_met(players[0].id()));
		assert!(!players[0].has_met(players[1].id()));
	}

	#[test]
	fn correcting_a_result_takes_back_the_old_points() {
		let mut players = roster();
		let mut round = round();

		round.record_result(0, Outcome::FirstWins, &mut players).unwrap();
		round.record_result(0, Outcome::SecondWins, &mut players).unwrap();

		assert_eq!(players[0].score(), 0.0);
		assert_eq!(players[2].score(), 1.0);
		assert_eq!(players[0].opponents().len(), 1);
	}

	#[test]
	fn match_index_is_checked() {
		let mut players = roster();
		assert_eq!(
			round().record_result(2, Outcome::Draw, &mut players),
			Err(RoundError::InvalidMatchIndex {
				round: "Round 1".to_string(),
				index: 2,
			})
		);
	}

	#[test]
	fn cannot_close_with_undecided_matches() {
		let mut players = roster();
		let mut round = round();
		round.record_result(0, Outcome::Draw, &mut players).unwrap();

		assert_eq!(
			round.close(at(16)),
			Err(RoundError::IncompleteRound {
				round: "Round 1".to_string(),
				undecided: 1,
			})
		);
		assert!(!round.is_closed());
	}

	#[test]
	fn closed_round_is_frozen() {
		let mut players = roster();
		let mut round = round();
		round.record_result(0, Outcome::Draw, &mut players).unwrap();
		round.record_result(1, Outcome::SecondWins, &mut players).unwrap();
		round.close(at(16)).unwrap();

		assert_eq!(round.end(), Some(at(16)));
		assert_eq!(
			round.record_result(0, Outcome::FirstWins, &mut players),
			Err(RoundError::RoundAlreadyClosed("Round 1".to_string()))
		);
		assert_eq!(
			round.close(at(17)),
			Err(RoundError::RoundAlreadyClosed("Round 1".to_string()))
		);
		assert_eq!(players[0].score(), 0.5);
	}

	#[test]
	fn outcomes_parse_and_map_back_from_points() {
		assert_eq!("1".parse::<Outcome>(), Ok(Outcome::FirstWins));
		assert_eq!("P2".parse::<Outcome>(), Ok(Outcome::SecondWins));
		assert_eq!("draw".parse::<Outcome>(), Ok(Outcome::Draw));
		assert!("3".parse::<Outcome>().is_err());

		assert_eq!(Outcome::from_points([0.5, 0.5]), Some(Outcome::Draw));
		assert_eq!(Outcome::from_points([0.0, 0.0]), None);
		assert_eq!(Outcome::from_points([1.0, 1.0]), None);
	}
}
