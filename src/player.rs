//! Registered chess players: identity, cumulative score and the set of
//! opponents already met.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlayerError {
	#[error("player: rank must be a positive integer")]
	InvalidRank,
	#[error("player: unknown gender {0:?}, expected M or F")]
	InvalidGender(String),
}

/// Stable lookup key: birth date plus the first three letters of each name,
/// e.g. `19920514_POIMAR`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
	pub fn derive(date_of_birth: NaiveDate, last_name: &str, first_name: &str) -> Self {
		Self(format!(
			"{}_{}{}",
			date_of_birth.format("%Y%m%d"),
			initials(last_name),
			initials(first_name)
		))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PlayerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for PlayerId {
	fn from(id: &str) -> Self {
		Self(id.trim().to_uppercase())
	}
}

fn initials(name: &str) -> String {
	name.trim().chars().take(3).collect::<String>().to_uppercase()
}

fn capitalize(name: &str) -> String {
	let mut chars = name.trim().chars();
	match chars.next() {
		Some(first) => first
			.to_uppercase()
			.chain(chars.flat_map(char::to_lowercase))
			.collect(),
		None => String::new(),
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
	#[serde(rename = "M")]
	Male,
	#[serde(rename = "F")]
	Female,
}

impl fmt::Display for Gender {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Gender::Male => write!(f, "M"),
			Gender::Female => write!(f, "F"),
		}
	}
}

impl FromStr for Gender {
	type Err = PlayerError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_uppercase().as_str() {
			"M" => Ok(Gender::Male),
			"F" => Ok(Gender::Female),
			_ => Err(PlayerError::InvalidGender(s.to_string())),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
	last_name: String,
	first_name: String,
	date_of_birth: NaiveDate,
	gender: Gender,
	rank: u32,
	id: PlayerId,
	score: f32,
	opponents: BTreeSet<PlayerId>,
}

impl Player {
	/// Registers a player with a zero score and no opponents.
	///
	/// # Errors
	///
	/// If `rank` is zero.
	pub fn new(
		last_name: &str,
		first_name: &str,
		date_of_birth: NaiveDate,
		gender: Gender,
		rank: u32,
	) -> Result<Self, PlayerError> {
		if rank == 0 {
			return Err(PlayerError::InvalidRank);
		}

		let last_name = capitalize(last_name);
		let first_name = capitalize(first_name);
		let id = PlayerId::derive(date_of_birth, &last_name, &first_name);

		Ok(Self {
			last_name,
			first_name,
			date_of_birth,
			gender,
			rank,
			id,
			score: 0.0,
			opponents: BTreeSet::new(),
		})
	}

	pub fn id(&self) -> &PlayerId {
		&self.id
	}

	pub fn last_name(&self) -> &str {
		&self.last_name
	}

	pub fn first_name(&self) -> &str {
		&self.first_name
	}

	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}

	pub fn date_of_birth(&self) -> NaiveDate {
		self.date_of_birth
	}

	pub fn gender(&self) -> Gender {
		self.gender
	}

	/// Lower is stronger.
	pub fn rank(&self) -> u32 {
		self.rank
	}

	pub fn score(&self) -> f32 {
		self.score
	}

	pub fn opponents(&self) -> &BTreeSet<PlayerId> {
		&self.opponents
	}

	pub fn has_met(&self, other: &PlayerId) -> bool {
		self.opponents.contains(other)
	}

	pub(crate) fn add_points(&mut self, points: f32) {
		self.score += points;
	}

	pub(crate) fn record_opponent(&mut self, other: &PlayerId) {
		self.opponents.insert(other.clone());
	}
}

impl fmt::Display for Player {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} ({}) born {} gender {} rank {} score {}",
			self.first_name,
			self.last_name,
			self.id,
			self.date_of_birth.format("%d/%m/%Y"),
			self.gender,
			self.rank,
			self.score
		)
	}
}
