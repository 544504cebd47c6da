//! Swiss pairing.
//!
//! The first round seeds the top half of the field (by rank) against the
//! bottom half. Later rounds walk the field in standing order and give each
//! player the nearest opponent they have not met yet. When that greedy walk
//! would strand two players who already met, the search backtracks; a rematch
//! only happens when no rematch-free pairing of the whole field exists.

use std::{fmt, str::FromStr};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{player::Player, round::Match, round::Round, MAX_PLAYER_LIMIT};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PairingError {
	#[error("pairing: cannot pair {size} players, need an even count between 2 and {max}")]
	InvalidPoolSize { size: usize, max: usize },
	#[error("pairing: unknown tie-break {0:?}, expected rank or seed")]
	UnknownTieBreak(String),
}

/// Order among players with the same score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
	/// Stronger rank first.
	#[default]
	Rank,
	/// Registration order.
	Seed,
}

impl fmt::Display for TieBreak {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TieBreak::Rank => write!(f, "rank"),
			TieBreak::Seed => write!(f, "seed"),
		}
	}
}

impl FromStr for TieBreak {
	type Err = PairingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"rank" => Ok(TieBreak::Rank),
			"seed" => Ok(TieBreak::Seed),
			_ => Err(PairingError::UnknownTieBreak(s.to_string())),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pairer {
	max_players: usize,
	tie_break: TieBreak,
}

impl Default for Pairer {
	fn default() -> Self {
		Self::new(MAX_PLAYER_LIMIT, TieBreak::default())
	}
}

impl Pairer {
	pub fn new(max_players: usize, tie_break: TieBreak) -> Self {
		Self {
			max_players,
			tie_break,
		}
	}

	/// Pairs the next round. Matches hold indices into `pool`.
	///
	/// Only `history.is_empty()` is consulted: who met whom is read from the
	/// players' opponent sets. Player state is left untouched.
	///
	/// # Errors
	///
	/// If the pool is empty, odd, or larger than the player cap.
	pub fn pair(&self, pool: &[Player], history: &[Round]) -> Result<Vec<Match>, PairingError> {
		let size = pool.len();
		if size == 0 || size % 2 != 0 || size > self.max_players {
			return Err(PairingError::InvalidPoolSize {
				size,
				max: self.max_players,
			});
		}

		let pairs = if history.is_empty() {
			self.pair_by_rank(pool)
		} else {
			self.pair_by_score(pool)
		};

		for (first, second) in &pairs {
			debug!("paired {} against {}", pool[*first].id(), pool[*second].id());
		}

		Ok(pairs
			.into_iter()
			.map(|(first, second)| Match::new(first, second))
			.collect())
	}

	/// Indices of `pool` from first to last place: score descending, then the
	/// configured tie-break.
	pub fn standing_order(&self, pool: &[Player]) -> Vec<usize> {
		let mut order: Vec<usize> = (0..pool.len()).collect();
		if self.tie_break == TieBreak::Rank {
			order.sort_by_key(|&index| pool[index].rank());
		}
		order.sort_by(|&a, &b| pool[b].score().total_cmp(&pool[a].score()));
		order
	}

	fn pair_by_rank(&self, pool: &[Player]) -> Vec<(usize, usize)> {
		let mut order: Vec<usize> = (0..pool.len()).collect();
		order.sort_by_key(|&index| pool[index].rank());

		let (upper, lower) = order.split_at(pool.len() / 2);
		upper.iter().copied().zip(lower.iter().copied()).collect()
	}

	fn pair_by_score(&self, pool: &[Player]) -> Vec<(usize, usize)> {
		let order = self.standing_order(pool);
		let mut taken = vec![false; order.len()];
		let mut pairs = Vec::with_capacity(order.len() / 2);

		if search(pool, &order, &mut taken, &mut pairs) {
			return pairs;
		}

		warn!("every pairing of the field repeats a game, allowing rematches");
		greedy_with_rematches(pool, &order)
	}
}

fn already_met(pool: &[Player], a: usize, b: usize) -> bool {
	pool[a].has_met(pool[b].id()) || pool[b].has_met(pool[a].id())
}

/// Depth-first over standing positions. Candidates are tried nearest first,
/// so the first solution is the greedy one whenever the greedy walk succeeds.
fn search(
	pool: &[Player],
	order: &[usize],
	taken: &mut [bool],
	pairs: &mut Vec<(usize, usize)>,
) -> bool {
	let Some(top) = taken.iter().position(|taken| !taken) else {
		return true;
	};

	taken[top] = true;
	for next in top + 1..order.len() {
		if taken[next] || already_met(pool, order[top], order[next]) {
			continue;
		}

		taken[next] = true;
		pairs.push((order[top], order[next]));
		if search(pool, order, taken, pairs) {
			return true;
		}
		pairs.pop();
		taken[next] = false;
	}
	taken[top] = false;

	false
}

fn greedy_with_rematches(pool: &[Player], order: &[usize]) -> Vec<(usize, usize)> {
	let mut taken = vec![false; order.len()];
	let mut pairs = Vec::with_capacity(order.len() / 2);

	for top in 0..order.len() {
		if taken[top] {
			continue;
		}
		taken[top] = true;

		let candidates: Vec<usize> = (top + 1..order.len()).filter(|&c| !taken[c]).collect();
		let fresh = candidates
			.iter()
			.copied()
			.find(|&c| !already_met(pool, order[top], order[c]));
		let Some(next) = fresh.or_else(|| candidates.first().copied()) else {
			break;
		};

		if fresh.is_none() {
			warn!(
				"rematch: {} against {}",
				pool[order[top]].id(),
				pool[order[next]].id()
			);
		}

		taken[next] = true;
		pairs.push((order[top], order[next]));
	}

	pairs
}
