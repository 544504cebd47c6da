//! Stored records. Scores and opponent sets are not stored: loading a
//! tournament replays its recorded results.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
	pairing::TieBreak,
	player::{Gender, Player, PlayerError, PlayerId},
	round::Outcome,
	tournament::{TimeControl, Tournament, TournamentError},
};

#[derive(Error, Debug)]
pub enum RecordError {
	#[error(transparent)]
	Player(#[from] PlayerError),
	#[error(transparent)]
	Tournament(#[from] TournamentError),
	#[error("record: {0} is not on the roster")]
	UnknownPlayer(PlayerId),
	#[error("record: {0} cannot play against themselves")]
	SelfPairing(PlayerId),
	#[error("record: {0:?} is not a valid score")]
	InvalidScore([f32; 2]),
	#[error("record: {player} plays twice in {round}")]
	PlayerTwiceInRound { round: String, player: PlayerId },
	#[error("record: {player} has no game in {round}")]
	MissingFromRound { round: String, player: PlayerId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
	pub last_name: String,
	pub first_name: String,
	pub date_of_birth: NaiveDate,
	pub gender: Gender,
	pub rank: u32,
}

impl PlayerRecord {
	pub fn id(&self) -> PlayerId {
		PlayerId::derive(self.date_of_birth, &self.last_name, &self.first_name)
	}
}

impl From<&Player> for PlayerRecord {
	fn from(player: &Player) -> Self {
		Self {
			last_name: player.last_name().to_string(),
			first_name: player.first_name().to_string(),
			date_of_birth: player.date_of_birth(),
			gender: player.gender(),
			rank: player.rank(),
		}
	}
}

impl TryFrom<&PlayerRecord> for Player {
	type Error = PlayerError;

	fn try_from(record: &PlayerRecord) -> Result<Self, Self::Error> {
		Player::new(
			&record.last_name,
			&record.first_name,
			record.date_of_birth,
			record.gender,
			record.rank,
		)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
	pub name: String,
	pub location: String,
	pub time_control: TimeControl,
	pub description: String,
	#[serde(default)]
	pub tie_break: TieBreak,
	pub begin_date: NaiveDateTime,
	pub end_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
	pub position: usize,
	#[serde(flatten)]
	pub player: PlayerRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
	pub players: [PlayerId; 2],
	pub score: [f32; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
	pub name: String,
	pub start_date: NaiveDateTime,
	pub end_date: Option<NaiveDateTime>,
	pub games: Vec<GameRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
	pub tournament_info: TournamentInfo,
	#[serde(default)]
	pub players_list: Vec<RosterEntry>,
	#[serde(default)]
	pub rounds_list: Vec<RoundRecord>,
}

impl From<&Tournament> for TournamentRecord {
	fn from(tournament: &Tournament) -> Self {
		let players = tournament.players();

		Self {
			tournament_info: TournamentInfo {
				name: tournament.name().to_string(),
				location: tournament.location().to_string(),
				time_control: tournament.time_control(),
				description: tournament.description().to_string(),
				tie_break: tournament.tie_break(),
				begin_date: tournament.start(),
				end_date: tournament.end(),
			},
			players_list: players
				.iter()
				.enumerate()
				.map(|(position, player)| RosterEntry {
					position,
					player: player.into(),
				})
				.collect(),
			rounds_list: tournament
				.rounds()
				.iter()
				.map(|round| RoundRecord {
					name: round.name().to_string(),
					start_date: round.start(),
					end_date: round.end(),
					games: round
						.matches()
						.iter()
						.map(|game| {
							let [first, second] = game.players();
							GameRecord {
								players: [players[first].id().clone(), players[second].id().clone()],
								score: game.score(),
							}
						})
						.collect(),
				})
				.collect(),
		}
	}
}

impl TryFrom<TournamentRecord> for Tournament {
	type Error = RecordError;

	fn try_from(record: TournamentRecord) -> Result<Self, Self::Error> {
		let info = record.tournament_info;
		let mut tournament = Tournament::new(
			&info.name,
			&info.location,
			info.time_control,
			&info.description,
			info.begin_date,
		)
		.with_tie_break(info.tie_break);

		let mut roster = record.players_list;
		roster.sort_by_key(|entry| entry.position);
		for entry in &roster {
			tournament.add_player(Player::try_from(&entry.player)?)?;
		}

		for round in &record.rounds_list {
			let mut games = Vec::with_capacity(round.games.len());
			for game in &round.games {
				games.push(resolve_game(&tournament, game)?);
			}
			check_every_player_seated_once(&tournament, &round.name, &games)?;
			tournament.replay_round(&round.name, round.start_date, &games, round.end_date)?;
		}

		if let Some(end) = info.end_date {
			tournament.end_tournament(end)?;
		}

		Ok(tournament)
	}
}

fn check_every_player_seated_once(
	tournament: &Tournament,
	round: &str,
	games: &[([usize; 2], Option<Outcome>)],
) -> Result<(), RecordError> {
	let players = tournament.players();
	let mut seated = vec![false; players.len()];

	for position in games.iter().flat_map(|(pair, _)| *pair) {
		if seated[position] {
			return Err(RecordError::PlayerTwiceInRound {
				round: round.to_string(),
				player: players[position].id().clone(),
			});
		}
		seated[position] = true;
	}

	match seated.iter().position(|seated| !seated) {
		Some(position) => Err(RecordError::MissingFromRound {
			round: round.to_string(),
			player: players[position].id().clone(),
		}),
		None => Ok(()),
	}
}

fn resolve_game(
	tournament: &Tournament,
	game: &GameRecord,
) -> Result<([usize; 2], Option<Outcome>), RecordError> {
	let [first, second] = &game.players;
	if first == second {
		return Err(RecordError::SelfPairing(first.clone()));
	}

	let position = |id: &PlayerId| {
		tournament
			.position_of(id)
			.ok_or_else(|| RecordError::UnknownPlayer(id.clone()))
	};

	let outcome = if game.score == [0.0, 0.0] {
		None
	} else {
		Some(Outcome::from_points(game.score).ok_or(RecordError::InvalidScore(game.score))?)
	};

	Ok(([position(first)?, position(second)?], outcome))
}
