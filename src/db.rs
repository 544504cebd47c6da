use std::{io::Read, path::Path};

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::{
	data::{PlayerRecord, TournamentInfo, TournamentRecord},
	player::{Player, PlayerId},
};

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("store: {0} already exists")]
	AlreadyExists(String),
	#[error("store: {0} not found")]
	NotFound(String),
	#[error("store: {0}")]
	Database(#[from] rusqlite::Error),
	#[error("store: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("store: {0}")]
	Csv(#[from] csv::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
	pub imported: usize,
	pub skipped: usize,
}

/// Tournaments and the player directory, kept as JSON documents in SQLite.
pub struct Store {
	conn: Connection,
}

pub fn create_schema(conn: &mut Connection) -> rusqlite::Result<()> {
	let tx = conn.transaction()?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS players (
			id       TEXT PRIMARY KEY,
			document TEXT NOT NULL
		);",
		[],
	)?;

	tx.execute(
		"CREATE TABLE IF NOT EXISTS tournaments (
			name     TEXT PRIMARY KEY,
			document TEXT NOT NULL
		);",
		[],
	)?;

	tx.commit()
}

impl Store {
	pub fn open(path: &Path) -> Result<Self, StoreError> {
		let mut conn = Connection::open(path)?;
		create_schema(&mut conn)?;
		info!("opened {}", path.display());

		Ok(Self { conn })
	}

	pub fn open_in_memory() -> Result<Self, StoreError> {
		let mut conn = Connection::open_in_memory()?;
		create_schema(&mut conn)?;

		Ok(Self { conn })
	}

	/// # Errors
	///
	/// If a tournament with the same name is stored and `allow_update` is
	/// false.
	pub fn save_tournament(
		&mut self,
		record: &TournamentRecord,
		allow_update: bool,
	) -> Result<(), StoreError> {
		let name = &record.tournament_info.name;
		let document = serde_json::to_string(record)?;

		let tx = self.conn.transaction()?;
		let exists = tx
			.query_row("SELECT 1 FROM tournaments WHERE name = ?1;", [name], |_| Ok(()))
			.optional()?
			.is_some();

		if exists && !allow_update {
			return Err(StoreError::AlreadyExists(format!("tournament {name}")));
		}

		tx.execute(
			"INSERT INTO tournaments (name, document) VALUES (?1, ?2)
			 ON CONFLICT(name) DO UPDATE SET document = excluded.document;",
			params![name, document],
		)?;
		tx.commit()?;
		info!("saved tournament {name}");

		Ok(())
	}

	pub fn load_tournament(&self, name: &str) -> Result<TournamentRecord, StoreError> {
		let document: Option<String> = self
			.conn
			.query_row(
				"SELECT document FROM tournaments WHERE name = ?1;",
				[name],
				|row| row.get(0),
			)
			.optional()?;

		match document {
			Some(document) => Ok(serde_json::from_str(&document)?),
			None => Err(StoreError::NotFound(format!("tournament {name}"))),
		}
	}

	pub fn list_tournaments(&self) -> Result<Vec<TournamentInfo>, StoreError> {
		let mut stmt = self
			.conn
			.prepare("SELECT document FROM tournaments ORDER BY name;")?;
		let mut rows = stmt.query([])?;

		let mut tournaments = Vec::new();
		while let Some(row) = rows.next()? {
			let document: String = row.get(0)?;
			let record: TournamentRecord = serde_json::from_str(&document)?;
			tournaments.push(record.tournament_info);
		}

		Ok(tournaments)
	}

	/// # Errors
	///
	/// If a player with the same key is already stored.
	pub fn save_player(&mut self, record: &PlayerRecord) -> Result<PlayerId, StoreError> {
		let id = record.id();
		let document = serde_json::to_string(record)?;

		let tx = self.conn.transaction()?;
		let exists = tx
			.query_row("SELECT 1 FROM players WHERE id = ?1;", [id.as_str()], |_| Ok(()))
			.optional()?
			.is_some();

		if exists {
			return Err(StoreError::AlreadyExists(format!("player {id}")));
		}

		tx.execute(
			"INSERT INTO players (id, document) VALUES (?1, ?2);",
			params![id.as_str(), document],
		)?;
		tx.commit()?;
		info!("saved player {id}");

		Ok(id)
	}

	pub fn load_player(&self, id: &PlayerId) -> Result<PlayerRecord, StoreError> {
		let document: Option<String> = self
			.conn
			.query_row(
				"SELECT document FROM players WHERE id = ?1;",
				[id.as_str()],
				|row| row.get(0),
			)
			.optional()?;

		match document {
			Some(document) => Ok(serde_json::from_str(&document)?),
			None => Err(StoreError::NotFound(format!("player {id}"))),
		}
	}

	/// Sorted by last name, then first name.
	pub fn list_players(&self) -> Result<Vec<PlayerRecord>, StoreError> {
		let mut stmt = self.conn.prepare("SELECT document FROM players;")?;
		let mut rows = stmt.query([])?;

		let mut players = Vec::new();
		while let Some(row) = rows.next()? {
			let document: String = row.get(0)?;
			players.push(serde_json::from_str::<PlayerRecord>(&document)?);
		}

		players.sort_by(|a, b| {
			(a.last_name.to_lowercase(), a.first_name.to_lowercase())
				.cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
		});

		Ok(players)
	}

	/// Saves every player of a roster to the directory. Keys already stored
	/// are skipped.
	pub fn save_roster(&mut self, players: &[Player]) -> Result<ImportSummary, StoreError> {
		let mut summary = ImportSummary::default();

		for player in players {
			match self.save_player(&PlayerRecord::from(player)) {
				Ok(_) => summary.imported += 1,
				Err(StoreError::AlreadyExists(what)) => {
					warn!("skipping {what}: already stored");
					summary.skipped += 1;
				}
				Err(err) => return Err(err),
			}
		}

		Ok(summary)
	}

	/// Reads `last_name,first_name,date_of_birth,gender,rank` rows into the
	/// player directory. Malformed rows, invalid players and keys already
	/// stored are skipped.
	pub fn import_players<R: Read>(&mut self, reader: R) -> Result<ImportSummary, StoreError> {
		let mut reader = csv::Reader::from_reader(reader);
		let mut summary = ImportSummary::default();

		for (line, result) in reader.deserialize::<PlayerRecord>().enumerate() {
			let record = match result {
				Ok(record) => record,
				Err(err) if err.is_io_error() => return Err(err.into()),
				Err(err) => {
					warn!("skipping row {}: {err}", line + 1);
					summary.skipped += 1;
					continue;
				}
			};

			let record = match Player::try_from(&record) {
				Ok(player) => PlayerRecord::from(&player),
				Err(err) => {
					warn!("skipping {} {}: {err}", record.first_name, record.last_name);
					summary.skipped += 1;
					continue;
				}
			};

			match self.save_player(&record) {
				Ok(_) => summary.imported += 1,
				Err(StoreError::AlreadyExists(what)) => {
					warn!("skipping {what}: already stored");
					summary.skipped += 1;
				}
				Err(err) => return Err(err),
			}
		}

		Ok(summary)
	}
}
