mod cli;

use std::{
	env,
	fs::File,
	io::{self, Write},
};

use anyhow::Context;
use chesstour::{
	data::{PlayerRecord, TournamentRecord},
	db::{Store, StoreError},
	Player, PlayerId, Tournament, TournamentError,
};
use chrono::{Local, Utc};
use clap::Parser;
use cli::{Cli, Commands, PlayerArgs, RosterOrder};
use env_logger::Builder;
use log::{warn, LevelFilter};

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logger();

	let mut store = Store::open(&cli.database)
		.with_context(|| format!("could not open {}", cli.database.display()))?;

	let mut out = match cli.output.as_deref() {
		Some(path) => Box::new(
			File::create(path).with_context(|| format!("could not create {}", path.display()))?,
		) as Box<dyn Write>,
		None => Box::new(io::stdout()) as Box<dyn Write>,
	};

	run(cli.command, &mut store, &mut out)
}

fn init_logger() {
	let mut builder = Builder::new();

	builder.format(|formatter, record| {
		writeln!(
			formatter,
			"{} [{}] ({}): {}",
			Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
			record.level(),
			record.target(),
			record.args()
		)
	});

	if let Ok(var) = env::var("RUST_LOG") {
		builder.parse_filters(&var);
	} else {
		builder.filter(None, LevelFilter::Warn);
	}

	builder.init();
}

fn run(command: Commands, store: &mut Store, out: &mut dyn Write) -> anyhow::Result<()> {
	let now = Local::now().naive_local();

	match command {
		Commands::Create {
			name,
			location,
			time_control,
			description,
			start,
			tie_break,
		} => {
			let tournament = Tournament::new(
				&name,
				&location,
				time_control,
				&description,
				start.unwrap_or(now),
			)
			.with_tie_break(tie_break);
			store.save_tournament(&TournamentRecord::from(&tournament), false)?;
			writeln!(out, "{tournament}")?;
		}
		Commands::Tournaments => {
			for info in store.list_tournaments()? {
				let end = info
					.end_date
					.map_or_else(|| "in progress".to_string(), |end| end.to_string());
				writeln!(
					out,
					"{} at {} ({}), {} to {}",
					info.name, info.location, info.time_control, info.begin_date, end
				)?;
			}
		}
		Commands::Show { tournament } => {
			let tournament = load(store, &tournament)?;
			write_tournament(out, &tournament)?;
		}
		Commands::AddPlayer {
			tournament,
			player,
			save,
		} => {
			let player = Player::try_from(&player_record(player))?;
			let record = PlayerRecord::from(&player);
			let tournament = update(store, &tournament, |t| t.add_player(player))?;
			if save {
				match store.save_player(&record) {
					Ok(id) => writeln!(out, "saved {id}")?,
					Err(StoreError::AlreadyExists(what)) => {
						warn!("{what} is already in the directory")
					}
					Err(err) => return Err(err.into()),
				}
			}
			write_roster(out, &tournament)?;
		}
		Commands::Roster {
			tournament,
			by,
			position,
		} => {
			let tournament = load(store, &tournament)?;
			let players: Vec<&Player> = match by {
				RosterOrder::Seed => tournament.players().iter().collect(),
				RosterOrder::Name => tournament.players_by_name(),
				RosterOrder::Rank => tournament.players_by_rank(),
			};
			match position {
				Some(place) => {
					let player = place
						.checked_sub(1)
						.and_then(|index| players.get(index))
						.with_context(|| {
							format!("no player at place {place} of {}", tournament.name())
						})?;
					writeln!(out, "{place}: {player}")?;
				}
				None => {
					for (index, player) in players.iter().enumerate() {
						writeln!(out, "{}: {player}", index + 1)?;
					}
				}
			}
		}
		Commands::SaveRoster { tournament } => {
			let tournament = load(store, &tournament)?;
			let summary = store.save_roster(tournament.players())?;
			writeln!(
				out,
				"saved {} player(s), skipped {}",
				summary.imported, summary.skipped
			)?;
		}
		Commands::Enroll {
			tournament,
			player_id,
		} => {
			let record = store.load_player(&PlayerId::from(player_id.as_str()))?;
			let player = Player::try_from(&record)?;
			let tournament = update(store, &tournament, |t| t.add_player(player))?;
			write_roster(out, &tournament)?;
		}
		Commands::SavePlayer { player } => {
			let player = Player::try_from(&player_record(player))?;
			let id = store.save_player(&PlayerRecord::from(&player))?;
			writeln!(out, "saved {id}")?;
		}
		Commands::Players => {
			for record in store.list_players()? {
				writeln!(out, "{}", Player::try_from(&record)?)?;
			}
		}
		Commands::ImportPlayers { file } => {
			let reader =
				File::open(&file).with_context(|| format!("could not open {}", file.display()))?;
			let summary = store.import_players(reader)?;
			writeln!(
				out,
				"imported {} player(s), skipped {}",
				summary.imported, summary.skipped
			)?;
		}
		Commands::NextRound { tournament } => {
			let tournament = update(store, &tournament, |t| t.start_next_round(now).map(|_| ()))?;
			write_round(out, &tournament, tournament.rounds().len() - 1)?;
		}
		Commands::Record {
			tournament,
			number,
			outcome,
		} => {
			anyhow::ensure!(number >= 1, "match numbers start at 1");
			let index = number - 1;
			let tournament = update(store, &tournament, |t| t.record_result(index, outcome))?;
			write_round(out, &tournament, tournament.rounds().len() - 1)?;
		}
		Commands::CloseRound { tournament } => {
			let tournament = update(store, &tournament, |t| t.close_round(now).map(|_| ()))?;
			writeln!(out, "{tournament}")?;
			write_standings(out, &tournament)?;
		}
		Commands::Finish { tournament, date } => {
			let date = date.unwrap_or(now.date());
			let tournament = update(store, &tournament, |t| t.end_tournament(date))?;
			writeln!(out, "{tournament}")?;
			write_standings(out, &tournament)?;
		}
		Commands::Standings { tournament } => {
			let tournament = load(store, &tournament)?;
			write_standings(out, &tournament)?;
		}
	}

	Ok(())
}

fn player_record(args: PlayerArgs) -> PlayerRecord {
	PlayerRecord {
		last_name: args.last_name,
		first_name: args.first_name,
		date_of_birth: args.born,
		gender: args.gender,
		rank: args.rank,
	}
}

fn load(store: &Store, name: &str) -> anyhow::Result<Tournament> {
	let record = store.load_tournament(name)?;
	Tournament::try_from(record).with_context(|| format!("tournament {name} is corrupt"))
}

/// Loads, applies one operation and writes the tournament back. Nothing is
/// written when the operation fails.
fn update<F>(store: &mut Store, name: &str, operation: F) -> anyhow::Result<Tournament>
where
	F: FnOnce(&mut Tournament) -> Result<(), TournamentError>,
{
	let mut tournament = load(store, name)?;
	operation(&mut tournament)?;
	store.save_tournament(&TournamentRecord::from(&tournament), true)?;

	Ok(tournament)
}

fn write_tournament(out: &mut dyn Write, tournament: &Tournament) -> io::Result<()> {
	writeln!(out, "# {tournament}")?;
	if !tournament.description().is_empty() {
		writeln!(out, "{}", tournament.description())?;
	}
	write_roster(out, tournament)?;
	for index in 0..tournament.rounds().len() {
		write_round(out, tournament, index)?;
	}

	Ok(())
}

fn write_roster(out: &mut dyn Write, tournament: &Tournament) -> io::Result<()> {
	writeln!(
		out,
		"\n## Players ({}/{})",
		tournament.players().len(),
		tournament.limits().max_players
	)?;
	for (position, player) in tournament.players().iter().enumerate() {
		writeln!(out, "{}: {player}", position + 1)?;
	}

	Ok(())
}

fn write_round(out: &mut dyn Write, tournament: &Tournament, index: usize) -> io::Result<()> {
	let (Some(round), Some(views)) = (tournament.rounds().get(index), tournament.match_views(index))
	else {
		return Ok(());
	};

	let end = round.end().map_or_else(
		|| "in progress".to_string(),
		|end| end.format("%d/%m/%Y %H:%M").to_string(),
	);
	writeln!(
		out,
		"\n## {} ({} to {})",
		round.name(),
		round.start().format("%d/%m/%Y %H:%M"),
		end
	)?;
	for view in views {
		writeln!(
			out,
			"{}: {} vs {} [{}, {}]",
			view.number, view.first, view.second, view.score[0], view.score[1]
		)?;
	}

	Ok(())
}

fn write_standings(out: &mut dyn Write, tournament: &Tournament) -> io::Result<()> {
	writeln!(out, "\n## Standings\n```")?;
	for standing in tournament.standings() {
		writeln!(
			out,
			"{}: {} ({}) rank {} score {}",
			standing.place, standing.name, standing.id, standing.rank, standing.score
		)?;
	}
	writeln!(out, "```")
}

#[cfg(test)]
mod tests {
	use chesstour::{Gender, TieBreak, TimeControl};
	use chrono::NaiveDate;

	use super::*;

	fn player(last_name: &str, first_name: &str, year: i32, rank: u32) -> PlayerArgs {
		PlayerArgs {
			last_name: last_name.to_string(),
			first_name: first_name.to_string(),
			born: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
			gender: Gender::Female,
			rank,
		}
	}

	fn store_with_tournament() -> Store {
		let mut store = Store::open_in_memory().unwrap();
		let create = Commands::Create {
			name: "Tournoi".to_string(),
			location: "Caen".to_string(),
			time_control: TimeControl::Blitz,
			description: String::new(),
			start: None,
			tie_break: TieBreak::Rank,
		};
		run(create, &mut store, &mut Vec::new()).unwrap();
		store
	}

	fn add(store: &mut Store, player: PlayerArgs, save: bool) -> anyhow::Result<()> {
		let command = Commands::AddPlayer {
			tournament: "Tournoi".to_string(),
			player,
			save,
		};
		run(command, store, &mut Vec::new())
	}

	fn full_store() -> Store {
		let mut store = store_with_tournament();
		let names = ["Hugo", "Bertin", "Garnier", "Aubert", "Faure", "Durand", "Caron", "Etienne"];
		for (i, name) in names.into_iter().enumerate() {
			add(&mut store, player(name, "Lea", 1980 + i as i32, (i as u32 + 1) * 3 % 10 + 1), false)
				.unwrap();
		}
		store
	}

	fn report(store: &mut Store, command: Commands) -> String {
		let mut out = Vec::new();
		run(command, store, &mut out).unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn refused_player_is_not_saved_to_the_directory() {
		let mut store = full_store();

		let result = add(&mut store, player("Extra", "Zoe", 2001, 50), true);

		assert!(result.is_err());
		assert!(store.list_players().unwrap().is_empty());
		assert_eq!(
			store.load_tournament("Tournoi").unwrap().players_list.len(),
			8
		);
	}

	#[test]
	fn saved_player_lands_in_the_directory_after_registration() {
		let mut store = store_with_tournament();
		add(&mut store, player("Poirier", "Marine", 1992, 1), true).unwrap();
		add(&mut store, player("Poirier", "Marine", 1992, 1), true).unwrap_err();

		let players = store.list_players().unwrap();
		assert_eq!(players.len(), 1);
		assert_eq!(players[0].last_name, "Poirier");
	}

	#[test]
	fn roster_lists_by_name_and_by_rank() {
		let mut store = full_store();
		let roster = |by, position| Commands::Roster {
			tournament: "Tournoi".to_string(),
			by,
			position,
		};

		let by_name = report(&mut store, roster(RosterOrder::Name, None));
		let first_lines: Vec<&str> = by_name.lines().take(2).collect();
		assert!(first_lines[0].starts_with("1: Lea Aubert"));
		assert!(first_lines[1].starts_with("2: Lea Bertin"));

		// Ranks by seed are 4, 7, 10, 3, 6, 9, 2, 5.
		let by_rank = report(&mut store, roster(RosterOrder::Rank, None));
		assert!(by_rank.lines().next().unwrap().starts_with("1: Lea Caron"));

		let third = report(&mut store, roster(RosterOrder::Seed, Some(3)));
		assert!(third.starts_with("3: Lea Garnier"));

		let command = roster(RosterOrder::Seed, Some(9));
		assert!(run(command, &mut store, &mut Vec::new()).is_err());
	}

	#[test]
	fn save_roster_skips_players_already_in_the_directory() {
		let mut store = full_store();
		let command = Commands::SaveRoster {
			tournament: "Tournoi".to_string(),
		};

		assert_eq!(report(&mut store, command), "saved 8 player(s), skipped 0\n");
		let command = Commands::SaveRoster {
			tournament: "Tournoi".to_string(),
		};
		assert_eq!(report(&mut store, command), "saved 0 player(s), skipped 8\n");
		assert_eq!(store.list_players().unwrap().len(), 8);
	}
}
