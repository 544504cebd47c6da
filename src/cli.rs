use std::path::PathBuf;

use chesstour::{Gender, Outcome, TieBreak, TimeControl};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Swiss-system chess tournaments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	/// SQLite file holding tournaments and players
	#[arg(short, long, value_name = "FILE", default_value = "chesstour.db")]
	pub database: PathBuf,

	/// Write reports here instead of stdout
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Args)]
pub struct PlayerArgs {
	#[arg(long)]
	pub last_name: String,
	#[arg(long)]
	pub first_name: String,
	/// Date of birth
	#[arg(long, value_name = "YYYY-MM-DD")]
	pub born: NaiveDate,
	/// M or F
	#[arg(long)]
	pub gender: Gender,
	/// Positive, lower is stronger
	#[arg(long)]
	pub rank: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RosterOrder {
	/// Registration order
	Seed,
	/// Last name, then first name
	Name,
	/// Strongest first
	Rank,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a tournament
	Create {
		name: String,
		#[arg(long)]
		location: String,
		/// bullet, blitz or rapid
		#[arg(long)]
		time_control: TimeControl,
		#[arg(long, default_value = "")]
		description: String,
		/// Defaults to now
		#[arg(long, value_name = "YYYY-MM-DDTHH:MM:SS")]
		start: Option<NaiveDateTime>,
		/// Order among equal scores: rank or seed
		#[arg(long, default_value_t = TieBreak::Rank)]
		tie_break: TieBreak,
	},
	/// List stored tournaments
	Tournaments,
	/// Print a tournament with its roster and rounds
	Show { tournament: String },
	/// Register a new player in a tournament
	AddPlayer {
		tournament: String,
		#[command(flatten)]
		player: PlayerArgs,
		/// Also keep the player in the player directory
		#[arg(long)]
		save: bool,
	},
	/// Print the players of a tournament
	Roster {
		tournament: String,
		#[arg(long, value_enum, default_value_t = RosterOrder::Seed)]
		by: RosterOrder,
		/// Only the player at this place in the list, starting at 1
		#[arg(value_name = "PLACE")]
		position: Option<usize>,
	},
	/// Copy the players of a tournament into the player directory
	SaveRoster { tournament: String },
	/// Register a player from the player directory
	Enroll { tournament: String, player_id: String },
	/// Add a player to the player directory
	SavePlayer {
		#[command(flatten)]
		player: PlayerArgs,
	},
	/// List the player directory
	Players,
	/// Load the player directory from a CSV file
	ImportPlayers {
		#[arg(value_name = "FILE")]
		file: PathBuf,
	},
	/// Pair and start the next round
	NextRound { tournament: String },
	/// Record the result of a match of the current round
	#[command(name = "result")]
	Record {
		tournament: String,
		/// Match number, starting at 1
		#[arg(value_name = "MATCH")]
		number: usize,
		/// 1, 2 or draw
		outcome: Outcome,
	},
	/// Close the current round once every result is in
	CloseRound { tournament: String },
	/// Set the end date of a tournament whose rounds are all played
	Finish {
		tournament: String,
		/// Defaults to today
		#[arg(long, value_name = "YYYY-MM-DD")]
		date: Option<NaiveDate>,
	},
	/// Print the standings
	Standings { tournament: String },
}
