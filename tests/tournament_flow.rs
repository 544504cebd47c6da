//! Integration tests for a tournament driven through the store, the way the
//! command line does it: load, apply one operation, save back.

use chesstour::{
	data::{PlayerRecord, TournamentRecord},
	db::{Store, StoreError},
	Gender, Outcome, Player, Tournament, TimeControl, TournamentError, TournamentState,
};
use chrono::{NaiveDate, NaiveDateTime};

fn at(day: u32, hour: u32) -> NaiveDateTime {
	NaiveDate::from_ymd_opt(2021, 3, day)
		.unwrap()
		.and_hms_opt(hour, 0, 0)
		.unwrap()
}

fn directory() -> Vec<PlayerRecord> {
	[
		("Poirier", "Marine", (1992, 5, 14), Gender::Female, 1),
		("Villey", "Chloe", (1989, 8, 14), Gender::Female, 2),
		("Villey", "Karine", (1985, 9, 29), Gender::Female, 16),
		("Jourdan", "Evelyne", (1960, 10, 4), Gender::Female, 10),
		("Quesney", "Dany", (1990, 5, 7), Gender::Male, 24),
		("Brise", "Vincent", (1990, 1, 11), Gender::Male, 42),
		("Villey", "Thierry", (1959, 9, 6), Gender::Male, 6),
		("Saint-Aubin", "Alana", (2016, 3, 5), Gender::Female, 156),
	]
	.into_iter()
	.map(|(last_name, first_name, (y, m, d), gender, rank)| PlayerRecord {
		last_name: last_name.to_string(),
		first_name: first_name.to_string(),
		date_of_birth: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
		gender,
		rank,
	})
	.collect()
}

fn update<F>(store: &mut Store, operation: F) -> Result<Tournament, TournamentError>
where
	F: FnOnce(&mut Tournament) -> Result<(), TournamentError>,
{
	let record = store.load_tournament("Tournoi").unwrap();
	let mut tournament = Tournament::try_from(record).unwrap();
	operation(&mut tournament)?;
	store
		.save_tournament(&TournamentRecord::from(&tournament), true)
		.unwrap();
	Ok(tournament)
}

#[test]
fn tournament_survives_a_reload_after_every_step() {
	let mut store = Store::open_in_memory().unwrap();
	let tournament = Tournament::new("Tournoi", "Caen", TimeControl::Blitz, "", at(22, 9));
	store
		.save_tournament(&TournamentRecord::from(&tournament), false)
		.unwrap();

	for record in directory() {
		let id = store.save_player(&record).unwrap();
		let player = Player::try_from(&store.load_player(&id).unwrap()).unwrap();
		update(&mut store, |t| t.add_player(player)).unwrap();
	}

	let outcomes = [Outcome::FirstWins, Outcome::Draw, Outcome::SecondWins, Outcome::Draw];
	for (round, outcome) in outcomes.into_iter().enumerate() {
		let day = 22 + round as u32;
		update(&mut store, |t| t.start_next_round(at(day, 14)).map(|_| ())).unwrap();
		for index in 0..4 {
			update(&mut store, |t| t.record_result(index, outcome)).unwrap();
		}
		let tournament = update(&mut store, |t| t.close_round(at(day, 18)).map(|_| ())).unwrap();
		assert_eq!(tournament.rounds().len(), round + 1);
	}

	let tournament = update(&mut store, |_| Ok(())).unwrap();
	assert_eq!(tournament.state(), TournamentState::Complete);
	for player in tournament.players() {
		assert_eq!(player.opponents().len(), 4);
	}

	let end = NaiveDate::from_ymd_opt(2021, 3, 26).unwrap();
	update(&mut store, |t| t.end_tournament(end)).unwrap();

	let stored = store.load_tournament("Tournoi").unwrap();
	assert_eq!(stored.tournament_info.end_date, Some(end));
	assert_eq!(stored.rounds_list.len(), 4);
	assert!(stored.rounds_list.iter().all(|round| round.end_date.is_some()));

	let tournament = Tournament::try_from(stored).unwrap();
	assert_eq!(tournament.state(), TournamentState::Closed);
	let total: f32 = tournament.standings().iter().map(|s| s.score).sum();
	assert_eq!(total, 16.0);
}

#[test]
fn failed_operation_leaves_the_stored_record_alone() {
	let mut store = Store::open_in_memory().unwrap();
	let mut tournament = Tournament::new("Tournoi", "Caen", TimeControl::Bullet, "", at(22, 9));
	for record in directory() {
		tournament.add_player(Player::try_from(&record).unwrap()).unwrap();
	}
	store
		.save_tournament(&TournamentRecord::from(&tournament), false)
		.unwrap();
	update(&mut store, |t| t.start_next_round(at(22, 14)).map(|_| ())).unwrap();

	let before = store.load_tournament("Tournoi").unwrap();
	let err = update(&mut store, |t| t.close_round(at(22, 18)).map(|_| ())).unwrap_err();
	assert!(matches!(err, TournamentError::Round(_)));
	assert_eq!(store.load_tournament("Tournoi").unwrap(), before);
}

#[test]
fn second_tournament_with_the_same_name_is_refused() {
	let mut store = Store::open_in_memory().unwrap();
	let tournament = Tournament::new("Tournoi", "Caen", TimeControl::Rapid, "", at(22, 9));
	let record = TournamentRecord::from(&tournament);

	store.save_tournament(&record, false).unwrap();
	assert!(matches!(
		store.save_tournament(&record, false),
		Err(StoreError::AlreadyExists(_))
	));
}
