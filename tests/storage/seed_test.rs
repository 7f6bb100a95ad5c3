use std::{fs, path::Path};

use rowstream::{
    executor::users::stream_users,
    storage::seed::{load_data_from_csv, parse_age, seed},
    types::error::DatabaseError,
    utils::mock::TempDatabase,
};
use rust_decimal::Decimal;

const CSV: &str = "\
name,email,age
Dan Altenwerth Jr.,Molly59@gmail.com,67
Glenda Wisozk,Miriam21@gmail.com,119
Daniel Fahey IV,Delia.Lesch11@hotmail.com,49
Ronnie Bechtelar,Sandra19@yahoo.com,22.5
Broken Row,broken@example.com,not-a-number
";

fn write_csv(dir: &Path, contents: &str) -> Result<std::path::PathBuf, DatabaseError> {
    let path = dir.join("user_data.csv");
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn test_load_skips_invalid_ages() -> Result<(), DatabaseError> {
    let dir = tempfile::tempdir()?;
    let load = load_data_from_csv(&write_csv(dir.path(), CSV)?)?;
    assert_eq!(load.users.len(), 4);
    assert_eq!(load.invalid, 1);
    assert_eq!(load.users[3].age, Decimal::new(2250, 2));
    assert_eq!(load.users[0].email, "Molly59@gmail.com");
    Ok(())
}

#[test]
fn test_ages_fit_the_decimal_column() -> Result<(), DatabaseError> {
    let dir = tempfile::tempdir()?;
    let csv = "name,email,age\n\
               Half Up,half@example.com,22.505\n\
               Even Half,even@example.com,0.125\n\
               Oldest,oldest@example.com,999.99\n\
               Too Old,too.old@example.com,1000\n\
               Rounds Over,over@example.com,999.995\n";
    let load = load_data_from_csv(&write_csv(dir.path(), csv)?)?;
    let ages: Vec<Decimal> = load.users.iter().map(|u| u.age).collect();
    assert_eq!(
        ages,
        vec![Decimal::new(2251, 2), Decimal::new(13, 2), Decimal::new(99999, 2)]
    );
    assert_eq!(load.invalid, 2);

    assert_eq!(parse_age(" 41.75 "), Some(Decimal::new(4175, 2)));
    assert_eq!(parse_age("-999.99"), Some(Decimal::new(-99999, 2)));
    assert_eq!(parse_age("-1000"), None);
    assert_eq!(parse_age(""), None);
    Ok(())
}

#[test]
fn test_missing_csv_is_an_error() {
    let result = load_data_from_csv(Path::new("/definitely/not/here.csv"));
    assert!(matches!(
        result,
        Err(DatabaseError::Csv(_)) | Err(DatabaseError::Io(_))
    ));
}

#[test]
fn test_seed_creates_database_and_inserts() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("seed")?;
    let csv = write_csv(temp_db.path.parent().expect("temp dir"), CSV)?;
    let report = seed(&temp_db.provider(), &csv)?;
    assert_eq!(report.inserted, 4);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.invalid, 1);
    assert!(temp_db.path.exists());

    let users: Vec<_> = stream_users(temp_db.provider()).collect();
    assert_eq!(users.len(), 4);
    assert!(users.iter().all(|u| u.user_id.len() == 36));
    Ok(())
}

#[test]
fn test_seeding_twice_inserts_nothing_new() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("reseed")?;
    let csv = write_csv(temp_db.path.parent().expect("temp dir"), CSV)?;
    let provider = temp_db.provider();
    seed(&provider, &csv)?;
    let again = seed(&provider, &csv)?;
    assert_eq!(again.inserted, 0);
    assert_eq!(again.duplicates, 4);
    assert_eq!(stream_users(&provider).count(), 4);
    Ok(())
}

#[test]
fn test_duplicate_emails_within_one_file() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("dupes")?;
    let csv = write_csv(
        temp_db.path.parent().expect("temp dir"),
        "name,email,age\nA,same@example.com,30\nB,same@example.com,40\n",
    )?;
    let report = seed(&temp_db.provider(), &csv)?;
    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    Ok(())
}
