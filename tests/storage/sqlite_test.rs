use rowstream::{
    config::DatabaseConfig,
    executor::{
        cursor::RowCursor,
        pull::PullSource,
        scan::Scanner,
        users::{lazy_paginate, paginate_users, stream_users, stream_users_in_batches},
    },
    storage::{
        connection::{Connection, ConnectionProvider},
        query::Query,
        sqlite::SqliteProvider,
    },
    types::{
        error::{DatabaseError, ErrorClass, MAX_FETCH_SIZE},
        value::Value,
    },
    utils::mock::{TempDatabase, new_users},
};

#[test]
fn test_missing_database_is_connection_failure() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("missing")?;
    let provider = temp_db.provider();
    match provider.open() {
        Err(e) => assert_eq!(e.class(), ErrorClass::Connection),
        Ok(_) => panic!("opened a database that does not exist"),
    }
    assert!(!temp_db.path.exists());

    let mut users = stream_users(&provider);
    assert_eq!(users.by_ref().count(), 0);
    assert!(matches!(
        users.last_error(),
        Some(DatabaseError::ConnectionFailure { .. })
    ));
    Ok(())
}

#[test]
fn test_cursor_scan_and_batches() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("cursor")?;
    temp_db.with_users(&new_users(12))?;
    let provider = temp_db.provider();

    let mut cursor = provider
        .open()?
        .query(&Query::new("SELECT name FROM user_data ORDER BY name"))?;
    let first = cursor.scan()?.expect("first row");
    assert_eq!(first.values, vec![Value::from("User 0")]);
    assert_eq!(cursor.scan_batch(5)?.len(), 5);
    assert_eq!(cursor.scan_all()?.len(), 6);
    assert!(cursor.scan()?.is_none());
    Ok(())
}

#[test]
fn test_streams_agree_on_order() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("order")?;
    temp_db.with_users(&new_users(23))?;
    let provider = temp_db.provider();

    let streamed: Vec<String> = stream_users(&provider).map(|u| u.user_id).collect();
    assert_eq!(streamed.len(), 23);
    let mut sorted = streamed.clone();
    sorted.sort();
    assert_eq!(streamed, sorted);

    let batched: Vec<String> = stream_users_in_batches(&provider, 10)?
        .flat_map(|page| page.into_iter().map(|u| u.user_id))
        .collect();
    let paged: Vec<String> = lazy_paginate(&provider, 7)?
        .flat_map(|page| page.into_iter().map(|u| u.user_id))
        .collect();
    assert_eq!(batched, streamed);
    assert_eq!(paged, streamed);

    let window: Vec<String> = paginate_users(&provider, 5, 20)?
        .into_iter()
        .map(|u| u.user_id)
        .collect();
    assert_eq!(window, streamed[20..].to_vec());
    Ok(())
}

#[test]
fn test_bad_sql_is_query_failure() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("bad_sql")?;
    temp_db.with_users(&new_users(1))?;
    let provider = temp_db.provider();

    let results: Vec<_> = RowCursor::new(&provider, Query::new("SELECT * FROM nowhere"))
        .fallible()
        .collect();
    assert_eq!(results.len(), 1);
    match &results[0] {
        Err(e) => assert_eq!(e.class(), ErrorClass::Query),
        Ok(row) => panic!("unexpected row {:?}", row),
    }
    Ok(())
}

#[test]
fn test_ages_are_decimal() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("ages")?;
    temp_db.with_users(&new_users(3))?;
    let ages: Vec<_> = stream_users(temp_db.provider())
        .map(|user| user.age)
        .collect();
    let mut expected: Vec<_> = new_users(3).into_iter().map(|u| u.age).collect();
    let mut actual = ages.clone();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
    Ok(())
}

#[test]
fn test_provider_exposes_config() {
    let config = DatabaseConfig::new("/tmp/rowstream-test.db");
    let provider = SqliteProvider::new(config.clone());
    assert_eq!(provider.config(), &config);
    assert_eq!(provider.target(), "/tmp/rowstream-test.db");
}

#[test]
fn test_rows_are_stepped_on_demand() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("on_demand")?;
    temp_db.with_users(&[])?;
    let provider = temp_db.provider();

    // the third row overflows abs() when SQLite steps to it
    let query = Query::new(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 5) \
         SELECT n, CASE WHEN n = 3 THEN abs(n - 3 - 9223372036854775807 - 1) ELSE n END FROM seq",
    );
    let mut results = RowCursor::new(&provider, query).fallible();
    let first = results.next().expect("first row")?;
    assert_eq!(first.values, vec![Value::Integer(1), Value::Integer(1)]);
    let second = results.next().expect("second row")?;
    assert_eq!(second.values, vec![Value::Integer(2), Value::Integer(2)]);
    match results.next() {
        Some(Err(e)) => assert_eq!(e.class(), ErrorClass::Query),
        other => panic!("expected a step failure, got {:?}", other),
    }
    assert!(results.next().is_none());
    Ok(())
}

#[test]
fn test_dropped_cursor_releases_its_read_lock() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("release")?;
    temp_db.with_users(&new_users(50))?;
    let provider = SqliteProvider::new(DatabaseConfig {
        path: temp_db.path.clone(),
        busy_timeout_ms: 0,
    });
    let insert = "INSERT INTO user_data (user_id, name, email, age) \
                  VALUES ('late-user', 'Late', 'late@example.com', 30)";

    let mut users = stream_users(&provider);
    assert!(users.next().is_some());
    {
        let writer = provider.open()?;
        assert!(
            writer.execute_batch(insert).is_err(),
            "an open cursor should block writers"
        );
    }

    drop(users);
    provider.open()?.execute_batch(insert)?;
    assert_eq!(stream_users(&provider).count(), 51);
    Ok(())
}

#[test]
fn test_oversized_requests_over_sqlite() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("oversized")?;
    temp_db.with_users(&new_users(23))?;
    let provider = temp_db.provider();

    let paged: usize = lazy_paginate(&provider, MAX_FETCH_SIZE)?
        .map(|page| page.len())
        .sum();
    assert_eq!(paged, 23);
    assert_eq!(paginate_users(&provider, MAX_FETCH_SIZE, 20)?.len(), 3);

    let batches: Vec<usize> = stream_users_in_batches(&provider, usize::MAX)?
        .map(|page| page.len())
        .collect();
    assert_eq!(batches, vec![23]);
    Ok(())
}
