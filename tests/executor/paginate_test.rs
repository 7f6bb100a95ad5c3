use rowstream::{
    executor::{
        paginate::OffsetPaginator,
        pull::{PullSource, ScanState},
        users::{lazy_paginate, paginate_users, stream_users},
    },
    storage::query::{PagedQuery, Window},
    types::error::{DatabaseError, ErrorClass, MAX_FETCH_SIZE},
    utils::mock::{MockProvider, user_rows},
};

#[test]
fn test_pages_match_full_scan() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(23);
    let paged: Vec<String> = lazy_paginate(&provider, 7)?
        .flat_map(|page| page.into_iter().map(|user| user.user_id))
        .collect();
    let full: Vec<String> = stream_users(&provider).map(|user| user.user_id).collect();
    assert_eq!(paged.len(), 23);
    assert_eq!(paged, full);
    Ok(())
}

#[test]
fn test_each_page_is_an_independent_request() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(23);
    let sizes: Vec<usize> = lazy_paginate(&provider, 10)?
        .map(|page| page.len())
        .collect();
    assert_eq!(sizes, vec![10, 10, 3]);

    // three pages plus the empty one that ends the scan
    assert_eq!(provider.opened(), 4);
    assert_eq!(provider.live(), 0);
    let windows: Vec<Option<Window>> = provider.queries().iter().map(|q| q.window).collect();
    assert_eq!(
        windows,
        vec![
            Some(Window { limit: 10, offset: 0 }),
            Some(Window { limit: 10, offset: 10 }),
            Some(Window { limit: 10, offset: 20 }),
            Some(Window { limit: 10, offset: 30 }),
        ]
    );
    Ok(())
}

#[test]
fn test_connection_released_between_pages() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(30);
    let mut pages = lazy_paginate(&provider, 10)?;
    let first = pages.next().expect("first page");
    assert_eq!(first.len(), 10);
    assert_eq!(provider.live(), 0);
    Ok(())
}

#[test]
fn test_single_page_request() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(23);
    let page = paginate_users(&provider, 5, 20)?;
    let ids: Vec<&str> = page.iter().map(|user| user.user_id.as_str()).collect();
    assert_eq!(ids, vec!["user-00020", "user-00021", "user-00022"]);
    assert!(paginate_users(&provider, 5, 100)?.is_empty());
    Ok(())
}

#[test]
fn test_restart_and_seek() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(12);
    let mut pages = lazy_paginate(&provider, 5)?;
    assert_eq!(pages.by_ref().count(), 3);
    assert_eq!(pages.state(), ScanState::Exhausted);
    assert!(pages.next().is_none());

    pages.restart();
    assert_eq!(pages.next().map(|page| page.number), Some(0));

    pages.seek(2);
    assert_eq!(pages.next_page(), 2);
    let last = pages.next().expect("page 2");
    assert_eq!(last.offset, 10);
    assert_eq!(last.len(), 2);
    assert!(pages.next().is_none());
    Ok(())
}

#[test]
fn test_zero_page_size_rejected() {
    let provider = MockProvider::with_users(3);
    assert!(matches!(
        lazy_paginate(&provider, 0),
        Err(DatabaseError::InvalidPageSize { size: 0 })
    ));
    assert!(matches!(
        paginate_users(&provider, 0, 0),
        Err(DatabaseError::InvalidPageSize { size: 0 })
    ));
    assert_eq!(provider.opened(), 0);
}

#[test]
fn test_empty_table_yields_no_pages() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(0);
    assert_eq!(lazy_paginate(&provider, 7)?.count(), 0);
    assert_eq!(provider.opened(), 1);
    assert_eq!(provider.released(), 1);
    Ok(())
}

#[test]
fn test_connection_failure_is_recorded() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(5).failing_open();
    let mut pages = lazy_paginate(&provider, 2)?;
    assert!(pages.next().is_none());
    assert_eq!(
        pages.last_error().map(DatabaseError::class),
        Some(ErrorClass::Connection)
    );

    let strict: Vec<_> = lazy_paginate(&provider, 2)?.fallible().collect();
    assert_eq!(strict.len(), 1);
    assert!(strict[0].is_err());
    Ok(())
}

#[test]
fn test_raw_row_paginator() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(4);
    let query = PagedQuery::parse("SELECT * FROM user_data ORDER BY user_id")?;
    let paginator = OffsetPaginator::new(&provider, query, 3)?;
    assert_eq!(paginator.page_size(), 3);
    assert_eq!(paginator.offset_of(4), Some(12));
    assert_eq!(paginator.offset_of(usize::MAX), None);
    let sizes: Vec<usize> = paginator.map(|page| page.len()).collect();
    assert_eq!(sizes, vec![3, 1]);
    Ok(())
}

#[test]
fn test_page_shapes_across_sizes() -> Result<(), DatabaseError> {
    for rows in 0..=25usize {
        let expected: Vec<String> = user_rows(rows)
            .iter()
            .filter_map(|row| row.values[0].as_text().map(str::to_string))
            .collect();
        for page_size in 1..=12usize {
            let provider = MockProvider::with_users(rows);
            let pages: Vec<_> = lazy_paginate(&provider, page_size)?.collect();
            let context = format!("{} rows in pages of {}", rows, page_size);
            let page_count = rows.div_ceil(page_size);

            assert_eq!(pages.len(), page_count, "{}", context);
            for (index, page) in pages.iter().enumerate() {
                assert_eq!(page.number, index, "{}", context);
                assert_eq!(page.offset, index * page_size, "{}", context);
                let remaining = rows - index * page_size;
                assert_eq!(page.len(), remaining.min(page_size), "{}", context);
            }

            let ids: Vec<String> = pages
                .into_iter()
                .flat_map(|page| page.into_iter().map(|user| user.user_id))
                .collect();
            assert_eq!(ids, expected, "{}", context);
            // one request per page plus the empty one that ends the scan
            assert_eq!(provider.opened(), page_count + 1, "{}", context);
            assert_eq!(provider.live(), 0, "{}", context);
        }
    }
    Ok(())
}

#[test]
fn test_page_size_beyond_bindable_range_rejected() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(23);
    let pages: Vec<usize> = lazy_paginate(&provider, MAX_FETCH_SIZE)?
        .map(|page| page.len())
        .collect();
    assert_eq!(pages, vec![23]);

    let too_big = MAX_FETCH_SIZE + 1;
    assert!(matches!(
        lazy_paginate(&provider, too_big),
        Err(DatabaseError::InvalidPageSize { size }) if size == too_big
    ));
    assert!(matches!(
        paginate_users(&provider, too_big, 0),
        Err(DatabaseError::InvalidPageSize { size }) if size == too_big
    ));
    assert_eq!(provider.opened(), 2);
    Ok(())
}

#[test]
fn test_unaddressable_page_fails_without_a_request() -> Result<(), DatabaseError> {
    let provider = MockProvider::with_users(5);
    let mut pages = lazy_paginate(&provider, 3)?;
    pages.seek(usize::MAX / 2);
    assert!(pages.next().is_none());
    assert!(matches!(
        pages.last_error(),
        Some(DatabaseError::OffsetOverflow { .. })
    ));
    assert_eq!(pages.state(), ScanState::Exhausted);

    pages.seek(usize::MAX / 2);
    let strict: Vec<_> = pages.fallible().collect();
    assert_eq!(strict.len(), 1);
    assert!(matches!(strict[0], Err(DatabaseError::OffsetOverflow { .. })));
    assert_eq!(provider.opened(), 0);
    Ok(())
}
