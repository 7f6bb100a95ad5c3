use rowstream::types::page::Page;

#[test]
fn test_page_positions() {
    let page = Page::new(2, 20, vec!["u20", "u21", "u22"]);
    assert_eq!(page.len(), 3);
    assert_eq!(page.first(), Some(&"u20"));
    assert_eq!(page.end_offset(), 23);
    assert!(!page.is_empty());
}

#[test]
fn test_empty_page() {
    let page: Page<i32> = Page::new(0, 0, Vec::new());
    assert!(page.is_empty());
    assert_eq!(page.end_offset(), 0);
    assert_eq!(page.first(), None);
}

#[test]
fn test_page_map_keeps_position() {
    let page = Page::new(1, 10, vec![1, 2, 3]).map(|n| n * 10);
    assert_eq!(page.number, 1);
    assert_eq!(page.offset, 10);
    assert_eq!(page.records, vec![10, 20, 30]);
}

#[test]
fn test_page_iteration() {
    let page = Page::new(0, 0, vec!["a".to_string(), "b".to_string()]);
    let borrowed: Vec<&String> = (&page).into_iter().collect();
    assert_eq!(borrowed.len(), 2);
    assert_eq!(page.iter().count(), 2);
    let owned: Vec<String> = page.into_iter().collect();
    assert_eq!(owned, vec!["a", "b"]);
}
