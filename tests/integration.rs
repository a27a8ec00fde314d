//! Integration tests — BookCatalog operations, persistence, error policy.

mod common;

use common::{assert_error_contains, empty_catalog, standard_catalog, titles, InMemoryRepo};

use reading_list::application::catalog::BookCatalog;
use reading_list::domain::model::book::{Book, UpdateBookRequest};
use reading_list::domain::model::ordered_set::OrderedSet;
use reading_list::infra::json_store::JsonReadingListRepository;

// =============================================================================
// create
// =============================================================================

#[test]
fn create_appends_and_persists() {
    let mut catalog = empty_catalog();
    let book = catalog.create_book("Dune", "recommended", None);

    assert!(!book.has_been_read());
    assert_eq!(catalog.books().len(), 1);
    assert_eq!(catalog.repository().save_count(), 1);
    assert_eq!(catalog.repository().stored().unwrap()[0], book);
}

#[test]
fn create_duplicate_is_noop() {
    let mut catalog = empty_catalog();
    let first = catalog.create_book("Dune", "recommended", None);
    let second = catalog.create_book("Dune", "recommended", None);

    assert_eq!(catalog.books().len(), 1);
    assert_eq!(first.id(), second.id());
    assert_eq!(catalog.books()[0].title(), "Dune");
}

#[test]
fn create_keeps_image() {
    let mut catalog = empty_catalog();
    let book = catalog.create_book("Cover", "art", Some(vec![9, 8, 7]));
    assert_eq!(book.image(), Some(&[9u8, 8, 7][..]));
}

// =============================================================================
// views
// =============================================================================

#[test]
fn toggle_moves_between_views() {
    let mut catalog = empty_catalog();
    let a = catalog.create_book("A", "x", None);
    catalog.create_book("B", "y", None);

    catalog.toggle_read(&a).unwrap();

    assert_eq!(titles(&catalog.read_books()), vec!["A"]);
    assert_eq!(titles(&catalog.unread_books()), vec!["B"]);
}

#[test]
fn views_sorted_by_title() {
    let catalog = standard_catalog();
    assert_eq!(titles(&catalog.unread_books()), vec!["Foundation", "Neuromancer"]);
    assert_eq!(titles(&catalog.read_books()), vec!["Dune"]);
}

#[test]
fn raw_collection_keeps_insertion_order() {
    let catalog = standard_catalog();
    let order: Vec<&str> = catalog.books().iter().map(|b| b.title()).collect();
    assert_eq!(order, vec!["Neuromancer", "Dune", "Foundation"]);
}

// =============================================================================
// toggle_read
// =============================================================================

#[test]
fn toggle_twice_restores_and_persists_each_time() {
    let mut catalog = empty_catalog();
    let book = catalog.create_book("A", "x", None);
    let saves = catalog.repository().save_count();

    assert!(catalog.toggle_read(&book).unwrap().has_been_read());
    assert!(!catalog.toggle_read(&book).unwrap().has_been_read());
    assert_eq!(catalog.repository().save_count(), saves + 2);
}

#[test]
fn toggle_unknown_returns_none_without_saving() {
    let mut catalog = standard_catalog();
    let saves = catalog.repository().save_count();

    let stranger = Book::new("Stranger", "", None);
    assert!(catalog.toggle_read(&stranger).is_none());
    assert_eq!(catalog.repository().save_count(), saves);
}

// =============================================================================
// update
// =============================================================================

#[test]
fn update_overwrites_only_supplied_fields() {
    let mut catalog = standard_catalog();
    let foundation = catalog.books()[2].clone();

    let updated = catalog
        .update(
            &foundation,
            UpdateBookRequest {
                title: Some("Foundation and Empire".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title(), "Foundation and Empire");
    assert_eq!(updated.reason_to_read(), "classic");
    assert_eq!(updated.image(), Some(&[1u8, 2, 3, 4][..]));
    assert_eq!(updated.id(), foundation.id());
}

#[test]
fn update_with_stale_copy_still_finds_book() {
    let mut catalog = empty_catalog();
    let original = catalog.create_book("Old", "x", None);
    catalog.update(
        &original,
        UpdateBookRequest {
            title: Some("New".into()),
            ..Default::default()
        },
    );

    // タイトルが変わっても元のコピーで操作できる
    let toggled = catalog.toggle_read(&original).unwrap();
    assert_eq!(toggled.title(), "New");
}

#[test]
fn update_without_fields_still_persists() {
    let mut catalog = standard_catalog();
    let before = catalog.books().clone();
    let saves = catalog.repository().save_count();

    let dune = catalog.books()[1].clone();
    catalog.update(&dune, UpdateBookRequest::default()).unwrap();

    assert_eq!(catalog.books(), &before);
    assert_eq!(catalog.repository().save_count(), saves + 1);
}

#[test]
fn update_unknown_is_noop_without_saving() {
    let mut catalog = standard_catalog();
    let saves = catalog.repository().save_count();

    let result = catalog.update(
        &Book::new("Ghost", "", None),
        UpdateBookRequest {
            title: Some("x".into()),
            ..Default::default()
        },
    );

    assert!(result.is_none());
    assert_eq!(catalog.repository().save_count(), saves);
}

// =============================================================================
// delete
// =============================================================================

#[test]
fn delete_removes_and_persists() {
    let mut catalog = standard_catalog();
    let dune = catalog.books()[1].clone();

    assert!(catalog.delete(&dune).is_some());
    assert!(catalog.get(dune.id()).is_none());
    assert_eq!(catalog.repository().stored().unwrap().len(), 2);
}

#[test]
fn delete_non_member_still_saves() {
    let mut catalog = standard_catalog();
    let before = catalog.books().clone();
    let saves = catalog.repository().save_count();

    assert!(catalog.delete(&Book::new("Ghost", "", None)).is_none());
    assert_eq!(catalog.books(), &before);
    assert_eq!(catalog.repository().save_count(), saves + 1);
    assert_eq!(catalog.repository().stored().unwrap(), before);
}

// =============================================================================
// load
// =============================================================================

#[test]
fn open_loads_saved_books() {
    let books: OrderedSet<Book> = [Book::new("A", "x", None), Book::new("B", "y", None)]
        .into_iter()
        .collect();
    let catalog = BookCatalog::open(InMemoryRepo::with_books(&books));

    assert_eq!(catalog.books(), &books);
    assert_eq!(catalog.repository().save_count(), 0);
}

#[test]
fn open_corrupt_store_starts_empty() {
    let catalog = BookCatalog::open(InMemoryRepo::corrupt());
    assert!(catalog.books().is_empty());
}

#[test]
fn try_open_corrupt_store_errors() {
    let result = BookCatalog::try_open(InMemoryRepo::corrupt());
    assert_error_contains(result.map(|_| ()), "storage error");
}

#[test]
fn require_unknown_errors() {
    let catalog = standard_catalog();
    let ghost = Book::new("Ghost", "", None);
    assert_error_contains(catalog.require(ghost.id()), "book not found");
}

// =============================================================================
// JsonReadingListRepository (file-backed)
// =============================================================================

#[test]
fn json_repo_roundtrip_through_fresh_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ReadingList.json");

    let mut catalog = BookCatalog::open(JsonReadingListRepository::new(&path));
    assert!(catalog.books().is_empty());

    catalog.create_book("Neuromancer", "cyberpunk", None);
    let dune = catalog.create_book("Dune", "recommended", None);
    catalog.create_book("Foundation", "classic", Some(vec![0, 1, 254, 255]));
    catalog.toggle_read(&dune);

    // 新たなインスタンスで読み直す
    let reopened = BookCatalog::open(JsonReadingListRepository::new(&path));
    assert_eq!(reopened.books(), catalog.books());
    assert_eq!(titles(&reopened.read_books()), vec!["Dune"]);
}

#[test]
fn json_repo_empty_list_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ReadingList.json");

    let catalog = BookCatalog::open(JsonReadingListRepository::new(&path));
    catalog.save().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.trim(), "[]");
    assert!(BookCatalog::try_open(JsonReadingListRepository::new(&path))
        .unwrap()
        .books()
        .is_empty());
}

#[test]
fn json_repo_unwritable_path_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    // 親がファイルなので作成できない
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let path = blocker.join("ReadingList.json");

    let mut catalog = BookCatalog::open(JsonReadingListRepository::new(&path));
    let book = catalog.create_book("Dune", "recommended", None);

    assert_eq!(catalog.books().len(), 1);
    assert_eq!(catalog.get(book.id()), Some(&book));
    assert!(catalog.save().is_err());
}

#[test]
fn json_repo_garbage_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ReadingList.json");
    std::fs::write(&path, "not json at all").unwrap();

    let catalog = BookCatalog::open(JsonReadingListRepository::new(&path));
    assert!(catalog.books().is_empty());
}
