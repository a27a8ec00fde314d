//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use reading_list::application::catalog::BookCatalog;
use reading_list::domain::model::book::Book;
use reading_list::domain::model::ordered_set::OrderedSet;
use reading_list::domain::repository::ReadingListRepository;

// =============================================================================
// InMemoryRepo — テスト用リポジトリ
// =============================================================================

/// ファイルI/O不要のインメモリリポジトリ。保存回数を数える。
pub struct InMemoryRepo {
    store: RefCell<Option<String>>,
    saves: Cell<usize>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(None),
            saves: Cell::new(0),
        }
    }

    /// 保存済みの内容を持った状態で作る。
    pub fn with_books(books: &OrderedSet<Book>) -> Self {
        let repo = Self::new();
        *repo.store.borrow_mut() = Some(serde_json::to_string(books).unwrap());
        repo
    }

    /// 壊れたJSONを保存済みにする。
    pub fn corrupt() -> Self {
        let repo = Self::new();
        *repo.store.borrow_mut() = Some("[{\"title\": 42".to_string());
        repo
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// 最後に保存された内容。
    pub fn stored(&self) -> Option<OrderedSet<Book>> {
        self.store
            .borrow()
            .as_deref()
            .map(|json| serde_json::from_str(json).unwrap())
    }
}

impl ReadingListRepository for InMemoryRepo {
    type Error = serde_json::Error;

    fn load(&self) -> Result<Option<OrderedSet<Book>>, Self::Error> {
        match self.store.borrow().as_deref() {
            Some(json) => serde_json::from_str(json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, books: &OrderedSet<Book>) -> Result<(), Self::Error> {
        let json = serde_json::to_string(books)?;
        *self.store.borrow_mut() = Some(json);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// 空のカタログ。
pub fn empty_catalog() -> BookCatalog<InMemoryRepo> {
    BookCatalog::open(InMemoryRepo::new())
}

/// 標準的なテスト用カタログ:
/// ```text
/// unread: Neuromancer (cyberpunk), Foundation (classic, image)
/// read:   Dune (recommended)
/// ```
pub fn standard_catalog() -> BookCatalog<InMemoryRepo> {
    let mut catalog = empty_catalog();
    catalog.create_book("Neuromancer", "cyberpunk", None);
    let dune = catalog.create_book("Dune", "recommended", None);
    catalog.create_book("Foundation", "classic", Some(vec![1, 2, 3, 4]));
    catalog.toggle_read(&dune);
    catalog
}

pub fn titles(books: &[&Book]) -> Vec<String> {
    books.iter().map(|b| b.title().to_string()).collect()
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
