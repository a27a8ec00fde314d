use tracing::{debug, warn};

use crate::domain::model::book::{Book, UpdateBookRequest};
use crate::domain::model::id::BookId;
use crate::domain::model::ordered_set::OrderedSet;
use crate::domain::model::reading_list::ReadingList;
use crate::domain::repository::ReadingListRepository;

use super::error::AppError;

/// 読書リストに対するユースケース。
///
/// 生成時に一度だけloadし、以後はメモリ上のリストが正。
/// 変更操作のたびにリスト全体をsaveする。保存失敗はログに残して握りつぶす。
pub struct BookCatalog<R: ReadingListRepository> {
    repo: R,
    list: ReadingList,
}

impl<R: ReadingListRepository> BookCatalog<R> {
    /// 保存済みのリストを読み込んで開く。読めなければ空のリストで始める。
    pub fn open(repo: R) -> Self {
        let mut catalog = Self {
            repo,
            list: ReadingList::new(),
        };
        if let Err(e) = catalog.load() {
            warn!(error = %e, "failed to load reading list; starting empty");
        }
        catalog
    }

    /// `open` と同じだが、読み込み失敗をそのまま返す。
    pub fn try_open(repo: R) -> Result<Self, AppError> {
        let mut catalog = Self {
            repo,
            list: ReadingList::new(),
        };
        catalog.load()?;
        Ok(catalog)
    }

    pub fn books(&self) -> &OrderedSet<Book> {
        self.list.books()
    }

    pub fn read_books(&self) -> Vec<&Book> {
        self.list.read_books()
    }

    pub fn unread_books(&self) -> Vec<&Book> {
        self.list.unread_books()
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.list.get(id)
    }

    pub fn require(&self, id: BookId) -> Result<&Book, AppError> {
        Ok(self.list.require(id)?)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 本を追加して永続化する。同じ内容の未読の本があればそれを返す。
    pub fn create_book(
        &mut self,
        title: impl Into<String>,
        reason_to_read: impl Into<String>,
        image: Option<Vec<u8>>,
    ) -> Book {
        let book = self
            .list
            .add(Book::new(title, reason_to_read, image))
            .clone();
        self.persist();
        book
    }

    /// 本を削除して永続化する。リストに無くても保存は行う。
    pub fn delete(&mut self, book: &Book) -> Option<Book> {
        let removed = self.list.remove(book.id());
        if removed.is_none() {
            debug!(id = %book.id(), "delete: book not in list");
        }
        self.persist();
        removed
    }

    /// 既読/未読を反転する。見つからなければNoneを返し、保存しない。
    pub fn toggle_read(&mut self, book: &Book) -> Option<Book> {
        let updated = self.list.toggle_read(book.id())?.clone();
        self.persist();
        Some(updated)
    }

    /// 指定フィールドを上書きする。見つからなければ何もしない。
    /// 空のリクエストでも保存は行う。
    pub fn update(&mut self, book: &Book, req: UpdateBookRequest) -> Option<Book> {
        let updated = self.list.update(book.id(), req)?.clone();
        self.persist();
        Some(updated)
    }

    /// リスト全体を書き出す。
    pub fn save(&self) -> Result<(), AppError> {
        self.repo
            .save(self.list.books())
            .map_err(|e| AppError::Storage(Box::new(e)))?;
        debug!(count = self.list.len(), "reading list saved");
        Ok(())
    }

    /// 保存済みのリストでメモリ上の状態を丸ごと置き換える。
    /// 失敗時はメモリ上の状態を変えない。
    pub fn load(&mut self) -> Result<(), AppError> {
        let loaded = self
            .repo
            .load()
            .map_err(|e| AppError::Storage(Box::new(e)))?;
        match loaded {
            Some(books) => {
                debug!(count = books.len(), "reading list loaded");
                self.list = ReadingList::from_books(books);
            }
            None => {
                debug!("no saved reading list; starting empty");
                self.list = ReadingList::new();
            }
        }
        Ok(())
    }

    // --- private ---

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to save reading list; keeping in-memory state");
        }
    }
}
