use super::book::{Book, UpdateBookRequest};
use super::id::BookId;
use super::ordered_set::OrderedSet;
use crate::domain::error::DomainError;

/// 読書リスト — 集約ルート。全ての本の操作はここを経由する。
///
/// `read_books` / `unread_books` は状態を持たず、呼び出し毎に計算する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingList {
    books: OrderedSet<Book>,
}

impl ReadingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_books(books: OrderedSet<Book>) -> Self {
        Self { books }
    }

    pub fn books(&self) -> &OrderedSet<Book> {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books
            .index_of_key(&id)
            .and_then(|index| self.books.get(index))
    }

    /// 存在しなければ `BookNotFound`。
    pub fn require(&self, id: BookId) -> Result<&Book, DomainError> {
        self.get(id).ok_or(DomainError::BookNotFound(id))
    }

    /// 本を追加し、リスト上の本を返す。
    /// タイトル・理由・画像が同じ未読の本が既にあれば追加せず、既存の本を返す。
    pub fn add(&mut self, book: Book) -> &Book {
        let existing = self.books.iter().position(|b| {
            !b.has_been_read()
                && b.title() == book.title()
                && b.reason_to_read() == book.reason_to_read()
                && b.image() == book.image()
        });
        let index = match existing {
            Some(index) => index,
            None => {
                self.books.append(book);
                self.books.len() - 1
            }
        };
        &self.books[index]
    }

    pub fn remove(&mut self, id: BookId) -> Option<Book> {
        self.books.remove_key(&id)
    }

    /// 既読/未読を反転する。見つからなければNone。
    pub fn toggle_read(&mut self, id: BookId) -> Option<&Book> {
        let index = self.books.index_of_key(&id)?;
        self.books[index].toggle_read();
        Some(&self.books[index])
    }

    /// 指定されたフィールドだけ上書きする。見つからなければNone。
    pub fn update(&mut self, id: BookId, req: UpdateBookRequest) -> Option<&Book> {
        let index = self.books.index_of_key(&id)?;
        self.books[index].apply(req);
        Some(&self.books[index])
    }

    /// 既読の本（タイトル昇順）
    pub fn read_books(&self) -> Vec<&Book> {
        self.sorted_by_title(true)
    }

    /// 未読の本（タイトル昇順）
    pub fn unread_books(&self) -> Vec<&Book> {
        self.sorted_by_title(false)
    }

    fn sorted_by_title(&self, has_been_read: bool) -> Vec<&Book> {
        let mut books: Vec<&Book> = self
            .books
            .iter()
            .filter(|b| b.has_been_read() == has_been_read)
            .collect();
        // 安定ソート: 同タイトルは挿入順のまま
        books.sort_by(|a, b| a.title().cmp(b.title()));
        books
    }
}
