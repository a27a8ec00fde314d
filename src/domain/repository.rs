use super::model::book::Book;
use super::model::ordered_set::OrderedSet;

/// 永続化の抽象。Infra層が実装する。
/// 読書リスト全体を1単位として読み書きする。
pub trait ReadingListRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// 保存済みのリストを読む。未保存ならNone。
    fn load(&self) -> Result<Option<OrderedSet<Book>>, Self::Error>;
    fn save(&self, books: &OrderedSet<Book>) -> Result<(), Self::Error>;
}
