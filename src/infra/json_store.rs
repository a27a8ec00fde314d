use std::path::PathBuf;

use crate::domain::model::book::Book;
use crate::domain::model::ordered_set::OrderedSet;
use crate::domain::repository::ReadingListRepository;

/// 既定の保存ファイル名
pub const DEFAULT_FILE_NAME: &str = "ReadingList.json";

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine the user data directory")]
    NoDataDir,
}

/// JSONファイルによるReadingListRepository実装。
/// リスト全体 = 1 JSONファイル（本の配列）。
pub struct JsonReadingListRepository {
    path: PathBuf,
}

impl JsonReadingListRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ユーザーごとの既定の場所に置くリポジトリ。
    pub fn at_default_location() -> Result<Self, JsonStoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `<data_dir>/reading-list/ReadingList.json`
    pub fn default_path() -> Result<PathBuf, JsonStoreError> {
        let data = dirs::data_dir().ok_or(JsonStoreError::NoDataDir)?;
        Ok(data.join("reading-list").join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ReadingListRepository for JsonReadingListRepository {
    type Error = JsonStoreError;

    fn load(&self) -> Result<Option<OrderedSet<Book>>, Self::Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let books: OrderedSet<Book> = serde_json::from_str(&content)?;
        Ok(Some(books))
    }

    fn save(&self, books: &OrderedSet<Book>) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(books)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
