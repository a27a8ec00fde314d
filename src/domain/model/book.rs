use serde::{Deserialize, Serialize};

use super::id::BookId;
use super::ordered_set::Keyed;

/// 本の更新リクエスト（Noneのフィールドは変更しない）
#[derive(Debug, Clone, Default)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub reason_to_read: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// 読書リスト上の1冊。
///
/// 同一性は `id` のみで判定する。タイトル等を編集しても同じ本として扱われる。
/// `PartialEq` は全フィールドの値比較。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: String,
    reason_to_read: String,
    #[serde(default)]
    has_been_read: bool,
    /// 表紙画像などのバイナリ。形式は問わない。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<Vec<u8>>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        reason_to_read: impl Into<String>,
        image: Option<Vec<u8>>,
    ) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            reason_to_read: reason_to_read.into(),
            has_been_read: false,
            image,
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reason_to_read(&self) -> &str {
        &self.reason_to_read
    }

    pub fn has_been_read(&self) -> bool {
        self.has_been_read
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    // --- 内部操作（ReadingList経由でのみ呼ばれる） ---

    pub(crate) fn toggle_read(&mut self) {
        self.has_been_read = !self.has_been_read;
    }

    pub(crate) fn apply(&mut self, req: UpdateBookRequest) {
        if let Some(title) = req.title {
            self.title = title;
        }
        if let Some(reason) = req.reason_to_read {
            self.reason_to_read = reason;
        }
        if let Some(image) = req.image {
            self.image = Some(image);
        }
    }
}

impl Keyed for Book {
    type Key = BookId;

    fn key(&self) -> BookId {
        self.id
    }
}
