use serde::{Deserialize, Serialize};
use std::fmt;

/// 本の識別子。作成時に一度だけ採番され、以後変わらない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(uuid::Uuid);

impl Default for BookId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl BookId {
    pub fn new() -> Self {
        Self::default()
    }

    /// 短縮ID（UUIDの先頭8文字）
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}
