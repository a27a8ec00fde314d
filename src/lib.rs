//! Personal reading list: an ordered, de-duplicated catalog of books with
//! read/unread state, persisted as a single JSON file.

pub mod application;
pub mod domain;
pub mod infra;
pub mod interface;
