pub mod book;
pub mod id;
pub mod ordered_set;
pub mod reading_list;
