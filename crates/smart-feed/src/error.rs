use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FeedError {
    #[error("Content item {0} not found")]
    ItemNotFound(u64),

    #[error("Content item {0} already exists")]
    DuplicateItem(u64),

    #[error("Invalid content item: {0}")]
    InvalidItem(String),
}
