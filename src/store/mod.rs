pub mod file;
pub mod record;

pub use file::SecretStore;
pub use record::SecretRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialize: {0}")]
    Serialization(String),
    #[error("Corrupt store: {0}")]
    Corrupt(String),
}
