#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No stored secret with id \"{0}\"")]
    KeyNotFound(String),
    #[error("Record \"{0}\" is not hardware-bound")]
    UnsupportedRecord(String),
    #[error("Gate: {0}")]
    Gate(#[from] crate::gate::GateError),
    #[error("Crypto: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
