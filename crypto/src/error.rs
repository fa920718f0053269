use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("`{0}`")]
    EcdsaError(#[from] k256::ecdsa::Error),
    #[error("invalid secret scalar")]
    InvalidSecret,
    #[error("invalid public key")]
    InvalidPublic,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("cryptographic invariant violated")]
    InvalidState,
}
