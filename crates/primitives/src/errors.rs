use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid proving system: {given}, available proving systems are: [{available}]")]
pub struct ParseProvingSystemError {
    pub given: String,
    pub available: String,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed task response encoding: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}
