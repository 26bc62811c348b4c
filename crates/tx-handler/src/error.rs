use thiserror::Error;

/// Violations of the transaction shape contract. These are caller bugs, not
/// invalid transactions; invalidity is reported through [`crate::validation::Rejection`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    #[error("Input index {index} out of range for transaction with {inputs} inputs")]
    InputOutOfRange { index: usize, inputs: usize },
    #[error("Transaction has {0} outputs, more than an output index can address")]
    TooManyOutputs(usize),
}
