//! Fee-maximizing acceptance of ledger transactions against a set of unspent outputs.
//!
//! A [`TxHandler`] owns the [`EntrySet`] and, once per round, validates an
//! unordered batch of candidates, picks a conflict-free subset by fee, and
//! commits it.

pub mod crypto;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod selection;
pub mod shared;
pub mod transaction;
pub mod validation;

pub use crypto::{Ed25519Verifier, Keypair, SignatureVerifier};
pub use error::TxError;
pub use handler::{AcceptedTx, RoundOutcome, TxHandler};
pub use ledger::EntrySet;
pub use selection::SelectionPolicy;
pub use shared::SharedTxHandler;
pub use transaction::{
    Input, OutPoint, Output, PublicKey, Signature, Transaction, TransactionBuilder, TxHash,
};
pub use validation::Rejection;

/// Run successive batches through a fresh greedy handler and return the
/// accepted transactions of each round along with the final entry set
pub fn process_rounds<I>(snapshot: &EntrySet, rounds: I) -> (Vec<Vec<Transaction>>, EntrySet)
where
    I: IntoIterator<Item = Vec<Transaction>>,
{
    let mut handler = TxHandler::new(snapshot);

    let accepted = rounds
        .into_iter()
        .map(|batch| handler.process_round(&batch))
        .collect();

    (accepted, handler.into_entries())
}
