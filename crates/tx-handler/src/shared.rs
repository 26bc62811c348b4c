use crate::crypto::{Ed25519Verifier, SignatureVerifier};
use crate::handler::{RoundOutcome, TxHandler};
use crate::ledger::EntrySet;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::Arc;

/// Handler shared between callers. Each round holds the lock from first
/// validation to last commit, so rounds never interleave.
pub struct SharedTxHandler<V = Ed25519Verifier> {
    inner: Arc<Mutex<TxHandler<V>>>,
}

impl<V> Clone for SharedTxHandler<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: SignatureVerifier> SharedTxHandler<V> {
    pub fn new(handler: TxHandler<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(handler)),
        }
    }

    pub fn process_round(&self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.inner.lock().process_round(candidates)
    }

    pub fn process_round_detailed(&self, candidates: &[Transaction]) -> RoundOutcome {
        self.inner.lock().process_round_detailed(candidates)
    }

    pub fn is_valid(&self, tx: &Transaction) -> bool {
        self.inner.lock().is_valid(tx)
    }

    /// Deep copy of the entry set between rounds.
    pub fn snapshot(&self) -> EntrySet {
        self.inner.lock().entries().clone()
    }
}
