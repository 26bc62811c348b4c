use crate::crypto::{Ed25519Verifier, SignatureVerifier};
use crate::ledger::EntrySet;
use crate::selection::{self, Candidate, SelectionPolicy};
use crate::transaction::{Transaction, TxHash};
use crate::validation::{self, Rejection};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info};

/// A committed transaction together with the fee it paid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTx {
    pub tx: Transaction,
    pub fee: Decimal,
}

/// Result of one round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Committed transactions in acceptance order
    pub accepted: Vec<AcceptedTx>,
    /// Candidates dropped as invalid, duplicated, or conflicting
    pub rejected: usize,
}

impl RoundOutcome {
    pub fn total_fees(&self) -> Decimal {
        self.accepted
            .iter()
            .fold(Decimal::ZERO, |sum, accepted| sum.saturating_add(accepted.fee))
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.accepted.into_iter().map(|accepted| accepted.tx).collect()
    }
}

/// Owns the entry set and accepts batches of candidate transactions round by round
#[derive(Debug, Clone)]
pub struct TxHandler<V = Ed25519Verifier> {
    entries: EntrySet,
    // Hashes behind the snapshot plus everything committed since
    committed: HashSet<TxHash>,
    verifier: V,
    policy: SelectionPolicy,
}

impl TxHandler {
    /// Starts from a private copy of `snapshot`, verifying with Ed25519.
    pub fn new(snapshot: &EntrySet) -> Self {
        Self::with_verifier(snapshot, Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_verifier(snapshot: &EntrySet, verifier: V) -> Self {
        Self {
            entries: snapshot.clone(),
            committed: snapshot.outpoints().map(|outpoint| outpoint.tx_hash).collect(),
            verifier,
            policy: SelectionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub const fn entries(&self) -> &EntrySet {
        &self.entries
    }

    pub fn into_entries(self) -> EntrySet {
        self.entries
    }

    /// Validates `tx` against the current entry set, returning its fee.
    ///
    /// A transaction whose hash is already part of the history is refused
    /// before the validity rules run. Without this an input-less transaction
    /// could be committed again and bring back outputs that were spent.
    pub fn check(&self, tx: &Transaction) -> Result<Decimal, Rejection> {
        if self.committed.contains(tx.hash()) {
            return Err(Rejection::Replayed(*tx.hash()));
        }

        validation::check(tx, &self.entries, &self.verifier)
    }

    pub fn is_valid(&self, tx: &Transaction) -> bool {
        self.check(tx).is_ok()
    }

    /// Fee of `tx` against the current entry set. Defined for invalid
    /// transactions too; see [`validation::fee`].
    pub fn fee(&self, tx: &Transaction) -> Decimal {
        validation::fee(tx, &self.entries)
    }

    /// Processes one batch and returns the accepted transactions in acceptance order.
    pub fn process_round(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.process_round_detailed(candidates).into_transactions()
    }

    /// Processes one batch, committing every accepted transaction to the entry set.
    ///
    /// Candidates are validated against the entry set as it stood when the
    /// round began, ranked by fee descending then hash ascending, and each
    /// pick is re-validated against the entry set as mutated by earlier picks
    /// before being committed.
    pub fn process_round_detailed(&mut self, candidates: &[Transaction]) -> RoundOutcome {
        if candidates.is_empty() {
            return RoundOutcome::default();
        }

        let mut outcome = RoundOutcome::default();
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut ranked: Vec<Candidate<'_>> = Vec::with_capacity(candidates.len());

        for tx in candidates {
            if !seen.insert(*tx.hash()) {
                debug!(hash = %tx.hash(), "Skipping duplicate candidate");
                outcome.rejected += 1;

                continue;
            }

            match self.check(tx) {
                Ok(fee) => ranked.push(Candidate { tx, fee }),
                Err(reason) => {
                    debug!(hash = %tx.hash(), %reason, "Rejected candidate");
                    outcome.rejected += 1;
                }
            }
        }

        ranked.sort_by(Candidate::rank);

        let picks: Vec<Candidate<'_>> = match self.policy {
            SelectionPolicy::Greedy => ranked,
            SelectionPolicy::Exact { max_component } => {
                let chosen = selection::select_exact(&ranked, max_component);
                outcome.rejected += ranked.len() - chosen.len();

                chosen.into_iter().map(|position| ranked[position]).collect()
            }
        };

        for candidate in picks {
            match self.check(candidate.tx) {
                Ok(fee) => {
                    self.commit(candidate.tx);
                    outcome.accepted.push(AcceptedTx {
                        tx: candidate.tx.clone(),
                        fee,
                    });
                }
                Err(reason) => {
                    debug!(
                        hash = %candidate.tx.hash(),
                        %reason,
                        "Candidate conflicts with an earlier acceptance"
                    );
                    outcome.rejected += 1;
                }
            }
        }

        info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected,
            fees = %outcome.total_fees(),
            remaining = self.entries.len(),
            "Round processed"
        );

        outcome
    }

    fn commit(&mut self, tx: &Transaction) {
        self.committed.insert(*tx.hash());

        for input in tx.inputs() {
            self.entries.remove(&input.outpoint());
        }

        for (outpoint, output) in tx.produced() {
            self.entries.insert(outpoint, output.clone());
        }
    }
}
