//! Transaction validity against an entry set.
//!
//! Invalidity is an ordinary outcome here: every check yields a [`Rejection`]
//! value rather than an error that callers are expected to propagate.

use crate::crypto::SignatureVerifier;
use crate::ledger::EntrySet;
use crate::transaction::{OutPoint, Transaction, TxHash};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// Why a transaction is not acceptable against the current entry set
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Claimed output {0} is not in the entry set")]
    MissingOutput(OutPoint),
    #[error("Output {0} is claimed more than once")]
    DuplicateInput(OutPoint),
    #[error("Signature on input {input} does not verify")]
    BadSignature { input: usize },
    #[error("Output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: Decimal },
    #[error("Outputs {outputs} exceed inputs {inputs}")]
    InsufficientInput { inputs: Decimal, outputs: Decimal },
    #[error("Value sum overflow")]
    Overflow,
    #[error("Transaction {0} was already committed")]
    Replayed(TxHash),
}

/// Validates `tx` against `entries` and returns its fee.
///
/// Rules, in evaluation order per input then per output:
/// every claimed output exists, is claimed once, and is signed by its owner
/// over the unsigned form for that input position; every output is
/// non-negative; inputs cover outputs.
pub fn check<V: SignatureVerifier>(
    tx: &Transaction,
    entries: &EntrySet,
    verifier: &V,
) -> Result<Decimal, Rejection> {
    let mut claimed: HashSet<OutPoint> = HashSet::with_capacity(tx.inputs().len());
    let mut inputs = Decimal::ZERO;

    for (index, input) in tx.inputs().iter().enumerate() {
        let outpoint = input.outpoint();

        let spent = entries
            .get(&outpoint)
            .ok_or(Rejection::MissingOutput(outpoint))?;

        if !claimed.insert(outpoint) {
            return Err(Rejection::DuplicateInput(outpoint));
        }

        let message = tx
            .raw_data_to_sign(index)
            .ok_or(Rejection::BadSignature { input: index })?;

        if !verifier.verify(&spent.owner, &message, &input.signature) {
            return Err(Rejection::BadSignature { input: index });
        }

        inputs = inputs
            .checked_add(spent.value)
            .ok_or(Rejection::Overflow)?;
    }

    let mut outputs = Decimal::ZERO;

    for (index, output) in tx.outputs().iter().enumerate() {
        if output.value < Decimal::ZERO {
            return Err(Rejection::NegativeOutput {
                index,
                value: output.value,
            });
        }

        outputs = outputs
            .checked_add(output.value)
            .ok_or(Rejection::Overflow)?;
    }

    if inputs < outputs {
        return Err(Rejection::InsufficientInput { inputs, outputs });
    }

    Ok(inputs - outputs)
}

/// Sum of claimable input values minus sum of output values.
///
/// Inputs missing from `entries` contribute nothing, so the result is defined
/// (and may be negative) for invalid transactions. Sums saturate instead of
/// overflowing.
pub fn fee(tx: &Transaction, entries: &EntrySet) -> Decimal {
    let inputs = tx
        .inputs()
        .iter()
        .filter_map(|input| entries.get(&input.outpoint()))
        .fold(Decimal::ZERO, |sum, spent| sum.saturating_add(spent.value));

    let outputs = tx
        .outputs()
        .iter()
        .fold(Decimal::ZERO, |sum, output| sum.saturating_add(output.value));

    inputs.saturating_sub(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519Verifier, Keypair};
    use crate::transaction::{Output, Signature, TransactionBuilder, TxHash};

    fn funded(keypair: &Keypair, values: &[i64]) -> EntrySet {
        (0u32..)
            .zip(values)
            .map(|(index, value)| {
                (
                    OutPoint::new(TxHash::new([1u8; 32]), index),
                    Output::new(Decimal::from(*value), keypair.public_key()),
                )
            })
            .collect()
    }

    fn spend(keypair: &Keypair, claims: &[u32], outputs: &[i64]) -> Transaction {
        let mut builder = TransactionBuilder::new();
        for index in claims {
            builder.add_input(OutPoint::new(TxHash::new([1u8; 32]), *index));
        }
        for value in outputs {
            builder.add_output(Decimal::from(*value), keypair.public_key());
        }
        builder.sign_all_with(keypair).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_valid_returns_fee() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10, 5]);
        let tx = spend(&alice, &[0, 1], &[12]);

        assert_eq!(check(&tx, &entries, &Ed25519Verifier), Ok(Decimal::from(3)));
        assert_eq!(fee(&tx, &entries), Decimal::from(3));
    }

    #[test]
    fn test_missing_output() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let tx = spend(&alice, &[1], &[1]);

        assert!(matches!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::MissingOutput(_))
        ));
    }

    #[test]
    fn test_duplicate_input() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let tx = spend(&alice, &[0, 0], &[15]);

        assert!(matches!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::DuplicateInput(_))
        ));
    }

    #[test]
    fn test_signature_from_wrong_owner() {
        let alice = Keypair::for_account("alice");
        let mallory = Keypair::for_account("mallory");
        let entries = funded(&alice, &[10]);
        let tx = spend(&mallory, &[0], &[10]);

        assert_eq!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::BadSignature { input: 0 })
        );
    }

    #[test]
    fn test_signature_bound_to_input_position() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10, 10]);

        let mut builder = TransactionBuilder::new();
        builder.add_input(OutPoint::new(TxHash::new([1u8; 32]), 0));
        builder.add_input(OutPoint::new(TxHash::new([1u8; 32]), 1));
        builder.add_output(Decimal::from(20), alice.public_key());
        builder.sign_input_with(0, &alice).unwrap();

        // Reuse the first input's signature on the second input
        let reused: Signature = builder.clone().build().unwrap().inputs()[0]
            .signature
            .clone();
        builder.sign_input(1, |_| reused).unwrap();
        let tx = builder.build().unwrap();

        assert_eq!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::BadSignature { input: 1 })
        );
    }

    #[test]
    fn test_negative_output() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let tx = spend(&alice, &[0], &[11, -1]);

        assert_eq!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::NegativeOutput {
                index: 1,
                value: Decimal::from(-1)
            })
        );
    }

    #[test]
    fn test_outputs_exceed_inputs() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let tx = spend(&alice, &[0], &[6, 5]);

        assert!(matches!(
            check(&tx, &entries, &Ed25519Verifier),
            Err(Rejection::InsufficientInput { .. })
        ));
    }

    #[test]
    fn test_no_inputs_only_zero_outputs() {
        let alice = Keypair::for_account("alice");
        let entries = EntrySet::new();

        assert_eq!(
            check(&spend(&alice, &[], &[0]), &entries, &Ed25519Verifier),
            Ok(Decimal::ZERO)
        );
        assert!(check(&spend(&alice, &[], &[1]), &entries, &Ed25519Verifier).is_err());
    }

    #[test]
    fn test_input_sum_overflow() {
        let alice = Keypair::for_account("alice");
        let entries: EntrySet = (0u32..2)
            .map(|index| {
                (
                    OutPoint::new(TxHash::new([1u8; 32]), index),
                    Output::new(Decimal::MAX, alice.public_key()),
                )
            })
            .collect();
        let tx = spend(&alice, &[0, 1], &[1]);

        assert_eq!(check(&tx, &entries, &Ed25519Verifier), Err(Rejection::Overflow));
        assert_eq!(
            fee(&tx, &entries),
            "79228162514264337593543950334".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_fee_ignores_missing_inputs() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let tx = spend(&alice, &[0, 3], &[4]);

        assert_eq!(fee(&tx, &entries), Decimal::from(6));
        assert_eq!(fee(&tx, &EntrySet::new()), Decimal::from(-4));
    }

    #[test]
    fn test_check_does_not_mutate() {
        let alice = Keypair::for_account("alice");
        let entries = funded(&alice, &[10]);
        let before = entries.clone();
        let tx = spend(&alice, &[0], &[9]);

        let first = check(&tx, &entries, &Ed25519Verifier);
        let second = check(&tx, &entries, &Ed25519Verifier);

        assert_eq!(first, second);
        assert_eq!(entries, before);
    }
}
