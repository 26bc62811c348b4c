use crate::crypto::Keypair;
use crate::error::TxError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity hash of a transaction (SHA-256 over its raw form)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Owner identity of an output. The bytes are opaque to the handler and only
/// interpreted by the signature verifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Signature bytes attached to an input
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reference to a previously produced output: (producing transaction, output index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_hash: TxHash,
    pub output_index: u32,
}

impl OutPoint {
    pub const fn new(tx_hash: TxHash, output_index: u32) -> Self {
        Self {
            tx_hash,
            output_index,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.output_index)
    }
}

/// Claim on an output of an earlier transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub prev_tx_hash: TxHash,
    pub output_index: u32,
    pub signature: Signature,
}

impl Input {
    pub const fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.prev_tx_hash, self.output_index)
    }
}

/// Value paid to an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: Decimal,
    pub owner: PublicKey,
}

impl Output {
    pub const fn new(value: Decimal, owner: PublicKey) -> Self {
        Self { value, owner }
    }
}

/// Immutable transaction. Built through [`TransactionBuilder`], which fixes the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    hash: TxHash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Transaction {
    pub const fn hash(&self) -> &TxHash {
        &self.hash
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Outpoints this transaction will create once committed.
    pub fn produced(&self) -> impl Iterator<Item = (OutPoint, &Output)> + '_ {
        // `build` guarantees every index fits in u32
        (0u32..)
            .zip(&self.outputs)
            .map(move |(index, output)| (OutPoint::new(self.hash, index), output))
    }

    /// Canonical unsigned bytes that the signature of input `index` covers.
    /// Returns `None` when the index is out of range.
    pub fn raw_data_to_sign(&self, index: usize) -> Option<Vec<u8>> {
        self.inputs
            .get(index)
            .map(|input| signing_bytes(input, &self.outputs))
    }

    /// Full canonical encoding including signatures; the hash preimage.
    pub fn raw_tx(&self) -> Vec<u8> {
        raw_bytes(&self.inputs, &self.outputs)
    }
}

/// Assembles inputs and outputs, signs inputs, and seals the result into a [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unsigned claim on `outpoint` and returns the input position.
    pub fn add_input(&mut self, outpoint: OutPoint) -> usize {
        self.inputs.push(Input {
            prev_tx_hash: outpoint.tx_hash,
            output_index: outpoint.output_index,
            signature: Signature::default(),
        });

        self.inputs.len() - 1
    }

    pub fn add_output(&mut self, value: Decimal, owner: PublicKey) -> usize {
        self.outputs.push(Output::new(value, owner));

        self.outputs.len() - 1
    }

    /// Signs input `index` over the current outputs. Outputs added afterwards
    /// invalidate the signature.
    pub fn sign_input<F>(&mut self, index: usize, sign: F) -> Result<(), TxError>
    where
        F: FnOnce(&[u8]) -> Signature,
    {
        let input = self
            .inputs
            .get(index)
            .ok_or(TxError::InputOutOfRange {
                index,
                inputs: self.inputs.len(),
            })?;

        let signature = sign(&signing_bytes(input, &self.outputs));
        self.inputs[index].signature = signature;

        Ok(())
    }

    pub fn sign_input_with(&mut self, index: usize, keypair: &Keypair) -> Result<(), TxError> {
        self.sign_input(index, |message| keypair.sign(message))
    }

    /// Signs every input with the same key.
    pub fn sign_all_with(&mut self, keypair: &Keypair) -> Result<(), TxError> {
        (0..self.inputs.len()).try_for_each(|index| self.sign_input_with(index, keypair))
    }

    pub fn build(self) -> Result<Transaction, TxError> {
        if u32::try_from(self.outputs.len()).is_err() {
            return Err(TxError::TooManyOutputs(self.outputs.len()));
        }

        let hash = TxHash::new(Sha256::digest(raw_bytes(&self.inputs, &self.outputs)).into());

        Ok(Transaction {
            hash,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }
}

fn signing_bytes(input: &Input, outputs: &[Output]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(36 + outputs.len() * 48);
    bytes.extend_from_slice(input.prev_tx_hash.as_bytes());
    bytes.extend_from_slice(&input.output_index.to_le_bytes());
    encode_outputs(&mut bytes, outputs);

    bytes
}

fn raw_bytes(inputs: &[Input], outputs: &[Output]) -> Vec<u8> {
    let mut bytes = Vec::new();

    for input in inputs {
        bytes.extend_from_slice(input.prev_tx_hash.as_bytes());
        bytes.extend_from_slice(&input.output_index.to_le_bytes());
        // Signature lengths are bounded far below u32::MAX by any real scheme
        let len = u32::try_from(input.signature.as_bytes().len()).unwrap_or(u32::MAX);
        bytes.extend_from_slice(&len.to_le_bytes());
        bytes.extend_from_slice(input.signature.as_bytes());
    }

    encode_outputs(&mut bytes, outputs);

    bytes
}

fn encode_outputs(bytes: &mut Vec<u8>, outputs: &[Output]) {
    for output in outputs {
        // Normalized so that 1.0 and 1.00 encode identically
        bytes.extend_from_slice(&output.value.normalize().serialize());
        bytes.extend_from_slice(output.owner.as_bytes());
    }
}
