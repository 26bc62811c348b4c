use crate::scenario::Scenario;
use rust_decimal::Decimal;
use serde::Serialize;
use tx_handler::{AcceptedTx, OutPoint, Output, PublicKey, TxHash};

/// Accepted transaction row
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRecord {
    pub round: u32,
    pub tx: String,
    pub hash: String,
    pub fee: Decimal,
}

impl AcceptedRecord {
    pub fn new(round: u32, accepted: &AcceptedTx, scenario: &Scenario) -> Self {
        Self {
            round,
            tx: label(accepted.tx.hash(), scenario),
            hash: accepted.tx.hash().to_string(),
            fee: accepted.fee,
        }
    }
}

/// Entry set row
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRecord {
    pub tx: String,
    pub hash: String,
    pub index: u32,
    pub account: String,
    pub amount: Decimal,
}

impl LedgerRecord {
    pub fn new(outpoint: &OutPoint, output: &Output, scenario: &Scenario) -> Self {
        Self {
            tx: label(&outpoint.tx_hash, scenario),
            hash: outpoint.tx_hash.to_string(),
            index: outpoint.output_index,
            account: account(&output.owner, scenario),
            amount: output.value,
        }
    }
}

fn label(hash: &TxHash, scenario: &Scenario) -> String {
    scenario.label(hash).unwrap_or_default().to_owned()
}

fn account(key: &PublicKey, scenario: &Scenario) -> String {
    scenario
        .account(key)
        .map_or_else(|| key.to_string(), str::to_owned)
}
