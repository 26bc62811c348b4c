use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::warn;
use tx_handler::{
    EntrySet, Keypair, OutPoint, PublicKey, Transaction, TransactionBuilder, TxHash,
};

/// Scenario row type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Genesis,
    Input,
    Output,
}

/// Scenario record from CSV
#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    pub kind: RowKind,
    #[serde(default)]
    pub round: Option<u32>,
    pub tx: String,
    #[serde(default)]
    pub ref_tx: Option<String>,
    #[serde(default)]
    pub ref_index: Option<u32>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Default)]
struct Draft {
    genesis: bool,
    round: Option<u32>,
    // (referenced label, output index, signing account)
    inputs: Vec<(String, u32, String)>,
    outputs: Vec<(Decimal, String)>,
}

/// Initial entry set plus candidate batches keyed by round number
#[derive(Debug, Default)]
pub struct Scenario {
    pub genesis: EntrySet,
    pub rounds: BTreeMap<u32, Vec<Transaction>>,
    labels: HashMap<TxHash, String>,
    accounts: HashMap<PublicKey, String>,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).context("Failed to open input file")?;

        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self::from_csv(reader)
    }

    /// Label the scenario gave to a transaction, if any
    pub fn label(&self, hash: &TxHash) -> Option<&str> {
        self.labels.get(hash).map(String::as_str)
    }

    /// Account name behind a public key, if the scenario introduced it
    pub fn account(&self, key: &PublicKey) -> Option<&str> {
        self.accounts.get(key).map(String::as_str)
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut order: Vec<String> = Vec::new();
        let mut drafts: HashMap<String, Draft> = HashMap::new();

        for result in reader.deserialize() {
            let row: Row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("Failed to parse scenario row: {e}");

                    continue;
                }
            };

            let draft = drafts.entry(row.tx.clone()).or_insert_with(|| {
                order.push(row.tx.clone());
                Draft::default()
            });

            if let Err(e) = apply_row(draft, row) {
                warn!("Skipping scenario row: {e}");
            }
        }

        let mut scenario = Self::default();
        let mut keys: HashMap<String, Keypair> = HashMap::new();
        let mut built: HashMap<String, TxHash> = HashMap::new();

        for label in order {
            let Some(draft) = drafts.remove(&label) else {
                continue;
            };

            let tx = scenario
                .build(&label, &draft, &built, &mut keys)
                .with_context(|| format!("Failed to build transaction {label}"))?;

            if let Some(other) = scenario.labels.get(tx.hash()) {
                bail!("Transaction {label} is identical to {other}");
            }

            built.insert(label.clone(), *tx.hash());
            scenario.labels.insert(*tx.hash(), label);

            if draft.genesis {
                scenario
                    .genesis
                    .extend(tx.produced().map(|(outpoint, output)| (outpoint, output.clone())));
            } else if let Some(round) = draft.round {
                scenario.rounds.entry(round).or_default().push(tx);
            }
        }

        Ok(scenario)
    }

    fn build(
        &mut self,
        label: &str,
        draft: &Draft,
        built: &HashMap<String, TxHash>,
        keys: &mut HashMap<String, Keypair>,
    ) -> Result<Transaction> {
        if !draft.genesis && draft.round.is_none() {
            bail!("Transaction {label} has no round");
        }

        let mut builder = TransactionBuilder::new();

        for (reference, index, _) in &draft.inputs {
            let hash = built
                .get(reference)
                .ok_or_else(|| anyhow!("Reference to {reference} before it is defined"))?;
            builder.add_input(OutPoint::new(*hash, *index));
        }

        for (amount, account) in &draft.outputs {
            let key = self.keypair(account, keys).public_key();
            builder.add_output(*amount, key);
        }

        for (position, (_, _, signer)) in draft.inputs.iter().enumerate() {
            let keypair = self.keypair(signer, keys).clone();
            builder.sign_input_with(position, &keypair)?;
        }

        Ok(builder.build()?)
    }

    fn keypair<'k>(&mut self, account: &str, keys: &'k mut HashMap<String, Keypair>) -> &'k Keypair {
        keys.entry(account.to_owned()).or_insert_with(|| {
            let keypair = Keypair::for_account(account);
            self.accounts.insert(keypair.public_key(), account.to_owned());
            keypair
        })
    }
}

fn apply_row(draft: &mut Draft, row: Row) -> Result<()> {
    let Row {
        kind,
        round,
        tx,
        ref_tx,
        ref_index,
        account,
        amount,
    } = row;

    let account = account.ok_or_else(|| anyhow!("Row for {tx} has no account"))?;

    match kind {
        RowKind::Genesis => {
            if draft.round.is_some() {
                bail!("{tx} is already a round candidate");
            }
            let amount = amount.ok_or_else(|| anyhow!("Genesis row for {tx} has no amount"))?;

            draft.genesis = true;
            draft.outputs.push((amount, account));
        }
        RowKind::Input | RowKind::Output => {
            if draft.genesis {
                bail!("{tx} is already a genesis transaction");
            }
            let round = round.ok_or_else(|| anyhow!("Row for {tx} has no round"))?;
            if draft.round.is_some_and(|existing| existing != round) {
                bail!("{tx} appears in more than one round");
            }
            draft.round = Some(round);

            if kind == RowKind::Input {
                let reference = ref_tx.ok_or_else(|| anyhow!("Input row for {tx} has no ref_tx"))?;
                let index =
                    ref_index.ok_or_else(|| anyhow!("Input row for {tx} has no ref_index"))?;
                draft.inputs.push((reference, index, account));
            } else {
                let amount = amount.ok_or_else(|| anyhow!("Output row for {tx} has no amount"))?;
                draft.outputs.push((amount, account));
            }
        }
    }

    Ok(())
}
