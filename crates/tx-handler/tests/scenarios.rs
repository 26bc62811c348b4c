use rust_decimal::Decimal;
use tx_handler::{
    process_rounds, EntrySet, Keypair, OutPoint, Output, Transaction, TransactionBuilder, TxHandler,
    TxHash,
};

fn utxo(index: u32) -> OutPoint {
    OutPoint::new(TxHash::new([0xAB; 32]), index)
}

fn single_entry(value: i64, owner: &Keypair) -> EntrySet {
    [(utxo(1), Output::new(Decimal::from(value), owner.public_key()))]
        .into_iter()
        .collect()
}

fn transfer(signer: &Keypair, claim: OutPoint, value: i64, to: &Keypair) -> Transaction {
    let mut builder = TransactionBuilder::new();
    builder.add_input(claim);
    builder.add_output(Decimal::from(value), to.public_key());
    builder.sign_all_with(signer).unwrap();
    builder.build().unwrap()
}

#[test]
fn test_single_valid_transfer_replaces_entry() {
    let a = Keypair::for_account("A");
    let b = Keypair::for_account("B");
    let mut handler = TxHandler::new(&single_entry(10, &a));

    let tx1 = transfer(&a, utxo(1), 10, &b);
    let accepted = handler.process_round(&[tx1.clone()]);

    assert_eq!(accepted, vec![tx1.clone()]);

    let expected: EntrySet = [(
        OutPoint::new(*tx1.hash(), 0),
        Output::new(Decimal::from(10), b.public_key()),
    )]
    .into_iter()
    .collect();
    assert_eq!(handler.entries(), &expected);
}

#[test]
fn test_double_spend_keeps_higher_fee() {
    let a = Keypair::for_account("A");
    let b = Keypair::for_account("B");
    let mut handler = TxHandler::new(&single_entry(10, &a));

    let tx1 = transfer(&a, utxo(1), 8, &b);
    let tx2 = transfer(&a, utxo(1), 5, &b);

    let accepted = handler.process_round(&[tx1.clone(), tx2.clone()]);

    assert_eq!(accepted, vec![tx2.clone()]);
    assert_eq!(handler.entries().len(), 1);
    assert!(handler.entries().contains(&OutPoint::new(*tx2.hash(), 0)));
    assert!(!handler.entries().contains(&OutPoint::new(*tx1.hash(), 0)));
}

#[test]
fn test_unknown_reference_is_excluded() {
    let a = Keypair::for_account("A");
    let b = Keypair::for_account("B");
    let snapshot = single_entry(10, &a);
    let mut handler = TxHandler::new(&snapshot);

    let tx = transfer(&a, utxo(2), 5, &b);

    assert!(!handler.is_valid(&tx));
    assert!(handler.process_round(&[tx]).is_empty());
    assert_eq!(handler.entries(), &snapshot);
}

#[test]
fn test_negative_output_is_excluded() {
    let a = Keypair::for_account("A");
    let b = Keypair::for_account("B");
    let snapshot = single_entry(10, &a);
    let mut handler = TxHandler::new(&snapshot);

    let mut builder = TransactionBuilder::new();
    builder.add_input(utxo(1));
    builder.add_output(Decimal::from(-1), b.public_key());
    builder.add_output(Decimal::from(5), b.public_key());
    builder.sign_all_with(&a).unwrap();
    let tx = builder.build().unwrap();

    assert!(!handler.is_valid(&tx));
    assert!(handler.process_round(&[tx]).is_empty());
    assert_eq!(handler.entries(), &snapshot);
}

#[test]
fn test_empty_batch_changes_nothing() {
    let a = Keypair::for_account("A");
    let snapshot = single_entry(10, &a);
    let mut handler = TxHandler::new(&snapshot);

    assert!(handler.process_round(&[]).is_empty());
    assert_eq!(handler.entries(), &snapshot);
}

#[test]
fn test_chain_across_rounds() {
    let a = Keypair::for_account("A");
    let b = Keypair::for_account("B");
    let c = Keypair::for_account("C");
    let snapshot = single_entry(10, &a);

    let first = transfer(&a, utxo(1), 9, &b);
    let second = transfer(&b, OutPoint::new(*first.hash(), 0), 7, &c);

    let (accepted, entries) =
        process_rounds(&snapshot, vec![vec![first.clone()], vec![second.clone()]]);

    assert_eq!(accepted, vec![vec![first], vec![second.clone()]]);
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.get(&OutPoint::new(*second.hash(), 0)),
        Some(&Output::new(Decimal::from(7), c.public_key()))
    );
}
