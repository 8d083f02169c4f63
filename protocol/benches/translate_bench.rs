// Translation benchmarks.
//
// Measures building a complete sign request from a decoded transaction
// as the number of inputs grows. Address ownership is answered from an
// in-memory address book.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeSet;

use ticketsign_protocol::codec::address::encode_unchecked;
use ticketsign_protocol::codec::Hash;
use ticketsign_protocol::config::NetworkParams;
use ticketsign_protocol::transaction::{
    index_by_hash, DecodedTransaction, InputTransactions, TxInput, TxOutput,
};
use ticketsign_protocol::translate::build_sign_request;
use ticketsign_protocol::wallet::AddressBook;

fn p2pkh(index: u32, value: u64, address: &str) -> TxOutput {
    TxOutput {
        value,
        addresses: vec![address.to_string()],
        script_version: 0,
        index,
        script: vec![0x76, 0xa9, 0x14],
    }
}

/// A transaction spending `n` owned outputs of one source, paying one
/// foreign address plus change.
fn setup(n: u32, params: &NetworkParams) -> (DecodedTransaction, InputTransactions, AddressBook) {
    let mut book = AddressBook::new();
    let source_hash = Hash::from([0x11; 32]);

    let mut source_outputs = Vec::new();
    let mut inputs = Vec::new();
    for i in 0..n {
        let address = encode_unchecked(params.pubkey_hash_addr_id, &[i as u8; 20]);
        book.insert_owned(address.clone(), 0, false, i);
        source_outputs.push(p2pkh(i, 100_000_000, &address));
        inputs.push(TxInput {
            prev_hash: source_hash,
            prev_index: i,
            amount_in: 100_000_000,
            sequence: u32::MAX,
            tree: None,
            signature_script: vec![],
        });
    }

    let foreign = encode_unchecked(params.pubkey_hash_addr_id, &[0xfe; 20]);
    let change = encode_unchecked(params.pubkey_hash_addr_id, &[0xfd; 20]);
    book.insert_foreign(foreign.clone(), false);
    book.insert_owned(change.clone(), 0, true, 0);

    let source = DecodedTransaction {
        hash: source_hash,
        version: 1,
        lock_time: 0,
        expiry: 0,
        inputs: vec![],
        outputs: source_outputs,
    };
    let tx = DecodedTransaction {
        hash: Hash::from([0x22; 32]),
        version: 1,
        lock_time: 0,
        expiry: 0,
        inputs,
        outputs: vec![
            p2pkh(0, u64::from(n) * 50_000_000, &foreign),
            p2pkh(1, u64::from(n) * 49_000_000, &change),
        ],
    };
    (tx, index_by_hash(vec![source]), book)
}

fn bench_build_sign_request(c: &mut Criterion) {
    let params = NetworkParams::mainnet();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let change: BTreeSet<u32> = [1].into_iter().collect();

    let mut group = c.benchmark_group("translate/build_sign_request");
    for n in [1u32, 10, 100] {
        let (tx, input_txs, book) = setup(n, &params);
        group.throughput(Throughput::Elements(u64::from(n)));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                rt.block_on(build_sign_request(&tx, &input_txs, &change, &book, &params))
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_sign_request);
criterion_main!(benches);
