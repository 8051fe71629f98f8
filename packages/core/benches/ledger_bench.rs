use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion};
use newton_core::field::FieldValue;
use newton_core::ledger::Ledger;
use newton_core::{Blueprint, BlueprintBuilder, ForgeAction};

fn counter_blueprint(ledger: Arc<Ledger>) -> Blueprint {
    BlueprintBuilder::new("Counter")
        .field("count", FieldValue::Integer(0))
        .unwrap()
        .forge("bump", |fields| {
            let next = match fields.read("count") {
                Some(FieldValue::Integer(n)) => n + 1,
                _ => 1,
            };
            fields.write("count", FieldValue::Integer(next));
            vec![ForgeAction::Commit]
        })
        .unwrap()
        .build(ledger)
}

/// Exercises `Ledger::append` the way a real caller reaches it: via
/// `Blueprint::forge`, which records exactly one entry per call. The
/// append path itself is `pub(crate)`: the ledger is a collaborator
/// blueprints append to, not a type callers append to directly (see
/// the "append (internal)" line of the crate's external interface
/// list).
fn ledger_append_benchmark(c: &mut Criterion) {
    c.bench_function("forge -> ledger append, single thread", |b| {
        let ledger = Arc::new(Ledger::new());
        let mut blueprint = counter_blueprint(ledger);
        b.iter(|| blueprint.forge("bump"))
    });

    c.bench_function("forge -> ledger append, 4 concurrent blueprints", |b| {
        b.iter(|| {
            let ledger = Arc::new(Ledger::new());
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let mut blueprint = counter_blueprint(ledger.clone());
                    thread::spawn(move || {
                        for _ in 0..100 {
                            blueprint.forge("bump");
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        })
    });
}

criterion_group!(benches, ledger_append_benchmark);
criterion_main!(benches);
