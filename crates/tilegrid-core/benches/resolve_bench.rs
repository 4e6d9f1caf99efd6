//! Benchmark: pointer-to-cell resolution and drag splices.
//!
//! Run with: `cargo bench -p tilegrid-core --bench resolve_bench`
//!
//! Both run once per pointer-move event, so they must stay well under a
//! frame budget even for large grids.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tilegrid_core::{GridLayout, OrderMaintainer, OrderedSequence, Pointer, resolve_index};

fn bench_resolve(c: &mut Criterion) {
    let layout = GridLayout::new(964.0, 3_440.0, 300.0, 200.0, 49).unwrap();
    let pointers: Vec<Pointer> = (0..256)
        .map(|i| Pointer::new(f64::from(i * 37 % 964), f64::from(i * 131 % 3_440)))
        .collect();

    c.bench_function("resolve_index/49_items", |b| {
        b.iter(|| {
            let mut acc = 0isize;
            for p in &pointers {
                acc = acc.wrapping_add(resolve_index(black_box(&layout), *p));
            }
            acc
        });
    });
}

fn bench_move(c: &mut Criterion) {
    let order = OrderedSequence::from_ids((0..500).map(|i| format!("m{i}"))).unwrap();

    c.bench_function("move_drag/500_items_sweep", |b| {
        b.iter(|| {
            let mut m = OrderMaintainer::new(order.clone());
            m.start_drag(0).unwrap();
            for t in 0..500 {
                m.move_drag(black_box(t));
            }
            m.end_drag()
        });
    });
}

criterion_group!(benches, bench_resolve, bench_move);
criterion_main!(benches);
