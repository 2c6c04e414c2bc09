use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pluvia::core::rng::Rng;
use pluvia::tree::{AXIOM, Grammar, TreeBuilder, TreeParams, interpret};

fn bench_grammar_expand(c: &mut Criterion) {
    let grammar = Grammar::default();
    let mut group = c.benchmark_group("grammar_expand");
    for iterations in [3u32, 4, 5] {
        group.bench_function(format!("{iterations}_iterations"), |b| {
            b.iter(|| {
                let mut rng = Rng::new(42);
                grammar
                    .expand(black_box(AXIOM), iterations, &mut rng)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_turtle_interpret(c: &mut Criterion) {
    let grammar = Grammar::default();
    let mut rng = Rng::new(42);
    let symbols = grammar.expand(AXIOM, 4, &mut rng).unwrap();
    let params = TreeParams::default();

    c.bench_function("turtle_interpret", |b| {
        b.iter(|| {
            let mut rng = Rng::new(7);
            interpret(black_box(&symbols), &params, &mut rng).unwrap()
        })
    });
}

fn bench_full_build(c: &mut Criterion) {
    let builder = TreeBuilder::default();
    let params = TreeParams::default();

    c.bench_function("tree_build", |b| {
        b.iter(|| {
            let mut rng = Rng::new(1234);
            builder.build(black_box(&params), &mut rng).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_grammar_expand,
    bench_turtle_interpret,
    bench_full_build
);
criterion_main!(benches);
