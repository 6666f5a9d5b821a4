use actrie::Trie;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Generate a realistic word list from prefix/root/suffix combinations.
fn generate_terms(size: usize) -> Vec<String> {
    let prefixes = [
        "pre", "un", "re", "in", "dis", "en", "non", "over", "mis", "sub",
    ];
    let roots = [
        "test", "code", "data", "work", "play", "read", "write", "run", "walk", "talk",
    ];
    let suffixes = [
        "ing", "ed", "er", "est", "ly", "ness", "ment", "tion", "able", "ful",
    ];

    let mut terms = Vec::with_capacity(size);
    for i in 0..size {
        let prefix = prefixes[i % prefixes.len()];
        let root = roots[(i / prefixes.len()) % roots.len()];
        let suffix = suffixes[(i / (prefixes.len() * roots.len())) % suffixes.len()];
        terms.push(format!("{}{}{}", prefix, root, suffix));
    }
    terms.sort();
    terms.dedup();
    terms
}

fn build_trie(terms: &[String], ordered: bool) -> Trie<'static> {
    let mut trie = Trie::builder().ordered(ordered).build();
    for term in terms {
        trie.insert(term);
    }
    trie
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_insert");
    for size in [100, 1000, 5000].iter() {
        let terms = generate_terms(*size);
        group.throughput(Throughput::Elements(terms.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &terms, |b, terms| {
            b.iter(|| {
                let mut trie = Trie::new();
                for term in terms {
                    trie.insert(black_box(term));
                }
                black_box(trie.len())
            })
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_lookup");
    for size in [100, 1000, 5000].iter() {
        let terms = generate_terms(*size);
        let queries: Vec<&str> = terms.iter().take(100).map(|s| s.as_str()).collect();

        for (label, ordered) in [("unordered", false), ("ordered", true)] {
            let trie = build_trie(&terms, ordered);
            group.throughput(Throughput::Elements(queries.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(label, size),
                &queries,
                |b, queries| {
                    b.iter(|| {
                        for query in queries {
                            black_box(trie.lookup(black_box(query)));
                        }
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_match_longest(c: &mut Criterion) {
    let terms = generate_terms(1000);
    let trie = build_trie(&terms, false);
    let text = terms
        .iter()
        .take(200)
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut group = c.benchmark_group("trie_match_longest");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("1000_terms", |b| {
        b.iter(|| black_box(trie.match_longest(black_box(&text), None).count()))
    });
    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let terms = generate_terms(1000);
    let trie = build_trie(&terms, false);
    let mut buf = vec![0u8; trie.buff_size()];
    trie.to_buff(&mut buf).expect("serialize");

    let mut group = c.benchmark_group("trie_serialization");
    group.throughput(Throughput::Bytes(buf.len() as u64));
    group.bench_function("to_buff", |b| {
        b.iter(|| trie.to_buff(black_box(&mut buf)).expect("serialize"))
    });
    group.bench_function("from_buff_copy", |b| {
        b.iter(|| black_box(Trie::from_buff(black_box(&buf), true).expect("decode")))
    });
    group.bench_function("from_buff_view", |b| {
        b.iter(|| black_box(Trie::from_buff(black_box(&buf), false).expect("decode")))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup,
    bench_match_longest,
    bench_serialization
);
criterion_main!(benches);
