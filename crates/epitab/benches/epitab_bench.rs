use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use epitab::{build_graph, build_tableau, canonicalize, parse_formula, Formula, Params};

const SMALL: &str = "k1(p v q) ^ ~k1p";
const MEDIUM: &str = "G(p -> F q) ^ k1(G p) ^ ~k2(q U r) ^ (p W ~q)";
const LARGE: &str = "G(p0 -> N(p1 v p2)) ^ G(p1 -> F p3) ^ k1(p0 v k1 q) ^ ~k1 G p2 ^ \
    k2(F p3 -> G ~q) ^ (p0 U (p3 ^ k2 q)) ^ ~(r W s) ^ F(p2 ^ ~k1 r)";

fn canon(f: &str) -> Vec<Formula> {
    vec![canonicalize(&parse_formula(f).unwrap())]
}

pub fn parser(c: &mut Criterion) {
    let mut g = c.benchmark_group("Parser");
    for (name, f) in [("small", SMALL), ("medium", MEDIUM), ("large", LARGE)] {
        g.bench_with_input(BenchmarkId::new("Parser", name), &f, |b, &f| {
            b.iter(|| black_box(parse_formula(f).unwrap()))
        });
        g.bench_with_input(BenchmarkId::new("Canonicalize", name), &f, |b, &f| {
            let n = parse_formula(f).unwrap();
            b.iter(|| black_box(canonicalize(&n)))
        });
    }
    g.finish();
}

pub fn tableau(c: &mut Criterion) {
    let mut g = c.benchmark_group("Tableau");
    for params in [Params::knowledge(), Params::belief()] {
        for (name, f) in [("small", SMALL), ("medium", MEDIUM), ("large", LARGE)] {
            let id = format!("{}/{name}", params.mode);
            let fs = canon(f);
            g.bench_with_input(BenchmarkId::new("Tableau", &id), &fs, |b, fs| {
                b.iter(|| black_box(build_tableau(fs, &params)))
            });
        }
    }
    g.finish();
}

pub fn graph(c: &mut Criterion) {
    let mut g = c.benchmark_group("Graph");
    g.sample_size(10);
    for params in [Params::knowledge(), Params::belief()] {
        for (name, f) in [("small", SMALL), ("medium", MEDIUM)] {
            let id = format!("{}/{name}", params.mode);
            let fs = canon(f);
            g.bench_with_input(BenchmarkId::new("Graph", &id), &fs, |b, fs| {
                b.iter(|| {
                    let res = build_tableau(fs, &params).and_then(|br| build_graph(&br, &params));
                    black_box(res)
                })
            });
        }
    }
    g.finish();
}

criterion_group!(benches, parser, tableau, graph);
criterion_main!(benches);
