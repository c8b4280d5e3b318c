use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use spendcat_core::{Label, Matrix, TextMatrix};
use spendcat_models::encoder::{TokenDictionary, encode_rows, tokenize_rows};
use spendcat_models::naive_bayes::NaiveBayes;
use std::hint::black_box;

const RECEIVERS: [&str; 8] = [
    "K-Market Kamppi",
    "Lidl Helsinki",
    "HSL Mobiili*Ticket",
    "VR Lahijunat",
    "Netflix.com",
    "Spotify AB",
    "Vuokra As Oy",
    "Palkka ACME Oy",
];

const CATEGORIES: [&str; 4] = ["groceries", "transport", "subscriptions", "housing"];

fn make_transactions(rows: usize) -> (TextMatrix, Matrix, Vec<Label>) {
    let text = TextMatrix::from_fn(rows, 2, |i, j| {
        if j == 0 {
            format!("{} {}", RECEIVERS[i % RECEIVERS.len()], i % 13)
        } else {
            format!("ref_{}", i % 97)
        }
    });
    let numeric = Matrix::from_fn(rows, 1, |i, _| {
        let sign = if i % 5 == 0 { 1.0 } else { -1.0 };
        sign * ((i * 37) % 400) as f64 * 0.75
    });
    let labels = (0..rows)
        .map(|i| CATEGORIES[(i % RECEIVERS.len()) / 2].to_string())
        .collect();
    (text, numeric, labels)
}

fn bench_encoder(c: &mut Criterion) {
    let (text, _, _) = make_transactions(4_096);
    let rows = tokenize_rows(&text);
    let dict = TokenDictionary::build(rows.iter().flatten());

    let mut group = c.benchmark_group("encoder");
    group.bench_function("tokenize_4096x2", |b| {
        b.iter(|| black_box(tokenize_rows(black_box(&text))))
    });
    group.bench_function("encode_rows_4096", |b| {
        b.iter(|| black_box(encode_rows(black_box(&rows), black_box(&dict))))
    });
    group.finish();
}

fn bench_naive_bayes(c: &mut Criterion) {
    let (text, numeric, labels) = make_transactions(4_096);

    let mut group = c.benchmark_group("naive_bayes");
    group.bench_function("fit_4096", |b| {
        b.iter_batched(
            NaiveBayes::new,
            |mut model| {
                model
                    .fit(black_box(&text), black_box(&numeric), black_box(&labels))
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    let mut fitted = NaiveBayes::new();
    fitted.fit(&text, &numeric, &labels).unwrap();
    group.bench_function("predict_4096", |b| {
        b.iter(|| {
            let preds = fitted.predict(black_box(&text), black_box(&numeric)).unwrap();
            black_box(preds);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encoder, bench_naive_bayes);
criterion_main!(benches);
