use awara::{lexer, token::TokenKind};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/big.awara");

fn lexer_incremental(input: &str) {
    let mut i = 0;
    for token in lexer::Lexer::new(input) {
        if matches!(token.kind, TokenKind::Error(_)) {
            continue;
        }
        i += 1;
    }
    black_box(i);
}

fn lexer_eager(input: &str) {
    let tokens = lexer::lex_in_new(input);
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("incremental", |b| {
        b.iter(|| lexer_incremental(black_box(INPUT)));
    });
    c.bench_function("eager", |b| b.iter(|| lexer_eager(black_box(INPUT))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
