//! Benchmarks for edit propagation
//!
//! Measures how the cost of an edit grows with what floats on the buffer:
//! - Plain inserts and removes
//! - Anchors and multi-range selections following edits
//! - Fold lines shifting under edits
//! - Undo and redo of recorded batches

use caret_core::{Document, EditSession, Position, Range, UndoManager};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::cell::RefCell;
use std::rc::Rc;

/// Generate a brace-structured source file with `blocks` functions
fn generate_source(blocks: usize) -> String {
    let mut text = String::new();
    for i in 0..blocks {
        text.push_str(&format!("fn block_{i}() {{\n"));
        text.push_str(&format!("    let value = {i};\n"));
        text.push_str("    value + 1\n");
        text.push_str("}\n");
    }
    text
}

/// Benchmark raw buffer edits
fn bench_document_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_edits");

    for blocks in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("insert_line", blocks), &blocks, |b, &blocks| {
            b.iter_batched(
                || Document::new(&generate_source(blocks)),
                |doc| black_box(doc.insert(Position::new(blocks, 4), "call();\n    ")),
                criterion::BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("remove_block", blocks), &blocks, |b, &blocks| {
            b.iter_batched(
                || Document::new(&generate_source(blocks)),
                |doc| black_box(doc.remove(Range::new(0, 0, 4, 0))),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark anchors and selections following edits
fn bench_anchor_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchor_tracking");

    for anchors in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("anchors", anchors), &anchors, |b, &anchors| {
            b.iter_batched(
                || {
                    let doc = Document::new(&generate_source(anchors));
                    let held: Vec<_> = (0..anchors)
                        .map(|row| doc.create_anchor(Position::new(row * 4 + 1, 4)))
                        .collect();
                    (doc, held)
                },
                |(doc, held)| {
                    doc.insert(Position::new(0, 0), "// header\n");
                    black_box(held)
                },
                criterion::BatchSize::SmallInput,
            );
        });

        group.bench_with_input(
            BenchmarkId::new("multi_select", anchors),
            &anchors,
            |b, &anchors| {
                b.iter_batched(
                    || {
                        let mut session = EditSession::new(Document::new(&generate_source(anchors)));
                        for row in 0..anchors {
                            let range = Range::new(row * 4 + 1, 8, row * 4 + 1, 13);
                            session.selection_mut().add_range(range, false).unwrap();
                        }
                        session
                    },
                    |mut session| {
                        session.insert(Position::new(0, 0), "// header\n");
                        black_box(session)
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark fold maintenance under edits
fn bench_fold_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold_updates");

    for blocks in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("fold_all", blocks), &blocks, |b, &blocks| {
            b.iter_batched(
                || EditSession::new(Document::new(&generate_source(blocks))),
                |session| black_box(session.fold_all()),
                criterion::BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("edit_above_folds", blocks), &blocks, |b, &blocks| {
            b.iter_batched(
                || {
                    let session = EditSession::new(Document::new(&generate_source(blocks)));
                    session.fold_all();
                    session
                },
                |mut session| {
                    session.insert(Position::new(0, 0), "// header\n");
                    black_box(session)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark undo and redo of recorded batches
fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    group.bench_function("undo_redo_typing", |b| {
        b.iter_batched(
            || {
                let mut session = EditSession::new(Document::new(&generate_source(50)));
                session.set_undo_manager(Some(Rc::new(RefCell::new(UndoManager::new()))));
                for column in 0..20 {
                    session.insert(Position::new(1, 4 + column), "x");
                    session.mark_undo_group();
                }
                session
            },
            |mut session| {
                for _ in 0..20 {
                    session.undo().unwrap();
                }
                for _ in 0..20 {
                    session.redo().unwrap();
                }
                black_box(session)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_document_edits,
    bench_anchor_tracking,
    bench_fold_updates,
    bench_history
);
criterion_main!(benches);
