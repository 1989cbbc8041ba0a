use content_model_core::{
    delete::{backward_delete_collapsed_selection, delete_selection},
    dom::NodeId,
    model::{
        Block, CachedElementKind, ContentModelDocument, Paragraph, Segment, SelectionMarker, Table,
        TableCell, TableRow, Text, clone_model, normalize_content_model,
    },
    selection::{IterateSelectionsOption, collect_selections, get_selected_segments},
    snapshots::{Snapshot, SnapshotsManager},
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for model operations
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Selection lookup on large models
/// - Range and single character deletion
/// - Normalization
/// - Model cloning for the clipboard
/// - Undo snapshot bookkeeping
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 12] = [
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
];

fn text_segment(value: String, selected: bool) -> Segment {
    Segment::Text(Text {
        text: value,
        is_selected: selected,
        ..Default::default()
    })
}

fn marker() -> Segment {
    Segment::SelectionMarker(SelectionMarker {
        is_selected: true,
        ..Default::default()
    })
}

fn sentence(index: usize, words: usize) -> String {
    (0..words)
        .map(|j| SAMPLE_WORDS[(index + j) % SAMPLE_WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Create a test document with the specified number of paragraphs, every tenth
/// one a small table. Paragraphs in `selected` are fully selected.
fn create_test_document(
    num_paragraphs: usize,
    selected: std::ops::Range<usize>,
) -> ContentModelDocument {
    let mut blocks = Vec::with_capacity(num_paragraphs);
    for i in 0..num_paragraphs {
        if i % 10 == 9 {
            blocks.push(Block::Table(Table {
                rows: (0..3)
                    .map(|row| TableRow {
                        cells: (0..3)
                            .map(|col| TableCell {
                                blocks: vec![Block::Paragraph(
                                    Paragraph::default()
                                        .with_segments(vec![text_segment(sentence(row + col, 3), false)]),
                                )],
                                ..Default::default()
                            })
                            .collect(),
                        ..Default::default()
                    })
                    .collect(),
                widths: vec![100.0; 3],
                ..Default::default()
            }));
            continue;
        }
        let segments = vec![
            text_segment(sentence(i, 8), selected.contains(&i)),
            text_segment(sentence(i + 1, 4), selected.contains(&i)),
        ];
        blocks.push(Block::Paragraph(Paragraph::default().with_segments(segments)));
    }
    ContentModelDocument::new().with_blocks(blocks)
}

fn create_caret_document(num_paragraphs: usize) -> ContentModelDocument {
    let mut document = create_test_document(num_paragraphs, 0..0);
    let middle = num_paragraphs / 2;
    let middle = if middle % 10 == 9 { middle - 1 } else { middle };
    if let Some(Block::Paragraph(paragraph)) = document.blocks.get_mut(middle) {
        paragraph.segments.push(marker());
    }
    document
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        // One key press should stay within a frame
        if self.avg_duration.as_millis() > 16 {
            println!("\nWARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = durations.iter().min().copied().unwrap_or_default();
    let max_duration = durations.iter().max().copied().unwrap_or_default();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sizes() -> [(&'static str, usize); 3] {
    [
        ("small", SMALL_DOC_PARAGRAPHS),
        ("medium", MEDIUM_DOC_PARAGRAPHS),
        ("large", LARGE_DOC_PARAGRAPHS),
    ]
}

#[test]
fn bench_selection_lookup() {
    for (label, paragraphs) in sizes() {
        let document = create_test_document(paragraphs, paragraphs / 3..paragraphs / 2);
        let result = benchmark(&format!("collect selections ({label})"), ITERATIONS, || {
            let records = collect_selections(&document, IterateSelectionsOption::default());
            assert!(!records.is_empty() || paragraphs < 3);
        });
        result.print();

        let result = benchmark(&format!("selected segments ({label})"), ITERATIONS, || {
            let segments = get_selected_segments(&document);
            std::hint::black_box(segments.len());
        });
        result.print();
    }
}

#[test]
fn bench_range_delete() {
    for (label, paragraphs) in sizes() {
        let template = create_test_document(paragraphs, paragraphs / 4..paragraphs * 3 / 4);
        let result = benchmark(&format!("delete range ({label})"), ITERATIONS, || {
            let mut document = template.clone();
            delete_selection(&mut document, &[], None);
            normalize_content_model(&mut document);
        });
        result.print();
    }
}

#[test]
fn bench_backspace() {
    for (label, paragraphs) in sizes() {
        let template = create_caret_document(paragraphs);
        let result = benchmark(&format!("backspace ({label})"), ITERATIONS, || {
            let mut document = template.clone();
            delete_selection(&mut document, &[backward_delete_collapsed_selection], None);
            normalize_content_model(&mut document);
        });
        result.print();
    }
}

#[test]
fn bench_clone_for_clipboard() {
    let document = create_test_document(LARGE_DOC_PARAGRAPHS, 0..LARGE_DOC_PARAGRAPHS);
    let mut next = 1_000u64;
    let result = benchmark("disconnected clone (large)", ITERATIONS, || {
        let mut policy = |node: NodeId, kind: CachedElementKind| match kind {
            CachedElementKind::Cache => None,
            CachedElementKind::General | CachedElementKind::Entity => {
                next += 1;
                Some(NodeId(node.0 + next))
            }
        };
        let cloned = clone_model(&document, Some(&mut policy));
        assert_eq!(cloned.blocks.len(), document.blocks.len());
    });
    result.print();
}

#[test]
fn bench_snapshot_history() {
    let html: String = (0..MEDIUM_DOC_PARAGRAPHS)
        .map(|i| format!("<p>{}</p>", sentence(i, 8)))
        .collect();
    let result = benchmark("add snapshots with trimming", ITERATIONS, || {
        let mut manager = SnapshotsManager::new(html.len() * 20);
        for i in 0..100 {
            manager.add_snapshot(Snapshot::new(format!("{html}{i}")), false);
        }
        assert!(manager.total_size() <= manager.max_size());
    });
    result.print();
}
