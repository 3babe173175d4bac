use contract_compliance::chunking::{chunk, ChunkingConfig};
use contract_compliance::data::{Document, Page};
use contract_compliance::normalizer::normalize;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

fn generate_document(page_count: usize) -> Document {
    let paragraphs = [
        "All passwords must be at least twelve characters in length and rotated every ninety days.",
        "The organization shall maintain a complete inventory of all IT assets including classification.",
        "Personnel with access to sensitive systems shall complete annual security awareness training.",
        "All data transmitted over public networks must be encrypted using TLS 1.2 or higher.",
        "Network access shall require authentication and role-based authorization controls.",
    ];

    let mut pages = Vec::with_capacity(page_count);
    let mut cursor = 0usize;
    for i in 0..page_count {
        let text = paragraphs[i % paragraphs.len()].repeat(3);
        let start = cursor;
        let end = start + text.chars().count();
        cursor = end;
        pages.push(Page {
            page_number: i + 1,
            raw_text: text.clone(),
            normalized_text: normalize(&text),
            char_offset_start: start,
            char_offset_end: end,
        });
    }

    Document {
        id: "bench-doc".to_string(),
        filename: "bench.pdf".to_string(),
        pages,
        metadata: HashMap::new(),
    }
}

fn bench_chunking_default_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking_default_policy");

    for &page_count in &[10, 100, 500] {
        let document = generate_document(page_count);

        group.bench_with_input(BenchmarkId::new("pages", page_count), &page_count, |b, _| {
            b.iter(|| chunk(black_box(&document), ChunkingConfig::default()));
        });
    }
    group.finish();
}

fn bench_chunking_multi_page_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking_multi_page_windows");
    let document = generate_document(200);

    for &pages_per_chunk in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("pages_per_chunk", pages_per_chunk),
            &pages_per_chunk,
            |b, _| {
                b.iter(|| {
                    chunk(
                        black_box(&document),
                        ChunkingConfig {
                            pages_per_chunk,
                            overlap_pages: 0,
                        },
                    )
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_chunking_default_policy, bench_chunking_multi_page_windows);
criterion_main!(benches);
