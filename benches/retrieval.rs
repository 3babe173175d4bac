use contract_compliance::catalog::REQUIREMENTS;
use contract_compliance::data::Chunk;
use contract_compliance::normalizer::normalize;
use contract_compliance::retrieval::Bm25Index;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_corpus(chunk_count: usize) -> Vec<Chunk> {
    let paragraphs = [
        "All passwords must be at least twelve characters and rotated every ninety days with MFA enforced.",
        "The organization maintains a complete inventory of IT assets with classification and disposal procedures.",
        "Personnel with access to sensitive systems complete annual security awareness training and background checks.",
        "All data transmitted over public networks is encrypted using TLS 1.2 or higher without exception.",
        "Network access requires authentication and role-based authorization with segmented VLANs.",
        "Vendor payment schedules and delivery timelines are addressed in section twelve of this agreement.",
        "Force majeure events do not excuse performance obligations under the indemnification clause.",
    ];

    (0..chunk_count)
        .map(|i| {
            let text = paragraphs[i % paragraphs.len()];
            Chunk {
                id: format!("doc:chunk_{i}"),
                raw_text: text.to_string(),
                normalized_text: normalize(text),
                page_start: i + 1,
                page_end: i + 1,
                char_offset_start: 0,
                char_offset_end: text.len(),
            }
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_build");

    for &chunk_count in &[50, 500, 2000] {
        let chunks = generate_corpus(chunk_count);

        group.bench_with_input(BenchmarkId::new("chunks", chunk_count), &chunk_count, |b, _| {
            b.iter(|| Bm25Index::build(black_box(chunks.clone())));
        });
    }
    group.finish();
}

fn bench_retrieve_all_requirement_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("bm25_retrieve");

    for &chunk_count in &[50, 500, 2000] {
        let index = Bm25Index::build(generate_corpus(chunk_count));

        group.bench_with_input(BenchmarkId::new("chunks", chunk_count), &chunk_count, |b, _| {
            b.iter(|| {
                for requirement in &REQUIREMENTS {
                    black_box(index.retrieve(requirement.bm25_query, 5, requirement.id));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_build, bench_retrieve_all_requirement_queries);
criterion_main!(benches);
