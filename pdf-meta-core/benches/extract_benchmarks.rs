//! Extraction Benchmarks
//!
//! Measures the cost of the individual scan stages and of a full extraction
//! over in-memory fixtures.
//!
//! Run with: `cargo bench extract_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdf_meta::parser::page_count::count_pages_in;
use pdf_meta::parser::test_helpers::{create_sample_pdf, PdfFixture, SAMPLE_XMP};
use pdf_meta::parser::xmp::RdfMetadata;
use pdf_meta::{ExtractOptions, Extractor};
use std::io::Cursor;

/// A file with `revisions` incremental updates and `pages` page objects
fn create_large_pdf(revisions: u32, pages: u32) -> Vec<u8> {
    let mut pdf = PdfFixture::new("1.7");
    pdf.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(2, "<< /Type /Pages /Count 0 >>");
    let mut objects = vec![1, 2];
    for page in 0..pages {
        let number = 3 + page;
        pdf.object(number, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
        objects.push(number);
    }
    pdf.xref(&objects, "/Root 1 0 R");

    let mut next = 3 + pages;
    for revision in 0..revisions {
        pdf.object(next, &format!("<< /Title (Revision {revision}) >>"));
        pdf.xref(&[next], &format!("/Root 1 0 R /Info {next} 0 R"));
        next += 1;
    }
    pdf.finish()
}

fn bench_full_extraction(c: &mut Criterion) {
    let sample = create_sample_pdf();
    c.bench_function("extract_sample", |b| {
        b.iter(|| {
            Extractor::new()
                .extract_reader(Cursor::new(black_box(sample.as_slice())))
                .unwrap()
        })
    });
}

fn bench_chain_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("xref_chain");
    for revisions in [1u32, 10, 100] {
        let pdf = create_large_pdf(revisions, 10);
        group.bench_with_input(BenchmarkId::from_parameter(revisions), &pdf, |b, pdf| {
            b.iter(|| {
                Extractor::new()
                    .extract_reader(Cursor::new(pdf.as_slice()))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_page_scan(c: &mut Criterion) {
    let pdf = create_large_pdf(1, 2000);
    let mut group = c.benchmark_group("page_scan");
    group.bench_function("in_memory", |b| b.iter(|| count_pages_in(black_box(&pdf))));
    for chunk in [300usize, 4096, 65536] {
        let options = ExtractOptions::lenient().with_page_scan_chunk(chunk);
        group.bench_with_input(BenchmarkId::new("chunked", chunk), &pdf, |b, pdf| {
            b.iter(|| {
                Extractor::new()
                    .with_options(options.clone())
                    .extract_reader(Cursor::new(pdf.as_slice()))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_xmp_parse(c: &mut Criterion) {
    c.bench_function("rdf_parse", |b| {
        b.iter(|| RdfMetadata::parse(black_box(SAMPLE_XMP.as_bytes())))
    });
}

criterion_group!(
    benches,
    bench_full_extraction,
    bench_chain_length,
    bench_page_scan,
    bench_xmp_parse
);
criterion_main!(benches);
