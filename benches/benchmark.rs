//! パフォーマンスベンチマーク
//!
//! このモジュールは、deckimportクレートのインポート処理の性能を測定します。
//!
//! 実装するベンチマーク:
//! - JSON配列のインポート
//! - 共有文字列と数値を含むXLSXワークブックのインポート
//! - multipartフォーム経由のアップロード

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use deckimport::ImporterBuilder;
use rust_xlsxwriter::Workbook;

/// 指定行数のJSON配列を生成
fn generate_json(rows: usize) -> Vec<u8> {
    let cards: Vec<serde_json::Value> = (0..rows)
        .map(|i| {
            serde_json::json!({
                "Spanish": format!("palabra {}", i),
                "English": format!("word {}", i),
                "Level": i % 5,
            })
        })
        .collect();
    serde_json::to_vec(&cards).unwrap()
}

/// 指定行数のワークブックを生成
fn generate_xlsx(rows: u32) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string(0, 0, "Spanish")?;
    worksheet.write_string(0, 1, "English")?;
    worksheet.write_string(0, 2, "Level")?;
    for row in 1..=rows {
        worksheet.write_string(row, 0, format!("palabra {}", row))?;
        worksheet.write_string(row, 1, format!("word {}", row))?;
        worksheet.write_number(row, 2, f64::from(row % 5))?;
    }

    workbook.save_to_buffer()
}

fn benchmark_json(c: &mut Criterion) {
    let importer = ImporterBuilder::new().build().unwrap();
    let mut group = c.benchmark_group("import_json");

    for rows in [100usize, 10_000] {
        let data = generate_json(rows);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| importer.import_file("cards.json", black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_xlsx(c: &mut Criterion) {
    let importer = ImporterBuilder::new().build().unwrap();
    let mut group = c.benchmark_group("import_xlsx");

    for rows in [100u32, 10_000] {
        let data = generate_xlsx(rows).unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| importer.import_file("cards.xlsx", black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_upload(c: &mut Criterion) {
    let importer = ImporterBuilder::new().build().unwrap();
    let file = generate_xlsx(1_000).unwrap();

    let mut body = Vec::new();
    body.extend_from_slice(b"--bench\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nBench\r\n");
    body.extend_from_slice(
        b"--bench\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cards.xlsx\"\r\n\r\n",
    );
    body.extend_from_slice(&file);
    body.extend_from_slice(b"\r\n--bench--\r\n");

    c.bench_function("import_upload_1000_rows", |b| {
        b.iter(|| importer.import_upload(black_box(&body), "multipart/form-data; boundary=bench"))
    });
}

criterion_group!(benches, benchmark_json, benchmark_xlsx, benchmark_upload);
criterion_main!(benches);
