use async_compression::tokio::write::GzipEncoder;
use csv_pg_ingest::ingestion::{
    open_source, BatchReader, CellValue, ColumnType, IngestionOrchestrator, MemorySink, SourceLocator,
};
use csv_pg_ingest::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Build a small yellow-taxi style CSV with `rows` data rows.
fn trips_csv(rows: usize) -> String {
    let mut text = String::from(
        "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,store_and_fwd_flag,total_amount\n",
    );
    for i in 0..rows {
        let passengers = if i % 7 == 0 { String::new() } else { (i % 4 + 1).to_string() };
        text.push_str(&format!(
            "{},2021-01-01 {:02}:{:02}:00,2021-01-01 {:02}:{:02}:30,{},N,{}.{:02}\n",
            i % 2 + 1,
            (i / 60) % 24,
            i % 60,
            (i / 60) % 24,
            i % 60,
            passengers,
            i % 50,
            i % 100
        ));
    }
    text
}

fn temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("csv_pg_ingest_{}{}", uuid::Uuid::new_v4(), suffix))
}

fn dt_cols() -> Vec<String> {
    vec!["tpep_pickup_datetime".to_string(), "tpep_dropoff_datetime".to_string()]
}

async fn ingest_locator(location: &str, chunk_size: usize) -> (MemorySink, String) {
    let locator = SourceLocator::parse(location);
    let source = open_source(&locator).await.unwrap();
    let mut reader = BatchReader::open(source, &dt_cols(), chunk_size).await.unwrap();
    let mut sink = MemorySink::new("yellow_taxi_trips");
    let mut orchestrator = IngestionOrchestrator::new(Vec::new());
    orchestrator.run(&mut reader, &mut sink).await.unwrap();
    (sink, String::from_utf8(orchestrator.into_report()).unwrap())
}

#[tokio::test]
async fn test_local_file_end_to_end() {
    let path = temp_path(".csv");
    tokio::fs::write(&path, trips_csv(95)).await.unwrap();

    let (sink, report) = ingest_locator(path.to_str().unwrap(), 40).await;

    let sizes: Vec<usize> = sink.batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![40, 40, 15]);
    assert_eq!(report.lines().count(), 3);

    let first = &sink.batches[0];
    let types: Vec<ColumnType> = first.schema.columns.iter().map(|c| c.data_type).collect();
    assert_eq!(
        types,
        vec![
            ColumnType::BigInt,
            ColumnType::Timestamp,
            ColumnType::Timestamp,
            ColumnType::BigInt,
            ColumnType::Text,
            ColumnType::Double,
        ]
    );
    // Missing passenger_count on every seventh row
    assert_eq!(first.rows[0][3], CellValue::Null);
    assert_eq!(first.rows[1][3], CellValue::Int(2));
    assert_eq!(first.rows[1][4], CellValue::Text("N".to_string()));

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_gzip_file_matches_plain_file() {
    let csv = trips_csv(33);

    let plain = temp_path(".csv");
    tokio::fs::write(&plain, &csv).await.unwrap();

    let mut encoder = GzipEncoder::new(Vec::new());
    encoder.write_all(csv.as_bytes()).await.unwrap();
    encoder.shutdown().await.unwrap();
    let gz = temp_path(".csv.gz");
    tokio::fs::write(&gz, encoder.into_inner()).await.unwrap();

    let (plain_sink, _) = ingest_locator(plain.to_str().unwrap(), 10).await;
    let (gz_sink, _) = ingest_locator(gz.to_str().unwrap(), 10).await;
    assert_eq!(plain_sink.batches, gz_sink.batches);
    assert_eq!(gz_sink.total_rows(), 33);

    let _ = tokio::fs::remove_file(&plain).await;
    let _ = tokio::fs::remove_file(&gz).await;
}

#[tokio::test]
async fn test_default_chunking_with_remainder() {
    let csv = trips_csv(150_000);
    let mut reader = BatchReader::open(csv.as_bytes(), &dt_cols(), DEFAULT_CHUNK_SIZE).await.unwrap();
    let mut sink = MemorySink::new("yellow_taxi_trips");
    let mut orchestrator = IngestionOrchestrator::new(Vec::new());

    let result = orchestrator.run(&mut reader, &mut sink).await.unwrap();
    assert_eq!(result.batches, 2);
    assert_eq!(result.rows_ingested, 150_000);
    let sizes: Vec<usize> = sink.batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![100_000, 50_000]);
    assert_eq!(sink.batches[1].first_row, 100_000);
}

#[tokio::test]
async fn test_default_chunking_exact_multiple() {
    let csv = trips_csv(200_000);
    let mut reader = BatchReader::open(csv.as_bytes(), &dt_cols(), DEFAULT_CHUNK_SIZE).await.unwrap();
    let mut sink = MemorySink::new("yellow_taxi_trips");
    let mut orchestrator = IngestionOrchestrator::new(Vec::new());

    let result = orchestrator.run(&mut reader, &mut sink).await.unwrap();
    assert_eq!(result.batches, 2);
    assert!(sink.batches.iter().all(|b| b.len() == 100_000));

    let report = String::from_utf8(orchestrator.into_report()).unwrap();
    assert_eq!(report.lines().count(), 2);
}

#[tokio::test]
async fn test_missing_datetime_column_prints_nothing() {
    let csv = trips_csv(5);
    let dt = vec!["lpep_pickup_datetime".to_string()];
    let err = match BatchReader::open(csv.as_bytes(), &dt, 2).await {
        Ok(_) => panic!("expected a source read error"),
        Err(e) => e,
    };
    assert!(err.is_source_read());
}
