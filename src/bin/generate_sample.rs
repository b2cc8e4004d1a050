use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, ListBuilder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Write a small labelled text dataset: every printable ASCII character,
/// labelled `punctuation` or `no_punctuation`.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Output parquet file
    #[arg(short, long, default_value = "sample_data.parquet")]
    output: PathBuf,

    /// Fraction of rows assigned to the test split
    #[arg(long, default_value_t = 0.3)]
    test_size: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Printable characters in Python's `string.printable` order.
fn printable() -> Vec<char> {
    ('0'..='9')
        .chain('a'..='z')
        .chain('A'..='Z')
        .chain(('!'..='~').filter(char::is_ascii_punctuation))
        .chain([' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}'])
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.test_size),
        "test_size must lie in [0, 1], got {}",
        args.test_size
    );

    let characters = printable();
    let n = characters.len();

    // Shuffle positions so both splits see both labels
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(args.seed));
    let n_test = (n as f64 * args.test_size).round() as usize;
    let mut splits = vec!["train"; n];
    for &pos in &order[..n_test] {
        splits[pos] = "test";
    }

    let texts: Vec<String> = characters.iter().map(char::to_string).collect();
    let mut label_builder = ListBuilder::new(StringBuilder::new());
    for c in &characters {
        let label = if c.is_ascii_punctuation() {
            "punctuation"
        } else {
            "no_punctuation"
        };
        label_builder.values().append_value(label);
        label_builder.append(true);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("key", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("label", DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))), false),
        Field::new("split", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>())),
            Arc::new(StringArray::from(texts.iter().map(String::as_str).collect::<Vec<_>>())),
            Arc::new(label_builder.finish()),
            Arc::new(StringArray::from(splits)),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;

    info!("{n_test} of {n} rows in the test split");
    println!("Wrote {n} labelled instances to {}", args.output.display());
    Ok(())
}
