use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Int32Array, Int64Array, LargeListArray, ListArray, StringArray};
use arrow::datatypes::DataType;
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Environment, Instance, InstanceProvider, Key, LabelProvider, LabelSet};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Column names used when reading labelled instances.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub text_column: String,
    pub label_column: String,
    /// Optional identifier column; rows without one are keyed by row number.
    pub key_column: String,
    /// Optional split column; rows without one go to `default_split`.
    pub split_column: String,
    pub default_split: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            text_column: "text".to_string(),
            label_column: "label".to_string(),
            key_column: "key".to_string(),
            split_column: "split".to_string(),
            default_split: "test".to_string(),
        }
    }
}

/// One parsed row before it is grouped into splits.
struct Row {
    key: Option<Key>,
    text: String,
    labels: LabelSet,
    split: Option<String>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load labelled instances from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Utf8 text column, Utf8 or List<Utf8> label column
/// * `.json`    – `[{ "text": "...", "label": "pos", "split": "train" }, ...]`
/// * `.csv`     – header row; multi-label cells are semicolon-separated
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Environment> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path, options)?,
        "json" => read_json(path, options)?,
        "csv" => read_csv(path, options)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    debug!("read {} rows from {}", rows.len(), path.display());
    assemble(rows, options)
}

/// Group rows into splits and collect the ground truth.
///
/// Keys are unique across the whole file, not only within a split: the
/// ground truth is one key → labels map shared by every split.
fn assemble(rows: Vec<Row>, options: &LoadOptions) -> Result<Environment> {
    let mut grouped: BTreeMap<String, Vec<Instance>> = BTreeMap::new();
    let mut labels = Vec::with_capacity(rows.len());
    let mut seen: BTreeSet<Key> = BTreeSet::new();

    for (row_no, row) in rows.into_iter().enumerate() {
        let key = row.key.unwrap_or(Key::Int(row_no as i64));
        if !seen.insert(key.clone()) {
            bail!("Row {row_no}: duplicate key {key}");
        }
        let split = row.split.unwrap_or_else(|| options.default_split.clone());
        labels.push((key.clone(), row.labels));
        grouped.entry(split).or_default().push(Instance { key, data: row.text });
    }

    let mut env = Environment::new(LabelProvider::from_tuples(labels));
    for (split, instances) in grouped {
        let provider = InstanceProvider::from_instances(instances)
            .with_context(|| format!("building split '{split}'"))?;
        env = env.with_split(split, provider);
    }
    Ok(env)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "key": 0, "text": "I love it!", "label": "positive", "split": "train" },
///   { "key": 1, "text": "Meh", "label": ["neutral", "negative"] }
/// ]
/// ```
fn read_json(path: &Path, options: &LoadOptions) -> Result<Vec<Row>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;

            let text = obj
                .get(&options.text_column)
                .and_then(JsonValue::as_str)
                .with_context(|| format!("Row {i}: missing or invalid '{}'", options.text_column))?
                .to_string();
            let labels = json_to_labels(obj.get(&options.label_column))
                .with_context(|| format!("Row {i}: invalid '{}'", options.label_column))?;
            let key = match obj.get(&options.key_column) {
                None | Some(JsonValue::Null) => None,
                Some(v) => Some(json_to_key(v).with_context(|| format!("Row {i}: invalid key"))?),
            };
            let split = obj
                .get(&options.split_column)
                .and_then(JsonValue::as_str)
                .map(str::to_string);

            Ok(Row { key, text, labels, split })
        })
        .collect()
}

fn json_to_key(val: &JsonValue) -> Result<Key> {
    match val {
        JsonValue::String(s) => Ok(Key::Str(s.clone())),
        JsonValue::Number(n) => n.as_i64().map(Key::Int).context("key is not an integer"),
        other => bail!("unsupported key {other}"),
    }
}

fn json_to_labels(val: Option<&JsonValue>) -> Result<LabelSet> {
    match val {
        None | Some(JsonValue::Null) => Ok(LabelSet::new()),
        Some(JsonValue::String(s)) => Ok(std::iter::once(s.clone()).collect()),
        Some(JsonValue::Number(n)) => Ok(std::iter::once(n.to_string()).collect()),
        Some(JsonValue::Bool(b)) => Ok(std::iter::once(b.to_string()).collect()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|v| match v {
                JsonValue::String(s) => Ok(s.clone()),
                JsonValue::Number(n) => Ok(n.to_string()),
                other => bail!("unsupported label {other}"),
            })
            .collect(),
        Some(other) => bail!("unsupported label {other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. The label column holds one
/// label, or several separated by semicolons: `"neutral;negative"`.
fn read_csv(path: &Path, options: &LoadOptions) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let text_idx = position(&options.text_column)
        .with_context(|| format!("CSV missing '{}' column", options.text_column))?;
    let label_idx = position(&options.label_column);
    let key_idx = position(&options.key_column);
    let split_idx = position(&options.split_column);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let text = record.get(text_idx).unwrap_or("").to_string();
        let labels = label_idx
            .and_then(|i| record.get(i))
            .map(parse_semicolon_labels)
            .unwrap_or_default();
        let key = key_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(guess_key);
        let split = split_idx
            .and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        rows.push(Row { key, text, labels, split });
    }
    Ok(rows)
}

fn parse_semicolon_labels(s: &str) -> LabelSet {
    s.split(';')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(str::to_string)
        .collect()
}

fn guess_key(s: &str) -> Key {
    match s.parse::<i64>() {
        Ok(i) => Key::Int(i),
        Err(_) => Key::Str(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load labelled instances from a Parquet file.
///
/// Expected schema:
/// - text column: Utf8 / LargeUtf8
/// - label column: Utf8 or List<Utf8> (multi-label)
/// - optional key column: Int32 / Int64 / Utf8
/// - optional split column: Utf8
fn read_parquet(path: &Path, options: &LoadOptions) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let text_idx = schema
            .index_of(&options.text_column)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", options.text_column))?;
        let label_col = schema.index_of(&options.label_column).ok().map(|i| batch.column(i));
        let key_col = schema.index_of(&options.key_column).ok().map(|i| batch.column(i));
        let split_col = schema.index_of(&options.split_column).ok().map(|i| batch.column(i));
        let text_col = batch.column(text_idx);

        for row in 0..batch.num_rows() {
            let text = extract_string(text_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", options.text_column))?
                .unwrap_or_default();
            let labels = match label_col {
                Some(col) => extract_labels(col, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", options.label_column))?,
                None => LabelSet::new(),
            };
            let key = match key_col {
                Some(col) => extract_key(col, row)?,
                None => None,
            };
            let split = match split_col {
                Some(col) => extract_string(col, row)?,
                None => None,
            };
            rows.push(Row { key, text, labels, split });
        }
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Extract a string from a Utf8 or LargeUtf8 column; nulls become `None`.
fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => Ok(Some(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Ok(Some(col.as_string::<i64>().value(row).to_string())),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

fn extract_key(col: &Arc<dyn Array>, row: usize) -> Result<Option<Key>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().context("expected Int32Array")?;
            Ok(Some(Key::Int(arr.value(row) as i64)))
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().context("expected Int64Array")?;
            Ok(Some(Key::Int(arr.value(row))))
        }
        _ => Ok(extract_string(col, row)?.map(Key::Str)),
    }
}

/// Extract a label set from a Utf8 column or a List / LargeList of Utf8.
fn extract_labels(col: &Arc<dyn Array>, row: usize) -> Result<LabelSet> {
    if col.is_null(row) {
        return Ok(LabelSet::new());
    }

    let values_array = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            return Ok(extract_string(col, row)?.into_iter().collect());
        }
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected Utf8 or List column, got {other:?}"),
    };

    let strings = values_array
        .as_any()
        .downcast_ref::<StringArray>()
        .with_context(|| format!("List inner type is {:?}, expected Utf8", values_array.data_type()))?;
    Ok(strings.iter().flatten().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::label_set;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_records_grouped_by_split() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
                {"key": "a", "text": "great", "label": "positive", "split": "train"},
                {"key": "b", "text": "awful", "label": ["negative"], "split": "test"},
                {"key": "c", "text": "fine", "label": "neutral"}
            ]"#,
        );
        let env = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(env.split_names(), vec!["test", "train"]);
        assert_eq!(env.split("test").unwrap().len(), 2);
        assert_eq!(env.labels().labels_of(&Key::from("b")), label_set(["negative"]));
    }

    #[test]
    fn csv_semicolon_labels_and_row_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "text,label\nhello,a;b\nbye,c\n");
        let env = load_file(&path, &LoadOptions::default()).unwrap();
        let test = env.split("test").unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(env.labels().labels_of(&Key::Int(0)), label_set(["a", "b"]));
        assert_eq!(test.get(&Key::Int(1)).unwrap().data, "bye");
    }

    #[test]
    fn csv_without_text_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "body,label\nhello,a\n");
        assert!(load_file(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.txt", "");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn duplicate_keys_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "dup.csv", "key,text,label\n1,a,x\n1,b,y\n");
        assert!(load_file(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn csv_key_repeated_across_splits_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "splits.csv",
            "key,text,label,split\n1,hello,pos,train\n1,bye,neg,test\n",
        );
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Row 1: duplicate key 1"), "{err}");
    }

    #[test]
    fn json_key_repeated_across_splits_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "splits.json",
            r#"[
                {"key": "a", "text": "hello", "label": "pos", "split": "train"},
                {"key": "a", "text": "bye", "label": "neg", "split": "test"}
            ]"#,
        );
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate key \"a\""), "{err}");
    }

    #[test]
    fn explicit_key_colliding_with_row_number_fails() {
        let dir = tempfile::tempdir().unwrap();
        // the second row has no key and would be keyed by its row number 1
        let path = write_file(&dir, "mixed.csv", "key,text,label\n1,a,x\n,b,y\n");
        assert!(load_file(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn parquet_round_trip() {
        use arrow::array::{ListBuilder, StringBuilder};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let mut label_builder = ListBuilder::new(StringBuilder::new());
        for labels in [vec!["pos"], vec!["neg", "neutral"], vec![]] {
            for label in labels {
                label_builder.values().append_value(label);
            }
            label_builder.append(true);
        }

        let schema = Arc::new(Schema::new(vec![
            Field::new("key", DataType::Int64, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("label", DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))), false),
            Field::new("split", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 20, 30])),
                Arc::new(StringArray::from(vec!["great", "meh", "what"])),
                Arc::new(label_builder.finish()),
                Arc::new(StringArray::from(vec![Some("train"), Some("test"), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.parquet");
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let options = LoadOptions {
            default_split: "validation".to_string(),
            ..LoadOptions::default()
        };
        let env = load_file(&path, &options).unwrap();
        assert_eq!(env.split_names(), vec!["test", "train", "validation"]);
        assert_eq!(env.split("train").unwrap().get(&Key::Int(10)).unwrap().data, "great");
        assert_eq!(env.split("validation").unwrap().get(&Key::Int(30)).unwrap().data, "what");
        assert_eq!(env.labels().labels_of(&Key::Int(20)), label_set(["neg", "neutral"]));
        assert!(env.labels().labels_of(&Key::Int(30)).is_empty());
    }

    #[test]
    fn parquet_without_text_column_fails() {
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![Field::new("body", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(StringArray::from(vec!["x"]))]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pq");
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("missing 'text' column"), "{err}");
    }
}
