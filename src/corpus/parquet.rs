//! Columnar corpus files.
//!
//! Reads the question table from Parquet with the columns `Id`, `Title`,
//! `CleanTags`, `Score` and `Answer`. Extra columns (such as a dataframe
//! index) are ignored. Integer and string columns are cast to `Int64` and
//! `Utf8`, so narrower ints and large strings load too.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use super::{Answer, CLOSED_SENTINEL, Corpus, Document, TagSet};
use crate::error::{HubError, Result};

/// Batch-level failures, prefixed with the file path by the caller.
type BatchResult<T> = std::result::Result<T, String>;

/// Load a corpus from a Parquet file.
pub fn load_parquet(path: &Path) -> Result<Corpus> {
    let fail = |msg: String| HubError::CorpusLoad(format!("{}: {msg}", path.display()));

    let file = File::open(path)
        .map_err(|err| HubError::CorpusLoad(format!("open {}: {err}", path.display())))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(ParquetRecordBatchReaderBuilder::build)
        .map_err(|err| fail(err.to_string()))?;

    let mut docs = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|err| fail(err.to_string()))?;
        let offset = docs.len();
        docs.extend(documents_from_batch(&batch, offset).map_err(fail)?);
    }
    debug!(rows = docs.len(), "parsed parquet corpus rows");

    let corpus = Corpus::from_documents(docs)?;
    info!(path = %path.display(), rows = corpus.len(), "corpus loaded");
    Ok(corpus)
}

/// Write documents as a single-row-group Parquet file.
pub fn write_parquet(docs: &[Document], path: &Path) -> Result<()> {
    let fail = |msg: String| HubError::CorpusLoad(format!("{}: {msg}", path.display()));

    let schema = Arc::new(Schema::new(vec![
        Field::new("Id", DataType::Int64, false),
        Field::new("Title", DataType::Utf8, false),
        Field::new("CleanTags", DataType::Utf8, true),
        Field::new("Score", DataType::Int64, false),
        Field::new("Answer", DataType::Utf8, true),
    ]));
    let answers: Vec<Option<String>> = docs
        .iter()
        .map(|d| match &d.answer {
            Answer::Body(body) => Some(body.clone()),
            Answer::Closed => Some(CLOSED_SENTINEL.to_string()),
        })
        .collect();
    let ids: Vec<i64> = docs.iter().map(|d| d.id).collect();
    let titles: Vec<String> = docs.iter().map(|d| d.title.clone()).collect();
    let tags: Vec<String> = docs.iter().map(|d| d.tags.to_string()).collect();
    let scores: Vec<i64> = docs.iter().map(|d| d.score).collect();
    let columns = vec![
        Arc::new(Int64Array::from(ids)) as ArrayRef,
        Arc::new(StringArray::from(titles)) as ArrayRef,
        Arc::new(StringArray::from(tags)) as ArrayRef,
        Arc::new(Int64Array::from(scores)) as ArrayRef,
        Arc::new(StringArray::from(answers)) as ArrayRef,
    ];
    let batch =
        RecordBatch::try_new(Arc::clone(&schema), columns).map_err(|err| fail(err.to_string()))?;

    let file = File::create(path)?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).map_err(|err| fail(err.to_string()))?;
    writer.write(&batch).map_err(|err| fail(err.to_string()))?;
    writer.close().map_err(|err| fail(err.to_string()))?;
    debug!(path = %path.display(), rows = docs.len(), "wrote parquet corpus");
    Ok(())
}

fn documents_from_batch(batch: &RecordBatch, offset: usize) -> BatchResult<Vec<Document>> {
    let ids = int_column(batch, "Id")?.ok_or("missing column Id")?;
    let titles = string_column(batch, "Title")?.ok_or("missing column Title")?;
    let tags = string_column(batch, "CleanTags")?;
    let scores = int_column(batch, "Score")?;
    let answers = string_column(batch, "Answer")?;

    let ids = ids.as_primitive::<Int64Type>();
    let titles = titles.as_string::<i32>();
    let tags = tags.as_ref().map(|a| a.as_string::<i32>());
    let scores = scores.as_ref().map(|a| a.as_primitive::<Int64Type>());
    let answers = answers.as_ref().map(|a| a.as_string::<i32>());

    (0..batch.num_rows())
        .map(|i| {
            let row = offset + i;
            if ids.is_null(i) {
                return Err(format!("row {row}: null Id"));
            }
            if titles.is_null(i) {
                return Err(format!("row {row}: null Title"));
            }
            let row_tags = tags
                .filter(|a| !a.is_null(i))
                .map(|a| TagSet::parse(a.value(i)))
                .unwrap_or_default();
            let score = scores.filter(|a| !a.is_null(i)).map_or(0, |a| a.value(i));
            let answer = answers
                .filter(|a| !a.is_null(i))
                .map(|a| a.value(i).to_string());
            Ok(Document {
                id: ids.value(i),
                title: titles.value(i).to_string(),
                tags: row_tags,
                score,
                answer: Answer::from_stored(answer),
            })
        })
        .collect()
}

fn int_column(batch: &RecordBatch, name: &str) -> BatchResult<Option<ArrayRef>> {
    cast_column(batch, name, &DataType::Int64)
}

fn string_column(batch: &RecordBatch, name: &str) -> BatchResult<Option<ArrayRef>> {
    cast_column(batch, name, &DataType::Utf8)
}

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> BatchResult<Option<ArrayRef>> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(None);
    };
    if column.data_type() == to {
        return Ok(Some(Arc::clone(column)));
    }
    cast(column, to)
        .map(Some)
        .map_err(|err| format!("column {name} ({}): {err}", column.data_type()))
}
