//! Binary Arrow IPC encoders, compiled in only under the `arrow` feature.
//!
//! `ndarray`/`series` use a one-column `StreamWriter` IPC stream (decoders
//! expect a schema-bearing stream, not a bare `Array`). `dataframe` uses an
//! uncompressed Feather-v2-equivalent file writer; decoders are not required
//! to support compressed record batches, so compression is never enabled.

use std::sync::Arc;

use arrow_array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch};
use arrow_ipc::writer::{FileWriter, StreamWriter};
use arrow_schema::{DataType, Field, Schema};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::value::{Column, NumericBuffer};

fn array_ref(data: &NumericBuffer) -> (ArrayRef, DataType) {
    match data {
        NumericBuffer::Float(v) => (Arc::new(Float64Array::from(v.clone())) as ArrayRef, DataType::Float64),
        NumericBuffer::Int(v) => (Arc::new(Int64Array::from(v.clone())) as ArrayRef, DataType::Int64),
        NumericBuffer::Bool(v) => (Arc::new(BooleanArray::from(v.clone())) as ArrayRef, DataType::Boolean),
    }
}

/// Writes a one-column Arrow IPC stream for `data` and returns it base64-encoded.
pub fn encode_one_column_stream(column_name: &str, data: &NumericBuffer) -> Result<String, String> {
    let (array, dtype) = array_ref(data);
    let schema = Arc::new(Schema::new(vec![Field::new(column_name, dtype, false)]));
    let batch = RecordBatch::try_new(schema.clone(), vec![array])
        .map_err(|e| format!("failed to build Arrow record batch: {e}"))?;

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buf, &schema)
            .map_err(|e| format!("failed to open Arrow IPC stream writer: {e}"))?;
        writer
            .write(&batch)
            .map_err(|e| format!("failed to write Arrow record batch: {e}"))?;
        writer
            .finish()
            .map_err(|e| format!("failed to finish Arrow IPC stream: {e}"))?;
    }
    Ok(BASE64.encode(buf))
}

/// Writes an uncompressed Arrow IPC file (Feather v2 equivalent) for a
/// table of columns and returns it base64-encoded.
pub fn encode_table_file(columns: &[Column]) -> Result<String, String> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for column in columns {
        let (array, dtype) = array_ref(&column.data);
        fields.push(Field::new(&column.name, dtype, false));
        arrays.push(array);
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| format!("failed to build Arrow record batch: {e}"))?;

    let mut buf: Vec<u8> = Vec::new();
    {
        // No compression: `FileWriter::try_new` defaults to uncompressed
        // record batches, which is what we want — decoders aren't required
        // to support compressed batches.
        let mut writer = FileWriter::try_new(&mut buf, &schema)
            .map_err(|e| format!("failed to open Arrow IPC file writer: {e}"))?;
        writer
            .write(&batch)
            .map_err(|e| format!("failed to write Arrow record batch: {e}"))?;
        writer
            .finish()
            .map_err(|e| format!("failed to finish Arrow IPC file: {e}"))?;
    }
    Ok(BASE64.encode(buf))
}
