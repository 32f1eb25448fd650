use serde_json::Value;
use tywrap_protocol::BridgeError;

use crate::envelope::{
    BytesEnvelope, DataFrameEnvelope, EstimatorEnvelope, NdArrayEnvelope, SeriesEnvelope,
    SparseEnvelope, TensorEnvelope, CODEC_VERSION,
};
use crate::policy::{CodecPolicy, FallbackMode, NanPolicy, TensorCopyPolicy};
use crate::value::{HostValue, NumericBuffer, SparseFormat, TensorDevice};

fn codec_error(message: impl Into<String>) -> BridgeError {
    BridgeError::Codec(message.into())
}

/// Converts a host-native return value into a JSON document safe to place in
/// a response envelope.
///
/// Dispatch is an explicit match, in the order mandated by the protocol
/// (earlier checks take priority because some types are polymorphic over
/// others in the host runtime this mirrors):
/// 1. ndarray  2. dataframe  3. series  4. sparse  5. tensor
/// 6. estimator  7. validated-model dump  8. stdlib scalar extensions
/// 9. pass-through / generic JSON
///
/// Measures the encoded payload against `policy.response_ceiling_bytes`
/// after encoding and fails the whole call if it is exceeded.
pub fn encode_response(value: &HostValue, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    let encoded = encode_host_value(value, policy)?;
    if let Some(ceiling) = policy.response_ceiling_bytes {
        let size = serde_json::to_string(&encoded)
            .map(|s| s.len())
            .unwrap_or(usize::MAX);
        if size > ceiling {
            return Err(BridgeError::PayloadTooLarge {
                observed_bytes: size,
                max_bytes: ceiling,
            });
        }
    }
    Ok(encoded)
}

fn encode_host_value(value: &HostValue, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    match value {
        // 1. Multi-dimensional numeric array
        HostValue::NdArray(arr) => encode_ndarray(&arr.shape, &arr.data, policy),

        // 2. Tabular frame
        HostValue::DataFrame(frame) => encode_dataframe(frame, policy),

        // 3. One-dimensional labeled vector
        HostValue::Series(series) => encode_series(series, policy),

        // 4. Sparse matrix
        HostValue::Sparse(sparse) => encode_sparse(sparse),

        // 5. Numeric tensor
        HostValue::Tensor(tensor) => encode_tensor(tensor, policy),

        // 6. Validated record / estimator metadata
        HostValue::Estimator(meta) => encode_estimator(meta),

        // 7. Validated model structural dump
        HostValue::Model(dump) => Ok(Value::Object(dump.0.clone())),

        // 8. Standard scalar extensions
        HostValue::Timestamp(ts) => Ok(Value::String(ts.to_rfc3339())),
        HostValue::Date(date) => Ok(Value::String(date.format("%Y-%m-%d").to_string())),
        HostValue::Time(time) => Ok(Value::String(time.format("%H:%M:%S%.f").to_string())),
        HostValue::Duration(seconds) => encode_finite_f64(*seconds, policy),
        HostValue::Decimal(dec) => Ok(Value::String(dec.to_string())),
        HostValue::Uuid(uuid) => Ok(Value::String(uuid.to_string())),
        HostValue::Path(path) => Ok(Value::String(path.to_string_lossy().into_owned())),
        HostValue::Bytes(bytes) => Ok(encode_bytes_envelope(bytes)),
        HostValue::Set(items) => {
            let encoded: Result<Vec<Value>, BridgeError> =
                items.iter().map(|item| encode_host_value(item, policy)).collect();
            Ok(Value::Array(encoded?))
        }

        // 9. Pass-through / generic JSON
        HostValue::Null => Ok(Value::Null),
        HostValue::Bool(b) => Ok(Value::Bool(*b)),
        HostValue::Int(i) => Ok(Value::from(*i)),
        HostValue::Float(f) => encode_finite_f64(*f, policy),
        HostValue::String(s) => Ok(Value::String(s.clone())),
        HostValue::List(items) => {
            let encoded: Result<Vec<Value>, BridgeError> =
                items.iter().map(|item| encode_host_value(item, policy)).collect();
            Ok(Value::Array(encoded?))
        }
        HostValue::Map(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(key.clone(), encode_host_value(item, policy)?);
            }
            Ok(Value::Object(map))
        }
        HostValue::Json(value) => Ok(value.clone()),
    }
}

fn encode_finite_f64(x: f64, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    if !x.is_finite() {
        if policy.nan_policy != NanPolicy::Permissive {
            return Err(codec_error(format!("cannot encode NaN/Infinity value: {x}")));
        }
        // Permissive mode is for internal callers only; pass the raw token
        // through rather than a standard JSON number.
        let token = if x.is_nan() {
            "NaN"
        } else if x == f64::INFINITY {
            "Infinity"
        } else {
            "-Infinity"
        };
        return Ok(Value::String(token.to_string()));
    }
    Ok(serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null))
}

fn encode_bytes_envelope(bytes: &[u8]) -> Value {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    let envelope = BytesEnvelope {
        tag: "bytes",
        encoding: "base64",
        data: BASE64.encode(bytes),
    };
    serde_json::to_value(envelope).expect("bytes envelope is always serializable")
}

fn encode_ndarray(shape: &[usize], data: &NumericBuffer, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    if policy.nan_policy == NanPolicy::Reject && data.has_non_finite() {
        return Err(codec_error("cannot encode ndarray containing NaN/Infinity"));
    }

    #[cfg(feature = "arrow")]
    if policy.use_binary() {
        match crate::arrow_support::encode_one_column_stream("value", data) {
            Ok(b64) => {
                let envelope = NdArrayEnvelope {
                    tag: "ndarray",
                    codec_version: CODEC_VERSION,
                    encoding: "arrow",
                    b64: Some(b64),
                    data: None,
                    shape: shape.to_vec(),
                    dtype: data.dtype_str(),
                };
                return Ok(serde_json::to_value(envelope).expect("ndarray envelope always serializable"));
            }
            Err(_) if policy.fallback_mode == FallbackMode::Json => {}
            Err(e) => return Err(codec_error(format!("Arrow encoding failed for ndarray: {e}"))),
        }
    }

    if !CodecPolicy::arrow_available() && policy.fallback_mode != FallbackMode::Json {
        return Err(codec_error(
            "Arrow encoding unavailable for ndarray; rebuild with the `arrow` feature or set the codec fallback mode to json",
        ));
    }

    let envelope = NdArrayEnvelope {
        tag: "ndarray",
        codec_version: CODEC_VERSION,
        encoding: "json",
        b64: None,
        data: Some(data.to_json_data()),
        shape: shape.to_vec(),
        dtype: data.dtype_str(),
    };
    Ok(serde_json::to_value(envelope).expect("ndarray envelope always serializable"))
}

fn encode_dataframe(frame: &crate::value::DataFrame, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    if policy.nan_policy == NanPolicy::Reject && frame.columns.iter().any(|c| c.data.has_non_finite()) {
        return Err(codec_error("cannot encode dataframe containing NaN/Infinity"));
    }

    #[cfg(feature = "arrow")]
    if policy.use_binary() {
        match crate::arrow_support::encode_table_file(&frame.columns) {
            Ok(b64) => {
                let envelope = DataFrameEnvelope {
                    tag: "dataframe",
                    codec_version: CODEC_VERSION,
                    encoding: "arrow",
                    b64: Some(b64),
                    data: None,
                };
                return Ok(serde_json::to_value(envelope).expect("dataframe envelope always serializable"));
            }
            Err(_) if policy.fallback_mode == FallbackMode::Json => {}
            Err(e) => return Err(codec_error(format!("Arrow encoding failed for dataframe: {e}"))),
        }
    }

    if !CodecPolicy::arrow_available() && policy.fallback_mode != FallbackMode::Json {
        return Err(codec_error(
            "Arrow encoding unavailable for dataframe; rebuild with the `arrow` feature or set the codec fallback mode to json",
        ));
    }

    let rows = dataframe_records(frame);
    let envelope = DataFrameEnvelope {
        tag: "dataframe",
        codec_version: CODEC_VERSION,
        encoding: "json",
        b64: None,
        data: Some(Value::Array(rows)),
    };
    Ok(serde_json::to_value(envelope).expect("dataframe envelope always serializable"))
}

fn dataframe_records(frame: &crate::value::DataFrame) -> Vec<Value> {
    let row_count = frame.row_count();
    (0..row_count)
        .map(|row_idx| {
            let mut map = serde_json::Map::with_capacity(frame.columns.len());
            for column in &frame.columns {
                let cell = match &column.data {
                    NumericBuffer::Float(v) => serde_json::Number::from_f64(v[row_idx])
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                    NumericBuffer::Int(v) => Value::from(v[row_idx]),
                    NumericBuffer::Bool(v) => Value::from(v[row_idx]),
                };
                map.insert(column.name.clone(), cell);
            }
            Value::Object(map)
        })
        .collect()
}

fn encode_series(series: &crate::value::Series, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    if policy.nan_policy == NanPolicy::Reject && series.data.has_non_finite() {
        return Err(codec_error("cannot encode series containing NaN/Infinity"));
    }

    #[cfg(feature = "arrow")]
    if policy.use_binary() {
        match crate::arrow_support::encode_one_column_stream(
            series.name.as_deref().unwrap_or("value"),
            &series.data,
        ) {
            Ok(b64) => {
                let envelope = SeriesEnvelope {
                    tag: "series",
                    codec_version: CODEC_VERSION,
                    encoding: "arrow",
                    b64: Some(b64),
                    data: None,
                    name: series.name.clone(),
                };
                return Ok(serde_json::to_value(envelope).expect("series envelope always serializable"));
            }
            Err(_) if policy.fallback_mode == FallbackMode::Json => {}
            Err(e) => return Err(codec_error(format!("Arrow encoding failed for series: {e}"))),
        }
    }

    if !CodecPolicy::arrow_available() && policy.fallback_mode != FallbackMode::Json {
        return Err(codec_error(
            "Arrow encoding unavailable for series; rebuild with the `arrow` feature or set the codec fallback mode to json",
        ));
    }

    let envelope = SeriesEnvelope {
        tag: "series",
        codec_version: CODEC_VERSION,
        encoding: "json",
        b64: None,
        data: Some(series.data.to_json_data()),
        name: series.name.clone(),
    };
    Ok(serde_json::to_value(envelope).expect("series envelope always serializable"))
}

#[cfg(feature = "sparse")]
fn encode_sparse(sparse: &crate::value::SparseMatrix) -> Result<Value, BridgeError> {
    if let Some(dtype) = &sparse.dtype {
        if dtype.contains("complex") {
            return Err(codec_error("complex sparse matrices are not supported by the JSON codec"));
        }
    }
    if sparse.data.iter().any(|x| !x.is_finite()) {
        return Err(codec_error("cannot encode sparse matrix containing NaN/Infinity"));
    }

    let envelope = match sparse.format {
        SparseFormat::Csr | SparseFormat::Csc => {
            let indices = sparse
                .indices
                .clone()
                .ok_or_else(|| codec_error(format!("{} matrix missing indices", sparse.format.as_str())))?;
            let indptr = sparse
                .indptr
                .clone()
                .ok_or_else(|| codec_error(format!("{} matrix missing indptr", sparse.format.as_str())))?;
            SparseEnvelope {
                tag: "scipy.sparse",
                codec_version: CODEC_VERSION,
                encoding: "json",
                format: sparse.format.as_str(),
                shape: sparse.shape,
                data: sparse.data.clone(),
                indices: Some(indices),
                indptr: Some(indptr),
                row: None,
                col: None,
                dtype: sparse.dtype.clone(),
            }
        }
        SparseFormat::Coo => {
            let row = sparse
                .row
                .clone()
                .ok_or_else(|| codec_error("coo matrix missing row"))?;
            let col = sparse
                .col
                .clone()
                .ok_or_else(|| codec_error("coo matrix missing col"))?;
            SparseEnvelope {
                tag: "scipy.sparse",
                codec_version: CODEC_VERSION,
                encoding: "json",
                format: sparse.format.as_str(),
                shape: sparse.shape,
                data: sparse.data.clone(),
                indices: None,
                indptr: None,
                row: Some(row),
                col: Some(col),
                dtype: sparse.dtype.clone(),
            }
        }
    };
    Ok(serde_json::to_value(envelope).expect("sparse envelope always serializable"))
}

#[cfg(not(feature = "sparse"))]
fn encode_sparse(_sparse: &crate::value::SparseMatrix) -> Result<Value, BridgeError> {
    Err(codec_error(
        "scipy.sparse encoding is not compiled into this bridge build",
    ))
}

#[cfg(feature = "tensor")]
fn encode_tensor(tensor: &crate::value::Tensor, policy: &CodecPolicy) -> Result<Value, BridgeError> {
    let needs_copy = tensor.device != TensorDevice::Cpu || !tensor.is_contiguous;
    if needs_copy && policy.tensor_copy_policy == TensorCopyPolicy::Forbid {
        if tensor.device != TensorDevice::Cpu {
            return Err(codec_error(
                "tensor is on a non-CPU device; enable the tensor copy policy to allow a host transfer",
            ));
        }
        return Err(codec_error(
            "tensor is not contiguous; enable the tensor copy policy to allow a contiguous copy",
        ));
    }

    let inner = encode_ndarray(&tensor.value.shape, &tensor.value.data, policy)?;
    let envelope = TensorEnvelope {
        tag: "torch.tensor",
        codec_version: CODEC_VERSION,
        encoding: "ndarray",
        value: inner,
        shape: tensor.value.shape.clone(),
        dtype: tensor.dtype.clone(),
        device: tensor.device_label.clone(),
    };
    Ok(serde_json::to_value(envelope).expect("tensor envelope always serializable"))
}

#[cfg(not(feature = "tensor"))]
fn encode_tensor(_tensor: &crate::value::Tensor, _policy: &CodecPolicy) -> Result<Value, BridgeError> {
    Err(codec_error(
        "torch.tensor encoding is not compiled into this bridge build",
    ))
}

#[cfg(feature = "estimator")]
fn encode_estimator(meta: &crate::value::EstimatorMeta) -> Result<Value, BridgeError> {
    // Params must be eagerly JSON-serializable; `Map<String, Value>` already
    // guarantees this, so this is a formality that mirrors the protocol's
    // explicit "verify eagerly" requirement.
    let params = Value::Object(meta.params.clone());
    let envelope = EstimatorEnvelope {
        tag: "sklearn.estimator",
        codec_version: CODEC_VERSION,
        encoding: "json",
        class_name: meta.class_name.clone(),
        module: meta.module.clone(),
        version: meta.version.clone(),
        params,
    };
    Ok(serde_json::to_value(envelope).expect("estimator envelope always serializable"))
}

#[cfg(not(feature = "estimator"))]
fn encode_estimator(_meta: &crate::value::EstimatorMeta) -> Result<Value, BridgeError> {
    Err(codec_error(
        "sklearn.estimator encoding is not compiled into this bridge build",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DataFrame, Column, Series, SparseMatrix, Tensor, NdArray};

    fn policy() -> CodecPolicy {
        CodecPolicy {
            fallback_mode: FallbackMode::Json,
            ..CodecPolicy::default()
        }
    }

    #[test]
    fn rejects_nan() {
        let value = HostValue::List(vec![
            HostValue::Float(f64::NAN),
            HostValue::Float(f64::INFINITY),
            HostValue::Float(f64::NEG_INFINITY),
        ]);
        let err = encode_response(&value, &policy()).unwrap_err();
        assert_eq!(err.error_type(), "CodecError");
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn ndarray_json_fallback_round_trips_shape() {
        let value = HostValue::NdArray(NdArray {
            shape: vec![2, 2],
            data: NumericBuffer::Float(vec![1.0, 2.0, 3.0, 4.0]),
        });
        let encoded = encode_response(&value, &policy()).unwrap();
        assert_eq!(encoded["__tywrap__"], "ndarray");
        assert_eq!(encoded["encoding"], "json");
        assert_eq!(encoded["shape"], serde_json::json!([2, 2]));
        assert_eq!(encoded["data"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn dataframe_json_fallback_emits_records() {
        let frame = DataFrame {
            columns: vec![Column {
                name: "x".into(),
                data: NumericBuffer::Int(vec![1, 2]),
            }],
        };
        let encoded = encode_response(&HostValue::DataFrame(frame), &policy()).unwrap();
        assert_eq!(encoded["encoding"], "json");
        assert_eq!(encoded["data"], serde_json::json!([{"x": 1}, {"x": 2}]));
    }

    #[test]
    fn series_preserves_name() {
        let series = Series {
            name: Some("close".into()),
            data: NumericBuffer::Float(vec![1.5]),
        };
        let encoded = encode_response(&HostValue::Series(series), &policy()).unwrap();
        assert_eq!(encoded["name"], "close");
    }

    #[test]
    fn sparse_rejects_unsupported_field_combo() {
        let sparse = SparseMatrix {
            format: SparseFormat::Csr,
            shape: [2, 2],
            data: vec![1.0],
            indices: None,
            indptr: None,
            row: None,
            col: None,
            dtype: None,
        };
        let err = encode_response(&HostValue::Sparse(sparse), &policy()).unwrap_err();
        assert_eq!(err.error_type(), "CodecError");
    }

    #[test]
    fn sparse_coo_round_trip() {
        let sparse = SparseMatrix {
            format: SparseFormat::Coo,
            shape: [3, 3],
            data: vec![1.0, 2.0],
            indices: None,
            indptr: None,
            row: Some(vec![0, 1]),
            col: Some(vec![1, 2]),
            dtype: Some("float64".into()),
        };
        let encoded = encode_response(&HostValue::Sparse(sparse), &policy()).unwrap();
        assert_eq!(encoded["format"], "coo");
        assert_eq!(encoded["row"], serde_json::json!([0, 1]));
    }

    #[test]
    fn tensor_rejects_non_cpu_without_copy_policy() {
        let tensor = Tensor {
            value: NdArray {
                shape: vec![1],
                data: NumericBuffer::Float(vec![1.0]),
            },
            dtype: "float32".into(),
            device: TensorDevice::Other,
            device_label: "cuda:0".into(),
            is_contiguous: true,
        };
        let err = encode_response(&HostValue::Tensor(tensor), &policy()).unwrap_err();
        assert_eq!(err.error_type(), "CodecError");
    }

    #[test]
    fn tensor_allows_copy_when_policy_permits() {
        let tensor = Tensor {
            value: NdArray {
                shape: vec![1],
                data: NumericBuffer::Float(vec![1.0]),
            },
            dtype: "float32".into(),
            device: TensorDevice::Other,
            device_label: "cuda:0".into(),
            is_contiguous: true,
        };
        let mut p = policy();
        p.tensor_copy_policy = TensorCopyPolicy::Allow;
        let encoded = encode_response(&HostValue::Tensor(tensor), &p).unwrap();
        assert_eq!(encoded["__tywrap__"], "torch.tensor");
    }

    #[test]
    fn bytes_round_trip_shape() {
        let encoded = encode_response(&HostValue::Bytes(b"Hello".to_vec()), &policy()).unwrap();
        assert_eq!(encoded["__type__"], "bytes");
        assert_eq!(encoded["encoding"], "base64");
        assert_eq!(encoded["data"], "SGVsbG8=");
    }

    #[test]
    fn response_ceiling_is_enforced() {
        let mut p = policy();
        p.response_ceiling_bytes = Some(4);
        let err = encode_response(&HostValue::String("too long for ceiling".into()), &p).unwrap_err();
        assert_eq!(err.error_type(), "PayloadTooLargeError");
    }
}
