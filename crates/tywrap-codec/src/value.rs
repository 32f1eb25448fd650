use serde_json::{Map, Value};

/// Element type of a flattened numeric buffer. Real numpy/arrow dtypes are
/// far richer than this; we keep exactly the widths the bridge needs to
/// round-trip values losslessly through JSON and Arrow.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericBuffer {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
}

impl NumericBuffer {
    pub fn len(&self) -> usize {
        match self {
            NumericBuffer::Float(v) => v.len(),
            NumericBuffer::Int(v) => v.len(),
            NumericBuffer::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype_str(&self) -> &'static str {
        match self {
            NumericBuffer::Float(_) => "float64",
            NumericBuffer::Int(_) => "int64",
            NumericBuffer::Bool(_) => "bool",
        }
    }

    /// Whether this buffer contains any NaN/Infinity values.
    pub fn has_non_finite(&self) -> bool {
        matches!(self, NumericBuffer::Float(v) if v.iter().any(|x| !x.is_finite()))
    }

    pub fn to_json_data(&self) -> Value {
        match self {
            NumericBuffer::Float(v) => Value::Array(
                v.iter()
                    .map(|x| serde_json::Number::from_f64(*x).map(Value::Number).unwrap_or(Value::Null))
                    .collect(),
            ),
            NumericBuffer::Int(v) => Value::Array(v.iter().map(|x| Value::from(*x)).collect()),
            NumericBuffer::Bool(v) => Value::Array(v.iter().map(|x| Value::from(*x)).collect()),
        }
    }
}

/// A multi-dimensional numeric array: row-major flattened data plus the
/// original shape.
#[derive(Clone, Debug, PartialEq)]
pub struct NdArray {
    pub shape: Vec<usize>,
    pub data: NumericBuffer,
}

/// A named, homogeneously-typed column of a [`DataFrame`].
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: NumericBuffer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataFrame {
    pub columns: Vec<Column>,
}

impl DataFrame {
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: Option<String>,
    pub data: NumericBuffer,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SparseFormat {
    Csr,
    Csc,
    Coo,
}

impl SparseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SparseFormat::Csr => "csr",
            SparseFormat::Csc => "csc",
            SparseFormat::Coo => "coo",
        }
    }
}

/// A scipy-style sparse matrix. CSR/CSC carry `indices`/`indptr`; COO
/// carries `row`/`col`. The encoder enforces which fields are present for
/// which format.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    pub format: SparseFormat,
    pub shape: [usize; 2],
    pub data: Vec<f64>,
    pub indices: Option<Vec<i64>>,
    pub indptr: Option<Vec<i64>>,
    pub row: Option<Vec<i64>>,
    pub col: Option<Vec<i64>>,
    pub dtype: Option<String>,
}

/// Residency/layout facts about a tensor value, modeling what a real
/// GPU-capable tensor library (e.g. torch) would report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TensorDevice {
    Cpu,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub value: NdArray,
    pub dtype: String,
    pub device: TensorDevice,
    pub device_label: String,
    pub is_contiguous: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EstimatorMeta {
    pub class_name: String,
    pub module: String,
    pub version: Option<String>,
    pub params: Map<String, Value>,
}

/// The structural dump of a validated record/model, already alias-resolved
/// by the caller (the host-side equivalent of `model_dump(by_alias=True)`).
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDump(pub Map<String, Value>);

/// The closed sum type of values the codec knows how to encode, plus an
/// escape hatch (`Json`) for values that are already JSON-safe. Dispatch is
/// an explicit match in `encode::encode_host_value`, ordered to match the
/// protocol's dispatch table — see that function's doc comment.
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    NdArray(NdArray),
    DataFrame(DataFrame),
    Series(Series),
    Sparse(SparseMatrix),
    Tensor(Tensor),
    Estimator(EstimatorMeta),
    Model(ModelDump),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    /// Total seconds; may be negative.
    Duration(f64),
    Decimal(bigdecimal::BigDecimal),
    Uuid(uuid::Uuid),
    Path(std::path::PathBuf),
    Bytes(Vec<u8>),
    Set(Vec<HostValue>),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<HostValue>),
    Map(Vec<(String, HostValue)>),
    /// Already-JSON data (e.g. decoded request arguments echoed back
    /// verbatim). `serde_json::Value` cannot itself hold NaN/Infinity, so
    /// this variant never needs the NaN/Infinity walk applied to `Float`.
    Json(Value),
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Json(value)
    }
}
