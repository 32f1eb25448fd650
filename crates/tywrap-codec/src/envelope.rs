//! JSON shapes of the typed value envelopes the codec produces (see the
//! "typed value envelopes" table). Each carries a `__tywrap__` discriminator
//! and the current [`CODEC_VERSION`].

use serde::Serialize;
use serde_json::Value;

/// Current codec envelope version. Monotonic; a decoder encountering a
/// higher version than it recognizes must reject rather than guess.
pub const CODEC_VERSION: u32 = 1;

#[derive(Serialize)]
pub struct NdArrayEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub shape: Vec<usize>,
    pub dtype: &'static str,
}

#[derive(Serialize)]
pub struct DataFrameEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Serialize)]
pub struct SeriesEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct SparseEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    pub format: &'static str,
    pub shape: [usize; 2],
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indptr: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
}

#[derive(Serialize)]
pub struct TensorEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    pub value: Value,
    pub shape: Vec<usize>,
    pub dtype: String,
    pub device: String,
}

#[derive(Serialize)]
pub struct EstimatorEnvelope {
    #[serde(rename = "__tywrap__")]
    pub tag: &'static str,
    #[serde(rename = "codecVersion")]
    pub codec_version: u32,
    pub encoding: &'static str,
    #[serde(rename = "className")]
    pub class_name: String,
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub params: Value,
}

#[derive(Serialize)]
pub struct BytesEnvelope {
    #[serde(rename = "__type__")]
    pub tag: &'static str,
    pub encoding: &'static str,
    pub data: String,
}
