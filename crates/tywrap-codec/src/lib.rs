//! Bidirectional codec between host-native rich values and `tywrap/1` JSON
//! envelopes: request arguments decode from JSON, return values encode into
//! the typed value envelopes (or a JSON fallback) the protocol defines.

#[cfg(feature = "arrow")]
mod arrow_support;
mod decode;
mod encode;
mod envelope;
mod policy;
mod value;

pub use decode::decode_request_value;
pub use encode::encode_response;
pub use envelope::CODEC_VERSION;
pub use policy::{CodecPolicy, FallbackMode, NanPolicy, TensorCopyPolicy};
pub use value::{
    Column, DataFrame, EstimatorMeta, HostValue, ModelDump, NdArray, NumericBuffer, Series,
    SparseFormat, SparseMatrix, Tensor, TensorDevice,
};
