use serde::Serialize;
use tywrap_codec::FallbackMode;
use tywrap_protocol::{PROTOCOL, PROTOCOL_VERSION};

/// The `meta` method's result: protocol identity plus which optional codec
/// capabilities this build was compiled with. A caller uses this to decide
/// up front whether it can ask for, say, a sparse matrix back without first
/// triggering a runtime error.
#[derive(Serialize)]
pub struct CapabilityReport {
    pub protocol: &'static str,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: u32,
    pub bridge: &'static str,
    pub pid: u32,
    #[serde(rename = "codecFallback")]
    pub codec_fallback: &'static str,
    #[serde(rename = "arrowAvailable")]
    pub arrow_available: bool,
    #[serde(rename = "sparseAvailable")]
    pub sparse_available: bool,
    #[serde(rename = "tensorAvailable")]
    pub tensor_available: bool,
    #[serde(rename = "estimatorAvailable")]
    pub estimator_available: bool,
    pub instances: usize,
}

pub const BRIDGE_NAME: &str = "rust-subprocess";

impl CapabilityReport {
    pub fn collect(fallback_mode: FallbackMode, instances: usize) -> Self {
        Self {
            protocol: PROTOCOL,
            protocol_version: PROTOCOL_VERSION,
            bridge: BRIDGE_NAME,
            pid: std::process::id(),
            codec_fallback: match fallback_mode {
                FallbackMode::Json => "json",
                FallbackMode::None => "none",
            },
            arrow_available: cfg!(feature = "arrow"),
            sparse_available: cfg!(feature = "sparse"),
            tensor_available: cfg!(feature = "tensor"),
            estimator_available: cfg!(feature = "estimator"),
            instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_protocol_identity() {
        let report = CapabilityReport::collect(FallbackMode::None, 0);
        assert_eq!(report.protocol, "tywrap/1");
        assert_eq!(report.protocol_version, 1);
    }
}
