/// Whether binary (Arrow) encoders are used or every rich type short-circuits
/// to its JSON variant. Configured once at startup from an environment
/// variable; see `tywrap-bridge`'s config module.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FallbackMode {
    None,
    Json,
}

/// How the encoder treats NaN/positive/negative Infinity. `Permissive` is for
/// internal use only — the bridge's outer loop must never select it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NanPolicy {
    Reject,
    Permissive,
}

/// Whether the tensor encoder may perform a device-to-host and/or
/// contiguity copy for a non-CPU or non-contiguous tensor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TensorCopyPolicy {
    Forbid,
    Allow,
}

/// Codec-construction-time configuration. One `CodecPolicy` is built at
/// startup and threaded through every encode call for the process lifetime.
#[derive(Clone, Copy, Debug)]
pub struct CodecPolicy {
    pub fallback_mode: FallbackMode,
    pub nan_policy: NanPolicy,
    pub tensor_copy_policy: TensorCopyPolicy,
    pub response_ceiling_bytes: Option<usize>,
}

impl Default for CodecPolicy {
    fn default() -> Self {
        Self {
            fallback_mode: FallbackMode::None,
            nan_policy: NanPolicy::Reject,
            tensor_copy_policy: TensorCopyPolicy::Forbid,
            response_ceiling_bytes: None,
        }
    }
}

impl CodecPolicy {
    pub fn arrow_available() -> bool {
        cfg!(feature = "arrow")
    }

    /// Whether binary encoding should be attempted for ndarray/dataframe/series.
    pub fn use_binary(&self) -> bool {
        Self::arrow_available() && self.fallback_mode == FallbackMode::None
    }
}
