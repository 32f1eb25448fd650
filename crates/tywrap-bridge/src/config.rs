use std::env;

use thiserror::Error;
use tywrap_codec::{CodecPolicy, FallbackMode, NanPolicy, TensorCopyPolicy};

const ENV_CODEC_FALLBACK: &str = "TYWRAP_CODEC_FALLBACK";
const ENV_RESPONSE_CEILING_BYTES: &str = "TYWRAP_RESPONSE_CEILING_BYTES";
const ENV_REQUEST_CEILING_BYTES: &str = "TYWRAP_REQUEST_CEILING_BYTES";
const ENV_TORCH_ALLOW_COPY: &str = "TYWRAP_TORCH_ALLOW_COPY";

/// Default applied when [`ENV_REQUEST_CEILING_BYTES`] is unset: generous
/// enough for real payloads while still bounding the line reader's buffer.
const DEFAULT_REQUEST_CEILING_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer byte count, got {value:?}")]
    InvalidCeiling { name: &'static str, value: String },
}

/// Startup configuration, read once from the environment and threaded
/// through the bridge loop for the rest of the process lifetime.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub request_ceiling_bytes: usize,
    pub codec: CodecPolicy,
}

impl Config {
    /// Reads and validates all configuration variables. A malformed
    /// (non-numeric, non-empty) ceiling value fails startup outright rather
    /// than silently disabling the ceiling.
    pub fn from_env() -> Result<Self, ConfigError> {
        let fallback_mode = if env_lower(ENV_CODEC_FALLBACK).as_deref() == Some("json") {
            FallbackMode::Json
        } else {
            FallbackMode::None
        };

        let tensor_copy_policy = if is_truthy(env_lower(ENV_TORCH_ALLOW_COPY).as_deref()) {
            TensorCopyPolicy::Allow
        } else {
            TensorCopyPolicy::Forbid
        };

        let response_ceiling_bytes = parse_ceiling(ENV_RESPONSE_CEILING_BYTES)?;
        let request_ceiling_bytes =
            parse_ceiling(ENV_REQUEST_CEILING_BYTES)?.unwrap_or(DEFAULT_REQUEST_CEILING_BYTES);

        Ok(Self {
            request_ceiling_bytes,
            codec: CodecPolicy {
                fallback_mode,
                nan_policy: NanPolicy::Reject,
                tensor_copy_policy,
                response_ceiling_bytes,
            },
        })
    }
}

fn env_lower(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_lowercase())
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("yes"))
}

/// A ceiling is disabled by leaving the variable unset; any non-empty value
/// must parse as a positive integer, or startup fails.
fn parse_ceiling(name: &'static str) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = env::var(name).ok() else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ConfigError::InvalidCeiling {
            name,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ceiling_treats_unset_as_disabled() {
        env::remove_var("TYWRAP_TEST_CEILING");
        assert_eq!(parse_ceiling("TYWRAP_TEST_CEILING").unwrap(), None);
    }

    #[test]
    fn parse_ceiling_treats_zero_as_disabled() {
        env::set_var("TYWRAP_TEST_CEILING_ZERO", "0");
        assert_eq!(parse_ceiling("TYWRAP_TEST_CEILING_ZERO").unwrap(), None);
        env::remove_var("TYWRAP_TEST_CEILING_ZERO");
    }

    #[test]
    fn parse_ceiling_rejects_garbage() {
        env::set_var("TYWRAP_TEST_CEILING_BAD", "not-a-number");
        assert!(parse_ceiling("TYWRAP_TEST_CEILING_BAD").is_err());
        env::remove_var("TYWRAP_TEST_CEILING_BAD");
    }

    #[test]
    fn parse_ceiling_accepts_positive_integer() {
        env::set_var("TYWRAP_TEST_CEILING_OK", "1024");
        assert_eq!(parse_ceiling("TYWRAP_TEST_CEILING_OK").unwrap(), Some(1024));
        env::remove_var("TYWRAP_TEST_CEILING_OK");
    }
}
