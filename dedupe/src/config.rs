//! Run configuration: the knobs from the external configuration table,
//! validated and clamped exactly once before a run starts.

use crate::error::{DedupeError, Result};

/// Upper bound K is clamped to; the search never benefits from wider
/// combinations than this in practice. `combgen::K_MAX` is the generator's
/// own (wider) hard ceiling.
pub const MAX_K_CAP: usize = 6;

/// The configuration knobs as supplied by a caller (CLI flags, defaults,
/// ...), before validation/clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawConfig {
    pub allow_gpu: bool,
    pub min_gain_mb: f64,
    pub min_bucket_size: u64,
    pub kick_size: usize,
    pub local_size: usize,
    pub max_k: usize,
    pub max_levels: usize,
    pub max_iterations: usize,
    pub max_bucket_splits: u32,
    pub merge_across_levels: bool,
    pub verbosity: u8,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            allow_gpu: true,
            min_gain_mb: 5.0,
            min_bucket_size: 512 * 1024,
            kick_size: 65536,
            local_size: 256,
            max_k: 4,
            max_levels: 3,
            max_iterations: 1024,
            max_bucket_splits: 25,
            merge_across_levels: true,
            verbosity: 1,
        }
    }
}

/// A validated, clamped [`RawConfig`], ready to drive a run. Constructed
/// only through [`RunConfig::from_raw`], so every live instance has
/// already survived power-of-two and range checks on its fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    pub allow_gpu: bool,
    pub min_gain_bytes: u64,
    pub min_bucket_size: u64,
    pub kick_size: usize,
    pub local_size: usize,
    pub max_k: usize,
    pub max_levels: usize,
    pub max_iterations: usize,
    pub max_bucket_splits: u32,
    pub merge_across_levels: bool,
    pub verbosity: u8,
}

impl RunConfig {
    /// Validates and clamps `raw`. `device_max_local_size` is the scoring
    /// backend's work-group size cap (1 for a CPU-only backend).
    pub fn from_raw(raw: RawConfig, device_max_local_size: usize) -> Result<Self> {
        if !raw.kick_size.is_power_of_two() || raw.kick_size == 0 {
            return Err(DedupeError::Config(format!(
                "kick_size {} is not a power of two",
                raw.kick_size
            )));
        }

        let mut local_size = raw.local_size.max(1);
        if !local_size.is_power_of_two() {
            return Err(DedupeError::Config(format!(
                "local_size {local_size} is not a power of two"
            )));
        }

        if local_size > device_max_local_size {
            tracing::warn!(
                requested = local_size,
                cap = device_max_local_size,
                "local workgroup size reduced to device cap"
            );
            local_size = device_max_local_size;
        }
        if !raw.allow_gpu && local_size != 1 {
            tracing::warn!(requested = local_size, "local workgroup size for CPU forced to 1");
            local_size = 1;
        }

        let mut max_k = raw.max_k;
        if max_k > MAX_K_CAP {
            tracing::warn!(requested = max_k, cap = MAX_K_CAP, "K too high, limiting");
            max_k = MAX_K_CAP;
        }
        if max_k < 2 {
            return Err(DedupeError::Config(format!("max_k {max_k} must be at least 2")));
        }

        let min_gain_bytes = (raw.min_gain_mb * 1024.0 * 1024.0) as u64;

        Ok(Self {
            allow_gpu: raw.allow_gpu,
            min_gain_bytes,
            min_bucket_size: raw.min_bucket_size,
            kick_size: raw.kick_size,
            local_size,
            max_k,
            max_levels: raw.max_levels,
            max_iterations: raw.max_iterations,
            max_bucket_splits: raw.max_bucket_splits,
            merge_across_levels: raw.merge_across_levels,
            verbosity: raw.verbosity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        let cfg = RunConfig::from_raw(RawConfig::default(), 256).unwrap();
        assert_eq!(cfg.max_k, 4);
        assert_eq!(cfg.local_size, 256);
        assert_eq!(cfg.min_gain_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn non_power_of_two_kick_size_is_a_config_error() {
        let raw = RawConfig { kick_size: 100, ..RawConfig::default() };
        assert!(matches!(RunConfig::from_raw(raw, 256), Err(DedupeError::Config(_))));
    }

    #[test]
    fn non_power_of_two_local_size_is_a_config_error() {
        let raw = RawConfig { local_size: 100, ..RawConfig::default() };
        assert!(matches!(RunConfig::from_raw(raw, 256), Err(DedupeError::Config(_))));
    }

    #[test]
    fn max_k_above_cap_is_clamped_not_an_error() {
        let raw = RawConfig { max_k: 8, ..RawConfig::default() };
        let cfg = RunConfig::from_raw(raw, 256).unwrap();
        assert_eq!(cfg.max_k, MAX_K_CAP);
    }

    #[test]
    fn local_size_above_device_cap_is_clamped() {
        let raw = RawConfig { local_size: 512, ..RawConfig::default() };
        let cfg = RunConfig::from_raw(raw, 64).unwrap();
        assert_eq!(cfg.local_size, 64);
    }

    #[test]
    fn cpu_backend_forces_local_size_to_one() {
        let raw = RawConfig { allow_gpu: false, local_size: 256, ..RawConfig::default() };
        let cfg = RunConfig::from_raw(raw, 256).unwrap();
        assert_eq!(cfg.local_size, 1);
    }
}
