//! CPU feature probe.
//!
//! `detect_capabilities()` is called once and cached in a process-scoped
//! [`once_cell::sync::OnceCell`], mirroring the singleton pattern the pack
//! uses for expensive one-time hardware probes. Probing never fails: any
//! detection error or unsupported platform falls back to [`CpuCapabilities::scalar`].

use once_cell::sync::OnceCell;

/// Vector width in bytes the structural scanner should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorWidth {
    Scalar,
    Bits128,
    Bits256,
    Bits512,
}

impl VectorWidth {
    pub fn bytes(self) -> usize {
        match self {
            VectorWidth::Scalar => 1,
            VectorWidth::Bits128 => 16,
            VectorWidth::Bits256 => 32,
            VectorWidth::Bits512 => 64,
        }
    }
}

/// Immutable, process-scope record of what the current CPU can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCapabilities {
    pub vector_width: VectorWidth,
    pub has_byte_compare_mask: bool,
    pub has_horizontal_or: bool,
}

impl CpuCapabilities {
    pub const fn scalar() -> Self {
        Self {
            vector_width: VectorWidth::Scalar,
            has_byte_compare_mask: false,
            has_horizontal_or: false,
        }
    }
}

static CAPABILITIES: OnceCell<CpuCapabilities> = OnceCell::new();

/// Detect and cache the CPU capability record. Preference order: 512-bit
/// masked SIMD, 256-bit byte-wide compares, 128-bit SIMD, ARM NEON 128-bit,
/// scalar fallback. Never returns an error — a failed probe degrades to
/// [`CpuCapabilities::scalar`].
pub fn detect_capabilities() -> CpuCapabilities {
    *CAPABILITIES.get_or_init(probe)
}

#[cfg(target_arch = "x86_64")]
fn probe() -> CpuCapabilities {
    let caps = if is_x86_feature_detected!("avx512bw") && is_x86_feature_detected!("avx512f") {
        CpuCapabilities {
            vector_width: VectorWidth::Bits512,
            has_byte_compare_mask: true,
            has_horizontal_or: true,
        }
    } else if is_x86_feature_detected!("avx2") {
        CpuCapabilities {
            vector_width: VectorWidth::Bits256,
            has_byte_compare_mask: true,
            has_horizontal_or: true,
        }
    } else if is_x86_feature_detected!("sse2") {
        CpuCapabilities {
            vector_width: VectorWidth::Bits128,
            has_byte_compare_mask: true,
            has_horizontal_or: is_x86_feature_detected!("ssse3"),
        }
    } else {
        CpuCapabilities::scalar()
    };
    tracing::debug!(?caps, "cpu capability probe (x86_64)");
    caps
}

#[cfg(target_arch = "aarch64")]
fn probe() -> CpuCapabilities {
    let caps = if std::arch::is_aarch64_feature_detected!("neon") {
        CpuCapabilities {
            vector_width: VectorWidth::Bits128,
            has_byte_compare_mask: true,
            has_horizontal_or: true,
        }
    } else {
        CpuCapabilities::scalar()
    };
    tracing::debug!(?caps, "cpu capability probe (aarch64)");
    caps
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe() -> CpuCapabilities {
    tracing::debug!("cpu capability probe: unsupported architecture, falling back to scalar");
    CpuCapabilities::scalar()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_is_idempotent_and_cached() {
        let a = detect_capabilities();
        let b = detect_capabilities();
        assert_eq!(a, b);
    }

    #[test]
    fn scalar_has_width_one() {
        assert_eq!(CpuCapabilities::scalar().vector_width.bytes(), 1);
    }
}
