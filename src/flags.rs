// This module encapsulates the bitflags API
// so that we don't leak details that may
// affect semver later on.

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    struct NodeBitFlags: u32 {
        const EMPTY = 0;
        const IS_SAMPLE = 1 << 1;
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    struct SweepBitFlags: u32 {
        const EMPTY = 0;
        const CENTRE = 1 << 1;
        const INTERNAL_CHECKS = 1 << 2;
    }
}

#[repr(transparent)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeFlags(NodeBitFlags);

impl NodeFlags {
    pub fn sample() -> Self {
        Self(NodeBitFlags::IS_SAMPLE)
    }

    pub fn is_sample(&self) -> bool {
        self.0.contains(NodeBitFlags::IS_SAMPLE)
    }
}

/// Options controlling a sweep.
///
/// The default is uncentred with no internal checks.
#[repr(transparent)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct SweepOptions(SweepBitFlags);

impl SweepOptions {
    /// Subtract column means from the weights before the sweep
    /// and from each window's output afterwards.
    pub fn with_centre(self) -> Self {
        Self(self.0 | SweepBitFlags::CENTRE)
    }

    /// Verify forest invariants while sweeping and report
    /// failures as errors rather than debug assertions.
    pub fn with_internal_checks(self) -> Self {
        Self(self.0 | SweepBitFlags::INTERNAL_CHECKS)
    }

    pub fn centre(&self) -> bool {
        self.0.contains(SweepBitFlags::CENTRE)
    }

    pub fn internal_checks(&self) -> bool {
        self.0.contains(SweepBitFlags::INTERNAL_CHECKS)
    }
}
