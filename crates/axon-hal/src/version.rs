//! HAL interface versions and their ordering.

use std::fmt;

/// Version tag of the hardware abstraction layer interface.
///
/// Versions are totally ordered and each later version is a strict superset
/// of the earlier operand and operation repertoires, so any value tagged with
/// one version can be re-tagged with a later version without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HalVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
}

impl HalVersion {
    /// The most recent interface version.
    pub const LATEST: HalVersion = HalVersion::V1_3;

    /// Whether non-constant tensor operands may omit their rank at this version.
    pub fn allows_unspecified_rank(self) -> bool {
        self >= HalVersion::V1_2
    }

    /// Whether request outputs may leave dimensions unspecified at this version.
    pub fn allows_unspecified_output(self) -> bool {
        self >= HalVersion::V1_2
    }

    /// Whether models may carry referenced subgraphs at this version.
    pub fn allows_referenced_subgraphs(self) -> bool {
        self >= HalVersion::V1_3
    }
}

impl fmt::Display for HalVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HalVersion::V1_0 => "1.0",
            HalVersion::V1_1 => "1.1",
            HalVersion::V1_2 => "1.2",
            HalVersion::V1_3 => "1.3",
        };
        f.write_str(s)
    }
}
