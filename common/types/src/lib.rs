pub mod header;
pub mod params;
pub mod tx;

/// How much of a header the import path wants checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Envelope and seal, the full predicate.
    CheckEverything,
    /// Same acceptance as `CheckEverything`; kept as a distinct level so
    /// callers can express intent for queued re-verification.
    QuickNonce,
    /// Headers already on the chain: skip the absolute bound checks
    /// (minimum difficulty, chain gas-limit bounds, extra-data size)
    /// and the seal predicate. The retarget equality and the
    /// parent-relative gas envelope still run.
    CheckNothingNew,
}

/// Which transaction pre-flight checks an import path requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportRequirements {
    pub transaction_signatures: bool,
    pub transaction_basic: bool,
}

impl ImportRequirements {
    pub fn everything() -> Self {
        ImportRequirements {
            transaction_signatures: true,
            transaction_basic: true,
        }
    }

    pub fn none() -> Self {
        ImportRequirements::default()
    }
}
