//! App events
//!
//! Fanned out over a broadcast channel after state changes so UI shells
//! re-render and internal listeners re-run their explicit triggers.

/// Event emitted by the app core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Categories collection was replaced by a new snapshot
    CategoriesChanged,
    /// Products collection was replaced by a new snapshot
    ProductsChanged,
    /// A subscription degraded; its collection shows empty with a warning
    SyncWarning(String),
}
