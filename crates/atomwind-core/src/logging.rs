//! Logging facilities for atomwind.
//!
//! atomwind uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("atomwind_style::resolve=trace")
//!         .init();
//! }
//! ```
//!
//! Every event is emitted under one of the [`targets`] below so subsystems
//! can be filtered independently.

/// Span names used throughout atomwind for tracing. Spans are entered under
/// the matching [`targets`] entry.
pub mod span_names {
    /// Signal emission span.
    pub const SIGNAL: &str = "atomwind::signal";
    /// Style resolution span.
    pub const RESOLVE: &str = "atomwind::resolve";
    /// Atom extraction span.
    pub const EXTRACT: &str = "atomwind::extract";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "atomwind_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "atomwind_core::signal";
    /// CSS front end target.
    pub const CSS: &str = "atomwind_style::css";
    /// Expression parser target.
    pub const EXPR: &str = "atomwind_style::expr";
    /// Atom extractor target.
    pub const EXTRACT: &str = "atomwind_style::extract";
    /// Atom store and runtime state target.
    pub const STORE: &str = "atomwind_style::store";
    /// Resolution engine target.
    pub const RESOLVE: &str = "atomwind_style::resolve";
    /// Consumer binding target.
    pub const BINDING: &str = "atomwind_style::binding";
    /// Hot reload target.
    pub const HOT_RELOAD: &str = "atomwind_style::hot_reload";
}
