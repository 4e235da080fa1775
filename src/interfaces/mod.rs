// ============================================================
// INTERFACES LAYER
// ============================================================
// Outward-facing surfaces; currently the CLI only

mod cli;

pub use cli::Cli;
