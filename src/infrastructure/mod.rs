// ============================================================
// INFRASTRUCTURE LAYER
// ============================================================
// I/O-facing building blocks consumed by the application layer

pub mod csv;
