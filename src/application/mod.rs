// ============================================================
// APPLICATION LAYER
// ============================================================
// Use cases composing the infrastructure building blocks

mod bulk;
mod repairer;

pub use bulk::{BulkProcessor, FsArchiveService, FsFolderSource, ARCHIVE_DIR, CLEAN_DIR, LOG_DIR};
pub use repairer::CsvRepairer;
