//! Structured events for rewrite and summary operations.
//!
//! Each emitter logs one `info!` event with an `event` field naming it, so
//! JSON output can be filtered by event name. [`FileSpan`] scopes them to the
//! build file being processed.

use tracing::info;

/// RAII guard for a span tagged with the build file path.
///
/// ```ignore
/// let _span = FileSpan::enter("services/api/Dockerfile");
/// // events below carry file = "services/api/Dockerfile"
/// ```
pub struct FileSpan {
    _span: tracing::span::EnteredSpan,
}

impl FileSpan {
    pub fn enter(path: &str) -> Self {
        let span = tracing::info_span!("dockpin.file", file = %path);
        Self {
            _span: span.entered(),
        }
    }
}

/// Base-image declarations were rewritten.
pub fn emit_from_rewritten(rewritten: usize, total: usize) {
    info!(event = "from.rewritten", rewritten = rewritten, total = total);
}

/// Package pinning for one layer finished.
pub fn emit_packages_pinned(layer: usize, instructions: usize, changes: usize) {
    info!(
        event = "packages.pinned",
        layer = layer,
        instructions = instructions,
        changes = changes,
    );
}

/// A diff list was folded down to `output` entries.
pub fn emit_diff_aggregated(input: usize, output: usize, limit: usize) {
    info!(
        event = "diff.aggregated",
        input = input,
        output = output,
        limit = limit,
    );
}
