use std::path::Path;

use tracing::Span;

use crate::core::types::{CompressionKind, ContentFormat};

/// Diagnostics scope for a single counting invocation.
///
/// Every counter logs under this span, so each line can be traced back to the
/// input it was emitted for. The span closes when the context is dropped.
#[derive(Debug, Clone)]
pub struct CountContext {
    span: Span,
}

impl CountContext {
    #[must_use]
    pub fn new(path: &Path, format: ContentFormat, compression: CompressionKind) -> Self {
        let span = tracing::info_span!(
            "count",
            input = %path.display(),
            format = %format,
            compression = %compression,
        );
        Self { span }
    }

    /// Context that is not attached to any subscriber
    #[must_use]
    pub fn detached() -> Self {
        Self { span: Span::none() }
    }

    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Run `f` with this context's span entered
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}
