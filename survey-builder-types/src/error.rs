use crate::PathParseError;

/// Why filling in a survey stopped before completion.
///
/// Answers reported before the failure stay with the host in every case.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// User cancelled the form (Ctrl+C, Escape, ...).
    #[error("Survey cancelled by user")]
    Cancelled,

    /// The renderer addressed an answer with a malformed path.
    #[error("Renderer reported an invalid answer path: {0}")]
    InvalidPath(#[from] PathParseError),

    /// The surface the renderer draws on failed (terminal I/O, ...).
    #[error("{renderer} renderer failed: {source}")]
    Backend {
        renderer: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl RenderError {
    /// Wrap a failure of the named renderer.
    pub fn backend(renderer: &'static str, err: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            renderer,
            source: err.into(),
        }
    }

    /// Check if this error represents user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
