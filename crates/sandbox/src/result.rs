//! The outcome of one sandbox execution.

/// Outcome of one sandbox run.
///
/// Constructors enforce the invariants consumers rely on: an image is only
/// ever present on success, and an error detail is present exactly when the
/// run failed. A successful run that drew no chart is still a success with
/// no image - not every question needs one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    success: bool,
    image: Option<Vec<u8>>,
    error: Option<String>,
    output: Vec<String>,
}

impl ExecutionResult {
    /// A run that finished without raising, with an optional rendered chart.
    pub fn completed(image: Option<Vec<u8>>, output: Vec<String>) -> Self {
        Self {
            success: true,
            image,
            error: None,
            output,
        }
    }

    /// A run that raised or hit a ceiling.
    pub fn failed(error: impl Into<String>, output: Vec<String>) -> Self {
        Self {
            success: false,
            image: None,
            error: Some(error.into()),
            output,
        }
    }

    /// Whether the run finished without raising.
    pub fn success(&self) -> bool {
        self.success
    }

    /// PNG bytes of the rendered chart, if one was produced.
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// Error detail, present exactly when the run failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lines printed by the script, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Consume the result, returning the chart bytes if any.
    pub fn into_image(self) -> Option<Vec<u8>> {
        self.image
    }
}
