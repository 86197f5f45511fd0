//! Structured prompt input for reasoner calls.

/// The structured input for one reasoner call: a system instruction plus an
/// ordered list of labeled sections.
///
/// Sections render as `[LABEL]` blocks so callers can hand the reasoner a
/// predictable layout regardless of backend:
///
/// ```text
/// [QUESTION]
/// how many missing values?
///
/// [PROFILE]
/// {"rows":100,...}
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    system: String,
    sections: Vec<Section>,
}

#[derive(Debug, Clone)]
struct Section {
    label: String,
    content: String,
}

impl PromptContext {
    /// Create a context with the given system instruction.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            sections: Vec::new(),
        }
    }

    /// Append a labeled section. Labels are uppercased in the rendered output.
    pub fn section(mut self, label: impl Into<String>, content: impl Into<String>) -> Self {
        self.sections.push(Section {
            label: label.into().to_uppercase(),
            content: content.into(),
        });
        self
    }

    /// The system instruction.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Whether any sections have been added.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the sections into a single prompt body.
    pub fn rendered(&self) -> String {
        let parts: Vec<String> = self
            .sections
            .iter()
            .map(|s| format!("[{}]\n{}", s.label, s.content))
            .collect();
        parts.join("\n\n")
    }
}
