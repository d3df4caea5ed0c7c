use serde::{Deserialize, Serialize};

/// Opening/closing sequence pair of an accepted root element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootElement {
    pub open: String,
    pub close: String,
}

impl RootElement {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Trigger and terminator table for one artifact language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Fenced-code-block opener, e.g. "```xml"
    pub fence_open: String,
    /// Fenced-code-block closer
    pub fence_close: String,
    /// Root elements in preference order
    pub roots: Vec<RootElement>,
    /// Leading declaration, e.g. "<?xml"
    pub declaration: String,
    /// Substring every accepted artifact must contain
    pub required_marker: String,
}

impl ArtifactSpec {
    /// draw.io diagram markup
    pub fn drawio() -> Self {
        Self {
            fence_open: "```xml".to_string(),
            fence_close: "```".to_string(),
            roots: vec![
                RootElement::new("<mxfile", "</mxfile>"),
                RootElement::new("<mxGraphModel", "</mxGraphModel>"),
            ],
            declaration: "<?xml".to_string(),
            required_marker: "mxGraphModel".to_string(),
        }
    }

    /// Every sequence that starts capture
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fence_open.as_str()).chain(self.markup_triggers())
    }

    /// Triggers that begin the markup itself (no fence)
    pub fn markup_triggers(&self) -> impl Iterator<Item = &str> {
        self.roots
            .iter()
            .map(|r| r.open.as_str())
            .chain(std::iter::once(self.declaration.as_str()))
    }

    pub fn longest_trigger(&self) -> usize {
        self.triggers().map(str::len).max().unwrap_or(0)
    }
}

impl Default for ArtifactSpec {
    fn default() -> Self {
        Self::drawio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawio_triggers() {
        let spec = ArtifactSpec::drawio();
        let triggers: Vec<&str> = spec.triggers().collect();

        assert_eq!(triggers, vec!["```xml", "<mxfile", "<mxGraphModel", "<?xml"]);
        assert_eq!(spec.longest_trigger(), "<mxGraphModel".len());
    }
}
