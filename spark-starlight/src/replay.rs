use crate::detect::edge::EdgeEstimate;
use crate::detect::property::detection::RawDetection;
use crate::pipeline::EdgeInput;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ReplayEdges {
    pub left: Option<u32>,
    pub right: Option<u32>,
}

/// One recorded frame of classifier output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplayFrame {
    /// Seconds since the start of the recording.
    pub t: f64,
    #[serde(default)]
    pub primary: Vec<RawDetection>,
    #[serde(default)]
    pub secondary: Vec<RawDetection>,
    #[serde(default)]
    pub edges: Option<ReplayEdges>,
}

impl ReplayFrame {
    pub fn edge_input(&self) -> EdgeInput<'static> {
        match self.edges {
            Some(edges) => EdgeInput::Estimated(EdgeEstimate::new(edges.left, edges.right)),
            None => EdgeInput::Unavailable,
        }
    }
}

/// Parses JSON lines, one frame per line. Blank lines are skipped.
pub fn parse_replay(text: &str) -> Result<Vec<ReplayFrame>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<ReplayFrame>(line)
                .with_context(|| format!("invalid replay frame on line {}", index + 1))
        })
        .collect()
}

pub fn load_replay(path: impl AsRef<Path>) -> Result<Vec<ReplayFrame>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read replay {:?}", path))?;
    parse_replay(&text).with_context(|| format!("failed to parse replay {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::property::bbox::BBox;

    #[test]
    fn parses_frames() -> Result<()> {
        let text = r#"
{"t": 0.0, "primary": [{"kind": "pothole", "confidence": 0.9, "bbox": [500, 600, 700, 700]}]}

{"t": 0.033, "secondary": [{"kind": "curb", "confidence": 0.4, "bbox": [0, 500, 100, 700]}], "edges": {"left": 200}}
"#;
        let frames = parse_replay(text)?;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].primary[0].bbox, BBox::new(500, 600, 700, 700));
        assert!(frames[0].secondary.is_empty());
        assert!(matches!(frames[0].edge_input(), EdgeInput::Unavailable));
        assert_eq!(
            frames[1].edges,
            Some(ReplayEdges {
                left: Some(200),
                right: None
            })
        );
        Ok(())
    }

    #[test]
    fn reports_the_bad_line() {
        let text = "{\"t\": 0.0}\n{\"t\": \"soon\"}\n";
        let message = format!("{:#}", parse_replay(text).unwrap_err());
        assert!(message.contains("line 2"), "{}", message);
    }
}
