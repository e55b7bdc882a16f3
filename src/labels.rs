//! Class label lookup for detector output.
//!
//! Label files hold one label per line; the line number is the class index. Unused
//! slots are marked `???`, and blank lines are kept as `???` so indices stay aligned.

use anyhow::{Context, Result};
use std::path::Path;

/// Placeholder used by SSD label maps for unused class slots.
pub const UNUSED_LABEL: &str = "???";

const BUILTIN_LABELS: &str = include_str!("../assets/labels.txt");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// COCO label map matching the bundled SSD-MobileNet detector.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_LABELS)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        let labels = Self::parse(&raw);
        log::info!("loaded {} labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    pub fn parse(raw: &str) -> Self {
        let labels = raw
            .lines()
            .map(|line| match line.trim() {
                "" => UNUSED_LABEL.to_string(),
                label => label.to_string(),
            })
            .collect();
        Self { labels }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a float-encoded class index (truncated toward zero).
    pub fn get(&self, class_index: f32) -> Option<&str> {
        if !class_index.is_finite() || class_index < 0.0 {
            return None;
        }
        self.labels
            .get(class_index as usize)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_map_resolves_road_classes() {
        let labels = LabelMap::builtin();
        assert_eq!(labels.get(0.0), Some("person"));
        assert_eq!(labels.get(2.0), Some("car"));
        assert_eq!(labels.get(7.0), Some("truck"));
        assert_eq!(labels.get(9.0), Some("traffic light"));
    }

    #[test]
    fn float_indices_truncate() {
        let labels = LabelMap::from_labels(["a", "b"]);
        assert_eq!(labels.get(1.9), Some("b"));
        assert_eq!(labels.get(2.0), None);
        assert_eq!(labels.get(-1.0), None);
        assert_eq!(labels.get(f32::NAN), None);
    }

    #[test]
    fn blank_lines_keep_slots() {
        let labels = LabelMap::parse("person\n\n  car  \n\n");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.get(1.0), Some(UNUSED_LABEL));
        assert_eq!(labels.get(2.0), Some("car"));
        assert_eq!(labels.get(3.0), Some(UNUSED_LABEL));
    }

    #[test]
    fn trailing_unused_slots_resolve_like_interior_ones() {
        let labels = LabelMap::parse("???\nperson\n???\n???\n");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.get(0.0), Some(UNUSED_LABEL));
        assert_eq!(labels.get(2.0), Some(UNUSED_LABEL));
        assert_eq!(labels.get(3.0), Some(UNUSED_LABEL));
        assert_eq!(labels.get(4.0), None);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = LabelMap::load("/nonexistent/labels.txt").unwrap_err();
        assert!(err.to_string().contains("failed to read label file"));
    }
}
