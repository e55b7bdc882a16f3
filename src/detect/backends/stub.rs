use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::path::Path;

use crate::detect::backend::{LightClassifier, ObjectDetector};
use crate::detect::result::DetectorOutput;
use crate::preprocess::{ClassifierInput, DetectorInput};

/// Detector that replays canned outputs instead of running a model.
///
/// Outputs are served in order; the last one repeats once the script runs out.
pub struct FixtureDetector {
    script: VecDeque<DetectorOutput>,
    last: DetectorOutput,
    calls: u64,
}

impl FixtureDetector {
    pub fn new(output: DetectorOutput) -> Self {
        Self::scripted(vec![output])
    }

    pub fn scripted(outputs: Vec<DetectorOutput>) -> Self {
        Self {
            script: outputs.into(),
            last: DetectorOutput::default(),
            calls: 0,
        }
    }

    /// Load a JSON fixture: a single output object or an array of them.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detector fixture {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid detector fixture {}", path.display()))?;
        let outputs: Vec<DetectorOutput> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        if outputs.is_empty() {
            return Err(anyhow!("detector fixture {} is empty", path.display()));
        }
        for output in &outputs {
            output.validate()?;
        }
        Ok(Self::scripted(outputs))
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ObjectDetector for FixtureDetector {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn detect(&mut self, _input: &DetectorInput) -> Result<DetectorOutput> {
        self.calls += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }
}

/// Classifier returning a fixed sigmoid score.
pub struct FixedClassifier {
    score: f32,
}

impl FixedClassifier {
    pub fn new(score: f32) -> Self {
        Self { score }
    }
}

impl LightClassifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn classify(&mut self, input: &ClassifierInput) -> Result<f32> {
        if input.values().is_empty() {
            return Err(anyhow!("classifier input is empty"));
        }
        Ok(self.score)
    }
}
