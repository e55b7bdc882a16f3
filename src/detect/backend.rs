use anyhow::Result;

use crate::detect::result::DetectorOutput;
use crate::preprocess::{ClassifierInput, DetectorInput};

/// Object detector backend.
///
/// Treated as a pure, synchronous function from a preprocessed tensor to the three
/// parallel output arrays. Inference blocks; there is no deadline.
pub trait ObjectDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one preprocessed frame.
    fn detect(&mut self, input: &DetectorInput) -> Result<DetectorOutput>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Traffic light colour classifier backend.
///
/// Returns the raw sigmoid output in [0, 1]; callers map it with `LightColor::from_score`.
pub trait LightClassifier: Send {
    fn name(&self) -> &'static str;

    fn classify(&mut self, input: &ClassifierInput) -> Result<f32>;
}

impl<T: ObjectDetector + ?Sized> ObjectDetector for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&mut self, input: &DetectorInput) -> Result<DetectorOutput> {
        (**self).detect(input)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }
}

impl<T: LightClassifier + ?Sized> LightClassifier for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn classify(&mut self, input: &ClassifierInput) -> Result<f32> {
        (**self).classify(input)
    }
}
