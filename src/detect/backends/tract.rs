#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{LightClassifier, ObjectDetector};
use crate::detect::result::DetectorOutput;
use crate::preprocess::{
    ClassifierInput, DetectorInput, CLASSIFIER_INPUT_SIZE, DETECTOR_INPUT_SIZE,
};

type Plan = TypedRunnableModel<TypedModel>;

fn load_plan(model_path: &Path, input: InferenceFact) -> Result<Plan> {
    tract_onnx::onnx()
        .model_for_path(model_path)
        .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
        .with_input_fact(0, input)
        .context("failed to set input fact")?
        .into_optimized()
        .context("failed to optimize ONNX model")?
        .into_runnable()
        .context("failed to build runnable ONNX model")
}

fn output_values(outputs: &TVec<TValue>, index: usize) -> Result<Vec<f32>> {
    let output = outputs
        .get(index)
        .ok_or_else(|| anyhow!("model produced no output #{}", index))?;
    let view = output
        .to_array_view::<f32>()
        .with_context(|| format!("model output #{} was not f32", index))?;
    Ok(view.iter().copied().collect())
}

/// SSD-MobileNet detector running on tract.
///
/// Input: [1, 300, 300, 3] u8 (NHWC). Outputs 0..=2: locations [1, N, 4],
/// classes [1, N], scores [1, N]. Any further outputs (detection count) are ignored.
pub struct TractDetector {
    model: Plan,
}

impl TractDetector {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let size = DETECTOR_INPUT_SIZE as usize;
        let model = load_plan(
            model_path.as_ref(),
            InferenceFact::dt_shape(u8::datum_type(), tvec!(1, size, size, 3)),
        )?;
        Ok(Self { model })
    }
}

impl ObjectDetector for TractDetector {
    fn name(&self) -> &'static str {
        "tract-ssd"
    }

    fn detect(&mut self, input: &DetectorInput) -> Result<DetectorOutput> {
        let tensor = tract_ndarray::Array4::from_shape_vec(
            (1, input.height as usize, input.width as usize, 3),
            input.pixels().to_vec(),
        )
        .context("detector input does not match its shape")?
        .into_tensor();
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("detector inference failed")?;

        let output = DetectorOutput {
            locations: output_values(&outputs, 0)?,
            classes: output_values(&outputs, 1)?,
            scores: output_values(&outputs, 2)?,
        };
        output.validate()?;
        Ok(output)
    }

    /// One inference on a black frame so the first real frame is not slowed by
    /// tract's lazy allocations.
    fn warm_up(&mut self) -> Result<()> {
        self.detect(&DetectorInput::blank()).map(|_| ())
    }
}

/// Binary traffic light CNN running on tract.
///
/// Input: [1, 64, 64, 3] f32 in [0, 1]. Output: [1, 1] sigmoid.
pub struct TractLightClassifier {
    model: Plan,
}

impl TractLightClassifier {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let size = CLASSIFIER_INPUT_SIZE as usize;
        let model = load_plan(
            model_path.as_ref(),
            InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, 3)),
        )?;
        Ok(Self { model })
    }
}

impl LightClassifier for TractLightClassifier {
    fn name(&self) -> &'static str {
        "tract-light-cnn"
    }

    fn classify(&mut self, input: &ClassifierInput) -> Result<f32> {
        let size = input.size as usize;
        let tensor =
            tract_ndarray::Array4::from_shape_vec((1, size, size, 3), input.values().to_vec())
                .context("classifier input does not match its shape")?
                .into_tensor();
        let outputs = self
            .model
            .run(tvec!(tensor.into()))
            .context("classifier inference failed")?;
        output_values(&outputs, 0)?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("classifier produced an empty output"))
    }
}
