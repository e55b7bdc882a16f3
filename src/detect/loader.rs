//! Model loading.
//!
//! A model that fails to load is logged and its feature disabled: without a detector
//! frames only go through the brightness heuristic, without a classifier traffic
//! lights are drawn but not classified. Nothing is retried.

use std::path::Path;

use crate::config::ModelSettings;

use super::backend::{LightClassifier, ObjectDetector};
use super::backends::FixtureDetector;

/// Build the configured detector, preferring a model file over a JSON fixture.
pub fn load_detector(models: &ModelSettings) -> Option<Box<dyn ObjectDetector>> {
    let loaded = if let Some(path) = &models.detector {
        load_detector_model(path)
    } else if let Some(path) = &models.detector_fixture {
        FixtureDetector::from_json_file(path)
            .map(|detector| Box::new(detector) as Box<dyn ObjectDetector>)
    } else {
        log::warn!("no detector configured; object detection disabled");
        return None;
    };

    match loaded {
        Ok(mut detector) => {
            if let Err(e) = detector.warm_up() {
                log::warn!("detector {} warm-up failed: {:#}", detector.name(), e);
            }
            log::info!("detector backend: {}", detector.name());
            Some(detector)
        }
        Err(e) => {
            log::error!("detector failed to load, object detection disabled: {:#}", e);
            None
        }
    }
}

/// Build the configured traffic light classifier.
pub fn load_classifier(models: &ModelSettings) -> Option<Box<dyn LightClassifier>> {
    let path = match &models.classifier {
        Some(path) => path,
        None => {
            log::warn!("no traffic light classifier configured; light colour disabled");
            return None;
        }
    };
    match load_classifier_model(path) {
        Ok(classifier) => {
            log::info!("classifier backend: {}", classifier.name());
            Some(classifier)
        }
        Err(e) => {
            log::error!("classifier failed to load, light colour disabled: {:#}", e);
            None
        }
    }
}

#[cfg(feature = "backend-tract")]
fn load_detector_model(path: &Path) -> anyhow::Result<Box<dyn ObjectDetector>> {
    Ok(Box::new(super::backends::TractDetector::new(path)?))
}

#[cfg(not(feature = "backend-tract"))]
fn load_detector_model(path: &Path) -> anyhow::Result<Box<dyn ObjectDetector>> {
    anyhow::bail!(
        "detector model {} requires the backend-tract feature",
        path.display()
    )
}

#[cfg(feature = "backend-tract")]
fn load_classifier_model(path: &Path) -> anyhow::Result<Box<dyn LightClassifier>> {
    Ok(Box::new(super::backends::TractLightClassifier::new(path)?))
}

#[cfg(not(feature = "backend-tract"))]
fn load_classifier_model(path: &Path) -> anyhow::Result<Box<dyn LightClassifier>> {
    anyhow::bail!(
        "classifier model {} requires the backend-tract feature",
        path.display()
    )
}
