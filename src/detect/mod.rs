mod backend;
mod backends;
mod loader;
mod result;

pub use backend::{LightClassifier, ObjectDetector};
pub use backends::{FixedClassifier, FixtureDetector};
#[cfg(feature = "backend-tract")]
pub use backends::{TractDetector, TractLightClassifier};
pub use loader::{load_classifier, load_detector};
pub use result::{BoundingBox, Detection, DetectorOutput, LightColor, PixelBox};
