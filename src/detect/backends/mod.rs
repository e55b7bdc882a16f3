pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::{FixedClassifier, FixtureDetector};

#[cfg(feature = "backend-tract")]
pub use tract::{TractDetector, TractLightClassifier};
