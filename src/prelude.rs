//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use mcuq::prelude::*;
//! ```

pub use crate::error::UqError;
pub use crate::falsification::{
    ConsistencyRule, Envelope, FalsificationConfig, FalsificationReport, PcaBasis,
    PriorFalsification,
};
pub use crate::neighbors::{DistanceMetric, Weighting};
pub use crate::posterior::{
    CalibrationModel, EmpiricalPosteriorSampler, Jitter, MarginalWindowSampler, NeighborPolicy,
    PosteriorSampleSet, PosteriorSampler,
};
pub use crate::primitives::Matrix;
pub use crate::traits::{InverseMapping, Transformer};
pub use crate::workflow::{UqWorkflow, WorkflowOutcome};
