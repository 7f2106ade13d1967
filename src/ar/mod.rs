//! # Augmented-reality session and placement
//!
//! The tracking platform is consumed through [`XrPlatform`]; everything else
//! here is platform independent:
//!
//! - [`session`] requests a session and acquires its spaces and hit-test source
//! - [`reticle`] moves the reticle onto the first surface hit each frame
//! - [`placement`] copies the reticle pose onto the model on select
//! - [`context`] owns all of the above and serializes their inputs
//!
//! [`simulated`] provides a platform that ray-casts against virtual surfaces.

pub mod context;
pub mod events;
pub mod placement;
pub mod platform;
pub mod pose;
pub mod reticle;
pub mod session;
pub mod simulated;

pub use context::{ArContext, FrameStats, ModelStatus};
pub use events::{ArEvent, EventQueue};
pub use placement::{OrientationMode, PlacementController, PlacementOutcome};
pub use platform::{
    FeatureRequest, HitTestResult, HitTestSource, PlatformError, ReferenceSpace,
    ReferenceSpaceKind, SessionFeature, SessionHandle, SessionMode, XrFrame, XrPlatform,
};
pub use pose::Pose;
pub use reticle::{HitTestReticle, ReticleUpdate};
pub use session::{ActiveSession, SessionController, SessionError, SessionState};
pub use simulated::{FailurePoint, SimulatedPlatform, SurfaceRect, ViewerRig};
