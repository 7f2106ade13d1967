//! Narrow interface to the spatial-tracking platform.
//!
//! The coordination core only needs session lifecycle, reference-space
//! resolution, hit-test source subscription and the per-frame hit-test query.
//! Everything else about tracking is the platform's business.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::pose::Pose;

/// Opaque id of a platform session instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    ImmersiveAr,
}

/// Features a session can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionFeature {
    HitTest,
    Local,
    LocalFloor,
    DomOverlay,
    Anchors,
}

impl SessionFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionFeature::HitTest => "hit-test",
            SessionFeature::Local => "local",
            SessionFeature::LocalFloor => "local-floor",
            SessionFeature::DomOverlay => "dom-overlay",
            SessionFeature::Anchors => "anchors",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequest {
    pub required: Vec<SessionFeature>,
    pub optional: Vec<SessionFeature>,
}

/// Coordinate frames the core asks for.
///
/// `Viewer` moves with the device and is used to cast hit-test rays; `Local`
/// is world-stable and is what hit results and placed objects are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceKind {
    Viewer,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpace {
    pub kind: ReferenceSpaceKind,
    pub session: SessionHandle,
}

/// Hit-test subscription tied to the session that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestSource {
    pub id: u64,
    pub session: SessionHandle,
    pub space: ReferenceSpaceKind,
}

/// Token handed to the per-frame callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XrFrame {
    pub session: SessionHandle,
    pub index: u64,
    pub time_ms: f64,
}

/// One ranked intersection between the hit-test ray and a tracked surface.
///
/// The pose is held in the platform's tracking coordinates; use
/// [`XrPlatform::resolve_pose`] to express it in a reference space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pub session: SessionHandle,
    pub tracking_pose: Pose,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlatformError {
    #[error("the user declined the session request")]
    Declined,
    #[error("required feature not available: {0}")]
    FeatureUnavailable(&'static str),
    #[error("reference space {0:?} could not be created")]
    ReferenceSpaceUnavailable(ReferenceSpaceKind),
    #[error("hit-test source request rejected: {0}")]
    HitTestRejected(String),
    #[error("{0} is not active")]
    SessionNotActive(SessionHandle),
    #[error("platform failure: {0}")]
    Other(String),
}

/// Host platform providing spatial tracking.
///
/// Asynchronous calls complete on the same cooperative thread that delivers
/// frames and input, so implementations may use interior mutability freely.
pub trait XrPlatform {
    fn is_session_supported(&self, mode: SessionMode) -> bool;

    fn request_session(
        &self,
        mode: SessionMode,
        features: &FeatureRequest,
    ) -> impl Future<Output = Result<SessionHandle, PlatformError>>;

    fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> impl Future<Output = Result<ReferenceSpace, PlatformError>>;

    fn request_hit_test_source(
        &self,
        session: SessionHandle,
        space: &ReferenceSpace,
    ) -> impl Future<Output = Result<HitTestSource, PlatformError>>;

    /// Ranked results for this frame, best first. Empty when nothing was hit.
    fn hit_test_results(&self, frame: &XrFrame, source: &HitTestSource) -> Vec<HitTestResult>;

    /// Expresses a result's pose in `space`, or `None` if the platform cannot
    /// relate the two this frame.
    fn resolve_pose(&self, result: &HitTestResult, space: &ReferenceSpace) -> Option<Pose>;

    /// Viewer (camera) pose for this frame expressed in `space`
    fn viewer_pose(&self, _frame: &XrFrame, _space: &ReferenceSpace) -> Option<Pose> {
        None
    }

    fn cancel_hit_test_source(&self, _source: &HitTestSource) {}

    fn end_session(&self, session: SessionHandle);
}
