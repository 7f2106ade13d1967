//! A tracking platform that ray-casts against configured virtual surfaces.
//!
//! Used by the desktop preview and by tests. The viewer is a simple rig
//! (position + yaw/pitch) and surfaces are bounded planar rectangles; hit-test
//! rays leave the viewer along its -Z axis, like a phone held upright.

use std::cell::RefCell;

use cgmath::{Deg, InnerSpace, Matrix4, Quaternion, Rad, Rotation3, Vector3, Vector4};
use log::{debug, info};

use super::platform::{
    FeatureRequest, HitTestResult, HitTestSource, PlatformError, ReferenceSpace,
    ReferenceSpaceKind, SessionFeature, SessionHandle, SessionMode, XrFrame, XrPlatform,
};
use super::pose::Pose;
use crate::gfx::picking::Ray;

const SUPPORTED_FEATURES: &[SessionFeature] = &[
    SessionFeature::HitTest,
    SessionFeature::Local,
    SessionFeature::LocalFloor,
];

/// Bounded planar surface the simulated tracker "detects"
#[derive(Debug, Clone)]
pub struct SurfaceRect {
    pub name: String,
    pub center: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    /// Half size along `tangent` and along `normal x tangent`
    pub half_extents: (f32, f32),
}

impl SurfaceRect {
    /// Horizontal surface facing up (floor, table top)
    pub fn horizontal(name: &str, center: Vector3<f32>, width: f32, depth: f32) -> Self {
        Self {
            name: name.to_string(),
            center,
            normal: Vector3::unit_y(),
            tangent: Vector3::unit_x(),
            half_extents: (width * 0.5, depth * 0.5),
        }
    }

    /// Vertical surface facing `facing` (walls)
    pub fn vertical(name: &str, center: Vector3<f32>, facing: Vector3<f32>, width: f32, height: f32) -> Self {
        let normal = facing.normalize();
        let tangent = Vector3::unit_y().cross(normal).normalize();
        Self {
            name: name.to_string(),
            center,
            normal,
            tangent,
            half_extents: (width * 0.5, height * 0.5),
        }
    }

    pub fn bitangent(&self) -> Vector3<f32> {
        self.normal.cross(self.tangent)
    }

    /// Distance along the ray and hit point, if the ray crosses the rectangle
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, Vector3<f32>)> {
        let t = ray.intersect_plane(self.center, self.normal)?;
        let point = ray.point_at(t);
        let offset = point - self.center;
        let u = offset.dot(self.tangent);
        let v = offset.dot(self.bitangent());
        if u.abs() <= self.half_extents.0 && v.abs() <= self.half_extents.1 {
            Some((t, point))
        } else {
            None
        }
    }

    /// Pose at `point` whose Y axis is the surface normal
    pub fn pose_at(&self, point: Vector3<f32>) -> Pose {
        let x = self.tangent;
        let y = self.normal;
        let z = x.cross(y);
        Pose::from_matrix(Matrix4::from_cols(
            x.extend(0.0),
            y.extend(0.0),
            z.extend(0.0),
            Vector4::new(point.x, point.y, point.z, 1.0),
        ))
    }

    /// Transform that maps the XZ unit plane onto this surface
    pub fn visual_transform(&self) -> Matrix4<f32> {
        let pose = self.pose_at(self.center);
        pose.matrix()
            * Matrix4::from_nonuniform_scale(
                self.half_extents.0 * 2.0,
                1.0,
                self.half_extents.1 * 2.0,
            )
    }
}

/// Position and heading of the simulated device
#[derive(Debug, Clone, Copy)]
pub struct ViewerRig {
    pub position: Vector3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl ViewerRig {
    const PITCH_LIMIT: f32 = 1.55;

    pub fn new(position: Vector3<f32>, yaw: impl Into<Rad<f32>>, pitch: impl Into<Rad<f32>>) -> Self {
        let mut rig = Self {
            position,
            yaw: yaw.into(),
            pitch: pitch.into(),
        };
        rig.clamp_pitch();
        rig
    }

    pub fn pose(&self) -> Pose {
        let orientation = Quaternion::from_angle_y(self.yaw) * Quaternion::from_angle_x(self.pitch);
        Pose::from_position_orientation(self.position, orientation)
    }

    pub fn look(&mut self, yaw_delta: Rad<f32>, pitch_delta: Rad<f32>) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        self.clamp_pitch();
    }

    /// Moves in the horizontal plane relative to the current heading
    pub fn walk(&mut self, forward: f32, right: f32) {
        let heading = Quaternion::from_angle_y(self.yaw);
        let forward_dir = heading * -Vector3::unit_z();
        let right_dir = heading * Vector3::unit_x();
        self.position += forward_dir * forward + right_dir * right;
    }

    fn clamp_pitch(&mut self) {
        self.pitch.0 = self.pitch.0.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }
}

impl Default for ViewerRig {
    /// Eye height, looking slightly down at the floor ahead
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 1.6, 0.0), Deg(0.0), Deg(-35.0))
    }
}

/// Step at which the next request should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    SessionRequest,
    ViewerSpace,
    LocalSpace,
    HitTestSource,
}

struct SimState {
    supported: bool,
    failure: Option<FailurePoint>,
    next_id: u64,
    active_session: Option<SessionHandle>,
    live_sources: Vec<HitTestSource>,
    frame_index: u64,
    session_requests: u32,
    viewer: ViewerRig,
    local_origin: Pose,
}

pub struct SimulatedPlatform {
    surfaces: Vec<SurfaceRect>,
    frame_interval_ms: f64,
    state: RefCell<SimState>,
}

impl SimulatedPlatform {
    pub fn new(surfaces: Vec<SurfaceRect>) -> Self {
        Self {
            surfaces,
            frame_interval_ms: 1000.0 / 60.0,
            state: RefCell::new(SimState {
                supported: true,
                failure: None,
                next_id: 1,
                active_session: None,
                live_sources: Vec::new(),
                frame_index: 0,
                session_requests: 0,
                viewer: ViewerRig::default(),
                local_origin: Pose::identity(),
            }),
        }
    }

    /// A single 20m x 20m floor at y = 0
    pub fn with_floor() -> Self {
        Self::new(vec![SurfaceRect::horizontal(
            "floor",
            Vector3::new(0.0, 0.0, 0.0),
            20.0,
            20.0,
        )])
    }

    /// Floor, a table ahead of the viewer and a wall behind it
    pub fn preview_room() -> Self {
        Self::new(vec![
            SurfaceRect::horizontal("floor", Vector3::new(0.0, 0.0, 0.0), 8.0, 8.0),
            SurfaceRect::horizontal("table", Vector3::new(0.0, 0.75, -1.5), 1.2, 0.8),
            SurfaceRect::vertical(
                "wall",
                Vector3::new(0.0, 1.25, -4.0),
                Vector3::unit_z(),
                8.0,
                2.5,
            ),
        ])
    }

    pub fn surfaces(&self) -> &[SurfaceRect] {
        &self.surfaces
    }

    pub fn set_supported(&self, supported: bool) {
        self.state.borrow_mut().supported = supported;
    }

    /// Makes the next request at `point` fail once
    pub fn fail_at(&self, point: FailurePoint) {
        self.state.borrow_mut().failure = Some(point);
    }

    /// World-space pose of the `local` reference space origin
    pub fn set_local_origin(&self, origin: Pose) {
        self.state.borrow_mut().local_origin = origin;
    }

    pub fn local_origin(&self) -> Pose {
        self.state.borrow().local_origin
    }

    pub fn viewer(&self) -> ViewerRig {
        self.state.borrow().viewer
    }

    pub fn set_viewer(&self, viewer: ViewerRig) {
        self.state.borrow_mut().viewer = viewer;
    }

    pub fn update_viewer(&self, update: impl FnOnce(&mut ViewerRig)) {
        update(&mut self.state.borrow_mut().viewer);
    }

    /// Viewer pose expressed in the `local` space, which is what the camera follows
    pub fn viewer_pose_local(&self) -> Pose {
        let state = self.state.borrow();
        let world = state.viewer.pose();
        world.relative_to(&state.local_origin).unwrap_or(world)
    }

    pub fn active_session(&self) -> Option<SessionHandle> {
        self.state.borrow().active_session
    }

    pub fn session_requests(&self) -> u32 {
        self.state.borrow().session_requests
    }

    pub fn live_hit_test_sources(&self) -> usize {
        self.state.borrow().live_sources.len()
    }

    /// Produces the next frame token while a session is running
    pub fn next_frame(&self) -> Option<XrFrame> {
        let mut state = self.state.borrow_mut();
        let session = state.active_session?;
        state.frame_index += 1;
        Some(XrFrame {
            session,
            index: state.frame_index,
            time_ms: state.frame_index as f64 * self.frame_interval_ms,
        })
    }

    /// Platform-initiated end (tracking lost, system UI); returns the ended session
    pub fn force_end(&self) -> Option<SessionHandle> {
        let handle = self.state.borrow().active_session?;
        info!("platform ended {}", handle);
        self.end_session(handle);
        Some(handle)
    }

    fn take_failure(&self, point: FailurePoint) -> bool {
        let mut state = self.state.borrow_mut();
        if state.failure == Some(point) {
            state.failure = None;
            true
        } else {
            false
        }
    }

    fn allocate_id(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    fn ensure_active(&self, session: SessionHandle) -> Result<(), PlatformError> {
        if self.state.borrow().active_session == Some(session) {
            Ok(())
        } else {
            Err(PlatformError::SessionNotActive(session))
        }
    }

    fn space_origin(&self, kind: ReferenceSpaceKind) -> Pose {
        let state = self.state.borrow();
        match kind {
            ReferenceSpaceKind::Viewer => state.viewer.pose(),
            ReferenceSpaceKind::Local => state.local_origin,
        }
    }

    /// Ray-casts from the origin of `space` along its -Z axis, nearest hit first
    fn cast(&self, session: SessionHandle, space: ReferenceSpaceKind) -> Vec<HitTestResult> {
        let origin = self.space_origin(space);
        let ray = Ray::new(origin.position(), origin.forward());

        let mut hits: Vec<HitTestResult> = self
            .surfaces
            .iter()
            .filter_map(|surface| {
                surface.intersect(&ray).map(|(distance, point)| HitTestResult {
                    session,
                    tracking_pose: surface.pose_at(point),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl XrPlatform for SimulatedPlatform {
    fn is_session_supported(&self, mode: SessionMode) -> bool {
        match mode {
            SessionMode::ImmersiveAr => self.state.borrow().supported,
        }
    }

    async fn request_session(
        &self,
        _mode: SessionMode,
        features: &FeatureRequest,
    ) -> Result<SessionHandle, PlatformError> {
        self.state.borrow_mut().session_requests += 1;

        if self.take_failure(FailurePoint::SessionRequest) {
            return Err(PlatformError::Declined);
        }
        if let Some(missing) = features
            .required
            .iter()
            .find(|feature| !SUPPORTED_FEATURES.contains(feature))
        {
            return Err(PlatformError::FeatureUnavailable(missing.as_str()));
        }
        if let Some(active) = self.state.borrow().active_session {
            return Err(PlatformError::Other(format!(
                "{} is still running",
                active
            )));
        }

        let handle = SessionHandle(self.allocate_id());
        let mut state = self.state.borrow_mut();
        state.active_session = Some(handle);
        state.frame_index = 0;
        debug!("granted {}", handle);
        Ok(handle)
    }

    async fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> Result<ReferenceSpace, PlatformError> {
        self.ensure_active(session)?;
        let failure = match kind {
            ReferenceSpaceKind::Viewer => FailurePoint::ViewerSpace,
            ReferenceSpaceKind::Local => FailurePoint::LocalSpace,
        };
        if self.take_failure(failure) {
            return Err(PlatformError::ReferenceSpaceUnavailable(kind));
        }
        Ok(ReferenceSpace { kind, session })
    }

    async fn request_hit_test_source(
        &self,
        session: SessionHandle,
        space: &ReferenceSpace,
    ) -> Result<HitTestSource, PlatformError> {
        self.ensure_active(session)?;
        if space.session != session {
            return Err(PlatformError::HitTestRejected(format!(
                "space belongs to {}",
                space.session
            )));
        }
        if self.take_failure(FailurePoint::HitTestSource) {
            return Err(PlatformError::HitTestRejected(
                "hit-test feature was not granted".to_string(),
            ));
        }

        let source = HitTestSource {
            id: self.allocate_id(),
            session,
            space: space.kind,
        };
        self.state.borrow_mut().live_sources.push(source);
        Ok(source)
    }

    fn hit_test_results(&self, frame: &XrFrame, source: &HitTestSource) -> Vec<HitTestResult> {
        let live = {
            let state = self.state.borrow();
            state.active_session == Some(frame.session)
                && source.session == frame.session
                && state.live_sources.iter().any(|s| s.id == source.id)
        };
        if !live {
            return Vec::new();
        }
        self.cast(frame.session, source.space)
    }

    fn resolve_pose(&self, result: &HitTestResult, space: &ReferenceSpace) -> Option<Pose> {
        if space.session != result.session || self.ensure_active(result.session).is_err() {
            return None;
        }
        let origin = self.space_origin(space.kind);
        result.tracking_pose.relative_to(&origin)
    }

    fn viewer_pose(&self, frame: &XrFrame, space: &ReferenceSpace) -> Option<Pose> {
        if frame.session != space.session || self.ensure_active(frame.session).is_err() {
            return None;
        }
        let viewer = self.space_origin(ReferenceSpaceKind::Viewer);
        viewer.relative_to(&self.space_origin(space.kind))
    }

    fn cancel_hit_test_source(&self, source: &HitTestSource) {
        self.state
            .borrow_mut()
            .live_sources
            .retain(|s| s.id != source.id);
    }

    fn end_session(&self, session: SessionHandle) {
        let mut state = self.state.borrow_mut();
        if state.active_session == Some(session) {
            state.active_session = None;
        }
        state.live_sources.retain(|s| s.session != session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(platform: &SimulatedPlatform) -> (SessionHandle, HitTestSource, ReferenceSpace) {
        pollster::block_on(async {
            let session = platform
                .request_session(SessionMode::ImmersiveAr, &FeatureRequest::default())
                .await
                .unwrap();
            let viewer = platform
                .request_reference_space(session, ReferenceSpaceKind::Viewer)
                .await
                .unwrap();
            let source = platform.request_hit_test_source(session, &viewer).await.unwrap();
            let local = platform
                .request_reference_space(session, ReferenceSpaceKind::Local)
                .await
                .unwrap();
            (session, source, local)
        })
    }

    #[test]
    fn table_is_ranked_before_floor() {
        let platform = SimulatedPlatform::preview_room();
        platform.set_viewer(ViewerRig::new(Vector3::new(0.0, 1.6, -1.5), Deg(0.0), Deg(-89.0)));
        let (_, source, _) = start(&platform);
        let frame = platform.next_frame().unwrap();

        let hits = platform.hit_test_results(&frame, &source);

        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance < hits[1].distance);
        assert!((hits[0].tracking_pose.position().y - 0.75).abs() < 1e-3);
        assert!(hits[1].tracking_pose.position().y.abs() < 1e-3);
    }

    #[test]
    fn looking_up_hits_nothing() {
        let platform = SimulatedPlatform::with_floor();
        platform.set_viewer(ViewerRig::new(Vector3::new(0.0, 1.6, 0.0), Deg(0.0), Deg(30.0)));
        let (_, source, _) = start(&platform);
        let frame = platform.next_frame().unwrap();

        assert!(platform.hit_test_results(&frame, &source).is_empty());
    }

    #[test]
    fn hit_pose_up_axis_follows_surface_normal() {
        let platform = SimulatedPlatform::with_floor();
        let (_, source, local) = start(&platform);
        let frame = platform.next_frame().unwrap();

        let hit = platform.hit_test_results(&frame, &source)[0];
        let pose = platform.resolve_pose(&hit, &local).unwrap();

        assert!((pose.up() - Vector3::unit_y()).magnitude() < 1e-4);
    }

    #[test]
    fn resolve_pose_is_relative_to_local_origin() {
        let platform = SimulatedPlatform::with_floor();
        platform.set_local_origin(Pose::from_position(Vector3::new(1.0, 0.0, 0.0)));
        let (_, source, local) = start(&platform);
        let frame = platform.next_frame().unwrap();

        let hit = platform.hit_test_results(&frame, &source)[0];
        let pose = platform.resolve_pose(&hit, &local).unwrap();

        let expected = hit.tracking_pose.position() - Vector3::new(1.0, 0.0, 0.0);
        assert!((pose.position() - expected).magnitude() < 1e-4);
    }

    #[test]
    fn viewer_pose_follows_rig_in_local_space() {
        let platform = SimulatedPlatform::with_floor();
        platform.set_local_origin(Pose::from_position(Vector3::new(0.0, 0.0, 2.0)));
        let (_, _, local) = start(&platform);
        let frame = platform.next_frame().unwrap();

        let pose = platform.viewer_pose(&frame, &local).unwrap();

        assert!((pose.position() - Vector3::new(0.0, 1.6, -2.0)).magnitude() < 1e-4);
        assert_eq!(
            platform.viewer_pose(&frame, &ReferenceSpace { session: SessionHandle(99), ..local }),
            None
        );
    }

    #[test]
    fn cancelled_source_returns_no_results() {
        let platform = SimulatedPlatform::with_floor();
        let (_, source, _) = start(&platform);
        let frame = platform.next_frame().unwrap();

        platform.cancel_hit_test_source(&source);

        assert!(platform.hit_test_results(&frame, &source).is_empty());
    }

    #[test]
    fn ended_session_stops_frames() {
        let platform = SimulatedPlatform::with_floor();
        let (session, _, _) = start(&platform);

        assert_eq!(platform.force_end(), Some(session));
        assert!(platform.next_frame().is_none());
        assert_eq!(platform.live_hit_test_sources(), 0);
    }

    #[test]
    fn missing_required_feature_is_rejected() {
        let platform = SimulatedPlatform::with_floor();
        let features = FeatureRequest {
            required: vec![SessionFeature::Anchors],
            optional: Vec::new(),
        };

        let err = pollster::block_on(platform.request_session(SessionMode::ImmersiveAr, &features))
            .unwrap_err();
        assert_eq!(err, PlatformError::FeatureUnavailable("anchors"));
    }
}
