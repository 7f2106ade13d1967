//! The explicit context that wires the AR pieces together.
//!
//! [`ArContext`] owns the platform, the scene host, the session, the reticle,
//! placement and the pending model load. Every input goes through one FIFO
//! [`EventQueue`] and is dispatched serially by [`ArContext::pump`], so the
//! order in which frames and gestures arrive is the order they take effect.

use log::{debug, error, info, warn};

use super::events::{ArEvent, EventQueue};
use super::placement::{PlacementController, PlacementOutcome};
use super::platform::{SessionHandle, SessionMode, XrFrame, XrPlatform};
use super::reticle::{HitTestReticle, ReticleUpdate};
use super::session::{SessionController, SessionError, SessionState};
use crate::assets::{AssetError, AssetLoader, ModelDefaults, ModelHandle};
use crate::config::{ArConfig, ConfigError};
use crate::gfx::rendering::{RenderError, Renderer};
use crate::gfx::scene::{Object, ObjectId};
use crate::gfx::SceneHost;

/// Where the model is in its load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    NotRequested,
    Loading,
    Ready,
    Failed,
}

impl ModelStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ModelStatus::NotRequested => "none",
            ModelStatus::Loading => "loading",
            ModelStatus::Ready => "ready",
            ModelStatus::Failed => "failed",
        }
    }
}

/// Per-context counters, mostly for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_rendered: u64,
    pub frames_dropped: u64,
    pub render_errors: u64,
}

pub struct ArContext<P: XrPlatform, R: Renderer> {
    platform: P,
    host: SceneHost<R>,
    loader: AssetLoader,
    session: SessionController,
    reticle: HitTestReticle,
    placement: PlacementController,
    queue: EventQueue,
    pending_model: Option<ModelHandle>,
    model: Option<ObjectId>,
    model_status: ModelStatus,
    notice: Option<String>,
    last_reticle_update: Option<ReticleUpdate>,
    last_placement: Option<PlacementOutcome>,
    stats: FrameStats,
}

impl<P: XrPlatform, R: Renderer> ArContext<P, R> {
    /// Initializes the scene host; no session is requested yet
    pub fn new(
        config: &ArConfig,
        platform: P,
        renderer: R,
        width: u32,
        height: u32,
    ) -> Result<Self, ConfigError> {
        let host = SceneHost::initialize(config, renderer, width, height)?;
        let reticle = HitTestReticle::new(host.reticle_id());

        Ok(Self {
            platform,
            host,
            loader: AssetLoader::new(config.model_defaults()?),
            session: SessionController::new(config.feature_request()),
            reticle,
            placement: PlacementController::new(config.placement.orientation),
            queue: EventQueue::new(),
            pending_model: None,
            model: None,
            model_status: ModelStatus::NotRequested,
            notice: None,
            last_reticle_update: None,
            last_placement: None,
            stats: FrameStats::default(),
        })
    }

    /// Starts a background load; the result is picked up by [`ArContext::pump`].
    ///
    /// A previous pending load is abandoned.
    pub fn load_model(&mut self, url: &str) {
        if let Some(previous) = self.pending_model.take() {
            debug!("abandoning pending load of {}", previous.url());
        }
        self.pending_model = Some(self.loader.load_model(url));
        self.model_status = ModelStatus::Loading;
    }

    /// Queues an already built model as if a load had just completed
    pub fn install_model(&mut self, object: Object) {
        self.pending_model = None;
        self.queue.push(ArEvent::ModelLoaded(Ok(object)));
    }

    /// Requests a session. Failures become the user notice.
    pub async fn start_session(&mut self) -> Result<SessionHandle, SessionError> {
        self.notice = None;
        match self.session.start(&self.platform).await {
            Ok(handle) => Ok(handle),
            Err(err) => {
                warn!("AR session not started: {}", err);
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Ends the session at the user's request
    pub fn end_session(&mut self) -> Option<SessionHandle> {
        let ended = self.session.end(&self.platform)?;
        self.reticle.hide(self.host.scene_mut());
        Some(ended)
    }

    pub fn push_event(&mut self, event: ArEvent) {
        self.queue.push(event);
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Collects a finished model load, then dispatches queued events in order.
    ///
    /// Returns the number of events dispatched.
    pub fn pump(&mut self) -> usize {
        if let Some(result) = self.pending_model.as_mut().and_then(ModelHandle::try_take) {
            self.pending_model = None;
            self.queue.push(ArEvent::ModelLoaded(result));
        }

        let mut dispatched = 0;
        while let Some(event) = self.queue.pop() {
            self.dispatch(event);
            dispatched += 1;
        }
        dispatched
    }

    fn dispatch(&mut self, event: ArEvent) {
        match event {
            ArEvent::Frame(frame) => self.on_frame(frame),
            ArEvent::Select => {
                let outcome =
                    self.placement
                        .on_select(self.host.scene_mut(), &self.reticle, self.model);
                self.last_placement = Some(outcome);
            }
            ArEvent::SessionEnded(handle) => {
                if self.session.handle_session_end(&self.platform, handle) {
                    self.reticle.hide(self.host.scene_mut());
                }
            }
            ArEvent::Resize { width, height } => self.host.resize(width, height),
            ArEvent::ModelLoaded(result) => self.on_model_loaded(result),
        }
    }

    fn on_frame(&mut self, frame: XrFrame) {
        let current = self.session.handle();
        if !self.session.frame_loop_registered() || current != Some(frame.session) {
            debug!("dropping frame {} of {}", frame.index, frame.session);
            self.stats.frames_dropped += 1;
            return;
        }

        let active = self.session.active();
        if let Some(session) = active {
            if let Some(pose) = self.platform.viewer_pose(&frame, &session.local_space) {
                self.host.set_camera_pose(&pose);
            }
        }

        let update = self
            .reticle
            .update(self.host.scene_mut(), &self.platform, active, &frame);
        self.last_reticle_update = Some(update);

        if let Err(err) = self.host.render_frame() {
            error!("frame {} failed to render: {}", frame.index, err);
            self.stats.render_errors += 1;
            return;
        }
        self.stats.frames_rendered += 1;
    }

    fn on_model_loaded(&mut self, result: Result<Object, AssetError>) {
        match result {
            Ok(object) => {
                if let Some(previous) = self.model.take() {
                    self.host.remove_object(previous);
                }
                let name = object.name.clone();
                self.model = Some(self.host.add_object(object));
                self.model_status = ModelStatus::Ready;
                info!("model '{}' ready for placement", name);
            }
            Err(err) => {
                error!("model unavailable: {}", err);
                self.model_status = ModelStatus::Failed;
                self.notice = Some(format!("Model failed to load: {}", err));
            }
        }
    }

    /// Draws the scene outside the session frame loop (e.g. before starting)
    pub fn render(&mut self) -> Result<(), RenderError> {
        self.host.render_frame()
    }

    pub fn is_supported(&self) -> bool {
        self.platform.is_session_supported(SessionMode::ImmersiveAr)
    }

    /// Last user-facing problem, cleared when a new session is requested
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn model_status(&self) -> ModelStatus {
        self.model_status
    }

    /// Scale, position and fallback color applied to loaded models
    pub fn model_defaults(&self) -> &ModelDefaults {
        self.loader.defaults()
    }

    pub fn model_id(&self) -> Option<ObjectId> {
        self.model
    }

    pub fn model(&self) -> Option<&Object> {
        self.model.and_then(|id| self.host.object(id))
    }

    pub fn reticle(&self) -> &HitTestReticle {
        &self.reticle
    }

    pub fn placement(&self) -> &PlacementController {
        &self.placement
    }

    pub fn placements(&self) -> u32 {
        self.placement.placements()
    }

    pub fn last_reticle_update(&self) -> Option<ReticleUpdate> {
        self.last_reticle_update
    }

    pub fn last_placement(&self) -> Option<PlacementOutcome> {
        self.last_placement
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn host(&self) -> &SceneHost<R> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut SceneHost<R> {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::placement::OrientationMode;
    use crate::ar::pose::Pose;
    use crate::ar::simulated::{FailurePoint, SimulatedPlatform, ViewerRig};
    use crate::gfx::geometry::generate_box;
    use crate::gfx::rendering::HeadlessRenderer;
    use cgmath::{Deg, InnerSpace, Vector3};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::time::{Duration, Instant};

    type TestContext = ArContext<SimulatedPlatform, HeadlessRenderer>;

    fn context() -> TestContext {
        ArContext::new(
            &ArConfig::default(),
            SimulatedPlatform::with_floor(),
            HeadlessRenderer::new(),
            640,
            480,
        )
        .unwrap()
    }

    fn looking_at_floor(x: f32) -> ViewerRig {
        // 45 degrees down from 1.5m: hits the floor 1.5m ahead
        ViewerRig::new(Vector3::new(x, 1.5, 0.0), Deg(0.0), Deg(-45.0))
    }

    fn looking_up() -> ViewerRig {
        ViewerRig::new(Vector3::new(0.0, 1.5, 0.0), Deg(0.0), Deg(30.0))
    }

    fn placeholder() -> Object {
        Object::from_geometry("box", &generate_box(0.2, 0.2, 0.2)).hidden()
    }

    fn start(ctx: &mut TestContext) -> SessionHandle {
        pollster::block_on(ctx.start_session()).unwrap()
    }

    /// Queues one platform frame and dispatches it
    fn frame(ctx: &mut TestContext) {
        let frame = ctx.platform().next_frame().unwrap();
        ctx.push_event(ArEvent::Frame(frame));
        ctx.pump();
    }

    fn model_position(ctx: &TestContext) -> Vector3<f32> {
        ctx.model().unwrap().position()
    }

    fn assert_close(actual: Vector3<f32>, expected: Vector3<f32>) {
        assert!(
            (actual - expected).magnitude() < 1e-4,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn scripted_miss_hit_tap_move() {
        let mut ctx = context();
        ctx.install_model(placeholder());
        ctx.pump();
        start(&mut ctx);

        ctx.platform().set_viewer(looking_up());
        frame(&mut ctx);
        assert_eq!(ctx.last_reticle_update(), Some(ReticleUpdate::Hidden));
        assert!(!ctx.model().unwrap().visible);

        ctx.platform().set_viewer(looking_at_floor(0.0));
        frame(&mut ctx);
        let p = Vector3::new(0.0, 0.0, -1.5);
        assert_close(ctx.reticle().current_pose(ctx.host().scene()).unwrap().position(), p);

        ctx.push_event(ArEvent::Select);
        ctx.pump();
        assert!(ctx.model().unwrap().visible);
        assert_close(model_position(&ctx), p);

        ctx.platform().set_viewer(looking_at_floor(1.0));
        frame(&mut ctx);
        let q = Vector3::new(1.0, 0.0, -1.5);
        assert_close(ctx.reticle().current_pose(ctx.host().scene()).unwrap().position(), q);
        assert_close(model_position(&ctx), p);
        assert_eq!(ctx.placements(), 1);
    }

    #[test]
    fn select_uses_pose_of_frames_already_dispatched() {
        let mut ctx = context();
        ctx.install_model(placeholder());
        start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.0));
        frame(&mut ctx);

        // Frame at Q then gesture: the model lands on Q
        ctx.platform().set_viewer(looking_at_floor(1.0));
        let at_q = ctx.platform().next_frame().unwrap();
        ctx.push_event(ArEvent::Frame(at_q));
        ctx.push_event(ArEvent::Select);
        ctx.pump();
        assert_close(model_position(&ctx), Vector3::new(1.0, 0.0, -1.5));

        // Gesture then frame at R: the model stays on Q
        ctx.platform().set_viewer(looking_at_floor(-1.0));
        let at_r = ctx.platform().next_frame().unwrap();
        ctx.push_event(ArEvent::Select);
        ctx.push_event(ArEvent::Frame(at_r));
        ctx.pump();
        assert_close(model_position(&ctx), Vector3::new(1.0, 0.0, -1.5));
        assert_close(
            ctx.reticle().current_pose(ctx.host().scene()).unwrap().position(),
            Vector3::new(-1.0, 0.0, -1.5),
        );
        assert_eq!(ctx.placements(), 2);
    }

    #[test]
    fn select_before_model_or_surface_is_a_no_op() {
        let mut ctx = context();
        start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.0));
        frame(&mut ctx);

        ctx.push_event(ArEvent::Select);
        ctx.pump();
        assert_eq!(ctx.last_placement(), Some(PlacementOutcome::ModelNotReady));

        ctx.install_model(placeholder());
        ctx.platform().set_viewer(looking_up());
        frame(&mut ctx);
        ctx.push_event(ArEvent::Select);
        ctx.pump();
        assert_eq!(ctx.last_placement(), Some(PlacementOutcome::NoSurface));
        assert!(!ctx.model().unwrap().visible);
        assert_eq!(ctx.placements(), 0);
    }

    #[test]
    fn frames_before_start_and_after_end_are_dropped() {
        let mut ctx = context();
        ctx.push_event(ArEvent::Frame(XrFrame {
            session: SessionHandle(1),
            index: 1,
            time_ms: 0.0,
        }));
        ctx.pump();
        assert_eq!(ctx.stats().frames_dropped, 1);

        let handle = start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.0));
        let stale = ctx.platform().next_frame().unwrap();

        ctx.end_session();
        ctx.push_event(ArEvent::Frame(stale));
        ctx.pump();

        assert_eq!(ctx.session_state(), SessionState::Ended);
        assert!(!ctx.reticle().is_visible(ctx.host().scene()));
        assert_eq!(ctx.stats().frames_dropped, 2);
        assert_eq!(ctx.stats().frames_rendered, 0);
        assert_eq!(ctx.platform().active_session(), None);

        // A late end event for the same session changes nothing
        ctx.push_event(ArEvent::SessionEnded(handle));
        ctx.pump();
        assert_eq!(ctx.session_state(), SessionState::Ended);
    }

    #[test]
    fn platform_end_hides_reticle_and_restart_reacquires() {
        let mut ctx = context();
        let first = start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.0));
        frame(&mut ctx);
        assert!(ctx.reticle().is_visible(ctx.host().scene()));

        let ended = ctx.platform().force_end().unwrap();
        ctx.push_event(ArEvent::SessionEnded(ended));
        ctx.pump();
        assert!(!ctx.reticle().is_visible(ctx.host().scene()));
        assert_eq!(ctx.platform().live_hit_test_sources(), 0);

        let second = start(&mut ctx);
        assert_ne!(first, second);
        let source = ctx.session().active().unwrap().hit_test_source().unwrap();
        assert_eq!(source.session, second);
        frame(&mut ctx);
        assert!(ctx.reticle().is_visible(ctx.host().scene()));
        assert_eq!(ctx.session().sessions_started(), 2);
    }

    #[test]
    fn camera_follows_viewer_during_session() {
        let mut ctx = context();
        start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.5));
        frame(&mut ctx);

        assert_close(ctx.host().scene().camera.eye(), Vector3::new(0.5, 1.5, 0.0));
    }

    #[test]
    fn unsupported_platform_sets_notice() {
        let mut ctx = context();
        ctx.platform().set_supported(false);

        let err = pollster::block_on(ctx.start_session()).unwrap_err();

        assert_eq!(err, SessionError::Unsupported);
        assert!(!ctx.is_supported());
        assert!(ctx.notice().is_some());
        assert_eq!(ctx.platform().session_requests(), 0);
    }

    #[test]
    fn declined_request_sets_notice_and_allows_retry() {
        let mut ctx = context();
        ctx.platform().fail_at(FailurePoint::SessionRequest);

        assert_eq!(
            pollster::block_on(ctx.start_session()).unwrap_err(),
            SessionError::Declined
        );
        assert_eq!(ctx.session_state(), SessionState::Idle);
        assert!(ctx.notice().is_some());

        start(&mut ctx);
        assert_eq!(ctx.notice(), None);
        assert_eq!(ctx.session_state(), SessionState::Active);
    }

    #[test]
    fn failed_load_is_reported_and_model_stays_absent() {
        let mut ctx = context();
        ctx.push_event(ArEvent::ModelLoaded(Err(AssetError::EmptyModel)));
        ctx.pump();

        assert_eq!(ctx.model_status(), ModelStatus::Failed);
        assert!(ctx.model_id().is_none());
        assert!(ctx.notice().unwrap().contains("failed"));
    }

    #[test]
    fn background_load_is_collected_by_pump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 0 -1\nf 1 2 3\n").unwrap();

        let mut ctx = context();
        ctx.load_model(path.to_str().unwrap());
        assert_eq!(ctx.model_status(), ModelStatus::Loading);

        let deadline = Instant::now() + Duration::from_secs(10);
        while ctx.model_status() == ModelStatus::Loading && Instant::now() < deadline {
            ctx.pump();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(ctx.model_status(), ModelStatus::Ready);
        let model = ctx.model().unwrap();
        assert_eq!(model.name, "tri");
        assert!(!model.visible);
    }

    #[test]
    fn new_model_replaces_previous_node() {
        let mut ctx = context();
        ctx.install_model(placeholder());
        ctx.pump();
        let first = ctx.model_id().unwrap();

        ctx.install_model(Object::new("chair", Vec::new()).hidden());
        ctx.pump();

        assert_eq!(ctx.model().unwrap().name, "chair");
        assert!(ctx.host().scene().find_by_name("box").is_none());
        assert_eq!(ctx.host().scene().object_count(), 2);
        assert_eq!(ctx.model_id(), Some(first));
    }

    #[test]
    fn full_pose_mode_copies_surface_orientation() {
        let mut config = ArConfig::default();
        config.placement.orientation = OrientationMode::FullPose;
        let mut ctx = ArContext::new(
            &config,
            SimulatedPlatform::with_floor(),
            HeadlessRenderer::new(),
            640,
            480,
        )
        .unwrap();
        ctx.install_model(placeholder());
        start(&mut ctx);
        ctx.platform().set_viewer(looking_at_floor(0.0));
        frame(&mut ctx);
        ctx.push_event(ArEvent::Select);
        ctx.pump();

        let placed = Pose::from_matrix(ctx.model().unwrap().transform);
        assert!((placed.up() - Vector3::unit_y()).magnitude() < 1e-4);
    }

    #[test]
    fn resize_event_reaches_renderer() {
        let mut ctx = context();
        ctx.push_event(ArEvent::Resize { width: 1024, height: 768 });
        ctx.push_event(ArEvent::Resize { width: 0, height: 0 });
        ctx.pump();

        assert_eq!(ctx.host().size(), (1024, 768));
        assert_eq!(ctx.host().renderer().size(), (1024, 768));
    }

    #[test]
    fn random_frames_never_place_without_visible_reticle() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ctx = context();
        ctx.install_model(placeholder());
        start(&mut ctx);

        for _ in 0..200 {
            let pitch = Deg(rng.random_range(-80.0f32..40.0));
            let x = rng.random_range(-2.0f32..2.0);
            ctx.platform()
                .set_viewer(ViewerRig::new(Vector3::new(x, 1.5, 0.0), Deg(0.0), pitch));
            frame(&mut ctx);

            let reticle = ctx.reticle().current_pose(ctx.host().scene());
            let before = ctx.placements();
            ctx.push_event(ArEvent::Select);
            ctx.pump();

            match reticle {
                Some(pose) => {
                    assert_eq!(ctx.placements(), before + 1);
                    assert_close(model_position(&ctx), pose.position());
                }
                None => assert_eq!(ctx.placements(), before),
            }
        }
        assert_eq!(ctx.stats().frames_rendered, 200);
    }
}
