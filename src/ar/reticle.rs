use log::trace;

use super::platform::{XrFrame, XrPlatform};
use super::pose::Pose;
use super::session::ActiveSession;
use crate::gfx::scene::{ObjectId, Scene};

/// Result of one per-frame reticle update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReticleUpdate {
    /// No active session, foreign frame or no hit-test source yet
    Skipped,
    Hidden,
    Shown(Pose),
}

/// Drives the reticle node from hit-test results.
///
/// The scene node is the only state: its transform is the last hit pose and
/// its visibility says whether that pose is current.
#[derive(Debug, Clone, Copy)]
pub struct HitTestReticle {
    node: ObjectId,
}

impl HitTestReticle {
    pub fn new(node: ObjectId) -> Self {
        Self { node }
    }

    pub fn node(&self) -> ObjectId {
        self.node
    }

    /// Pose of the reticle while it marks a surface
    pub fn current_pose(&self, scene: &Scene) -> Option<Pose> {
        scene
            .object(self.node)
            .filter(|object| object.visible)
            .map(|object| Pose::from_matrix(object.transform))
    }

    pub fn is_visible(&self, scene: &Scene) -> bool {
        scene.object(self.node).is_some_and(|object| object.visible)
    }

    pub fn update<P: XrPlatform>(
        &self,
        scene: &mut Scene,
        platform: &P,
        session: Option<&ActiveSession>,
        frame: &XrFrame,
    ) -> ReticleUpdate {
        let Some(session) = session else {
            return ReticleUpdate::Skipped;
        };
        if frame.session != session.handle {
            trace!("frame {} belongs to {}, not {}", frame.index, frame.session, session.handle);
            return ReticleUpdate::Skipped;
        }
        let Some(source) = session.hit_test_source() else {
            return ReticleUpdate::Skipped;
        };
        let Some(reticle) = scene.object_mut(self.node) else {
            log::warn!("reticle node is missing from the scene");
            return ReticleUpdate::Skipped;
        };

        // Only the first, platform-ranked result matters
        let pose = platform
            .hit_test_results(frame, source)
            .first()
            .and_then(|hit| platform.resolve_pose(hit, &session.local_space));

        match pose {
            Some(pose) => {
                reticle.transform = pose.matrix();
                reticle.visible = true;
                trace!("frame {}: reticle at {:?}", frame.index, pose.position());
                ReticleUpdate::Shown(pose)
            }
            None => {
                reticle.visible = false;
                trace!("frame {}: no surface", frame.index);
                ReticleUpdate::Hidden
            }
        }
    }

    pub fn hide(&self, scene: &mut Scene) {
        if let Some(reticle) = scene.object_mut(self.node) {
            reticle.visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::platform::{FeatureRequest, SessionFeature};
    use crate::ar::session::SessionController;
    use crate::ar::simulated::{SimulatedPlatform, SurfaceRect, ViewerRig};
    use crate::gfx::camera::PerspectiveCamera;
    use crate::gfx::geometry::generate_ring;
    use crate::gfx::scene::{HemisphereLight, Object};
    use cgmath::{Deg, Vector3};

    struct Fixture {
        scene: Scene,
        reticle: HitTestReticle,
        platform: SimulatedPlatform,
        sessions: SessionController,
    }

    fn fixture(platform: SimulatedPlatform) -> Fixture {
        let mut scene = Scene::new(
            PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0),
            HemisphereLight::default(),
        );
        let node = scene.add_object(Object::from_geometry("reticle", &generate_ring(0.05, 0.06, 32)).hidden());
        Fixture {
            scene,
            reticle: HitTestReticle::new(node),
            platform,
            sessions: SessionController::new(FeatureRequest {
                required: vec![SessionFeature::HitTest],
                optional: Vec::new(),
            }),
        }
    }

    fn look_down() -> ViewerRig {
        ViewerRig::new(Vector3::new(0.0, 1.5, 0.0), Deg(0.0), Deg(-90.0))
    }

    #[test]
    fn skipped_without_session() {
        let mut f = fixture(SimulatedPlatform::with_floor());
        let frame = XrFrame { session: crate::ar::platform::SessionHandle(1), index: 0, time_ms: 0.0 };

        let update = f.reticle.update(&mut f.scene, &f.platform, f.sessions.active(), &frame);

        assert_eq!(update, ReticleUpdate::Skipped);
        assert!(!f.reticle.is_visible(&f.scene));
    }

    #[test]
    fn first_ranked_result_wins() {
        // A table top above the floor: both are hit, the table is nearer
        let platform = SimulatedPlatform::new(vec![
            SurfaceRect::horizontal("floor", Vector3::new(0.0, 0.0, 0.0), 10.0, 10.0),
            SurfaceRect::horizontal("table", Vector3::new(0.0, 0.75, 0.0), 1.0, 1.0),
        ]);
        platform.set_viewer(look_down());
        let mut f = fixture(platform);
        pollster::block_on(f.sessions.start(&f.platform)).unwrap();
        let frame = f.platform.next_frame().unwrap();

        let update = f.reticle.update(&mut f.scene, &f.platform, f.sessions.active(), &frame);

        let ReticleUpdate::Shown(pose) = update else {
            panic!("expected a hit, got {update:?}");
        };
        assert!((pose.position().y - 0.75).abs() < 1e-5);
        assert_eq!(f.reticle.current_pose(&f.scene), Some(pose));
    }

    #[test]
    fn miss_hides_reticle_and_keeps_last_transform() {
        let platform = SimulatedPlatform::with_floor();
        platform.set_viewer(look_down());
        let mut f = fixture(platform);
        pollster::block_on(f.sessions.start(&f.platform)).unwrap();

        let frame = f.platform.next_frame().unwrap();
        f.reticle.update(&mut f.scene, &f.platform, f.sessions.active(), &frame);
        let shown_transform = f.scene.object(f.reticle.node()).unwrap().transform;

        f.platform.set_viewer(ViewerRig::new(Vector3::new(0.0, 1.5, 0.0), Deg(0.0), Deg(60.0)));
        let frame = f.platform.next_frame().unwrap();
        let update = f.reticle.update(&mut f.scene, &f.platform, f.sessions.active(), &frame);

        assert_eq!(update, ReticleUpdate::Hidden);
        assert!(f.reticle.current_pose(&f.scene).is_none());
        assert_eq!(f.scene.object(f.reticle.node()).unwrap().transform, shown_transform);
    }

    #[test]
    fn frame_from_previous_session_is_skipped() {
        let platform = SimulatedPlatform::with_floor();
        platform.set_viewer(look_down());
        let mut f = fixture(platform);
        pollster::block_on(f.sessions.start(&f.platform)).unwrap();
        let stale = f.platform.next_frame().unwrap();
        f.sessions.end(&f.platform);
        pollster::block_on(f.sessions.start(&f.platform)).unwrap();

        let update = f.reticle.update(&mut f.scene, &f.platform, f.sessions.active(), &stale);

        assert_eq!(update, ReticleUpdate::Skipped);
    }
}
