use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::pose::Pose;
use super::reticle::HitTestReticle;
use crate::gfx::scene::{ObjectId, Scene};

/// How much of the reticle pose a placement copies onto the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationMode {
    /// Translation only; the model keeps its loaded rotation and scale
    #[default]
    PositionOnly,
    /// Translation and surface orientation; the model keeps its scale
    FullPose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    Placed(Pose),
    NoSurface,
    ModelNotReady,
}

#[derive(Debug, Default)]
pub struct PlacementController {
    mode: OrientationMode,
    placements: u32,
}

impl PlacementController {
    pub fn new(mode: OrientationMode) -> Self {
        Self {
            mode,
            placements: 0,
        }
    }

    pub fn mode(&self) -> OrientationMode {
        self.mode
    }

    /// Number of gestures that moved the model
    pub fn placements(&self) -> u32 {
        self.placements
    }

    /// Handles one select gesture using whatever pose the reticle holds now
    pub fn on_select(
        &mut self,
        scene: &mut Scene,
        reticle: &HitTestReticle,
        model: Option<ObjectId>,
    ) -> PlacementOutcome {
        let Some(pose) = reticle.current_pose(scene) else {
            debug!("select ignored: no surface under the reticle");
            return PlacementOutcome::NoSurface;
        };
        let Some(object) = model.and_then(|id| scene.object_mut(id)) else {
            debug!("select ignored: model not loaded yet");
            return PlacementOutcome::ModelNotReady;
        };

        match self.mode {
            OrientationMode::PositionOnly => object.set_position(pose.position()),
            OrientationMode::FullPose => object.set_pose(&pose),
        }
        object.visible = true;
        self.placements += 1;

        info!(
            "placed '{}' at {:?} (placement #{})",
            object.name,
            pose.position(),
            self.placements
        );
        PlacementOutcome::Placed(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::PerspectiveCamera;
    use crate::gfx::scene::{HemisphereLight, Object};
    use cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3};

    fn scene_with_reticle() -> (Scene, HitTestReticle) {
        let mut scene = Scene::new(
            PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0),
            HemisphereLight::default(),
        );
        let node = scene.add_object(Object::new("reticle", Vec::new()).hidden());
        (scene, HitTestReticle::new(node))
    }

    fn show_reticle(scene: &mut Scene, reticle: &HitTestReticle, pose: Pose) {
        let node = scene.object_mut(reticle.node()).unwrap();
        node.transform = pose.matrix();
        node.visible = true;
    }

    fn add_model(scene: &mut Scene) -> ObjectId {
        let mut model = Object::new("model", Vec::new()).hidden();
        model.set_transform_trs(
            Vector3::new(0.0, 0.0, 0.0),
            Quaternion::from_angle_y(Deg(45.0)),
            Vector3::new(2.0, 2.0, 2.0),
        );
        scene.add_object(model)
    }

    fn tilted_pose() -> Pose {
        Pose::from_position_orientation(
            Vector3::new(1.0, 0.5, -2.0),
            Quaternion::from_angle_x(Deg(-90.0)),
        )
    }

    #[test]
    fn hidden_reticle_is_a_no_op() {
        let (mut scene, reticle) = scene_with_reticle();
        let model = add_model(&mut scene);
        let mut placement = PlacementController::default();

        let outcome = placement.on_select(&mut scene, &reticle, Some(model));

        assert_eq!(outcome, PlacementOutcome::NoSurface);
        assert!(!scene.object(model).unwrap().visible);
        assert_eq!(placement.placements(), 0);
    }

    #[test]
    fn missing_model_is_a_no_op() {
        let (mut scene, reticle) = scene_with_reticle();
        show_reticle(&mut scene, &reticle, tilted_pose());
        let mut placement = PlacementController::default();

        assert_eq!(
            placement.on_select(&mut scene, &reticle, None),
            PlacementOutcome::ModelNotReady
        );
    }

    #[test]
    fn position_only_keeps_rotation_and_scale() {
        let (mut scene, reticle) = scene_with_reticle();
        let model = add_model(&mut scene);
        let loaded_basis = scene.object(model).unwrap().transform.x;
        show_reticle(&mut scene, &reticle, tilted_pose());
        let mut placement = PlacementController::new(OrientationMode::PositionOnly);

        let outcome = placement.on_select(&mut scene, &reticle, Some(model));

        assert_eq!(outcome, PlacementOutcome::Placed(tilted_pose()));
        let object = scene.object(model).unwrap();
        assert!(object.visible);
        assert_eq!(object.position(), Vector3::new(1.0, 0.5, -2.0));
        assert_eq!(object.transform.x, loaded_basis);
    }

    #[test]
    fn full_pose_copies_orientation_with_base_scale() {
        let (mut scene, reticle) = scene_with_reticle();
        let model = add_model(&mut scene);
        show_reticle(&mut scene, &reticle, tilted_pose());
        let mut placement = PlacementController::new(OrientationMode::FullPose);

        placement.on_select(&mut scene, &reticle, Some(model));

        let object = scene.object(model).unwrap();
        let placed = Pose::from_matrix(object.transform);
        assert!((placed.position() - Vector3::new(1.0, 0.5, -2.0)).magnitude() < 1e-5);
        assert!((placed.up() - tilted_pose().up()).magnitude() < 1e-5);
        assert!((object.transform.y.truncate().magnitude() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn repeated_gestures_replace_previous_placement() {
        let (mut scene, reticle) = scene_with_reticle();
        let model = add_model(&mut scene);
        let mut placement = PlacementController::default();

        show_reticle(&mut scene, &reticle, Pose::from_position(Vector3::new(1.0, 0.0, 0.0)));
        placement.on_select(&mut scene, &reticle, Some(model));
        show_reticle(&mut scene, &reticle, Pose::from_position(Vector3::new(-3.0, 0.0, 1.0)));
        placement.on_select(&mut scene, &reticle, Some(model));

        assert_eq!(scene.object(model).unwrap().position(), Vector3::new(-3.0, 0.0, 1.0));
        assert_eq!(placement.placements(), 2);
    }
}
