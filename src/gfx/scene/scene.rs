use crate::gfx::camera::PerspectiveCamera;

use super::{
    light::HemisphereLight,
    object::{Object, ObjectId},
};

/// Summary counts for overlays and logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub objects: usize,
    pub visible: usize,
    pub meshes: usize,
    pub triangles: u32,
}

/// Scene graph: camera, light and a flat list of objects.
///
/// Objects live in slots addressed by [`ObjectId`]. Removing an object frees
/// its slot without shifting the others, so ids held elsewhere stay valid.
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub light: HemisphereLight,
    pub clear_color: [f64; 4],
    slots: Vec<Option<Object>>,
}

impl Scene {
    pub fn new(camera: PerspectiveCamera, light: HemisphereLight) -> Self {
        Self {
            camera,
            light,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            slots: Vec::new(),
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera.update();
    }

    /// Adds an object and returns its id. Duplicate names get a numeric suffix.
    pub fn add_object(&mut self, mut object: Object) -> ObjectId {
        object.name = self.ensure_unique_name(&object.name);
        log::debug!("adding '{}' to scene", object.name);

        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(object);
                ObjectId(index)
            }
            None => {
                self.slots.push(Some(object));
                ObjectId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        let removed = self.slots.get_mut(id.0)?.take();
        if let Some(object) = &removed {
            log::debug!("removed '{}' from scene", object.name);
        }
        removed
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|object| (ObjectId(i), object)))
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut Object)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|object| (ObjectId(i), object)))
    }

    pub fn visible_objects(&self) -> impl Iterator<Item = &Object> {
        self.objects()
            .map(|(_, object)| object)
            .filter(|object| object.visible)
    }

    pub fn object_count(&self) -> usize {
        self.objects().count()
    }

    pub fn stats(&self) -> SceneStats {
        self.objects()
            .fold(SceneStats::default(), |mut stats, (_, object)| {
                stats.objects += 1;
                stats.visible += usize::from(object.visible);
                stats.meshes += object.meshes.len();
                stats.triangles += object.meshes.iter().map(|m| m.triangle_count()).sum::<u32>();
                stats
            })
    }

    fn ensure_unique_name(&self, name: &str) -> String {
        let base = if name.is_empty() { "object" } else { name };
        let taken = |candidate: &str| self.objects().any(|(_, o)| o.name == candidate);

        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;

    fn scene() -> Scene {
        Scene::new(
            PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0),
            HemisphereLight::default(),
        )
    }

    #[test]
    fn test_ids_survive_removal_of_other_objects() {
        let mut scene = scene();
        let a = scene.add_object(Object::new("a", Vec::new()));
        let b = scene.add_object(Object::new("b", Vec::new()));

        assert!(scene.remove_object(a).is_some());

        assert!(!scene.contains(a));
        assert_eq!(scene.object(b).unwrap().name, "b");
        assert_eq!(scene.object_count(), 1);
        assert!(scene.remove_object(a).is_none());
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let mut scene = scene();
        scene.add_object(Object::new("model", Vec::new()));
        let second = scene.add_object(Object::new("model", Vec::new()));
        let third = scene.add_object(Object::new("model", Vec::new()));

        assert_eq!(scene.object(second).unwrap().name, "model_1");
        assert_eq!(scene.object(third).unwrap().name, "model_2");
        assert_eq!(scene.find_by_name("model_1"), Some(second));
    }

    #[test]
    fn test_stats_count_visible_and_triangles() {
        let mut scene = scene();
        scene.add_object(Object::from_geometry("box", &generate_box(1.0, 1.0, 1.0)));
        scene.add_object(Object::from_geometry("hidden", &generate_box(1.0, 1.0, 1.0)).hidden());

        let stats = scene.stats();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(stats.meshes, 2);
        assert_eq!(stats.triangles, 24);
        assert_eq!(scene.visible_objects().count(), 1);
    }
}
