use crate::camera::{Camera3D, Viewport};
use crate::snapshot::EntityKind;
use crate::world::{EntityId, EntityPayload, LiveEntity, SceneWorld};
use glam::{Quat, Vec2, Vec3};

const PICK_RANGE: f32 = 1000.0;
const AUDIO_PICK_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionInfo {
    pub id: EntityId,
    pub kind: EntityKind,
    pub distance: f32,
    /// Present for audio entities so loop toggles can resync without a
    /// second lookup.
    pub audio_loop: Option<bool>,
}

/// Selection, drag, rotate and scale of generated entities. Active only while
/// editing; disabling clears the selection.
pub struct InteractionController {
    enabled: bool,
    selected: Option<EntityId>,
    drag_distance: f32,
    drag_smooth: f32,
    rotation_speed_degrees: f32,
    scale_speed: f32,
    min_scale: f32,
    max_scale: f32,
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            enabled: false,
            selected: None,
            drag_distance: 5.0,
            drag_smooth: 10.0,
            rotation_speed_degrees: 120.0,
            scale_speed: 0.1,
            min_scale: 0.001,
            max_scale: 10.0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.selected = None;
        }
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Ray-picks the nearest selectable entity under the pointer. A miss
    /// clears the selection, like clicking empty space.
    pub fn select(
        &mut self,
        world: &SceneWorld,
        camera: &Camera3D,
        pointer: Vec2,
        viewport: Viewport,
    ) -> Option<SelectionInfo> {
        if !self.enabled {
            return None;
        }
        let (origin, dir) = camera.screen_ray(pointer, viewport)?;
        let mut best: Option<(EntityId, f32)> = None;
        for entity in world.entities() {
            if !entity.selectable {
                continue;
            }
            let radius = pick_radius(entity);
            let Some(distance) = ray_sphere(origin, dir, entity.transform.position, radius) else {
                continue;
            };
            if distance > PICK_RANGE {
                continue;
            }
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((entity.id, distance));
            }
        }
        match best {
            Some((id, distance)) => {
                self.selected = Some(id);
                self.drag_distance = distance;
                let entity = world.entity(id)?;
                Some(SelectionInfo {
                    id,
                    kind: entity.kind(),
                    distance,
                    audio_loop: entity.as_audio().map(|audio| audio.looping),
                })
            }
            None => {
                self.selected = None;
                None
            }
        }
    }

    /// Smoothed drag of the selected entity along the pointer ray at the
    /// distance captured when it was picked.
    pub fn drag(
        &mut self,
        world: &mut SceneWorld,
        camera: &Camera3D,
        pointer: Vec2,
        viewport: Viewport,
        dt: f32,
    ) {
        if !self.enabled {
            return;
        }
        let Some(id) = self.selected else {
            return;
        };
        let Some((origin, dir)) = camera.screen_ray(pointer, viewport) else {
            return;
        };
        let Some(entity) = world.entity_mut(id) else {
            return;
        };
        let desired = origin + dir * self.drag_distance;
        let t = (dt * self.drag_smooth).clamp(0.0, 1.0);
        entity.transform.position = entity.transform.position.lerp(desired, t);
    }

    /// Rotates the selected entity about the world Y axis.
    pub fn rotate(&mut self, world: &mut SceneWorld, input: f32, dt: f32) {
        if !self.enabled || input.abs() < 1e-4 {
            return;
        }
        let Some(entity) = self.selected.and_then(|id| world.entity_mut(id)) else {
            return;
        };
        let angle = (input * self.rotation_speed_degrees * dt).to_radians();
        entity.transform.rotation = Quat::from_rotation_y(angle) * entity.transform.rotation;
    }

    /// Uniformly scales the selected entity, clamped per component.
    pub fn scale(&mut self, world: &mut SceneWorld, input: f32) {
        if !self.enabled || input.abs() < 1e-4 {
            return;
        }
        let Some(entity) = self.selected.and_then(|id| world.entity_mut(id)) else {
            return;
        };
        let factor = 1.0 + input * self.scale_speed;
        let scaled = entity.transform.scale * factor;
        entity.transform.scale = scaled.clamp(Vec3::splat(self.min_scale), Vec3::splat(self.max_scale));
    }

    pub fn set_audio_loop(&self, world: &mut SceneWorld, enabled: bool) {
        let Some(audio) = self.selected.and_then(|id| world.entity_mut(id)).and_then(LiveEntity::as_audio_mut)
        else {
            return;
        };
        audio.looping = enabled;
    }

    /// Destroys the selected entity, unregistering audio entities from the
    /// registry first. Returns the destroyed id, if any.
    pub fn delete_selected(&mut self, world: &mut SceneWorld) -> Option<EntityId> {
        let id = self.selected.take()?;
        if world.entity(id).map_or(false, LiveEntity::is_audio) {
            world.audio.remove(id);
        }
        world.despawn(id);
        Some(id)
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_radius(entity: &LiveEntity) -> f32 {
    match &entity.payload {
        EntityPayload::Model(model) => {
            let scale = entity.transform.scale;
            let max_scale = scale.x.max(scale.y).max(scale.z).abs();
            (model.mesh.bounds.radius * max_scale).max(0.05)
        }
        EntityPayload::Audio(_) => AUDIO_PICK_RADIUS,
    }
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let projected = to_center.dot(dir);
    if projected < 0.0 {
        return None;
    }
    let closest_sq = to_center.length_squared() - projected * projected;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let distance = projected - half_chord;
    Some(distance.max(0.0))
}
