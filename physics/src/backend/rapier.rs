//! rapier3d backend stepped on a private rayon worker pool.
//!
//! Bodies are split into two broad-phase object layers (non-moving / moving)
//! expressed as rapier interaction groups built from the scene's
//! [`LayerConfig`]. Shapes are held as pending collider templates until a body
//! takes them; from then on the shape slot tracks the live collider.

use origin_core::math::{Quat, Vec3};
use origin_core::profile_scope;
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager,
    LockedAxes as RapierLockedAxes, MassProperties, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, Point, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, SharedShape, Vector,
};

use crate::backend::{log_rejected, BackendKind, PhysicsBackend, SceneDescriptor};
use crate::components::{LockedAxes, MotionQuality, MotionType, RigidBody};
use crate::conversions::rapier::{isometry_from_native, isometry_to_native, vec3_from_native, vec3_to_native};
use crate::error::{PhysicsError, PhysicsResult};
use crate::handle::{BodyHandle, SceneHandle, ShapeHandle, Slots};
use crate::layers::{LayerConfig, ObjectLayer};
use crate::shape::{ShapeDescriptor, ShapeGeometry, ShapeMaterial};

const KIND: BackendKind = BackendKind::Rapier;

struct RapierScene {
    gravity: Vector<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    max_bodies: u32,
    max_contacts: u32,
    layers: LayerConfig,
    contact_overflow_logged: bool,
}

impl RapierScene {
    fn new(desc: &SceneDescriptor) -> Self {
        Self {
            gravity: vec3_to_native(desc.gravity),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            max_bodies: desc.max_bodies,
            max_contacts: desc.max_contacts,
            layers: desc.layers.clone(),
            contact_overflow_logged: false,
        }
    }

    fn interaction_groups(&self, layer: ObjectLayer) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(LayerConfig::membership(layer)),
            Group::from_bits_truncate(self.layers.collision_mask(layer)),
        )
    }
}

enum ShapeState {
    Pending {
        shape: SharedShape,
        offset: Vec3,
        material: ShapeMaterial,
    },
    Attached {
        collider: ColliderHandle,
    },
}

#[derive(Clone, Copy)]
struct BodyEntry {
    rigid_body: RigidBodyHandle,
    shape: ShapeHandle,
    /// Forces were added since the last step and must be cleared after it.
    has_forces: bool,
}

/// Job-pool backend over rapier3d.
pub struct RapierBackend {
    worker_threads: usize,
    pool: Option<rayon::ThreadPool>,
    scenes: Slots<RapierScene>,
    active_scene: Option<SceneHandle>,
    bodies: Slots<BodyEntry>,
    shapes: Slots<ShapeState>,
}

impl RapierBackend {
    pub fn new(worker_threads: usize) -> Self {
        Self {
            worker_threads: worker_threads.max(1),
            pool: None,
            scenes: Slots::new(),
            active_scene: None,
            bodies: Slots::new(),
            shapes: Slots::new(),
        }
    }

    /// Number of threads the step pool runs on.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    fn scene_mut(&mut self) -> Option<&mut RapierScene> {
        let handle = self.active_scene?;
        self.scenes.get_mut(handle.index(), handle.generation())
    }

    fn scene(&self) -> Option<&RapierScene> {
        let handle = self.active_scene?;
        self.scenes.get(handle.index(), handle.generation())
    }

    fn body_entry(&self, body: BodyHandle) -> Option<BodyEntry> {
        let entry = (body.backend() == KIND)
            .then(|| self.bodies.get(body.index(), body.generation()))
            .flatten()
            .copied();
        if entry.is_none() {
            log_rejected(KIND, "body", &body);
        }
        entry
    }

    /// Flags the body so its accumulated forces are cleared after the next step.
    fn mark_forced(&mut self, body: BodyHandle) {
        if body.backend() != KIND {
            return;
        }
        if let Some(entry) = self.bodies.get_mut(body.index(), body.generation()) {
            entry.has_forces = true;
        }
    }

    fn with_body_mut(&mut self, body: BodyHandle, f: impl FnOnce(&mut rapier3d::prelude::RigidBody)) {
        let Some(entry) = self.body_entry(body) else {
            return;
        };
        if let Some(rb) = self
            .scene_mut()
            .and_then(|scene| scene.bodies.get_mut(entry.rigid_body))
        {
            f(rb);
        }
    }
}

fn native_shape(geometry: &ShapeGeometry) -> SharedShape {
    match *geometry {
        ShapeGeometry::Box { half_extents } => {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ShapeGeometry::Sphere { radius } => SharedShape::ball(radius),
        ShapeGeometry::Capsule {
            half_height,
            radius,
        } => SharedShape::capsule_y(half_height, radius),
    }
}

fn native_locked_axes(axes: LockedAxes) -> RapierLockedAxes {
    let pairs = [
        (LockedAxes::TRANSLATION_X, RapierLockedAxes::TRANSLATION_LOCKED_X),
        (LockedAxes::TRANSLATION_Y, RapierLockedAxes::TRANSLATION_LOCKED_Y),
        (LockedAxes::TRANSLATION_Z, RapierLockedAxes::TRANSLATION_LOCKED_Z),
        (LockedAxes::ROTATION_X, RapierLockedAxes::ROTATION_LOCKED_X),
        (LockedAxes::ROTATION_Y, RapierLockedAxes::ROTATION_LOCKED_Y),
        (LockedAxes::ROTATION_Z, RapierLockedAxes::ROTATION_LOCKED_Z),
    ];
    pairs
        .into_iter()
        .filter(|(ours, _)| axes.contains(*ours))
        .fold(RapierLockedAxes::empty(), |acc, (_, theirs)| acc | theirs)
}

/// Mass properties in the collider's frame: the requested total mass with the
/// shape's inertia scaled to match, centered at the body's center of mass.
fn mass_properties(shape: &SharedShape, desc: &RigidBody, offset: Vec3) -> Option<MassProperties> {
    let unit = shape.mass_properties(1.0);
    if !(desc.mass > 0.0) || unit.mass() <= 0.0 {
        return None;
    }
    let scale = desc.mass / unit.mass();
    let com = desc.center_of_mass - offset;
    Some(MassProperties::new(
        Point::new(com.x, com.y, com.z),
        desc.mass,
        unit.principal_inertia() * scale,
    ))
}

impl PhysicsBackend for RapierBackend {
    fn kind(&self) -> BackendKind {
        KIND
    }

    fn init(&mut self) -> PhysicsResult<()> {
        if self.pool.is_some() {
            return Err(PhysicsError::AlreadyInitialized);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .thread_name(|i| format!("physics-worker-{i}"))
            .build()
            .map_err(|e| PhysicsError::InitializationFailed(e.to_string()))?;
        self.pool = Some(pool);
        log::info!("rapier backend initialized with {} worker threads", self.worker_threads);
        Ok(())
    }

    fn shutdown(&mut self) -> PhysicsResult<()> {
        if self.pool.is_none() {
            return Err(PhysicsError::NotInitialized);
        }
        if self.active_scene.is_some() {
            return Err(PhysicsError::SceneStillActive);
        }
        if !self.shapes.is_empty() {
            log::warn!(
                "rapier backend: releasing {} unattached shapes at shutdown",
                self.shapes.len()
            );
            self.shapes.clear();
        }
        self.pool = None;
        log::info!("rapier backend shut down");
        Ok(())
    }

    fn create_scene(&mut self, desc: &SceneDescriptor) -> PhysicsResult<SceneHandle> {
        if self.pool.is_none() {
            return Err(PhysicsError::NotInitialized);
        }
        if self.active_scene.is_some() {
            return Err(PhysicsError::SceneAlreadyActive);
        }
        desc.layers.validate()?;

        let (index, generation) = self.scenes.insert(RapierScene::new(desc));
        let handle = SceneHandle::new(KIND, index, generation);
        self.active_scene = Some(handle);
        log::debug!(
            "rapier scene created: gravity {:?}, max {} bodies / {} contacts",
            desc.gravity.as_slice(),
            desc.max_bodies,
            desc.max_contacts
        );
        Ok(handle)
    }

    fn destroy_scene(&mut self, scene: SceneHandle) -> PhysicsResult<()> {
        if self.active_scene != Some(scene) {
            return Err(PhysicsError::UnknownScene);
        }
        if !self.bodies.is_empty() {
            return Err(PhysicsError::BodiesStillAlive {
                count: self.bodies.len(),
            });
        }
        self.scenes.remove(scene.index(), scene.generation());
        self.active_scene = None;
        Ok(())
    }

    fn create_shape(&mut self, desc: &ShapeDescriptor) -> Option<ShapeHandle> {
        if let Err(reason) = desc.geometry.validate() {
            log::warn!("rapier backend: invalid shape {:?}: {reason}", desc.geometry);
            return None;
        }
        let (index, generation) = self.shapes.insert(ShapeState::Pending {
            shape: native_shape(&desc.geometry),
            offset: desc.offset,
            material: ShapeMaterial::default(),
        });
        Some(ShapeHandle::new(KIND, index, generation))
    }

    fn set_shape_material(&mut self, shape: ShapeHandle, material: &ShapeMaterial) {
        if let Err(reason) = material.validate() {
            log::warn!("rapier backend: keeping previous material of {shape:?}: {reason}");
            return;
        }
        let state = if shape.backend() == KIND {
            self.shapes.get_mut(shape.index(), shape.generation())
        } else {
            None
        };
        match state {
            Some(ShapeState::Pending { material: m, .. }) => *m = *material,
            Some(ShapeState::Attached { collider }) => {
                let collider = *collider;
                if let Some(c) = self
                    .scene_mut()
                    .and_then(|scene| scene.colliders.get_mut(collider))
                {
                    c.set_friction(material.friction);
                    c.set_restitution(material.restitution);
                }
            }
            None => log_rejected(KIND, "shape", &shape),
        }
    }

    fn release_shape(&mut self, shape: ShapeHandle) {
        if shape.backend() != KIND {
            log_rejected(KIND, "shape", &shape);
            return;
        }
        match self.shapes.get(shape.index(), shape.generation()) {
            Some(ShapeState::Pending { .. }) => {
                self.shapes.remove(shape.index(), shape.generation());
            }
            Some(ShapeState::Attached { .. }) => {
                log::warn!("rapier backend: {shape:?} is attached; destroy its body instead");
            }
            None => log_rejected(KIND, "shape", &shape),
        }
    }

    fn create_body(
        &mut self,
        desc: &RigidBody,
        shape: ShapeHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle> {
        let live_bodies = self.bodies.len();
        let Some(scene) = self.scene() else {
            log::warn!("rapier backend: create_body without an active scene");
            return None;
        };
        if live_bodies >= scene.max_bodies as usize {
            log::warn!(
                "rapier backend: body capacity ({}) exhausted",
                scene.max_bodies
            );
            return None;
        }

        let (native, offset, material) = match (shape.backend() == KIND)
            .then(|| self.shapes.get(shape.index(), shape.generation()))
            .flatten()
        {
            Some(ShapeState::Pending {
                shape,
                offset,
                material,
            }) => (shape.clone(), *offset, *material),
            Some(ShapeState::Attached { .. }) => {
                log::warn!("rapier backend: {shape:?} is already attached to a body");
                return None;
            }
            None => {
                log_rejected(KIND, "shape", &shape);
                return None;
            }
        };

        let layer = ObjectLayer::for_motion(desc.motion_type);
        let groups = scene.interaction_groups(layer);
        let builder = match desc.motion_type {
            MotionType::Static => RigidBodyBuilder::fixed(),
            MotionType::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let rigid_body = builder
            .position(isometry_to_native(position, rotation))
            .locked_axes(native_locked_axes(desc.locked_axes))
            .ccd_enabled(desc.motion_quality == MotionQuality::Continuous)
            .gravity_scale(desc.effective_gravity_scale())
            .can_sleep(desc.allow_sleeping)
            .build();

        let mut collider = ColliderBuilder::new(native.clone())
            .translation(vec3_to_native(offset))
            .friction(material.friction)
            .restitution(material.restitution)
            .collision_groups(groups);
        if desc.motion_type == MotionType::Dynamic {
            if let Some(props) = mass_properties(&native, desc, offset) {
                collider = collider.mass_properties(props);
            }
        }

        let scene = self.scene_mut()?;
        let rigid_body = scene.bodies.insert(rigid_body);
        let collider = scene
            .colliders
            .insert_with_parent(collider.build(), rigid_body, &mut scene.bodies);

        if let Some(state) = self.shapes.get_mut(shape.index(), shape.generation()) {
            *state = ShapeState::Attached { collider };
        }
        let (index, generation) = self.bodies.insert(BodyEntry {
            rigid_body,
            shape,
            has_forces: false,
        });
        Some(BodyHandle::new(KIND, index, generation))
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        let Some(entry) = self.body_entry(body) else {
            return;
        };
        self.bodies.remove(body.index(), body.generation());
        self.shapes
            .remove(entry.shape.index(), entry.shape.generation());

        if let Some(scene) = self.scene_mut() {
            scene.bodies.remove(
                entry.rigid_body,
                &mut scene.islands,
                &mut scene.colliders,
                &mut scene.impulse_joints,
                &mut scene.multibody_joints,
                true,
            );
        }
    }

    fn step(&mut self, scene: SceneHandle, dt: f32) {
        profile_scope!("rapier: step");

        let Some(pool) = self.pool.as_ref() else {
            log::error!("rapier backend: step before init");
            return;
        };
        if self.active_scene != Some(scene) {
            log_rejected(KIND, "scene", &scene);
            return;
        }
        let Some(state) = self.scenes.get_mut(scene.index(), scene.generation()) else {
            return;
        };

        state.params.dt = dt;
        let RapierScene {
            gravity,
            params,
            pipeline,
            islands,
            broad_phase,
            narrow_phase,
            bodies,
            colliders,
            impulse_joints,
            multibody_joints,
            ccd_solver,
            ..
        } = &mut *state;
        pool.install(|| {
            pipeline.step(
                gravity,
                params,
                islands,
                broad_phase,
                narrow_phase,
                bodies,
                colliders,
                impulse_joints,
                multibody_joints,
                ccd_solver,
                None,
                &(),
                &(),
            );
        });

        for (_, _, entry) in self.bodies.iter_mut() {
            if std::mem::take(&mut entry.has_forces) {
                if let Some(rb) = state.bodies.get_mut(entry.rigid_body) {
                    rb.reset_forces(false);
                    rb.reset_torques(false);
                }
            }
        }

        let active_contacts = state
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .count();
        if active_contacts > state.max_contacts as usize && !state.contact_overflow_logged {
            state.contact_overflow_logged = true;
            log::warn!(
                "rapier backend: {active_contacts} active contact pairs exceed max_contacts ({})",
                state.max_contacts
            );
        }
    }

    fn pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        let entry = self.body_entry(body)?;
        let rb = self.scene()?.bodies.get(entry.rigid_body)?;
        Some(isometry_from_native(rb.position()))
    }

    fn add_force(&mut self, body: BodyHandle, force: Vec3) {
        self.mark_forced(body);
        self.with_body_mut(body, |rb| rb.add_force(vec3_to_native(force), true));
    }

    fn add_torque(&mut self, body: BodyHandle, torque: Vec3) {
        self.mark_forced(body);
        self.with_body_mut(body, |rb| rb.add_torque(vec3_to_native(torque), true));
    }

    fn add_impulse(&mut self, body: BodyHandle, impulse: Vec3) {
        self.with_body_mut(body, |rb| rb.apply_impulse(vec3_to_native(impulse), true));
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        let entry = self.body_entry(body)?;
        let rb = self.scene()?.bodies.get(entry.rigid_body)?;
        Some(vec3_from_native(rb.linvel()))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.with_body_mut(body, |rb| rb.set_linvel(vec3_to_native(velocity), true));
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}
