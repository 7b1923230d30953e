//! Sequential-impulse rigid body solver over parry3d-f64 contact queries.
//!
//! One step: integrate velocities, find contacts (brute-force AABB broad
//! phase filtered by object layer, then exact narrow phase), iterate contact
//! impulses with Coulomb friction, and integrate positions about each body's
//! center of mass.

use parry3d_f64::bounding_volume::{Aabb, BoundingVolume};
use parry3d_f64::na::{Isometry3, Matrix3, Quaternion, Translation3, UnitQuaternion, Vector3};
use parry3d_f64::query::{self, Contact};
use parry3d_f64::shape::Shape;

use super::material::{Material, MixedMaterial};
use crate::layers::{LayerConfig, ObjectLayer};

/// Closing speed (m/s) below which contacts do not bounce.
pub const RESTITUTION_VELOCITY_THRESHOLD: f64 = 1.0;
/// Fraction of penetration removed per step.
const BAUMGARTE: f64 = 0.2;
/// Penetration (m) tolerated without positional correction.
const PENETRATION_SLOP: f64 = 0.005;
/// Tangential speed (m/s) under which static friction applies.
const STATIC_FRICTION_SPEED: f64 = 0.01;

/// Simulation state of one actor.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub is_static: bool,
    pub layer: ObjectLayer,
    /// World position of the body origin.
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub linvel: Vector3<f64>,
    pub angvel: Vector3<f64>,
    /// Accumulated since the last step.
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
    pub inv_mass: f64,
    pub inv_inertia_local: Vector3<f64>,
    pub local_com: Vector3<f64>,
    pub gravity_scale: f64,
    /// 1.0 for free axes, 0.0 for locked ones.
    pub linear_free: Vector3<f64>,
    pub angular_free: Vector3<f64>,
}

impl Actor {
    pub fn new_static(position: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            is_static: true,
            layer: ObjectLayer::NON_MOVING,
            position,
            rotation,
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            inv_mass: 0.0,
            inv_inertia_local: Vector3::zeros(),
            local_com: Vector3::zeros(),
            gravity_scale: 0.0,
            linear_free: Vector3::zeros(),
            angular_free: Vector3::zeros(),
        }
    }

    /// A dynamic actor whose mass is `mass` (or the shape's unit-density mass
    /// when `mass` is not positive), with inertia taken from the shape.
    pub fn new_dynamic(
        shape: &dyn Shape,
        mass: f64,
        local_com: Vector3<f64>,
        position: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        let unit = shape.mass_properties(1.0);
        let mass = if mass > 0.0 { mass } else { unit.mass() };
        let scale = if unit.mass() > 0.0 {
            mass / unit.mass()
        } else {
            0.0
        };
        let inertia = unit.principal_inertia() * scale;
        Self {
            is_static: false,
            layer: ObjectLayer::MOVING,
            inv_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inv_inertia_local: inertia.map(|i| if i > 0.0 { 1.0 / i } else { 0.0 }),
            local_com,
            gravity_scale: 1.0,
            linear_free: Vector3::repeat(1.0),
            angular_free: Vector3::repeat(1.0),
            ..Self::new_static(position, rotation)
        }
    }

    /// World-space center of mass.
    pub fn com(&self) -> Vector3<f64> {
        self.position + self.rotation * self.local_com
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.rotation)
    }

    fn inv_mass_vec(&self) -> Vector3<f64> {
        self.linear_free * self.inv_mass
    }

    /// World inverse inertia with locked rotation axes removed.
    fn inv_inertia_world(&self) -> Matrix3<f64> {
        let r = self.rotation.to_rotation_matrix().into_inner();
        let free = Matrix3::from_diagonal(&self.angular_free);
        free * r * Matrix3::from_diagonal(&self.inv_inertia_local) * r.transpose() * free
    }

    /// Instantaneous impulse through the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vector3<f64>) {
        if !self.is_static {
            self.linvel += self.inv_mass_vec().component_mul(&impulse);
        }
    }

    pub fn set_linvel(&mut self, velocity: Vector3<f64>) {
        if !self.is_static {
            self.linvel = velocity.component_mul(&self.linear_free);
        }
    }
}

/// Collision geometry paired with an actor.
pub struct Collidable<'a> {
    pub shape: &'a dyn Shape,
    /// Shape position relative to the actor origin.
    pub offset: Vector3<f64>,
    pub material: Material,
}

pub struct StepParams<'a> {
    pub gravity: Vector3<f64>,
    pub dt: f64,
    pub iterations: u32,
    pub layers: &'a LayerConfig,
    pub max_contacts: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub contacts: usize,
    /// Contacts discarded because `max_contacts` was reached.
    pub dropped: usize,
}

/// Advances `actors` by `params.dt`. `collidables[i]` belongs to `actors[i]`.
pub fn step(actors: &mut [Actor], collidables: &[Collidable<'_>], params: &StepParams<'_>) -> StepReport {
    debug_assert_eq!(actors.len(), collidables.len());
    if !(params.dt > 0.0) {
        return StepReport::default();
    }

    integrate_velocities(actors, params);

    let inv_inertia: Vec<Matrix3<f64>> = actors.iter().map(Actor::inv_inertia_world).collect();
    let mut report = StepReport::default();
    let mut constraints = find_contacts(actors, collidables, &inv_inertia, params, &mut report);

    for _ in 0..params.iterations {
        for constraint in &mut constraints {
            constraint.solve(actors, &inv_inertia);
        }
    }

    integrate_positions(actors, params.dt);
    report.contacts = constraints.len();
    report
}

fn integrate_velocities(actors: &mut [Actor], params: &StepParams<'_>) {
    for actor in actors.iter_mut().filter(|a| !a.is_static) {
        let acceleration = params.gravity * actor.gravity_scale + actor.force * actor.inv_mass;
        actor.linvel += acceleration * params.dt;
        actor.angvel += actor.inv_inertia_world() * actor.torque * params.dt;
        actor.linvel.component_mul_assign(&actor.linear_free);
        actor.angvel.component_mul_assign(&actor.angular_free);
        actor.force = Vector3::zeros();
        actor.torque = Vector3::zeros();
    }
}

fn integrate_positions(actors: &mut [Actor], dt: f64) {
    for actor in actors.iter_mut().filter(|a| !a.is_static) {
        let com = actor.com() + actor.linvel * dt;
        let q = actor.rotation.into_inner();
        let w = actor.angvel;
        let spin = Quaternion::new(0.0, w.x, w.y, w.z) * q * (0.5 * dt);
        actor.rotation = UnitQuaternion::new_normalize(q + spin);
        actor.position = com - actor.rotation * actor.local_com;
    }
}

fn find_contacts(
    actors: &[Actor],
    collidables: &[Collidable<'_>],
    inv_inertia: &[Matrix3<f64>],
    params: &StepParams<'_>,
    report: &mut StepReport,
) -> Vec<ContactConstraint> {
    let poses: Vec<Isometry3<f64>> = actors
        .iter()
        .zip(collidables)
        .map(|(actor, c)| actor.isometry() * Translation3::from(c.offset))
        .collect();
    let bounds: Vec<Aabb> = collidables
        .iter()
        .zip(&poses)
        .map(|(c, pose)| c.shape.compute_aabb(pose))
        .collect();

    let mut constraints = Vec::new();
    for i in 0..actors.len() {
        for j in (i + 1)..actors.len() {
            let (a, b) = (&actors[i], &actors[j]);
            if a.is_static && b.is_static {
                continue;
            }
            if !params.layers.should_collide(a.layer, b.layer) {
                continue;
            }
            if !bounds[i].intersects(&bounds[j]) {
                continue;
            }
            let contact = match query::contact(
                &poses[i],
                collidables[i].shape,
                &poses[j],
                collidables[j].shape,
                0.0,
            ) {
                Ok(Some(contact)) => contact,
                Ok(None) => continue,
                Err(unsupported) => {
                    log::debug!("impulse backend: no contact query for pair: {unsupported:?}");
                    continue;
                }
            };
            if constraints.len() >= params.max_contacts {
                report.dropped += 1;
                continue;
            }
            let mixed = MixedMaterial::mix(&collidables[i].material, &collidables[j].material);
            constraints.push(ContactConstraint::new(
                (i, j),
                &contact,
                actors,
                inv_inertia,
                &mixed,
                params.dt,
            ));
        }
    }
    constraints
}

struct ContactConstraint {
    a: usize,
    b: usize,
    normal: Vector3<f64>,
    tangents: [Vector3<f64>; 2],
    ra: Vector3<f64>,
    rb: Vector3<f64>,
    normal_mass: f64,
    tangent_mass: [f64; 2],
    /// Target separating velocity along the normal.
    bias: f64,
    friction: f64,
    normal_impulse: f64,
    tangent_impulse: [f64; 2],
}

impl ContactConstraint {
    fn new(
        (a, b): (usize, usize),
        contact: &Contact,
        actors: &[Actor],
        inv_inertia: &[Matrix3<f64>],
        mixed: &MixedMaterial,
        dt: f64,
    ) -> Self {
        let normal = contact.normal1.into_inner();
        let point = (contact.point1.coords + contact.point2.coords) * 0.5;
        let ra = point - actors[a].com();
        let rb = point - actors[b].com();
        let tangents = tangent_basis(&normal);

        let mass_along = |dir: &Vector3<f64>| {
            let k = dir.dot(&actors[a].inv_mass_vec().component_mul(dir))
                + dir.dot(&actors[b].inv_mass_vec().component_mul(dir))
                + (inv_inertia[a] * ra.cross(dir)).cross(&ra).dot(dir)
                + (inv_inertia[b] * rb.cross(dir)).cross(&rb).dot(dir);
            if k > f64::EPSILON {
                1.0 / k
            } else {
                0.0
            }
        };

        let relative = relative_velocity(&actors[a], &actors[b], &ra, &rb);
        let approach = relative.dot(&normal);
        let restitution = if approach < -RESTITUTION_VELOCITY_THRESHOLD {
            -mixed.restitution * approach
        } else {
            0.0
        };
        let penetration = -contact.dist;
        let correction = BAUMGARTE / dt * (penetration - PENETRATION_SLOP).max(0.0);
        let sliding = (relative - normal * approach).norm();
        let friction = if sliding < STATIC_FRICTION_SPEED {
            mixed.static_friction
        } else {
            mixed.dynamic_friction
        };

        Self {
            a,
            b,
            normal,
            tangents,
            ra,
            rb,
            normal_mass: mass_along(&normal),
            tangent_mass: [mass_along(&tangents[0]), mass_along(&tangents[1])],
            bias: restitution.max(correction),
            friction,
            normal_impulse: 0.0,
            tangent_impulse: [0.0; 2],
        }
    }

    fn solve(&mut self, actors: &mut [Actor], inv_inertia: &[Matrix3<f64>]) {
        let (a, b) = pair_mut(actors, self.a, self.b);
        let (ia, ib) = (&inv_inertia[self.a], &inv_inertia[self.b]);

        let vn = relative_velocity(a, b, &self.ra, &self.rb).dot(&self.normal);
        let lambda = self.normal_mass * (self.bias - vn);
        let previous = self.normal_impulse;
        self.normal_impulse = (previous + lambda).max(0.0);
        let delta = self.normal_impulse - previous;
        self.apply(a, b, ia, ib, self.normal * delta);

        let limit = self.friction * self.normal_impulse;
        for k in 0..2 {
            let tangent = self.tangents[k];
            let vt = relative_velocity(a, b, &self.ra, &self.rb).dot(&tangent);
            let lambda = -self.tangent_mass[k] * vt;
            let previous = self.tangent_impulse[k];
            self.tangent_impulse[k] = (previous + lambda).clamp(-limit, limit);
            let delta = self.tangent_impulse[k] - previous;
            self.apply(a, b, ia, ib, tangent * delta);
        }
    }

    fn apply(&self, a: &mut Actor, b: &mut Actor, ia: &Matrix3<f64>, ib: &Matrix3<f64>, impulse: Vector3<f64>) {
        if !a.is_static {
            a.linvel -= a.inv_mass_vec().component_mul(&impulse);
            a.angvel -= ia * self.ra.cross(&impulse);
        }
        if !b.is_static {
            b.linvel += b.inv_mass_vec().component_mul(&impulse);
            b.angvel += ib * self.rb.cross(&impulse);
        }
    }
}

fn relative_velocity(a: &Actor, b: &Actor, ra: &Vector3<f64>, rb: &Vector3<f64>) -> Vector3<f64> {
    (b.linvel + b.angvel.cross(rb)) - (a.linvel + a.angvel.cross(ra))
}

fn tangent_basis(n: &Vector3<f64>) -> [Vector3<f64>; 2] {
    let t1 = if n.x.abs() > 0.577 {
        Vector3::new(n.y, -n.x, 0.0)
    } else {
        Vector3::new(0.0, n.z, -n.y)
    }
    .normalize();
    [t1, n.cross(&t1)]
}

/// Mutable access to two distinct actors, `i < j`.
fn pair_mut(actors: &mut [Actor], i: usize, j: usize) -> (&mut Actor, &mut Actor) {
    let (left, right) = actors.split_at_mut(j);
    (&mut left[i], &mut right[0])
}
