//! Fixed-step rigid-body world
//!
//! Thin wrapper over rapier2d exposing only what the game needs: static line
//! boundaries, dynamic circles, removal, one fixed step at a time, and the list of
//! contacts that started during the last step. Bodies are addressed by `BodyId`,
//! allocated here in increasing order so every iteration over bodies is stable.

use std::collections::BTreeMap;

use glam::Vec2;
use std::sync::mpsc::{Receiver, channel as unbounded};
use rapier2d::prelude::*;

use crate::consts::{GRAVITY, STEP_SECONDS};

/// Identity of a body in the world (never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

/// Two bodies whose contact started during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
}

impl Contact {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        Self { a, b }
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }
}

/// Kind of body tracked by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Boundary,
    Circle,
}

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    handle: RigidBodyHandle,
    kind: BodyKind,
}

/// The simulation world
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    events: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    /// Live bodies by id
    entries: BTreeMap<BodyId, BodyEntry>,
    /// Contacts started during the last step
    contacts: Vec<Contact>,
    next_id: u32,
    /// Completed fixed steps
    pub steps: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world with the game's gravity and fixed step
    pub fn new() -> Self {
        let (collision_send, collision_events) = unbounded();
        // Force events are never enabled on colliders; nothing listens for them
        let (force_send, _) = unbounded();
        let mut params = IntegrationParameters::default();
        params.dt = STEP_SECONDS;
        // World units are pixels; tolerances scale with this
        params.length_unit = 100.0;

        Self {
            gravity: vector![0.0, GRAVITY],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            entries: BTreeMap::new(),
            contacts: Vec::new(),
            next_id: 1,
            steps: 0,
        }
    }

    fn allocate_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Static line segment from `start` to `end` (world coordinates)
    pub fn create_static_line(&mut self, start: Vec2, end: Vec2) -> BodyId {
        let id = self.allocate_id();
        let handle = self.bodies.insert(RigidBodyBuilder::fixed().build());
        let collider = ColliderBuilder::segment(point![start.x, start.y], point![end.x, end.y])
            .friction(0.5)
            .restitution(0.1)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(id.0 as u128)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.entries.insert(
            id,
            BodyEntry {
                handle,
                kind: BodyKind::Boundary,
            },
        );
        id
    }

    /// Dynamic circle at `pos`, at rest
    pub fn create_circle(&mut self, pos: Vec2, radius: f32) -> BodyId {
        let id = self.allocate_id();
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![pos.x, pos.y])
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .density(1.0)
            .friction(0.5)
            .restitution(0.1)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(id.0 as u128)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.entries.insert(
            id,
            BodyEntry {
                handle,
                kind: BodyKind::Circle,
            },
        );
        id
    }

    /// Remove a body and its collider; returns false if it was already gone
    pub fn destroy(&mut self, id: BodyId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.bodies.remove(
            entry.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.contacts.retain(|c| !c.involves(id));
        true
    }

    /// Center of a live body
    pub fn position(&self, id: BodyId) -> Option<Vec2> {
        let entry = self.entries.get(&id)?;
        let t = self.bodies.get(entry.handle)?.translation();
        Some(Vec2::new(t.x, t.y))
    }

    /// Teleport a body (tests and debugging)
    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self
            .entries
            .get(&id)
            .and_then(|e| self.bodies.get_mut(e.handle))
        {
            body.set_translation(vector![pos.x, pos.y], true);
            body.set_linvel(vector![0.0, 0.0], true);
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Live dynamic bodies in id order
    pub fn circles(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.kind == BodyKind::Circle)
            .map(|(id, _)| *id)
    }

    /// Live static boundaries in id order
    pub fn boundaries(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.kind == BodyKind::Boundary)
            .map(|(id, _)| *id)
    }

    /// Endpoints of a boundary segment in world coordinates
    pub fn segment(&self, id: BodyId) -> Option<(Vec2, Vec2)> {
        let entry = self.entries.get(&id)?;
        let body = self.bodies.get(entry.handle)?;
        let collider = self.colliders.get(*body.colliders().first()?)?;
        let segment = collider.shape().as_segment()?;
        let pos = collider.position();
        let a = pos * segment.a;
        let b = pos * segment.b;
        Some((Vec2::new(a.x, a.y), Vec2::new(b.x, b.y)))
    }

    /// Advance exactly one fixed step and record the contacts that started in it
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &self.events,
        );
        self.steps += 1;

        self.contacts.clear();
        while let Ok(event) = self.collision_events.try_recv() {
            if !event.started() {
                continue;
            }
            let a = self.colliders.get(event.collider1()).map(|c| BodyId(c.user_data as u32));
            let b = self.colliders.get(event.collider2()).map(|c| BodyId(c.user_data as u32));
            if let (Some(a), Some(b)) = (a, b) {
                if self.entries.contains_key(&a) && self.entries.contains_key(&b) {
                    self.contacts.push(Contact::new(a, b));
                }
            }
        }
    }

    /// Contacts that started during the most recent step
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
}
