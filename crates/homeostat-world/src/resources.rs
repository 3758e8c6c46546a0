//! Consumable resources and their placement lifecycle.
//!
//! The [`ResourcePool`] exclusively owns where resources are. Consumption is
//! reported to it and the group's [`PlacementPolicy`] decides what happens:
//!
//! - `Static` -- nothing; the resource stays where it is.
//! - `Random` -- the resource is immediately re-rolled inside its range.
//! - `GroupedRandom` -- the resource is deactivated. When the active
//!   location group runs out, the whole group is cleared and a new group
//!   (possibly the same one) is chosen at random and spawned in full.
//!
//! Only one grouped-random location is live at a time.

use homeostat_types::{Aabb, PlacementPolicy, ResourceId, ResourceKind, Vec2};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::arena::Arena;
use crate::error::WorldError;
use crate::placement::{
    DEFAULT_OVERLAP_PADDING, PositionRange, RotationRange, ScaleRange, find_free_position,
};

/// Length of the olfactory scent profile carried by every resource.
pub const SCENT_FEATURES: usize = 10;

/// One resource group in the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceGroupConfig {
    /// Group name (used in logs and to identify grouped locations).
    pub name: String,

    /// Free-form display label.
    #[serde(default)]
    pub label: String,

    /// Resource kind spawned by this group.
    pub kind: ResourceKind,

    /// Placement policy applied on consumption.
    pub policy: PlacementPolicy,

    /// Number of resources in the group.
    #[serde(default = "default_count")]
    pub count: u32,

    /// Spawn range, relative to the arena origin.
    pub position: PositionRange,

    /// Spawn heading range in degrees.
    #[serde(default)]
    pub rotation: RotationRange,

    /// Spawn scale range.
    #[serde(default)]
    pub scale: ScaleRange,

    /// Footprint extents at scale 1.
    #[serde(default = "default_footprint")]
    pub footprint: Vec2,

    /// Olfactory scent profile; defaults by kind when absent.
    #[serde(default)]
    pub scent: Option<Vec<f64>>,
}

/// Resource configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceConfig {
    /// All resource groups.
    #[serde(default)]
    pub groups: Vec<ResourceGroupConfig>,

    /// Clearance kept between a spawned resource and anything else.
    #[serde(default = "default_padding")]
    pub overlap_padding: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            overlap_padding: default_padding(),
        }
    }
}

/// A spawned resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Identifier, unique within the pool's lifetime.
    pub id: ResourceId,
    /// Kind of resource.
    pub kind: ResourceKind,
    /// Placement policy inherited from the group.
    pub policy: PlacementPolicy,
    /// Index of the owning group in the configuration.
    pub group: usize,
    /// World-space position.
    pub position: Vec2,
    /// Yaw in degrees.
    pub heading: f64,
    /// Uniform scale.
    pub scale: f64,
    /// World-space footprint (unpadded).
    pub footprint: Aabb,
    /// Whether the resource can currently be sensed and consumed.
    pub active: bool,
}

/// What the pool did in response to a consumption.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// Static resource; nothing moved.
    Stayed,
    /// Random resource re-rolled to a new position.
    Relocated {
        /// The new position.
        position: Vec2,
    },
    /// Grouped resource deactivated; the group still has members left.
    GroupDepleting {
        /// Active members left in the group.
        remaining: u32,
    },
    /// Grouped resource was the last member; a new group was spawned.
    GroupRelocated {
        /// Index of the newly active group.
        group: usize,
        /// Its configured size, now the active count.
        count: u32,
    },
}

/// Owner of all resource entities and their placement policy.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    groups: Vec<GroupState>,
    padding: f64,
    items: Vec<Resource>,
    next_id: ResourceId,
    grouped: Vec<usize>,
    active_group: Option<usize>,
    active_remaining: u32,
}

/// A group with its range translated to world space.
#[derive(Debug, Clone)]
struct GroupState {
    config: ResourceGroupConfig,
    range: PositionRange,
    scent: Vec<f64>,
}

impl ResourcePool {
    /// Validate the configuration and build an empty pool.
    ///
    /// Call [`ResourcePool::reset`] to spawn resources for an episode.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] for an unordered position or
    /// scale range, a non-positive scale, a grouped-random group with no
    /// members, or a scent profile of the wrong length.
    pub fn new(config: &ResourceConfig, arena: &Arena) -> Result<Self, WorldError> {
        let mut groups = Vec::with_capacity(config.groups.len());
        let mut grouped = Vec::new();

        for (index, group) in config.groups.iter().enumerate() {
            validate_group(group)?;
            if group.policy == PlacementPolicy::GroupedRandom {
                grouped.push(index);
            }
            let scent = group
                .scent
                .clone()
                .unwrap_or_else(|| default_scent(group.kind).to_vec());
            groups.push(GroupState {
                config: group.clone(),
                range: group.position.offset(arena.origin()),
                scent,
            });
        }

        Ok(Self {
            groups,
            padding: config.overlap_padding.max(0.0),
            items: Vec::new(),
            next_id: ResourceId::new(0),
            grouped,
            active_group: None,
            active_remaining: 0,
        })
    }

    /// Clear every resource and spawn a fresh episode layout.
    ///
    /// Static groups spawn first, then random groups, then one randomly
    /// selected grouped-random location. `blocked` are footprints spawns must
    /// keep clear of (obstacles, the agent, predators).
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R, blocked: &[Aabb]) {
        self.items.clear();
        self.active_group = None;
        self.active_remaining = 0;

        for policy in [PlacementPolicy::Static, PlacementPolicy::Random] {
            let indices: Vec<usize> = self
                .groups
                .iter()
                .enumerate()
                .filter(|(_, g)| g.config.policy == policy)
                .map(|(i, _)| i)
                .collect();
            for index in indices {
                self.spawn_group(index, rng, blocked);
            }
        }

        self.select_grouped_location(rng, blocked);

        info!(
            resources = self.items.len(),
            active_group = ?self.active_group_name(),
            "Resource pool reset"
        );
    }

    /// Report that the agent consumed `id` and apply the placement policy.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ResourceNotFound`] for an unknown ID and
    /// [`WorldError::ResourceInactive`] for a resource already consumed.
    pub fn consume<R: Rng + ?Sized>(
        &mut self,
        id: ResourceId,
        rng: &mut R,
        blocked: &[Aabb],
    ) -> Result<ConsumeOutcome, WorldError> {
        let slot = self
            .items
            .iter()
            .position(|r| r.id == id)
            .ok_or(WorldError::ResourceNotFound(id))?;
        let resource = self.items.get(slot).ok_or(WorldError::ResourceNotFound(id))?;
        if !resource.active {
            return Err(WorldError::ResourceInactive(id));
        }

        match resource.policy {
            PlacementPolicy::Static => Ok(ConsumeOutcome::Stayed),
            PlacementPolicy::Random => {
                let group = resource.group;
                let mut occupied = self.occupied_except(id);
                occupied.extend_from_slice(blocked);
                let Some(state) = self.groups.get(group) else {
                    return Err(WorldError::ResourceNotFound(id));
                };
                let size = state.config.footprint.scale(resource.scale);
                let range = state.range;
                let placement = find_free_position(
                    rng,
                    |r| range.sample(r),
                    size,
                    self.padding,
                    &occupied,
                    range.center(),
                    &state.config.name,
                );
                let heading = state.config.rotation.sample(rng);
                if let Some(item) = self.items.get_mut(slot) {
                    item.position = placement.position;
                    item.footprint = placement.footprint;
                    item.heading = heading;
                }
                debug!(
                    %id,
                    x = placement.position.x,
                    z = placement.position.z,
                    "Resource relocated"
                );
                Ok(ConsumeOutcome::Relocated {
                    position: placement.position,
                })
            }
            PlacementPolicy::GroupedRandom => {
                if let Some(item) = self.items.get_mut(slot) {
                    item.active = false;
                }
                self.active_remaining = self.active_remaining.saturating_sub(1);
                if self.active_remaining > 0 {
                    debug!(%id, remaining = self.active_remaining, "Grouped resource consumed");
                    return Ok(ConsumeOutcome::GroupDepleting {
                        remaining: self.active_remaining,
                    });
                }

                if let Some(exhausted) = self.active_group {
                    self.items.retain(|r| r.group != exhausted);
                }
                self.select_grouped_location(rng, blocked);
                let group = self.active_group.unwrap_or_default();
                info!(
                    group = ?self.active_group_name(),
                    count = self.active_remaining,
                    "Grouped location exhausted, relocated"
                );
                Ok(ConsumeOutcome::GroupRelocated {
                    group,
                    count: self.active_remaining,
                })
            }
        }
    }

    /// Pick a random grouped-random location, spawn it, and lock it until
    /// its members are exhausted.
    fn select_grouped_location<R: Rng + ?Sized>(&mut self, rng: &mut R, blocked: &[Aabb]) {
        if self.grouped.is_empty() {
            self.active_group = None;
            self.active_remaining = 0;
            return;
        }
        let pick = rng.random_range(0..self.grouped.len());
        let Some(&group) = self.grouped.get(pick) else {
            return;
        };
        self.spawn_group(group, rng, blocked);
        self.active_group = Some(group);
        self.active_remaining = self.groups.get(group).map_or(0, |g| g.config.count);
    }

    fn spawn_group<R: Rng + ?Sized>(&mut self, group: usize, rng: &mut R, blocked: &[Aabb]) {
        let Some(state) = self.groups.get(group) else {
            return;
        };
        let config = state.config.clone();
        let range = state.range;

        for _ in 0..config.count {
            let scale = config.scale.sample(rng);
            let size = config.footprint.scale(scale);
            let mut occupied = self.occupied_except(ResourceId::new(u32::MAX));
            occupied.extend_from_slice(blocked);
            let placement = find_free_position(
                rng,
                |r| range.sample(r),
                size,
                self.padding,
                &occupied,
                range.center(),
                &config.name,
            );
            let heading = config.rotation.sample(rng);
            let id = self.next_id;
            self.next_id = self.next_id.next();
            self.items.push(Resource {
                id,
                kind: config.kind,
                policy: config.policy,
                group,
                position: placement.position,
                heading,
                scale,
                footprint: placement.footprint,
                active: true,
            });
        }
    }

    fn occupied_except(&self, id: ResourceId) -> Vec<Aabb> {
        self.items
            .iter()
            .filter(|r| r.active && r.id != id)
            .map(|r| r.footprint)
            .collect()
    }

    /// Look up a resource by ID.
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.items.iter().find(|r| r.id == id)
    }

    /// All resources that can currently be sensed or consumed.
    pub fn active(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter().filter(|r| r.active)
    }

    /// Closest active resource within `radius` of `point`.
    pub fn nearest_active_within(&self, point: Vec2, radius: f64) -> Option<&Resource> {
        self.active()
            .map(|r| (r, r.position.distance(point)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(r, _)| r)
    }

    /// Footprints of all active resources.
    pub fn footprints(&self) -> Vec<Aabb> {
        self.active().map(|r| r.footprint).collect()
    }

    /// Scent profile of a resource's group.
    pub fn scent_of(&self, resource: &Resource) -> &[f64] {
        self.groups
            .get(resource.group)
            .map_or(&[][..], |g| g.scent.as_slice())
    }

    /// Index of the live grouped-random location, if any.
    pub const fn active_group(&self) -> Option<usize> {
        self.active_group
    }

    /// Name of the live grouped-random location, if any.
    pub fn active_group_name(&self) -> Option<&str> {
        self.active_group
            .and_then(|g| self.groups.get(g))
            .map(|g| g.config.name.as_str())
    }

    /// Members of the live grouped-random location not yet consumed.
    pub const fn active_remaining(&self) -> u32 {
        self.active_remaining
    }
}

fn validate_group(group: &ResourceGroupConfig) -> Result<(), WorldError> {
    if !group.position.is_ordered() {
        return Err(WorldError::invalid(
            "resources.groups.position",
            format!("group '{}': min must not exceed max", group.name),
        ));
    }
    if group.scale.min <= 0.0 || group.scale.min > group.scale.max {
        return Err(WorldError::invalid(
            "resources.groups.scale",
            format!("group '{}': scale must be positive and ordered", group.name),
        ));
    }
    if group.policy == PlacementPolicy::GroupedRandom && group.count == 0 {
        return Err(WorldError::invalid(
            "resources.groups.count",
            format!("grouped group '{}' must have at least one member", group.name),
        ));
    }
    if let Some(scent) = &group.scent
        && scent.len() != SCENT_FEATURES
    {
        return Err(WorldError::invalid(
            "resources.groups.scent",
            format!(
                "group '{}': expected {SCENT_FEATURES} values, got {}",
                group.name,
                scent.len()
            ),
        ));
    }
    Ok(())
}

/// Default scent profile for a resource kind.
pub const fn default_scent(kind: ResourceKind) -> [f64; SCENT_FEATURES] {
    match kind {
        ResourceKind::Food => [1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ResourceKind::Water | ResourceKind::Pond => {
            [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
        }
    }
}

const fn default_count() -> u32 {
    1
}

const fn default_footprint() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

const fn default_padding() -> f64 {
    DEFAULT_OVERLAP_PADDING
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::arena::ArenaConfig;
    use crate::rng::{Stream, derive_rng};

    fn arena() -> Arena {
        Arena::new(&ArenaConfig {
            origin: Vec2::ZERO,
            floor_size: Vec2::new(60.0, 60.0),
            obstacles: Vec::new(),
        })
        .unwrap()
    }

    fn group(name: &str, policy: PlacementPolicy, count: u32, center: Vec2) -> ResourceGroupConfig {
        ResourceGroupConfig {
            name: name.to_owned(),
            label: String::new(),
            kind: ResourceKind::Food,
            policy,
            count,
            position: PositionRange {
                min: center.minus(Vec2::new(5.0, 5.0)),
                max: center.plus(Vec2::new(5.0, 5.0)),
            },
            rotation: RotationRange::default(),
            scale: ScaleRange::default(),
            footprint: Vec2::new(0.5, 0.5),
            scent: None,
        }
    }

    fn pool(groups: Vec<ResourceGroupConfig>) -> ResourcePool {
        let config = ResourceConfig {
            groups,
            overlap_padding: 0.1,
        };
        ResourcePool::new(&config, &arena()).unwrap()
    }

    #[test]
    fn reset_spawns_static_random_and_one_grouped_location() {
        let mut pool = pool(vec![
            group("pond", PlacementPolicy::Static, 1, Vec2::new(-20.0, -20.0)),
            group("water", PlacementPolicy::Random, 2, Vec2::ZERO),
            group("grove-a", PlacementPolicy::GroupedRandom, 3, Vec2::new(20.0, 20.0)),
            group("grove-b", PlacementPolicy::GroupedRandom, 4, Vec2::new(-20.0, 20.0)),
        ]);
        let mut rng = derive_rng(5, Stream::Resources);
        pool.reset(&mut rng, &[]);

        let grouped = pool.active_group().unwrap();
        let expected = if grouped == 2 { 3 } else { 4 };
        assert_eq!(pool.active_remaining(), expected);
        assert_eq!(pool.active().count(), 1 + 2 + expected as usize);
    }

    #[test]
    fn static_resources_stay_put() {
        let mut pool = pool(vec![group("pond", PlacementPolicy::Static, 1, Vec2::ZERO)]);
        let mut rng = derive_rng(5, Stream::Resources);
        pool.reset(&mut rng, &[]);
        let r = pool.active().next().unwrap().clone();
        let outcome = pool.consume(r.id, &mut rng, &[]).unwrap();
        assert_eq!(outcome, ConsumeOutcome::Stayed);
        assert_eq!(pool.get(r.id).unwrap().position, r.position);
    }

    #[test]
    fn random_resources_relocate_within_range() {
        let mut pool = pool(vec![group("water", PlacementPolicy::Random, 1, Vec2::ZERO)]);
        let mut rng = derive_rng(5, Stream::Resources);
        pool.reset(&mut rng, &[]);
        let id = pool.active().next().unwrap().id;
        for _ in 0..20 {
            let outcome = pool.consume(id, &mut rng, &[]).unwrap();
            let ConsumeOutcome::Relocated { position } = outcome else {
                panic!("expected relocation, got {outcome:?}");
            };
            assert!(position.x.abs() <= 5.0 && position.z.abs() <= 5.0);
            assert!(pool.get(id).unwrap().active);
        }
    }

    #[test]
    fn grouped_location_relocates_when_exhausted() {
        let mut pool = pool(vec![
            group("grove-a", PlacementPolicy::GroupedRandom, 2, Vec2::new(20.0, 20.0)),
            group("grove-b", PlacementPolicy::GroupedRandom, 3, Vec2::new(-20.0, -20.0)),
        ]);
        let mut rng = derive_rng(9, Stream::Resources);
        pool.reset(&mut rng, &[]);

        for _ in 0..10 {
            let first_group = pool.active_group().unwrap();
            let size = pool.active_remaining();
            let ids: Vec<ResourceId> = pool.active().map(|r| r.id).collect();
            assert_eq!(ids.len(), size as usize);

            let (last, rest) = ids.split_last().unwrap();
            for (n, id) in rest.iter().enumerate() {
                let outcome = pool.consume(*id, &mut rng, &[]).unwrap();
                let expected = size - 1 - u32::try_from(n).unwrap();
                assert_eq!(outcome, ConsumeOutcome::GroupDepleting { remaining: expected });
                assert!(!pool.get(*id).unwrap().active);
                assert_eq!(pool.active_group(), Some(first_group));
            }

            let outcome = pool.consume(*last, &mut rng, &[]).unwrap();
            let ConsumeOutcome::GroupRelocated { group, count } = outcome else {
                panic!("expected relocation, got {outcome:?}");
            };
            let configured = if group == 0 { 2 } else { 3 };
            assert_eq!(count, configured);
            assert_eq!(pool.active_remaining(), configured);
            assert_eq!(pool.active().count(), configured as usize);
            assert!(pool.get(*last).is_none());
        }
    }

    #[test]
    fn consuming_twice_is_an_error() {
        let mut pool = pool(vec![group("grove", PlacementPolicy::GroupedRandom, 2, Vec2::ZERO)]);
        let mut rng = derive_rng(1, Stream::Resources);
        pool.reset(&mut rng, &[]);
        let id = pool.active().next().unwrap().id;
        assert!(pool.consume(id, &mut rng, &[]).is_ok());
        assert!(matches!(
            pool.consume(id, &mut rng, &[]),
            Err(WorldError::ResourceInactive(_))
        ));
        assert!(matches!(
            pool.consume(ResourceId::new(999), &mut rng, &[]),
            Err(WorldError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn nearest_within_radius() {
        let mut pool = pool(vec![group("pond", PlacementPolicy::Static, 1, Vec2::ZERO)]);
        let mut rng = derive_rng(1, Stream::Resources);
        pool.reset(&mut rng, &[]);
        let at = pool.active().next().unwrap().position;
        assert!(pool.nearest_active_within(at.plus(Vec2::new(0.5, 0.0)), 1.0).is_some());
        assert!(pool.nearest_active_within(at.plus(Vec2::new(30.0, 0.0)), 1.0).is_none());
    }

    #[test]
    fn invalid_groups_are_rejected() {
        let mut bad = group("grove", PlacementPolicy::GroupedRandom, 0, Vec2::ZERO);
        let config = ResourceConfig {
            groups: vec![bad.clone()],
            ..ResourceConfig::default()
        };
        assert!(ResourcePool::new(&config, &arena()).is_err());

        bad.count = 1;
        bad.scent = Some(vec![1.0; 3]);
        let config = ResourceConfig {
            groups: vec![bad],
            ..ResourceConfig::default()
        };
        assert!(ResourcePool::new(&config, &arena()).is_err());
    }

    #[test]
    fn scent_defaults_by_kind() {
        let mut pool = pool(vec![group("apple", PlacementPolicy::Static, 1, Vec2::ZERO)]);
        let mut rng = derive_rng(1, Stream::Resources);
        pool.reset(&mut rng, &[]);
        let r = pool.active().next().unwrap().clone();
        assert_eq!(pool.scent_of(&r), &default_scent(ResourceKind::Food)[..]);
    }
}
