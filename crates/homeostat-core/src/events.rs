//! Per-instance event bus and the trigger zones that feed it.
//!
//! Every environment owns its own [`EventBus`]; nothing is process-wide, so
//! independent instances can run side by side. Handlers do not touch the
//! simulation directly. They return [`EventEffect`] values that the tick
//! applies in its own phase.

use std::collections::HashMap;

use homeostat_types::{PredatorId, Vec2};
use tracing::{debug, info};

use crate::config::{EventGroupConfig, EventsConfig};

/// Who set off a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventInvoker {
    /// The agent.
    Agent,
    /// A predator.
    Predator(PredatorId),
}

impl EventInvoker {
    /// The target tag this invoker matches.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Predator(_) => "predator",
        }
    }
}

/// What a handler asks the tick to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EventEffect {
    /// Record a message.
    Message {
        /// Tag that fired.
        tag: String,
        /// Message text.
        text: String,
    },
    /// Set the agent's food and water levels (clamped into range by the
    /// tick).
    SetLevels {
        /// Tag that fired.
        tag: String,
        /// New food level.
        food: f64,
        /// New water level.
        water: f64,
    },
}

impl EventEffect {
    /// Tag that produced the effect.
    pub fn tag(&self) -> &str {
        match self {
            Self::Message { tag, .. } | Self::SetLevels { tag, .. } => tag,
        }
    }
}

/// A subscriber callback.
pub type EventHandler = Box<dyn Fn(EventInvoker) -> Option<EventEffect> + Send>;

struct Subscription {
    handlers: Vec<EventHandler>,
    count: u32,
    /// `None` means unlimited.
    max_count: Option<u32>,
}

/// Tag-keyed subscriber lists with per-tag fire caps.
#[derive(Default)]
pub struct EventBus {
    subscriptions: HashMap<String, Subscription>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("tags", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `tag`.
    ///
    /// The fire cap is fixed by the first registration for a tag; a
    /// negative `max_count` means unlimited.
    pub fn register(&mut self, tag: &str, handler: EventHandler, max_count: i32) {
        let subscription = self
            .subscriptions
            .entry(tag.to_owned())
            .or_insert_with(|| Subscription {
                handlers: Vec::new(),
                count: 0,
                max_count: u32::try_from(max_count).ok(),
            });
        subscription.handlers.push(handler);
    }

    /// Fire every handler of `tag` in registration order.
    ///
    /// Unknown tags and tags at their fire cap do nothing.
    pub fn trigger(&mut self, tag: &str, invoker: EventInvoker) -> Vec<EventEffect> {
        let Some(subscription) = self.subscriptions.get_mut(tag) else {
            return Vec::new();
        };
        if let Some(max) = subscription.max_count
            && subscription.count >= max
        {
            debug!(tag, count = subscription.count, max, "Event at fire cap, skipped");
            return Vec::new();
        }
        let effects = subscription
            .handlers
            .iter()
            .filter_map(|handler| handler(invoker))
            .collect();
        subscription.count = subscription.count.saturating_add(1);
        effects
    }

    /// Zero every fire counter.
    pub fn reset_counts(&mut self) {
        for subscription in self.subscriptions.values_mut() {
            subscription.count = 0;
        }
    }

    /// Times `tag` has fired since the last reset.
    pub fn count(&self, tag: &str) -> u32 {
        self.subscriptions.get(tag).map_or(0, |s| s.count)
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
        debug!("Event bus cleared");
    }

    /// Build a bus with the built-in handlers for each configured group.
    pub fn from_config(config: &EventsConfig) -> Self {
        let mut bus = Self::new();
        for group in &config.groups {
            bus.register(&group.trigger_tag, handler_for(group), group.max_count);
        }
        info!(groups = config.groups.len(), "Event handlers registered");
        bus
    }
}

/// Message handler for groups with a message, resource handler otherwise.
fn handler_for(group: &EventGroupConfig) -> EventHandler {
    let tag = group.trigger_tag.clone();
    if let Some(text) = group.message.clone() {
        Box::new(move |invoker| {
            info!(tag = %tag, invoker = invoker.tag(), message = %text, "Event message");
            Some(EventEffect::Message {
                tag: tag.clone(),
                text: text.clone(),
            })
        })
    } else {
        let (food, water) = (group.food_value, group.water_value);
        Box::new(move |invoker| {
            (invoker == EventInvoker::Agent).then(|| EventEffect::SetLevels {
                tag: tag.clone(),
                food,
                water,
            })
        })
    }
}

/// A circular trigger zone in world space.
#[derive(Debug, Clone, PartialEq)]
struct TriggerZone {
    trigger_tag: String,
    target_tag: String,
    center: Vec2,
    radius: f64,
    /// Invokers inside the zone as of the last check.
    inside: Vec<EventInvoker>,
}

/// Trigger zones; a zone fires when a matching entity enters it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriggerZones {
    zones: Vec<TriggerZone>,
}

impl TriggerZones {
    /// Build the zones for each configured group.
    pub fn from_config(config: &EventsConfig, origin: Vec2) -> Self {
        let zones = config
            .groups
            .iter()
            .map(|group| TriggerZone {
                trigger_tag: group.trigger_tag.clone(),
                target_tag: group.target_tag.clone(),
                center: origin.plus(group.position),
                radius: group.radius,
                inside: Vec::new(),
            })
            .collect();
        Self { zones }
    }

    /// Forget who is inside, so an entity spawning in a zone fires it.
    pub fn reset(&mut self) {
        for zone in &mut self.zones {
            zone.inside.clear();
        }
    }

    /// Tags fired by entities entering a zone since the last check.
    pub fn check(&mut self, entities: &[(EventInvoker, Vec2)]) -> Vec<(String, EventInvoker)> {
        let mut fired = Vec::new();
        for zone in &mut self.zones {
            let now: Vec<EventInvoker> = entities
                .iter()
                .filter(|(invoker, position)| {
                    invoker.tag() == zone.target_tag
                        && position.distance(zone.center) <= zone.radius
                })
                .map(|(invoker, _)| *invoker)
                .collect();
            for invoker in &now {
                if !zone.inside.contains(invoker) {
                    fired.push((zone.trigger_tag.clone(), *invoker));
                }
            }
            zone.inside = now;
        }
        fired
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether there are no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(tag: &'static str) -> EventHandler {
        Box::new(move |_| {
            Some(EventEffect::Message {
                tag: tag.to_owned(),
                text: "hi".to_owned(),
            })
        })
    }

    #[test]
    fn trigger_runs_handlers_in_order() {
        let mut bus = EventBus::new();
        bus.register("door", message("first"), -1);
        bus.register("door", message("second"), -1);
        let effects = bus.trigger("door", EventInvoker::Agent);
        let tags: Vec<&str> = effects.iter().map(EventEffect::tag).collect();
        assert_eq!(tags, vec!["first", "second"]);
        assert_eq!(bus.count("door"), 1);
    }

    #[test]
    fn fire_cap_is_respected_until_reset() {
        let mut bus = EventBus::new();
        bus.register("door", message("door"), 2);
        assert_eq!(bus.trigger("door", EventInvoker::Agent).len(), 1);
        assert_eq!(bus.trigger("door", EventInvoker::Agent).len(), 1);
        assert!(bus.trigger("door", EventInvoker::Agent).is_empty());
        assert_eq!(bus.count("door"), 2);
        bus.reset_counts();
        assert_eq!(bus.count("door"), 0);
        assert_eq!(bus.trigger("door", EventInvoker::Agent).len(), 1);
    }

    #[test]
    fn unknown_tag_and_clear() {
        let mut bus = EventBus::new();
        assert!(bus.trigger("nothing", EventInvoker::Agent).is_empty());
        assert_eq!(bus.count("nothing"), 0);
        bus.register("door", message("door"), -1);
        bus.clear();
        assert!(bus.trigger("door", EventInvoker::Agent).is_empty());
    }

    #[test]
    fn resource_handler_ignores_predators() {
        let config = EventsConfig {
            groups: vec![EventGroupConfig {
                name: "oasis".to_owned(),
                trigger_tag: "resource".to_owned(),
                target_tag: "agent".to_owned(),
                max_count: -1,
                position: Vec2::ZERO,
                radius: 1.0,
                food_value: 2.0,
                water_value: 3.0,
                message: None,
            }],
        };
        let mut bus = EventBus::from_config(&config);
        let effects = bus.trigger("resource", EventInvoker::Agent);
        assert_eq!(
            effects,
            vec![EventEffect::SetLevels {
                tag: "resource".to_owned(),
                food: 2.0,
                water: 3.0
            }]
        );
        let none = bus.trigger("resource", EventInvoker::Predator(PredatorId::new(0)));
        assert!(none.is_empty());
    }

    #[test]
    fn zones_fire_on_entry_only() {
        let config = EventsConfig {
            groups: vec![EventGroupConfig {
                name: "gate".to_owned(),
                trigger_tag: "gate".to_owned(),
                target_tag: "agent".to_owned(),
                max_count: -1,
                position: Vec2::new(5.0, 0.0),
                radius: 1.0,
                food_value: 0.0,
                water_value: 0.0,
                message: Some("welcome".to_owned()),
            }],
        };
        let mut zones = TriggerZones::from_config(&config, Vec2::ZERO);
        let wolf = EventInvoker::Predator(PredatorId::new(0));

        assert!(zones.check(&[(EventInvoker::Agent, Vec2::ZERO)]).is_empty());
        let fired = zones.check(&[
            (EventInvoker::Agent, Vec2::new(5.5, 0.0)),
            (wolf, Vec2::new(5.0, 0.0)),
        ]);
        assert_eq!(fired, vec![("gate".to_owned(), EventInvoker::Agent)]);
        assert!(zones.check(&[(EventInvoker::Agent, Vec2::new(5.2, 0.0))]).is_empty());
        assert!(zones.check(&[(EventInvoker::Agent, Vec2::ZERO)]).is_empty());
        assert_eq!(zones.check(&[(EventInvoker::Agent, Vec2::new(5.0, 0.5))]).len(), 1);
    }
}
