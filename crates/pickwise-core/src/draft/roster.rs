// Roster construction and slot assignment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::slot::Slot;

/// One slot designation on the user's roster and the players assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotGroup {
    pub slot: Slot,
    /// Nominal capacity. Hard ceiling for primary slots, advisory for Bench.
    pub capacity: usize,
    /// Player display names in the order they were assigned.
    pub players: Vec<String>,
}

impl SlotGroup {
    fn is_open(&self) -> bool {
        self.players.len() < self.capacity
    }
}

/// The user's roster: a fixed set of slot groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub groups: Vec<SlotGroup>,
}

impl Roster {
    /// Create a new roster from a config mapping slot strings to capacities.
    ///
    /// The roster config comes from league.toml `[league.roster]`, e.g.:
    /// `{"QB": 1, "WR": 3, "RB": 2, "TE": 1, "Kicker": 1, "Defense": 1, "Bench": 7}`
    ///
    /// Aliases naming the same slot ("K" and "Kicker") are summed. A Bench
    /// group always exists so overflow picks have somewhere to land.
    pub fn new(roster_config: &HashMap<String, usize>) -> Self {
        let mut groups: Vec<SlotGroup> = Vec::new();

        for (slot_str, &capacity) in roster_config {
            let Some(slot) = Slot::from_str_pos(slot_str) else {
                continue;
            };
            match groups.iter_mut().find(|g| g.slot == slot) {
                Some(group) => group.capacity += capacity,
                None => groups.push(SlotGroup {
                    slot,
                    capacity,
                    players: Vec::new(),
                }),
            }
        }

        if !groups.iter().any(|g| g.slot == Slot::Bench) {
            groups.push(SlotGroup {
                slot: Slot::Bench,
                capacity: 0,
                players: Vec::new(),
            });
        }

        groups.sort_by_key(|g| g.slot.sort_order());

        Roster { groups }
    }

    /// Slots that still have room, in display order.
    ///
    /// Empty iff every slot, Bench included, has reached its capacity.
    pub fn needed_slots(&self) -> Vec<Slot> {
        self.groups
            .iter()
            .filter(|g| g.is_open())
            .map(|g| g.slot)
            .collect()
    }

    /// Whether there is room left in the given slot.
    pub fn has_open_slot(&self, slot: Slot) -> bool {
        self.group(slot).is_some_and(SlotGroup::is_open)
    }

    /// Assign a drafted player to the roster and return the slot used.
    ///
    /// Slot assignment priority:
    /// 1. The primary slot named by `position_str`, if it has room
    /// 2. Bench, unconditionally (Bench capacity is not enforced)
    pub fn assign(&mut self, name: &str, position_str: &str) -> Slot {
        let target = match Slot::from_str_pos(position_str) {
            Some(slot) if slot.is_primary() && self.has_open_slot(slot) => slot,
            _ => Slot::Bench,
        };

        if let Some(group) = self.groups.iter_mut().find(|g| g.slot == target) {
            group.players.push(name.to_string());
        }
        target
    }

    /// Players assigned to a slot, in assignment order.
    pub fn players_in(&self, slot: Slot) -> &[String] {
        self.group(slot).map(|g| g.players.as_slice()).unwrap_or(&[])
    }

    /// Number of players on the roster, Bench overflow included.
    pub fn filled_count(&self) -> usize {
        self.groups.iter().map(|g| g.players.len()).sum()
    }

    /// Sum of all slot capacities.
    pub fn total_capacity(&self) -> usize {
        self.groups.iter().map(|g| g.capacity).sum()
    }

    /// Players on the bench beyond its nominal capacity.
    pub fn bench_overflow(&self) -> usize {
        self.group(Slot::Bench)
            .map_or(0, |g| g.players.len().saturating_sub(g.capacity))
    }

    fn group(&self, slot: Slot) -> Option<&SlotGroup> {
        self.groups.iter().find(|g| g.slot == slot)
    }
}
