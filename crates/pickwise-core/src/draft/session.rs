// Draft session: the catalog, the user's roster, and everything taken so far.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::projections::{name_key, Catalog, PlayerRecord};

use super::filter::filter_candidates;
use super::roster::Roster;
use super::slot::Slot;

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("'{name}' is not among the available players")]
    UnrecognizedPick { name: String },
}

/// A pick made by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number for the user's team (1-indexed).
    pub pick_number: usize,
    /// Display name from the catalog.
    pub player_name: String,
    /// Position string as reported by the provider.
    pub position: String,
    /// Slot the player was placed in.
    pub slot: Slot,
    pub picked_at: DateTime<Utc>,
}

/// All mutable draft state for one process lifetime.
#[derive(Debug, Clone)]
pub struct DraftSession {
    catalog: Catalog,
    roster: Roster,
    /// Name keys of every player drafted by anyone.
    taken: HashSet<String>,
    picks: Vec<DraftPick>,
}

impl DraftSession {
    pub fn new(catalog: Catalog, roster: Roster) -> Self {
        DraftSession {
            catalog,
            roster,
            taken: HashSet::new(),
            picks: Vec::new(),
        }
    }

    /// Record players drafted by other teams.
    ///
    /// Names are matched case-insensitively; names not in the catalog are
    /// still remembered as taken. Returns the number of catalog rows removed.
    pub fn record_taken<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let mut removed = 0;
        for name in names {
            let key = name_key(name.as_ref());
            if key.is_empty() {
                continue;
            }
            let n = self.catalog.remove_by_name(&key);
            if n == 0 {
                debug!(player = %key, "taken player not in catalog");
            }
            removed += n;
            self.taken.insert(key);
        }
        info!(removed, remaining = self.catalog.len(), "recorded taken players");
        removed
    }

    /// Slots on the user's roster that still have room.
    pub fn needed_slots(&self) -> Vec<Slot> {
        self.roster.needed_slots()
    }

    /// Up to `limit` available players that fit a needed slot.
    pub fn candidates(&self, limit: usize) -> Vec<&PlayerRecord> {
        filter_candidates(&self.catalog, &self.taken, &self.needed_slots(), limit)
    }

    /// Record the user's own pick.
    ///
    /// The name must match an available player exactly (ignoring case and
    /// surrounding whitespace). On failure nothing is changed.
    pub fn pick_player(&mut self, name: &str) -> Result<DraftPick, DraftError> {
        let record = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| DraftError::UnrecognizedPick {
                name: name.trim().to_string(),
            })?;

        let slot = self.roster.assign(&record.name, &record.position);
        self.catalog.remove_by_name(&record.key);
        self.taken.insert(record.key.clone());

        let pick = DraftPick {
            pick_number: self.picks.len() + 1,
            player_name: record.name,
            position: record.position,
            slot,
            picked_at: Utc::now(),
        };
        info!(
            pick = pick.pick_number,
            player = %pick.player_name,
            slot = %pick.slot,
            "recorded user pick"
        );
        self.picks.push(pick.clone());
        Ok(pick)
    }

    /// Whether any team has drafted this player.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name_key(name))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn picks(&self) -> &[DraftPick] {
        &self.picks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn roster_config() -> HashMap<String, usize> {
        let mut config = HashMap::new();
        config.insert("QB".to_string(), 1);
        config.insert("WR".to_string(), 3);
        config.insert("RB".to_string(), 2);
        config.insert("TE".to_string(), 1);
        config.insert("Kicker".to_string(), 1);
        config.insert("Defense".to_string(), 1);
        config.insert("Bench".to_string(), 7);
        config
    }

    fn session() -> DraftSession {
        let catalog = Catalog::from_sources(vec![
            vec![
                PlayerRecord::new("Josh Allen", "QB", "espn"),
                PlayerRecord::new("Tyreek Hill", "WR", "espn"),
                PlayerRecord::new("Justin Tucker", "K", "espn"),
            ],
            vec![
                PlayerRecord::new("Tyreek Hill", "WR", "cbs"),
                PlayerRecord::new("Harrison Butker", "K", "cbs"),
                PlayerRecord::new("Breece Hall", "RB", "cbs"),
            ],
        ]);
        DraftSession::new(catalog, Roster::new(&roster_config()))
    }

    fn candidate_names(session: &DraftSession) -> Vec<String> {
        session
            .candidates(50)
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn record_taken_removes_from_catalog_and_candidates() {
        let mut s = session();
        let removed = s.record_taken(&["tyreek hill", "Unknown Rookie"]);
        assert_eq!(removed, 2);
        assert_eq!(s.catalog().len(), 4);
        assert!(s.is_taken("Tyreek Hill"));
        assert!(s.is_taken("unknown rookie"));
        assert!(!candidate_names(&s).contains(&"Tyreek Hill".to_string()));
    }

    #[test]
    fn record_taken_ignores_blank_entries() {
        let mut s = session();
        assert_eq!(s.record_taken(&["", "   "]), 0);
        assert_eq!(s.catalog().len(), 6);
    }

    #[test]
    fn pick_player_assigns_and_removes() {
        let mut s = session();
        let pick = s.pick_player("  josh ALLEN ").unwrap();
        assert_eq!(pick.pick_number, 1);
        assert_eq!(pick.player_name, "Josh Allen");
        assert_eq!(pick.slot, Slot::Quarterback);
        assert_eq!(s.roster().players_in(Slot::Quarterback), ["Josh Allen".to_string()]);
        assert!(!s.catalog().contains("Josh Allen"));
        assert_eq!(s.picks().len(), 1);
    }

    #[test]
    fn picked_player_never_returned_again() {
        let mut s = session();
        s.pick_player("Tyreek Hill").unwrap();
        assert!(!candidate_names(&s).contains(&"Tyreek Hill".to_string()));
        // Both provider rows are gone
        assert!(s.catalog().iter().all(|r| r.key != "tyreek hill"));
    }

    #[test]
    fn unrecognized_pick_changes_nothing() {
        let mut s = session();
        let err = s.pick_player("Josh Alen").unwrap_err();
        assert_eq!(
            err,
            DraftError::UnrecognizedPick {
                name: "Josh Alen".to_string()
            }
        );
        assert_eq!(s.catalog().len(), 6);
        assert_eq!(s.roster().filled_count(), 0);
        assert!(s.picks().is_empty());
    }

    #[test]
    fn already_taken_player_cannot_be_picked() {
        let mut s = session();
        s.record_taken(&["Breece Hall"]);
        assert!(s.pick_player("Breece Hall").is_err());
    }

    #[test]
    fn second_kicker_goes_to_bench() {
        let mut s = session();
        assert_eq!(s.pick_player("Justin Tucker").unwrap().slot, Slot::Kicker);
        let pick = s.pick_player("Harrison Butker").unwrap();
        assert_eq!(pick.slot, Slot::Bench);
        assert_eq!(pick.pick_number, 2);
    }

    #[test]
    fn filled_slot_positions_leave_candidates_while_bench_open() {
        let mut s = session();
        s.pick_player("Josh Allen").unwrap();
        s.pick_player("Justin Tucker").unwrap();
        assert!(s.needed_slots().contains(&Slot::Bench));
        assert!(!s.needed_slots().contains(&Slot::Quarterback));
        assert_eq!(candidate_names(&s), vec!["Tyreek Hill", "Breece Hall"]);
    }

    #[test]
    fn ineligible_player_can_still_be_picked_onto_bench() {
        let mut s = session();
        s.pick_player("Justin Tucker").unwrap();
        assert!(!candidate_names(&s).contains(&"Harrison Butker".to_string()));
        assert_eq!(s.pick_player("Harrison Butker").unwrap().slot, Slot::Bench);
    }

    #[test]
    fn candidates_are_deduplicated() {
        let s = session();
        assert_eq!(
            candidate_names(&s),
            vec![
                "Josh Allen",
                "Tyreek Hill",
                "Justin Tucker",
                "Harrison Butker",
                "Breece Hall"
            ]
        );
    }
}
