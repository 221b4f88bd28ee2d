//! Entity registry for the health monitoring service.
//!
//! Holds every monitored water body and toilet and is the single mutable
//! root of simulation state. Entities are stored as `Arc`s and never mutated
//! in place: each update builds a new record (with a new history buffer) and
//! swaps it into the entity's slot. A snapshot is just a copy of the `Arc`s,
//! so a renderer holding one can never observe a half-applied update.

use chrono::{DateTime, Duration, Utc};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;

use crate::alert::notify::{detect_transition, ContaminationEvent};
use crate::analysis::history::append_bounded;
use crate::config::{MonitorConfig, SimulationConfig};
use crate::logging::{self, Component};
use crate::model::{Toilet, WaterBody, READING_CAPACITY, SEED_READING_COUNT};
use crate::simulate::random::sim_rng;
use crate::simulate::readings::{generate_reading, seed_readings};
use crate::simulate::toilets::{advance_toilet, UsageLimits};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Buffer sizes and limits applied to every entity in a registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryOptions {
    /// Readings generated for a newly added water body.
    pub seed_readings: usize,
    pub reading_capacity: usize,
    /// Spacing between seeded readings; matches the tick interval so seeded
    /// history lines up with live history on a chart.
    pub tick_spacing: Duration,
    pub usage: UsageLimits,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        RegistryOptions {
            seed_readings: SEED_READING_COUNT,
            reading_capacity: READING_CAPACITY,
            tick_spacing: Duration::seconds(2),
            usage: UsageLimits::default(),
        }
    }
}

impl From<&SimulationConfig> for RegistryOptions {
    fn from(sim: &SimulationConfig) -> Self {
        RegistryOptions {
            seed_readings: sim.seed_readings,
            reading_capacity: sim.reading_capacity,
            tick_spacing: Duration::from_std(sim.tick_interval()).unwrap_or_else(|_| Duration::seconds(2)),
            usage: UsageLimits {
                max_step: sim.max_usage_step,
                ceiling: sim.usage_ceiling,
                capacity: sim.usage_capacity,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots and tick reports
// ---------------------------------------------------------------------------

/// A consistent view of the registry for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub tick: u64,
    pub water_bodies: Vec<Arc<WaterBody>>,
    pub toilets: Vec<Arc<Toilet>>,
}

impl RegistrySnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// What one tick changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub water_bodies_updated: usize,
    pub toilets_updated: usize,
    /// Water bodies that crossed into Contaminated on this tick.
    pub events: Vec<ContaminationEvent>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct Registry {
    water_bodies: Vec<Arc<WaterBody>>,
    toilets: Vec<Arc<Toilet>>,
    options: RegistryOptions,
    rng: ChaCha8Rng,
    next_entity_id: u64,
    next_reading_id: u64,
    ticks: u64,
}

impl Registry {
    /// An empty registry. `seed` fixes the RNG for reproducible runs.
    pub fn new(options: RegistryOptions, seed: Option<u64>) -> Self {
        Registry {
            water_bodies: Vec::new(),
            toilets: Vec::new(),
            options,
            rng: sim_rng(seed),
            next_entity_id: 1,
            next_reading_id: 1,
            ticks: 0,
        }
    }

    /// A registry populated with the sites named in `config`.
    pub fn from_config(config: &MonitorConfig, now: DateTime<Utc>) -> Self {
        let mut registry = Registry::new(RegistryOptions::from(&config.simulation), config.simulation.seed);
        for site in &config.water_bodies {
            registry.add_water_body(&site.name, now);
        }
        for site in &config.toilets {
            registry.add_toilet(&site.name);
        }
        registry
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn allocate_entity_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    // --- Water bodies -------------------------------------------------------

    /// Registers a water body with a seeded history ending at `now`.
    /// Returns its id.
    pub fn add_water_body(&mut self, name: &str, now: DateTime<Utc>) -> u64 {
        let id = self.allocate_entity_id();
        let next_reading_id = &mut self.next_reading_id;
        let readings = seed_readings(
            &mut self.rng,
            || {
                let reading_id = *next_reading_id;
                *next_reading_id += 1;
                reading_id
            },
            self.options.seed_readings,
            now,
            self.options.tick_spacing,
        );
        self.water_bodies.push(Arc::new(WaterBody {
            id,
            name: name.to_string(),
            readings,
        }));
        logging::info(Component::WaterBody, Some(id), &format!("Registered water body '{}'", name));
        id
    }

    /// Removes a water body. Unknown ids are a no-op; returns whether
    /// anything was removed.
    pub fn remove_water_body(&mut self, id: u64) -> bool {
        let before = self.water_bodies.len();
        self.water_bodies.retain(|w| w.id != id);
        let removed = self.water_bodies.len() != before;
        if removed {
            logging::info(Component::WaterBody, Some(id), "Removed water body");
        }
        removed
    }

    pub fn water_body(&self, id: u64) -> Option<Arc<WaterBody>> {
        self.water_bodies.iter().find(|w| w.id == id).cloned()
    }

    pub fn water_bodies(&self) -> &[Arc<WaterBody>] {
        &self.water_bodies
    }

    // --- Toilets ------------------------------------------------------------

    /// Registers a toilet with zero usage and no history. Returns its id.
    pub fn add_toilet(&mut self, name: &str) -> u64 {
        let id = self.allocate_entity_id();
        self.toilets.push(Arc::new(Toilet::new(id, name)));
        logging::info(Component::Toilet, Some(id), &format!("Registered toilet '{}'", name));
        id
    }

    /// Removes a toilet. Unknown ids are a no-op; returns whether anything
    /// was removed.
    pub fn remove_toilet(&mut self, id: u64) -> bool {
        let before = self.toilets.len();
        self.toilets.retain(|t| t.id != id);
        let removed = self.toilets.len() != before;
        if removed {
            logging::info(Component::Toilet, Some(id), "Removed toilet");
        }
        removed
    }

    pub fn toilet(&self, id: u64) -> Option<Arc<Toilet>> {
        self.toilets.iter().find(|t| t.id == id).cloned()
    }

    pub fn toilets(&self) -> &[Arc<Toilet>] {
        &self.toilets
    }

    // --- Updates ------------------------------------------------------------

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            tick: self.ticks,
            water_bodies: self.water_bodies.clone(),
            toilets: self.toilets.clone(),
        }
    }

    /// Advances every entity by one tick stamped `now`.
    ///
    /// Each water body gets one new reading; the transition check compares
    /// it with that body's own latest reading before the swap. Each toilet
    /// gets one usage increment.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        let mut events = Vec::new();

        for slot in self.water_bodies.iter_mut() {
            let reading_id = self.next_reading_id;
            self.next_reading_id += 1;
            let reading = generate_reading(&mut self.rng, reading_id, now);

            if let Some(event) = detect_transition(slot, &reading) {
                logging::warn(
                    Component::WaterBody,
                    Some(slot.id),
                    &format!(
                        "'{}' newly contaminated: pH {:.2}, turbidity {:.2} NTU, bacteria {}%",
                        slot.name, reading.ph(), reading.turbidity(), reading.bacteria_probability()
                    ),
                );
                events.push(event);
            }

            let updated = WaterBody {
                id: slot.id,
                name: slot.name.clone(),
                readings: append_bounded(&slot.readings, reading, self.options.reading_capacity),
            };
            *slot = Arc::new(updated);
        }

        for slot in self.toilets.iter_mut() {
            let updated = advance_toilet(&mut self.rng, slot, now, self.options.usage);
            if updated.usage < slot.usage {
                logging::debug(Component::Toilet, Some(slot.id), "Usage counter reset");
            }
            *slot = Arc::new(updated);
        }

        let report = TickReport {
            tick: self.ticks,
            water_bodies_updated: self.water_bodies.len(),
            toilets_updated: self.toilets.len(),
            events,
        };
        logging::log_tick_summary(
            report.tick,
            report.water_bodies_updated,
            report.toilets_updated,
            report.events.len(),
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SafetyStatus, PH_RANGE, TURBIDITY_RANGE_NTU};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn seeded() -> Registry {
        Registry::new(RegistryOptions::default(), Some(42))
    }

    // --- CRUD ---------------------------------------------------------------

    #[test]
    fn test_new_water_body_is_seeded_with_twelve_readings() {
        let mut registry = seeded();
        let id = registry.add_water_body("Riverside Reservoir", fixed_now());
        let body = registry.water_body(id).expect("just added");
        assert_eq!(body.readings().len(), 12);
        assert_eq!(body.latest().map(|r| r.timestamp), Some(fixed_now()));
        for r in body.readings() {
            assert!((PH_RANGE.0..=PH_RANGE.1).contains(&r.ph()));
            assert!((TURBIDITY_RANGE_NTU.0..=TURBIDITY_RANGE_NTU.1).contains(&r.turbidity()));
        }
    }

    #[test]
    fn test_new_toilet_has_zero_state() {
        let mut registry = seeded();
        let id = registry.add_toilet("Central Park");
        let toilet = registry.toilet(id).expect("just added");
        assert_eq!(toilet.usage, 0);
        assert!(toilet.history.is_empty());
    }

    #[test]
    fn test_ids_are_unique_across_entities() {
        let mut registry = seeded();
        let a = registry.add_water_body("A", fixed_now());
        let b = registry.add_toilet("B");
        let c = registry.add_water_body("C", fixed_now());
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn test_reading_ids_are_unique_and_increasing() {
        let mut registry = seeded();
        registry.add_water_body("A", fixed_now());
        registry.add_water_body("B", fixed_now());
        registry.tick(fixed_now() + Duration::seconds(2));

        let mut ids: Vec<u64> = registry
            .water_bodies()
            .iter()
            .flat_map(|w| w.readings().iter().map(|r| r.id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "reading ids must be unique");

        for body in registry.water_bodies() {
            assert!(body.readings().windows(2).all(|w| w[0].id < w[1].id));
        }
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut registry = seeded();
        registry.add_water_body("A", fixed_now());
        registry.add_toilet("B");
        assert!(!registry.remove_water_body(999));
        assert!(!registry.remove_toilet(999));
        assert_eq!(registry.water_bodies().len(), 1);
        assert_eq!(registry.toilets().len(), 1);
    }

    #[test]
    fn test_remove_existing_entities() {
        let mut registry = seeded();
        let w = registry.add_water_body("A", fixed_now());
        let t = registry.add_toilet("B");
        assert!(registry.remove_water_body(w));
        assert!(registry.remove_toilet(t));
        assert!(registry.water_body(w).is_none());
        assert!(registry.toilet(t).is_none());
    }

    // --- Ticks --------------------------------------------------------------

    #[test]
    fn test_tick_appends_one_reading_and_one_sample() {
        let mut registry = seeded();
        let w = registry.add_water_body("A", fixed_now());
        let t = registry.add_toilet("B");
        let report = registry.tick(fixed_now() + Duration::seconds(2));

        assert_eq!(report.tick, 1);
        assert_eq!(report.water_bodies_updated, 1);
        assert_eq!(report.toilets_updated, 1);
        assert_eq!(registry.water_body(w).map(|b| b.readings().len()), Some(13));
        assert_eq!(registry.toilet(t).map(|t| t.history.len()), Some(1));
    }

    #[test]
    fn test_histories_stay_bounded_over_many_ticks() {
        let mut registry = seeded();
        let w = registry.add_water_body("A", fixed_now());
        let t = registry.add_toilet("B");
        for i in 1..=100 {
            registry.tick(fixed_now() + Duration::seconds(2 * i));
        }
        let body = registry.water_body(w).expect("present");
        let toilet = registry.toilet(t).expect("present");
        assert_eq!(body.readings().len(), 60);
        assert_eq!(toilet.history.len(), 20);
        assert!(body.readings().windows(2).all(|p| p[0].timestamp < p[1].timestamp));
        assert_eq!(body.latest().map(|r| r.timestamp), Some(fixed_now() + Duration::seconds(200)));
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_ticks() {
        let mut registry = seeded();
        let w = registry.add_water_body("A", fixed_now());
        registry.add_toilet("B");
        let snapshot = registry.snapshot();
        registry.tick(fixed_now() + Duration::seconds(2));

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.water_bodies[0].readings().len(), 12);
        assert!(snapshot.toilets[0].history.is_empty());
        assert_eq!(registry.water_body(w).map(|b| b.readings().len()), Some(13));
    }

    #[test]
    fn test_events_match_status_transitions() {
        let mut registry = seeded();
        registry.add_water_body("A", fixed_now());
        registry.add_water_body("B", fixed_now());

        for i in 1..=200 {
            let before: Vec<Option<SafetyStatus>> =
                registry.water_bodies().iter().map(|w| w.current_status()).collect();
            let report = registry.tick(fixed_now() + Duration::seconds(2 * i));

            for (body, prev) in registry.water_bodies().iter().zip(before) {
                let now = body.current_status();
                let fired = report.events.iter().filter(|e| e.water_body_id == body.id).count();
                let expected = usize::from(
                    now == Some(SafetyStatus::Contaminated) && prev != Some(SafetyStatus::Contaminated),
                );
                assert_eq!(fired, expected, "tick {} body {} {:?} → {:?}", i, body.id, prev, now);
                if fired == 1 {
                    let event = report.events.iter().find(|e| e.water_body_id == body.id);
                    assert_eq!(event.map(|e| e.reading_id), body.latest().map(|r| r.id));
                }
            }
        }
    }

    #[test]
    fn test_same_seed_gives_same_run() {
        let run = |seed| {
            let mut registry = Registry::new(RegistryOptions::default(), Some(seed));
            registry.add_water_body("A", fixed_now());
            registry.add_toilet("B");
            for i in 1..=10 {
                registry.tick(fixed_now() + Duration::seconds(2 * i));
            }
            let snapshot = registry.snapshot();
            (snapshot.water_bodies[0].as_ref().clone(), snapshot.toilets[0].as_ref().clone())
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_from_config_registers_named_sites() {
        let config = MonitorConfig::default();
        let registry = Registry::from_config(&config, fixed_now());
        let names: Vec<&str> = registry.water_bodies().iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Riverside Reservoir", "Mill Creek"]);
        assert_eq!(registry.toilets().len(), 2);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut registry = seeded();
        registry.add_water_body("A", fixed_now());
        registry.add_toilet("B");
        registry.tick(fixed_now() + Duration::seconds(2));
        let json = registry.snapshot().to_json().expect("snapshot serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["tick"], 1);
        assert_eq!(value["water_bodies"][0]["readings"].as_array().map(|a| a.len()), Some(13));
        assert_eq!(value["toilets"][0]["history"].as_array().map(|a| a.len()), Some(1));
    }
}
