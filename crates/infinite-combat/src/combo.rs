//! Per-actor combo counter with a rolling time window
//!
//! Each actor's state is created on first use and dropped on departure. The
//! history keeps the last [`HISTORY_CAPACITY`] uses for chain detection.

use std::collections::{HashMap, VecDeque};

use infinite_core::EntityId;
use tracing::trace;

use crate::config::CombatConfig;
use crate::element::DamageType;
use crate::event::CombatEvent;
use crate::skill::{SkillId, SkillUseRecord};

/// Maximum skill uses remembered per actor
pub const HISTORY_CAPACITY: usize = 5;

/// Combo bookkeeping for one actor
#[derive(Debug, Clone)]
pub struct ComboState {
    pub combo_count: u32,
    pub last_skill_time: f64,
    pub last_skill_id: SkillId,
    pub last_damage_type: DamageType,
    history: VecDeque<SkillUseRecord>,
}

impl ComboState {
    fn new(skill_id: SkillId, damage_type: DamageType, now: f64) -> Self {
        Self {
            combo_count: 0,
            last_skill_time: now,
            last_skill_id: skill_id,
            last_damage_type: damage_type,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Recent uses, oldest first
    pub fn history(&self) -> &VecDeque<SkillUseRecord> {
        &self.history
    }

    fn push_history(&mut self, record: SkillUseRecord) {
        while self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Tracks combos for every actor that has used a skill
#[derive(Debug, Clone)]
pub struct ComboTracker {
    config: CombatConfig,
    states: HashMap<EntityId, ComboState>,
}

impl ComboTracker {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Record a skill use. Returns the combo count after this use.
    pub fn register_use(
        &mut self,
        actor: EntityId,
        skill_id: SkillId,
        damage_type: DamageType,
        now: f64,
        events: &mut Vec<CombatEvent>,
    ) -> u32 {
        let window = self.config.combo_window;
        let max_count = self.config.max_combo_count.max(1);

        let state = self
            .states
            .entry(actor)
            .or_insert_with(|| ComboState::new(skill_id, damage_type, now));

        let continues = state.combo_count > 0 && now - state.last_skill_time <= window;
        state.combo_count = if continues {
            (state.combo_count + 1).min(max_count)
        } else {
            1
        };

        state.push_history(SkillUseRecord {
            skill_id,
            damage_type,
            timestamp: now,
        });
        state.last_skill_time = now;
        state.last_skill_id = skill_id;
        state.last_damage_type = damage_type;

        let count = state.combo_count;
        let multiplier = self.config.damage_multiplier(count);
        trace!("Combo for {}: {} (x{:.2})", actor, count, multiplier);
        events.push(CombatEvent::ComboUpdated {
            actor,
            count,
            multiplier,
        });
        count
    }

    /// Pure combo multiplier for a count
    pub fn damage_multiplier(&self, count: u32) -> f32 {
        self.config.damage_multiplier(count)
    }

    /// Combo count in effect at `now` (0 once the window has lapsed)
    pub fn current_combo(&self, actor: EntityId, now: f64) -> u32 {
        match self.states.get(&actor) {
            Some(state) if now - state.last_skill_time <= self.config.combo_window => {
                state.combo_count
            }
            _ => 0,
        }
    }

    /// Reset every lapsed combo to zero, once per lapse
    pub fn tick(&mut self, now: f64, events: &mut Vec<CombatEvent>) {
        let window = self.config.combo_window;
        for (actor, state) in self.states.iter_mut() {
            if state.combo_count > 0 && now - state.last_skill_time > window {
                state.combo_count = 0;
                trace!("Combo for {} expired", actor);
                events.push(CombatEvent::ComboUpdated {
                    actor: *actor,
                    count: 0,
                    multiplier: 1.0,
                });
            }
        }
    }

    pub fn state(&self, actor: EntityId) -> Option<&ComboState> {
        self.states.get(&actor)
    }

    /// Recent uses for an actor, oldest first (empty if unknown)
    pub fn history(&self, actor: EntityId) -> impl Iterator<Item = &SkillUseRecord> + '_ {
        self.states
            .get(&actor)
            .into_iter()
            .flat_map(|state| state.history.iter())
    }

    pub fn history_len(&self, actor: EntityId) -> usize {
        self.states.get(&actor).map_or(0, |s| s.history.len())
    }

    /// Forget an actor's history (a chain consumed it)
    pub fn clear_history(&mut self, actor: EntityId) {
        if let Some(state) = self.states.get_mut(&actor) {
            state.history.clear();
        }
    }

    /// Drop all state for an actor that left the world
    pub fn remove_actor(&mut self, actor: EntityId) -> bool {
        self.states.remove(&actor).is_some()
    }

    pub fn tracked_actors(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> EntityId {
        EntityId::from_u128(1)
    }

    fn use_at(tracker: &mut ComboTracker, now: f64) -> u32 {
        let mut events = Vec::new();
        tracker.register_use(actor(), SkillId(1), DamageType::Fire, now, &mut events)
    }

    #[test]
    fn test_first_use_starts_at_one() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        let mut events = Vec::new();
        let count = tracker.register_use(actor(), SkillId(1), DamageType::Fire, 0.0, &mut events);
        assert_eq!(count, 1);
        assert_eq!(
            events,
            vec![CombatEvent::ComboUpdated {
                actor: actor(),
                count: 1,
                multiplier: 1.0
            }]
        );
    }

    #[test]
    fn test_uses_within_window_increment() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        for (i, t) in [0.0, 1.0, 2.5, 5.5].into_iter().enumerate() {
            assert_eq!(use_at(&mut tracker, t), i as u32 + 1);
        }
    }

    #[test]
    fn test_gap_beyond_window_resets_to_one() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        use_at(&mut tracker, 0.0);
        use_at(&mut tracker, 1.0);
        assert_eq!(use_at(&mut tracker, 4.01), 1);
        assert_eq!(use_at(&mut tracker, 5.0), 2);
    }

    #[test]
    fn test_count_caps_and_multiplier_clamps() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        let mut count = 0;
        for i in 0..15 {
            count = use_at(&mut tracker, i as f64 * 0.5);
            assert!(count <= 10);
        }
        assert_eq!(count, 10);
        // Nine extra stacks at 0.05 each; the cap on count keeps it there
        let at_cap = tracker.damage_multiplier(count);
        assert!((at_cap - 1.45).abs() < 1e-6);
        assert_eq!(use_at(&mut tracker, 7.5), 10);
        assert_eq!(tracker.damage_multiplier(10), at_cap);
        // The function itself saturates at 1 + max bonus
        assert!((tracker.damage_multiplier(11) - 1.5).abs() < 1e-6);
        assert!((tracker.damage_multiplier(100) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_current_combo_respects_window() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        assert_eq!(tracker.current_combo(actor(), 0.0), 0);
        use_at(&mut tracker, 0.0);
        use_at(&mut tracker, 1.0);
        assert_eq!(tracker.current_combo(actor(), 3.9), 2);
        assert_eq!(tracker.current_combo(actor(), 4.1), 0);
    }

    #[test]
    fn test_tick_expires_once() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        use_at(&mut tracker, 0.0);

        let mut events = Vec::new();
        tracker.tick(2.0, &mut events);
        assert!(events.is_empty());

        tracker.tick(3.5, &mut events);
        assert_eq!(
            events,
            vec![CombatEvent::ComboUpdated {
                actor: actor(),
                count: 0,
                multiplier: 1.0
            }]
        );
        assert_eq!(tracker.state(actor()).unwrap().combo_count, 0);

        events.clear();
        tracker.tick(10.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_use_after_tick_expiry_restarts_at_one() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        use_at(&mut tracker, 0.0);
        let mut events = Vec::new();
        tracker.tick(3.5, &mut events);
        assert_eq!(use_at(&mut tracker, 3.6), 1);
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        let mut events = Vec::new();
        for i in 0..7u64 {
            tracker.register_use(actor(), SkillId(i), DamageType::Ice, i as f64, &mut events);
        }
        let ids: Vec<u64> = tracker.history(actor()).map(|r| r.skill_id.0).collect();
        assert_eq!(ids, vec![2, 3, 4, 5, 6]);
        assert_eq!(tracker.history_len(actor()), HISTORY_CAPACITY);
    }

    #[test]
    fn test_last_use_fields_updated() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        let mut events = Vec::new();
        tracker.register_use(actor(), SkillId(4), DamageType::Holy, 1.25, &mut events);
        let state = tracker.state(actor()).unwrap();
        assert_eq!(state.last_skill_id, SkillId(4));
        assert_eq!(state.last_damage_type, DamageType::Holy);
        assert_eq!(state.last_skill_time, 1.25);
    }

    #[test]
    fn test_clear_history_keeps_combo() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        use_at(&mut tracker, 0.0);
        use_at(&mut tracker, 1.0);
        tracker.clear_history(actor());
        assert_eq!(tracker.history_len(actor()), 0);
        assert_eq!(tracker.current_combo(actor(), 1.0), 2);
    }

    #[test]
    fn test_remove_actor() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        use_at(&mut tracker, 0.0);
        assert_eq!(tracker.tracked_actors(), 1);
        assert!(tracker.remove_actor(actor()));
        assert!(!tracker.remove_actor(actor()));
        assert_eq!(tracker.history(actor()).count(), 0);
    }

    #[test]
    fn test_actors_are_independent() {
        let mut tracker = ComboTracker::new(CombatConfig::default());
        let other = EntityId::from_u128(2);
        let mut events = Vec::new();
        use_at(&mut tracker, 0.0);
        use_at(&mut tracker, 0.5);
        tracker.register_use(other, SkillId(9), DamageType::Dark, 0.6, &mut events);
        assert_eq!(tracker.current_combo(actor(), 0.6), 2);
        assert_eq!(tracker.current_combo(other, 0.6), 1);
    }
}
