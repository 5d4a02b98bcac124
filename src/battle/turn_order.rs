use crate::battle::state::CombatantRef;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Indices of `speeds` sorted fastest first. The sort is stable, so on a tie
/// the earlier index goes first.
pub fn compute_order(speeds: &[u16]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..speeds.len()).collect();
    order.sort_by(|a, b| speeds[*b].cmp(&speeds[*a]));
    order
}

/// Acting order for a battle. Entries rotate to the back once they act and
/// are never removed; fainted entries are bypassed when picking the next
/// actor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TurnScheduler {
    order: VecDeque<CombatantRef>,
    acted_this_round: Vec<CombatantRef>,
    speed_dirty: bool,
}

impl TurnScheduler {
    /// Build the initial order from `(combatant, speed)` pairs listed in
    /// roster order.
    pub fn new(entries: &[(CombatantRef, u16)]) -> Self {
        Self {
            order: sort_by_speed(entries),
            acted_this_round: Vec::new(),
            speed_dirty: false,
        }
    }

    pub fn order(&self) -> Vec<CombatantRef> {
        self.order.iter().copied().collect()
    }

    pub fn has_acted(&self, combatant: CombatantRef) -> bool {
        self.acted_this_round.contains(&combatant)
    }

    /// First living entry that has not yet acted this round.
    pub fn next_actor(&self, is_alive: impl Fn(CombatantRef) -> bool) -> Option<CombatantRef> {
        self.order
            .iter()
            .copied()
            .find(|entry| is_alive(*entry) && !self.has_acted(*entry))
    }

    /// Move the front entry to the back.
    pub fn rotate(&mut self) {
        if let Some(front) = self.order.pop_front() {
            self.order.push_back(front);
        }
    }

    /// Record that `actor` has acted and send it to the back of the order.
    pub fn complete_turn(&mut self, actor: CombatantRef) {
        if let Some(position) = self.order.iter().position(|entry| *entry == actor) {
            if position == 0 {
                self.rotate();
            } else if let Some(entry) = self.order.remove(position) {
                self.order.push_back(entry);
            }
        }
        if !self.has_acted(actor) {
            self.acted_this_round.push(actor);
        }
    }

    /// Every living entry has acted.
    pub fn round_complete(&self, is_alive: impl Fn(CombatantRef) -> bool) -> bool {
        self.order
            .iter()
            .filter(|entry| is_alive(**entry))
            .all(|entry| self.has_acted(*entry))
    }

    /// Flag that an effective speed changed. Mid-round callers should follow
    /// up with `reorder_mid_round`; otherwise the next round recomputes.
    pub fn mark_speed_changed(&mut self) {
        self.speed_dirty = true;
    }

    pub fn speed_dirty(&self) -> bool {
        self.speed_dirty
    }

    /// Recompute the order for the current round: entries still waiting to
    /// act come first by speed, then those that already acted, also by speed.
    pub fn reorder_mid_round(&mut self, entries: &[(CombatantRef, u16)]) {
        let (waiting, acted): (Vec<_>, Vec<_>) = entries
            .iter()
            .copied()
            .partition(|(entry, _)| !self.has_acted(*entry));

        let mut order = sort_by_speed(&waiting);
        order.extend(sort_by_speed(&acted));
        self.order = order;
        self.speed_dirty = false;
    }

    /// Reset per-round bookkeeping. Returns true if the order was recomputed.
    pub fn start_round(&mut self, entries: &[(CombatantRef, u16)]) -> bool {
        self.acted_this_round.clear();
        if self.speed_dirty {
            self.order = sort_by_speed(entries);
            self.speed_dirty = false;
            true
        } else {
            false
        }
    }
}

fn sort_by_speed(entries: &[(CombatantRef, u16)]) -> VecDeque<CombatantRef> {
    let speeds: Vec<u16> = entries.iter().map(|(_, speed)| *speed).collect();
    compute_order(&speeds)
        .into_iter()
        .map(|index| entries[index].0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::SideId;
    use pretty_assertions::assert_eq;

    fn p(index: usize) -> CombatantRef {
        CombatantRef::new(SideId::Player, index)
    }

    fn o(index: usize) -> CombatantRef {
        CombatantRef::new(SideId::Opponent, index)
    }

    #[test]
    fn test_compute_order_breaks_ties_by_input_order() {
        assert_eq!(compute_order(&[50, 80, 80, 30]), vec![1, 2, 0, 3]);
        assert_eq!(compute_order(&[10, 10, 10]), vec![0, 1, 2]);
        assert_eq!(compute_order(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_actors_rotate_to_the_back() {
        let mut scheduler = TurnScheduler::new(&[(p(0), 50), (o(0), 80), (o(1), 30)]);
        assert_eq!(scheduler.order(), vec![o(0), p(0), o(1)]);

        let alive = |_| true;
        assert_eq!(scheduler.next_actor(alive), Some(o(0)));
        scheduler.complete_turn(o(0));
        assert_eq!(scheduler.order(), vec![p(0), o(1), o(0)]);
        assert_eq!(scheduler.next_actor(alive), Some(p(0)));
        scheduler.complete_turn(p(0));
        scheduler.complete_turn(o(1));
        assert!(scheduler.round_complete(alive));
        assert_eq!(scheduler.order(), vec![o(0), p(0), o(1)]);

        assert!(!scheduler.start_round(&[(p(0), 50), (o(0), 80), (o(1), 30)]));
        assert_eq!(scheduler.next_actor(alive), Some(o(0)));
    }

    #[test]
    fn test_fainted_entries_are_bypassed_not_removed() {
        let mut scheduler = TurnScheduler::new(&[(p(0), 90), (o(0), 60), (o(1), 30)]);
        let alive = |entry: CombatantRef| entry != p(0);

        assert_eq!(scheduler.next_actor(alive), Some(o(0)));
        scheduler.complete_turn(o(0));
        assert_eq!(scheduler.next_actor(alive), Some(o(1)));
        scheduler.complete_turn(o(1));
        assert!(scheduler.round_complete(alive));
        assert_eq!(scheduler.order().len(), 3);
        assert!(scheduler.order().contains(&p(0)));
    }

    #[test]
    fn test_mid_round_reorder_keeps_acted_entries_at_the_back() {
        let mut scheduler = TurnScheduler::new(&[(p(0), 100), (p(1), 50), (o(0), 70), (o(1), 40)]);
        scheduler.complete_turn(p(0));

        // o(1) speeds up past everyone.
        scheduler.mark_speed_changed();
        scheduler.reorder_mid_round(&[(p(0), 100), (p(1), 50), (o(0), 70), (o(1), 120)]);
        assert_eq!(scheduler.order(), vec![o(1), o(0), p(1), p(0)]);
        assert!(!scheduler.speed_dirty());
        assert_eq!(scheduler.next_actor(|_| true), Some(o(1)));
    }

    #[test]
    fn test_new_round_recomputes_when_speed_changed() {
        let mut scheduler = TurnScheduler::new(&[(p(0), 100), (o(0), 70)]);
        scheduler.complete_turn(p(0));
        scheduler.complete_turn(o(0));
        scheduler.mark_speed_changed();
        assert!(scheduler.start_round(&[(p(0), 50), (o(0), 70)]));
        assert_eq!(scheduler.order(), vec![o(0), p(0)]);
        assert_eq!(scheduler.next_actor(|_| true), Some(o(0)));
    }
}
