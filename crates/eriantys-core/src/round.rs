//! Round and turn progression.
//!
//! A round is a planning phase (every player plays an assistant card) followed
//! by an action phase (every player takes one turn, lowest card first). The
//! functions here are called by the actions once they have applied their
//! effect, and decide what comes next.

use crate::game::{Game, GameState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookkeeping for the current round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTracker {
    /// Round number, 0 during setup
    pub number: u32,
    /// Nicknames in planning order
    pub planning_order: Vec<String>,
    /// Nicknames in action order, computed once every card is played
    pub action_order: Vec<String>,
    /// Index into whichever order is being walked
    pub turn: usize,
    /// Students moved by the round owner this turn
    pub students_moved: u32,
    pub card_activated_this_turn: bool,
    /// The game ends when this round ends
    pub last_round: bool,
}

impl RoundTracker {
    pub fn new(seating: Vec<String>) -> Self {
        Self {
            planning_order: seating,
            ..Self::default()
        }
    }
}

/// Stable sort of `planning` by card value, lowest first
pub fn action_order(planning: &[String], values: &BTreeMap<String, u8>) -> Vec<String> {
    let mut order = planning.to_vec();
    order.sort_by_key(|nickname| values.get(nickname).copied().unwrap_or(u8::MAX));
    order
}

/// Seating order starting from `first`
pub fn planning_order(seating: &[String], first: &str) -> Vec<String> {
    let start = seating.iter().position(|n| n == first).unwrap_or(0);
    seating[start..]
        .iter()
        .chain(seating[..start].iter())
        .cloned()
        .collect()
}

impl Game {
    fn seating(&self) -> Vec<String> {
        self.players.iter().map(|p| p.nickname.clone()).collect()
    }

    /// Hand the magician choice to the next seat, or start the first round
    pub(crate) fn after_magician_chosen(&mut self) {
        match self.players.iter().find(|p| p.magician.is_none()) {
            Some(next) => {
                let next = next.nickname.clone();
                self.set_round_owner(next);
            }
            // Clouds were filled at setup
            None => self.start_round(false),
        }
    }

    pub(crate) fn start_round(&mut self, refill: bool) {
        self.round.number += 1;
        self.round.turn = 0;
        self.round.action_order.clear();

        if refill {
            self.refill_clouds();
        }

        let nicknames = self.seating();
        for nickname in &nicknames {
            if let Some(player) = self.player_mut(nickname) {
                player.played_card = None;
            }
            self.notify_hand(nickname);
        }

        if let Some(first) = self.round.planning_order.first().cloned() {
            self.set_round_owner(first);
        }
        self.transition(GameState::PlanningChooseCard);
    }

    /// Fill every cloud back to capacity. A short bag makes this the last
    /// round.
    pub(crate) fn refill_clouds(&mut self) {
        let capacity = self.table.students_per_turn;
        for index in 0..self.clouds.len() {
            let missing = capacity.saturating_sub(self.clouds[index].students.total());
            let drawn = self.draw_students(missing);
            if drawn.total() < missing {
                self.round.last_round = true;
            }
            self.clouds[index].students.add_set(&drawn);
        }
        self.notify_clouds();
    }

    /// Move planning to the next player, or start the action phase
    pub(crate) fn after_card_played(&mut self) {
        self.round.turn += 1;
        if let Some(next) = self.round.planning_order.get(self.round.turn).cloned() {
            self.set_round_owner(next);
            return;
        }

        let values: BTreeMap<String, u8> = self
            .players
            .iter()
            .filter_map(|p| p.played_card.map(|card| (p.nickname.clone(), card.value)))
            .collect();
        self.round.action_order = action_order(&self.round.planning_order, &values);
        self.round.turn = 0;
        self.begin_turn();
    }

    pub(crate) fn begin_turn(&mut self) {
        self.round.students_moved = 0;
        self.round.card_activated_this_turn = false;
        if let Some(owner) = self.round.action_order.get(self.round.turn).cloned() {
            self.set_round_owner(owner);
        }
        self.transition(GameState::ActionMoveStudents);
    }

    pub(crate) fn after_student_moved(&mut self) {
        self.round.students_moved += 1;
        if self.round.students_moved >= self.table.students_per_turn {
            self.transition(GameState::ActionMoveMother);
        }
    }

    pub(crate) fn after_mother_nature_moved(&mut self) {
        if self.clouds.iter().all(|c| c.students.is_empty()) {
            self.end_turn();
        } else {
            self.transition(GameState::ActionChooseCloud);
        }
    }

    pub(crate) fn end_turn(&mut self) {
        if let Some(index) = self.active_character() {
            self.deactivate_character(index);
        }

        self.round.turn += 1;
        if self.round.turn < self.round.action_order.len() {
            self.begin_turn();
        } else {
            self.end_round();
        }
    }

    fn end_round(&mut self) {
        let hand_empty = self.players.iter().any(|p| p.hand.is_empty());
        if self.round.last_round || hand_empty {
            self.finish();
            return;
        }

        if let Some(first) = self.round.action_order.first().cloned() {
            self.round.planning_order = planning_order(&self.seating(), &first);
        }
        self.start_round(true);
    }

    /// End the game now if a player has placed every tower or only three
    /// islands are left
    pub(crate) fn check_immediate_end(&mut self) -> bool {
        if self.is_finished() {
            return true;
        }
        let out_of_towers = self.players.iter().any(|p| p.school.towers == 0);
        if out_of_towers || self.islands.len() <= 3 {
            self.finish();
            return true;
        }
        false
    }

    pub(crate) fn finish(&mut self) {
        self.winner = self.compute_winner();
        self.transition(GameState::GameEnded);
        self.notify_game_over();
    }

    /// Fewest towers left wins, then most professors; otherwise a draw
    pub fn compute_winner(&self) -> Option<String> {
        let min_towers = self.players.iter().map(|p| p.school.towers).min()?;
        let professors = |nickname: &str| {
            self.professors
                .values()
                .filter(|holder| holder.as_str() == nickname)
                .count()
        };

        let contenders: Vec<&str> = self
            .players
            .iter()
            .filter(|p| p.school.towers == min_towers)
            .map(|p| p.nickname.as_str())
            .collect();
        let best = contenders.iter().map(|&n| professors(n)).max()?;

        let mut winners = contenders.into_iter().filter(|&n| professors(n) == best);
        match (winners.next(), winners.next()) {
            (Some(winner), None) => Some(winner.to_string()),
            _ => None,
        }
    }
}
