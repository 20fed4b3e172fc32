//! Game invariants - sanity checks that detect bugs.
//!
//! A correctly implemented engine never triggers these. The server runs them
//! after every successful action and aborts the match on a violation.

use crate::game::Game;
use crate::rules::INITIAL_BANK;
use crate::students::STUDENTS_PER_COLOR;

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(game: &Game) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if !game.islands.is_feasible_index(game.mother_nature) {
        violations.push(violation(format!(
            "mother nature at {} but only {} islands",
            game.mother_nature,
            game.islands.len()
        )));
    }

    // Students are never created or destroyed
    let expected = STUDENTS_PER_COLOR * 5;
    let total = game.bag.len()
        + game.islands.iter().map(|i| i.students.total()).sum::<u32>()
        + game.clouds.iter().map(|c| c.students.total()).sum::<u32>()
        + game
            .players
            .iter()
            .map(|p| p.school.entry.total() + p.school.hall.total())
            .sum::<u32>()
        + game.characters.iter().map(|c| c.students.total()).sum::<u32>();
    if total != expected {
        violations.push(violation(format!(
            "{total} students in play, expected {expected}"
        )));
    }

    let active = game.characters.iter().filter(|c| c.active).count();
    if active > 1 {
        violations.push(violation(format!("{active} character cards active")));
    }
    if !game.rules.is_base() && active == 0 {
        violations.push(violation(format!(
            "rule policy {:?} in force with no active card",
            game.rules
        )));
    }

    for player in &game.players {
        if player.school.towers > game.table.towers {
            violations.push(violation(format!(
                "{} holds {} towers, more than {}",
                player.nickname, player.school.towers, game.table.towers
            )));
        }
    }

    if game.expert_mode {
        // One coin stays on each card after its first use
        let coins = game.bank
            + game.players.iter().map(|p| p.coins).sum::<u32>()
            + game.characters.iter().filter(|c| c.used).count() as u32;
        if coins != INITIAL_BANK {
            violations.push(violation(format!(
                "{coins} coins in play, expected {INITIAL_BANK}"
            )));
        }
    }

    violations
}
