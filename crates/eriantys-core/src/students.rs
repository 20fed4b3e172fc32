//! Student colors, student counts and the shared bag.
//!
//! This module contains:
//! - The five student colors
//! - StudentSet for managing per-color counts
//! - The bag students are drawn from

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Students per color in a complete bag
pub const STUDENTS_PER_COLOR: u32 = 26;

/// Students per color used to seed the islands at setup
pub const SEED_STUDENTS_PER_COLOR: u32 = 2;

/// Student (and professor) colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Green,
    Red,
    Yellow,
    Pink,
    Blue,
}

impl Color {
    /// All colors, in board order
    pub const ALL: [Color; 5] = [
        Color::Green,
        Color::Red,
        Color::Yellow,
        Color::Pink,
        Color::Blue,
    ];
}

/// A count of students per color
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSet {
    pub green: u32,
    pub red: u32,
    pub yellow: u32,
    pub pink: u32,
    pub blue: u32,
}

impl StudentSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding `count` students of every color
    pub fn uniform(count: u32) -> Self {
        Self {
            green: count,
            red: count,
            yellow: count,
            pink: count,
            blue: count,
        }
    }

    /// Total number of students
    pub fn total(&self) -> u32 {
        self.green + self.red + self.yellow + self.pink + self.blue
    }

    /// Check if there are no students
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific color
    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::Green => self.green,
            Color::Red => self.red,
            Color::Yellow => self.yellow,
            Color::Pink => self.pink,
            Color::Blue => self.blue,
        }
    }

    /// Set count of a specific color
    pub fn set(&mut self, color: Color, count: u32) {
        match color {
            Color::Green => self.green = count,
            Color::Red => self.red = count,
            Color::Yellow => self.yellow = count,
            Color::Pink => self.pink = count,
            Color::Blue => self.blue = count,
        }
    }

    /// Add students of one color
    pub fn add(&mut self, color: Color, amount: u32) {
        self.set(color, self.get(color) + amount);
    }

    /// Add another set to this one
    pub fn add_set(&mut self, other: &StudentSet) {
        for color in Color::ALL {
            self.add(color, other.get(color));
        }
    }

    /// Whether at least one student of `color` is present
    pub fn contains(&self, color: Color) -> bool {
        self.get(color) > 0
    }

    /// Remove one student of `color`, returning false if there is none
    pub fn remove(&mut self, color: Color) -> bool {
        let count = self.get(color);
        if count == 0 {
            return false;
        }
        self.set(color, count - 1);
        true
    }

    /// Remove up to `amount` students of `color`, returning how many were removed
    pub fn remove_up_to(&mut self, color: Color, amount: u32) -> u32 {
        let removed = self.get(color).min(amount);
        self.set(color, self.get(color) - removed);
        removed
    }

    /// Take every student out of the set
    pub fn take_all(&mut self) -> StudentSet {
        std::mem::take(self)
    }

    /// Pick a color at random, weighted by count
    fn pick_weighted<R: Rng>(&self, rng: &mut R) -> Option<Color> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0..total);
        for color in Color::ALL {
            let count = self.get(color);
            if roll < count {
                return Some(color);
            }
            roll -= count;
        }
        None
    }
}

/// The bag students are drawn from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    pub students: StudentSet,
}

impl Bag {
    /// Create the small bag used to seed the islands
    pub fn seed() -> Self {
        Self {
            students: StudentSet::uniform(SEED_STUDENTS_PER_COLOR),
        }
    }

    /// Add the rest of the students once the islands are seeded
    pub fn fill_remaining(&mut self) {
        let remaining = STUDENTS_PER_COLOR - SEED_STUDENTS_PER_COLOR;
        self.students.add_set(&StudentSet::uniform(remaining));
    }

    /// Students left in the bag
    pub fn len(&self) -> u32 {
        self.students.total()
    }

    /// Check if the bag is exhausted
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Draw one student at random
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<Color> {
        let color = self.students.pick_weighted(rng)?;
        self.students.remove(color);
        Some(color)
    }

    /// Draw up to `count` students; fewer are returned if the bag runs out
    pub fn draw_many<R: Rng>(&mut self, count: u32, rng: &mut R) -> StudentSet {
        let mut drawn = StudentSet::new();
        for _ in 0..count {
            match self.draw(rng) {
                Some(color) => drawn.add(color, 1),
                None => break,
            }
        }
        drawn
    }

    /// Put students back
    pub fn put_back(&mut self, color: Color, amount: u32) {
        self.students.add(color, amount);
    }
}
