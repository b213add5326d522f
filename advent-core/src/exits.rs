use serde::{Deserialize, Serialize};
use std::fmt;

/// Compass direction of an exit slot.
///
/// Declaration order is the canonical slot order inside a room record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    #[must_use]
    pub const fn letter(self) -> u8 {
        match self {
            Self::North => b'N',
            Self::East => b'E',
            Self::South => b'S',
            Self::West => b'W',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: u8) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            b'N' => Some(Self::North),
            b'E' => Some(Self::East),
            b'S' => Some(Self::South),
            b'W' => Some(Self::West),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::East => "East",
            Self::South => "South",
            Self::West => "West",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.letter()))
    }
}

/// One exit. A destination of 0 leaves the dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub destination: u16,
    /// Set only for exits invented by the repair pass.
    #[serde(default)]
    pub synthesized: bool,
}

impl Exit {
    #[must_use]
    pub const fn original(destination: u16) -> Self {
        Self {
            destination,
            synthesized: false,
        }
    }

    #[must_use]
    pub const fn synthesized(destination: u16) -> Self {
        Self {
            destination,
            synthesized: true,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.destination == 0
    }
}

/// The four direction slots of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Exits {
    slots: [Option<Exit>; 4],
}

impl Exits {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: [None; 4] }
    }

    /// Build original exits from `(direction, destination)` pairs; later pairs
    /// replace earlier ones for the same direction.
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Direction, u16)>,
    {
        let mut exits = Self::new();
        for (direction, destination) in pairs {
            exits.set(direction, Exit::original(destination));
        }
        exits
    }

    #[must_use]
    pub const fn get(&self, direction: Direction) -> Option<Exit> {
        self.slots[direction.index()]
    }

    #[must_use]
    pub fn destination(&self, direction: Direction) -> Option<u16> {
        self.get(direction).map(|exit| exit.destination)
    }

    pub fn set(&mut self, direction: Direction, exit: Exit) {
        self.slots[direction.index()] = Some(exit);
    }

    pub fn clear(&mut self, direction: Direction) {
        self.slots[direction.index()] = None;
    }

    /// Present exits in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, Exit)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| self.get(direction).map(|exit| (direction, exit)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy with every exit marked as original data.
    #[must_use]
    pub fn as_original(&self) -> Self {
        let mut copy = *self;
        for exit in copy.slots.iter_mut().flatten() {
            exit.synthesized = false;
        }
        copy
    }
}
