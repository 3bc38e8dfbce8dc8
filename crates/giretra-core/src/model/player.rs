use core::fmt;
use serde::{Deserialize, Serialize};

/// Seats in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerPosition {
    Bottom = 0,
    Left = 1,
    Top = 2,
    Right = 3,
}

impl PlayerPosition {
    pub const LOOP: [PlayerPosition; 4] = [
        PlayerPosition::Bottom,
        PlayerPosition::Left,
        PlayerPosition::Top,
        PlayerPosition::Right,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerPosition::Bottom),
            1 => Some(PlayerPosition::Left),
            2 => Some(PlayerPosition::Top),
            3 => Some(PlayerPosition::Right),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> PlayerPosition {
        match self {
            PlayerPosition::Bottom => PlayerPosition::Left,
            PlayerPosition::Left => PlayerPosition::Top,
            PlayerPosition::Top => PlayerPosition::Right,
            PlayerPosition::Right => PlayerPosition::Bottom,
        }
    }

    pub const fn previous(self) -> PlayerPosition {
        match self {
            PlayerPosition::Bottom => PlayerPosition::Right,
            PlayerPosition::Left => PlayerPosition::Bottom,
            PlayerPosition::Top => PlayerPosition::Left,
            PlayerPosition::Right => PlayerPosition::Top,
        }
    }

    pub const fn teammate(self) -> PlayerPosition {
        match self {
            PlayerPosition::Bottom => PlayerPosition::Top,
            PlayerPosition::Left => PlayerPosition::Right,
            PlayerPosition::Top => PlayerPosition::Bottom,
            PlayerPosition::Right => PlayerPosition::Left,
        }
    }

    pub const fn team(self) -> Team {
        match self {
            PlayerPosition::Bottom | PlayerPosition::Top => Team::Team1,
            PlayerPosition::Left | PlayerPosition::Right => Team::Team2,
        }
    }

    /// The four seats in play order, starting with the seat after `self`.
    pub const fn play_order(self) -> [PlayerPosition; 4] {
        let first = self.next();
        let second = first.next();
        let third = second.next();
        [first, second, third, self]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerPosition::Bottom => "Bottom",
            PlayerPosition::Left => "Left",
            PlayerPosition::Top => "Top",
            PlayerPosition::Right => "Right",
        }
    }
}

impl fmt::Display for PlayerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Bottom and Top.
    Team1,
    /// Left and Right.
    Team2,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::Team1, Team::Team2];

    pub const fn opponent(self) -> Team {
        match self {
            Team::Team1 => Team::Team2,
            Team::Team2 => Team::Team1,
        }
    }

    pub const fn members(self) -> [PlayerPosition; 2] {
        match self {
            Team::Team1 => [PlayerPosition::Bottom, PlayerPosition::Top],
            Team::Team2 => [PlayerPosition::Left, PlayerPosition::Right],
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Team::Team1 => 0,
            Team::Team2 => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Team1 => f.write_str("Team1"),
            Team::Team2 => f.write_str("Team2"),
        }
    }
}
