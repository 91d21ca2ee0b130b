//! Remote button map.
//!
//! The remote has ten switches, scanned as indices `0..SWITCH_COUNT`. Each
//! switch is bound to one logical scoreboard action.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of switches on the remote.
pub const SWITCH_COUNT: usize = 10;

// Switch indices as wired on the board.
pub const SW_2: usize = 0;
pub const SW_3: usize = 1;
pub const SW_4_L: usize = 2;
pub const SW_4_R: usize = 3;
pub const SW_5: usize = 4;
pub const SW_6: usize = 5;
pub const SW_7: usize = 6;
pub const SW_8: usize = 7;
pub const SW_9: usize = 8;
pub const SW_10: usize = 9;

/// Logical action of a remote button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Button {
    #[serde(rename = "add-1")]
    Add1,
    #[serde(rename = "add-2")]
    Add2,
    #[serde(rename = "add-3")]
    Add3,
    #[serde(rename = "add-4")]
    Add4,
    #[serde(rename = "add-5")]
    Add5,
    #[serde(rename = "add-6")]
    Add6,
    #[serde(rename = "add-7")]
    Add7,
    /// Give the serve/point to team A.
    ToTeamA,
    /// Give the serve/point to team B.
    ToTeamB,
    #[default]
    Reset,
}

/// Unknown button name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown button: {0}")]
pub struct ParseButtonError(pub String);

impl Button {
    /// Every button, in switch-index order.
    pub const ALL: [Button; SWITCH_COUNT] = [
        Button::Add3,
        Button::Add4,
        Button::ToTeamB,
        Button::ToTeamA,
        Button::Reset,
        Button::Add1,
        Button::Add5,
        Button::Add6,
        Button::Add7,
        Button::Add2,
    ];

    /// Map a scanned switch index to its button.
    pub fn from_switch(index: usize) -> Option<Button> {
        Self::ALL.get(index).copied()
    }

    /// Switch index this button is wired to.
    pub fn switch_index(self) -> usize {
        match self {
            Button::Add1 => SW_6,
            Button::Add2 => SW_10,
            Button::Add3 => SW_2,
            Button::Add4 => SW_3,
            Button::Add5 => SW_7,
            Button::Add6 => SW_8,
            Button::Add7 => SW_9,
            Button::ToTeamA => SW_4_R,
            Button::ToTeamB => SW_4_L,
            Button::Reset => SW_5,
        }
    }

    /// Points added by an `Add*` button.
    pub fn points(self) -> Option<u8> {
        match self {
            Button::Add1 => Some(1),
            Button::Add2 => Some(2),
            Button::Add3 => Some(3),
            Button::Add4 => Some(4),
            Button::Add5 => Some(5),
            Button::Add6 => Some(6),
            Button::Add7 => Some(7),
            Button::ToTeamA | Button::ToTeamB | Button::Reset => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::Add1 => "add-1",
            Button::Add2 => "add-2",
            Button::Add3 => "add-3",
            Button::Add4 => "add-4",
            Button::Add5 => "add-5",
            Button::Add6 => "add-6",
            Button::Add7 => "add-7",
            Button::ToTeamA => "to-team-a",
            Button::ToTeamB => "to-team-b",
            Button::Reset => "reset",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Button {
    type Err = ParseButtonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseButtonError(s.to_string()))
    }
}
