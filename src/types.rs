//! Type-safe selection types for installkit
//!
//! Check kinds, check states and confirmation resolutions are proper enums
//! rather than integers and booleans, so every match over them is exhaustive.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How an item can be selected.
///
/// Definition files encode this as the integer `checktype`
/// (0 = none, 1 = checkbox, 2 = radio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CheckKind {
    /// Informational entry, never selectable
    None,
    /// Independent on/off toggle
    #[default]
    Checkbox,
    /// Mutually exclusive with sibling radio items of the same category
    Radio,
}

impl CheckKind {
    /// Parse the integer `checktype` code used in definition files
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Checkbox),
            2 => Some(Self::Radio),
            _ => None,
        }
    }

    /// The integer `checktype` code for this kind
    pub fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Checkbox => 1,
            Self::Radio => 2,
        }
    }

    /// Whether items of this kind can be checked at all
    pub fn is_selectable(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Requested or current state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CheckState {
    Checked,
    Unchecked,
}

impl CheckState {
    pub fn is_checked(self) -> bool {
        matches!(self, Self::Checked)
    }
}

impl From<bool> for CheckState {
    fn from(checked: bool) -> Self {
        if checked { Self::Checked } else { Self::Unchecked }
    }
}

/// Caller's answer to a confirmation the selection machine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Resolution {
    /// Abort the transition, nothing changes
    Decline,
    /// Cascade the change to the affected items first
    Accept,
    /// Proceed and leave the affected items as they are
    Ignore,
}
