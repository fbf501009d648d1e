//! The liveness action vocabulary.
//!
//! A challenge instructs the user to perform exactly one of these actions
//! between the two captured frames. The set is a closed enum so that the
//! action-analysis capability's dispatch is exhaustive; adding an action is
//! a deliberate, compiler-checked change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An action the user must perform to prove live presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessAction {
    TurnLeft,
    TurnRight,
    Blink,
    OpenMouth,
}

impl LivenessAction {
    /// Every action in the vocabulary, in wire order.
    pub const ALL: [LivenessAction; 4] = [
        LivenessAction::TurnLeft,
        LivenessAction::TurnRight,
        LivenessAction::Blink,
        LivenessAction::OpenMouth,
    ];

    /// Wire name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
            Self::Blink => "blink",
            Self::OpenMouth => "open_mouth",
        }
    }

    /// Human-readable instruction shown to the user.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::TurnLeft => "Turn your head to the left",
            Self::TurnRight => "Turn your head to the right",
            Self::Blink => "Blink your eyes",
            Self::OpenMouth => "Open your mouth",
        }
    }
}

impl fmt::Display for LivenessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LivenessAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turn_left" => Ok(Self::TurnLeft),
            "turn_right" => Ok(Self::TurnRight),
            "blink" => Ok(Self::Blink),
            "open_mouth" => Ok(Self::OpenMouth),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Error for an action name outside the vocabulary.
#[derive(Debug, thiserror::Error)]
#[error("unknown liveness action: {0}")]
pub struct UnknownAction(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for action in LivenessAction::ALL {
            assert_eq!(action.as_str().parse::<LivenessAction>().unwrap(), action);
        }
    }

    #[test]
    fn serde_uses_snake_case_wire_names() {
        let json = serde_json::to_string(&LivenessAction::OpenMouth).unwrap();
        assert_eq!(json, "\"open_mouth\"");
        let back: LivenessAction = serde_json::from_str("\"turn_left\"").unwrap();
        assert_eq!(back, LivenessAction::TurnLeft);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("wave_hand".parse::<LivenessAction>().is_err());
    }
}
