//! Exclusive playback resource (audio focus) contract

use serde::{Deserialize, Serialize};

/// Answer to a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusGrant {
    Granted,
    Denied,
}

/// Focus notifications pushed by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    Gained,
    LostPermanent,
    LostTransient,
    LostTransientCanDuck,
}

impl FocusChange {
    /// Whether this change takes the resource away from us
    pub fn is_loss(self) -> bool {
        !matches!(self, Self::Gained)
    }
}

/// Telephony state pushed by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

impl CallState {
    /// Whether a call is ringing or active
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Arbiter for the exclusive playback resource
pub trait FocusArbiter: Send {
    fn acquire(&mut self) -> FocusGrant;
    fn release(&mut self);
}

/// Single-process arbiter
///
/// Grants focus unless it has been blocked, e.g. while a call is active.
#[derive(Debug, Default)]
pub struct LocalFocus {
    held: bool,
    blocked: bool,
}

impl LocalFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every request until unblocked
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        if blocked {
            self.held = false;
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl FocusArbiter for LocalFocus {
    fn acquire(&mut self) -> FocusGrant {
        if self.blocked {
            return FocusGrant::Denied;
        }
        self.held = true;
        FocusGrant::Granted
    }

    fn release(&mut self) {
        self.held = false;
    }
}
