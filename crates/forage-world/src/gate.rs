//! The tick gate: an explicit "simulation is running" guard.
//!
//! Shared world state (sensing, availability checks, claims) may only be
//! touched while an epoch is running. Instead of a global flag, the
//! [`TickGate`] mints a [`TickToken`] for the current `(epoch, tick)` and
//! every world query presents it back. A query made while the gate is closed
//! fails with [`WorldError::Inactive`]; one made with a token from another
//! tick fails with [`WorldError::StaleToken`].

use crate::error::WorldError;

/// Proof that a world query belongs to a specific tick of a running epoch.
///
/// Tokens can only be minted by [`TickGate::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken {
    /// Epoch the token was issued in.
    epoch: u64,
    /// Tick within the epoch the token was issued in.
    tick: u64,
}

impl TickToken {
    /// The epoch this token belongs to.
    pub const fn epoch(self) -> u64 {
        self.epoch
    }

    /// The tick this token belongs to.
    pub const fn tick(self) -> u64 {
        self.tick
    }
}

impl core::fmt::Display for TickToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "epoch {} tick {}", self.epoch, self.tick)
    }
}

/// Tracks whether an epoch is running and which tick it is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickGate {
    /// The running epoch, or `None` between epochs.
    active: Option<u64>,
    /// Ticks completed in the running epoch.
    tick: u64,
}

impl TickGate {
    /// Create a closed gate.
    pub const fn new() -> Self {
        Self {
            active: None,
            tick: 0,
        }
    }

    /// Open the gate for `epoch`, resetting the tick counter.
    pub const fn open(&mut self, epoch: u64) {
        self.active = Some(epoch);
        self.tick = 0;
    }

    /// Close the gate. Outstanding tokens become invalid.
    pub const fn close(&mut self) {
        self.active = None;
    }

    /// Whether an epoch is running.
    pub const fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// The running epoch, if any.
    pub const fn active_epoch(&self) -> Option<u64> {
        self.active
    }

    /// Ticks completed in the running epoch.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Move to the next tick. Tokens from the finished tick become stale.
    pub fn advance(&mut self) -> Result<u64, WorldError> {
        if self.active.is_none() {
            return Err(WorldError::Inactive);
        }
        self.tick = self.tick.checked_add(1).ok_or(WorldError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Mint a token for the current tick.
    pub const fn issue(&self) -> Result<TickToken, WorldError> {
        match self.active {
            Some(epoch) => Ok(TickToken {
                epoch,
                tick: self.tick,
            }),
            None => Err(WorldError::Inactive),
        }
    }

    /// Verify that `token` belongs to the current tick of a running epoch.
    pub fn check(&self, token: TickToken) -> Result<(), WorldError> {
        let expected = self.issue()?;
        if expected == token {
            Ok(())
        } else {
            Err(WorldError::StaleToken {
                expected,
                found: token,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn closed_gate_refuses_tokens() {
        let gate = TickGate::new();
        assert!(matches!(gate.issue(), Err(WorldError::Inactive)));
    }

    #[test]
    fn token_valid_for_its_tick_only() {
        let mut gate = TickGate::new();
        gate.open(3);
        let token = gate.issue().unwrap();
        assert!(gate.check(token).is_ok());
        assert_eq!(token.epoch(), 3);
        assert_eq!(token.tick(), 0);

        gate.advance().unwrap();
        assert!(matches!(
            gate.check(token),
            Err(WorldError::StaleToken { .. })
        ));
    }

    #[test]
    fn closing_invalidates_tokens() {
        let mut gate = TickGate::new();
        gate.open(0);
        let token = gate.issue().unwrap();
        gate.close();
        assert!(matches!(gate.check(token), Err(WorldError::Inactive)));
        assert!(matches!(gate.advance(), Err(WorldError::Inactive)));
    }

    #[test]
    fn reopening_resets_tick() {
        let mut gate = TickGate::new();
        gate.open(0);
        gate.advance().unwrap();
        gate.advance().unwrap();
        assert_eq!(gate.tick(), 2);
        gate.close();
        gate.open(1);
        assert_eq!(gate.tick(), 0);
        assert_eq!(gate.active_epoch(), Some(1));
    }
}
