//! Room manager configuration

/// How the global conference flag reacts to rooms ending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConferenceFlagPolicy {
    /// Flag is true while at least one room exists
    #[default]
    AnyRoomActive,

    /// Flag follows the last transition: any room start sets it, any room
    /// end clears it, even while other rooms are still running
    LastTransition,
}

/// Room manager configuration
#[derive(Debug, Clone, Default)]
pub struct RoomConfig {
    /// Conference flag policy
    pub conference_flag: ConferenceFlagPolicy,
}

impl RoomConfig {
    /// Set the conference flag policy
    pub fn conference_flag(mut self, policy: ConferenceFlagPolicy) -> Self {
        self.conference_flag = policy;
        self
    }
}
