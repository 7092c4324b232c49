//! Core emulator primitives and traits.

pub mod logging;

pub mod types {
    use serde::{Deserialize, Serialize};

    pub type AudioSample = i16;

    /// Video interrupt rate. One emulation tick happens per interrupt.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum InterruptRate {
        #[default]
        #[serde(rename = "50")]
        Hz50,
        #[serde(rename = "60")]
        Hz60,
    }

    impl InterruptRate {
        pub fn hz(self) -> u32 {
            match self {
                InterruptRate::Hz50 => 50,
                InterruptRate::Hz60 => 60,
            }
        }

        pub fn from_hz(hz: u32) -> Option<Self> {
            match hz {
                50 => Some(InterruptRate::Hz50),
                60 => Some(InterruptRate::Hz60),
                _ => None,
            }
        }
    }
}

/// Cycle bookkeeping exposed by an externally driven CPU.
///
/// The cycle count is the position inside the current interrupt period,
/// counted from the start of the period.
pub trait CycleCounter {
    fn cycle_count(&self) -> u32;
    fn cycles_per_period(&self) -> u32;
}

/// Description of a mount point (media slot) that a system supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPointInfo {
    /// Unique identifier for this mount point (e.g., "Cassette", "Cartridge")
    pub id: String,
    /// User-friendly name for display (e.g., "Cassette Deck")
    pub name: String,
    /// File extensions accepted by this mount point (e.g., ["cas"])
    pub extensions: Vec<String>,
    /// Whether this mount point is required for the system to function
    pub required: bool,
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Exact size in bytes of a save state blob.
    fn state_size(&self) -> usize;

    /// Write a save state into `out`, which must be exactly `state_size()` bytes.
    /// Media (cassettes, cartridges) is never part of the state.
    fn save_state(&self, out: &mut [u8]) -> Result<(), Self::Error>;

    /// Restore a save state. Rejected states leave the running system untouched.
    fn load_state(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Check if this system supports save/load state functionality
    fn supports_save_states(&self) -> bool {
        false
    }

    /// Get the list of mount points this system supports
    fn mount_points(&self) -> Vec<MountPointInfo>;

    /// Load media into a specific mount point
    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Unload media from a specific mount point
    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error>;

    /// Check if a mount point has media loaded
    fn is_mounted(&self, mount_point_id: &str) -> bool;
}
