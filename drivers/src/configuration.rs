#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Configuration {
    /// Timeout of single-register control transfers.
    pub register_timeout: std::time::Duration,

    /// Timeout of the control transfers that open a bulk window.
    pub bulk_setup_timeout: std::time::Duration,

    /// Timeout of motor and gamma table bulk writes.
    pub table_timeout: std::time::Duration,

    /// Timeout of each 512 bytes shading block.
    pub shading_timeout: std::time::Duration,

    /// Total number of calls made when a transfer is interrupted by a signal.
    pub interrupted_attempts: u32,

    /// Pause between two attempts of an interrupted control transfer.
    /// Bulk transfers are retried immediately.
    pub interrupted_pause: std::time::Duration,

    /// Number of FEBUSY reads before an analog frontend write gives up.
    pub frontend_busy_polls: u32,
}

impl Configuration {
    pub const DEFAULT: Configuration = Configuration {
        register_timeout: std::time::Duration::from_millis(500),
        bulk_setup_timeout: std::time::Duration::from_millis(1000),
        table_timeout: std::time::Duration::from_millis(1000),
        shading_timeout: std::time::Duration::from_millis(10000),
        interrupted_attempts: 100,
        interrupted_pause: std::time::Duration::from_millis(1),
        frontend_busy_polls: 10,
    };

    pub fn deserialize_bincode(data: &[u8]) -> bincode::Result<Configuration> {
        bincode::deserialize(data)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::DEFAULT
    }
}
