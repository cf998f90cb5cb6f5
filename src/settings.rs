use std::time::Duration;

/// Limits and timing used by [`get_device_info_with`][crate::get_device_info_with].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Timeout for each endpoint read or write.
    pub timeout: Duration,

    /// Delay after each XGIP initialization frame, and after a failed read.
    pub pacing: Duration,

    /// Failed reads allowed while collecting a chunked GIP descriptor.
    pub chunk_retries: u32,

    /// Reads attempted when collecting unsolicited GIP messages.
    pub message_reads: u32,

    pub config_max_len: usize,
    pub string_max_len: usize,
    pub device_max_len: usize,

    /// Buffer size for each endpoint read.
    pub read_max_len: usize,

    /// Collect unsolicited GIP messages after the descriptor exchange.
    pub collect_messages: bool,

    /// Fetch the Microsoft OS string descriptor from XGIP devices.
    pub fetch_os_descriptor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timeout: Duration::from_millis(1000),
            pacing: Duration::from_millis(100),
            chunk_retries: 10,
            message_reads: 5,
            config_max_len: 512,
            string_max_len: 255,
            device_max_len: 64,
            read_max_len: 64,
            collect_messages: true,
            fetch_os_descriptor: true,
        }
    }
}
