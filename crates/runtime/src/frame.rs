use foundation::time::Time;

/// Deterministic frame metadata.
///
/// This is the timebase for the widget runtime: one `Frame` per paint tick.
/// It is intentionally small and pure so interaction scripts can be replayed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (milliseconds).
    pub dt_ms: u64,
    /// Time at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_ms: u64) -> Self {
        Self {
            index,
            dt_ms,
            time: Time(index.saturating_mul(dt_ms)),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_ms)
    }
}
