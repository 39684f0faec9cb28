#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

impl LayerId {
    /// Top-level regions, always mounted.
    pub const STATES: LayerId = LayerId(1);
    /// Subdivisions of the current rendering scope.
    pub const DISTRICTS: LayerId = LayerId(2);
}

/// A group of shapes painted together, in the order layers are listed.
pub trait Layer {
    fn id(&self) -> LayerId;
    /// Number of shapes currently mounted.
    fn mounted_len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.mounted_len() == 0
    }
}
