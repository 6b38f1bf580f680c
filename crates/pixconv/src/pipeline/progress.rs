use std::fmt;

/// Conversion step being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPhase {
    Decoding,
    RemovingBackground,
    Constraining,
    Encoding,
}

impl ConversionPhase {
    /// Job progress recorded when the phase starts.
    pub fn percent(&self) -> u8 {
        match self {
            ConversionPhase::Decoding => 10,
            ConversionPhase::RemovingBackground => 30,
            ConversionPhase::Constraining => 60,
            ConversionPhase::Encoding => 80,
        }
    }
}

impl fmt::Display for ConversionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionPhase::Decoding => write!(f, "Decoding"),
            ConversionPhase::RemovingBackground => write!(f, "Removing background"),
            ConversionPhase::Constraining => write!(f, "Resizing"),
            ConversionPhase::Encoding => write!(f, "Encoding"),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, phase: ConversionPhase);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _phase: ConversionPhase) {}
}
