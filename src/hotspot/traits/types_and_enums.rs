//! Sensor error types and recovery hints
//!
//! This module defines the canonical error enum shared by configuration,
//! construction and lifecycle operations. The access hot path never returns
//! these errors; it logs and counts them instead.

/// Recovery hint for sensor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Fix the configuration and rebuild the sensor
    Reconfigure,
    /// Drop the event and continue, the pipeline tolerates loss
    Discard,
    /// Restart the sensor
    Restart,
}

/// Sensor error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    InvalidConfiguration(String),
    InvalidArgument(String),
    ChannelFull,
    ChannelClosed,
    ResourceExhausted(String),
    InvalidState(String),
    WorkerFailure(String),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            SensorError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            SensorError::ChannelFull => write!(f, "Hand-off channel is full"),
            SensorError::ChannelClosed => write!(f, "Hand-off channel is closed"),
            SensorError::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            SensorError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            SensorError::WorkerFailure(msg) => write!(f, "Worker failure: {}", msg),
        }
    }
}

impl std::error::Error for SensorError {}

impl SensorError {
    /// Create invalid configuration error
    #[inline(always)]
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create invalid argument error
    #[inline(always)]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create resource exhaustion error
    #[inline(always)]
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Create invalid state error
    #[inline(always)]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create worker failure error
    #[inline(always)]
    pub fn worker_failure(msg: impl Into<String>) -> Self {
        Self::WorkerFailure(msg.into())
    }

    /// Get recovery hint for this error
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::InvalidConfiguration(_) | Self::InvalidArgument(_) => RecoveryHint::Reconfigure,
            Self::ChannelFull | Self::ResourceExhausted(_) => RecoveryHint::Discard,
            Self::ChannelClosed | Self::InvalidState(_) | Self::WorkerFailure(_) => {
                RecoveryHint::Restart
            }
        }
    }

    /// Get error code for programmatic handling
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidConfiguration(_) => 4001,
            Self::InvalidArgument(_) => 2004,
            Self::ChannelFull => 1002,
            Self::ChannelClosed => 6004,
            Self::ResourceExhausted(_) => 1001,
            Self::InvalidState(_) => 2001,
            Self::WorkerFailure(_) => 8004,
        }
    }
}

/// Result alias used by fallible sensor operations
pub type SensorResult<T> = Result<T, SensorError>;
