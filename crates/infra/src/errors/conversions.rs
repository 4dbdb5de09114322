//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use deskpulse_domain::DeskPulseError;
use serde_json::Error as JsonError;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DeskPulseError);

impl From<InfraError> for DeskPulseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DeskPulseError> for InfraError {
    fn from(value: DeskPulseError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDeskPulseError {
    fn into_deskpulse(self) -> DeskPulseError;
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → DeskPulseError */
/* -------------------------------------------------------------------------- */

impl IntoDeskPulseError for IoError {
    fn into_deskpulse(self) -> DeskPulseError {
        match self.kind() {
            ErrorKind::NotFound => DeskPulseError::NotFound(self.to_string()),
            ErrorKind::AddrInUse | ErrorKind::AddrNotAvailable => {
                DeskPulseError::Network(format!("cannot bind listener: {self}"))
            }
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::BrokenPipe => DeskPulseError::Network(self.to_string()),
            ErrorKind::PermissionDenied => DeskPulseError::Platform(format!("permission denied: {self}")),
            ErrorKind::InvalidData | ErrorKind::InvalidInput => DeskPulseError::InvalidInput(self.to_string()),
            _ => DeskPulseError::Internal(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_deskpulse())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml → DeskPulseError */
/* -------------------------------------------------------------------------- */

impl IntoDeskPulseError for JsonError {
    fn into_deskpulse(self) -> DeskPulseError {
        if self.is_io() {
            DeskPulseError::Internal(format!("json io failure: {self}"))
        } else {
            DeskPulseError::Protocol(format!("invalid JSON at line {} column {}: {self}", self.line(), self.column()))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_deskpulse())
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(DeskPulseError::Config(format!("invalid TOML: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* tokio task failures → DeskPulseError */
/* -------------------------------------------------------------------------- */

impl IntoDeskPulseError for JoinError {
    fn into_deskpulse(self) -> DeskPulseError {
        if self.is_cancelled() {
            DeskPulseError::Internal("background task was cancelled".into())
        } else {
            DeskPulseError::Internal(format!("background task panicked: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_deskpulse())
    }
}

impl From<Elapsed> for InfraError {
    fn from(_: Elapsed) -> Self {
        InfraError(DeskPulseError::Internal("operation timed out".into()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn io_addr_in_use_maps_to_network_error() {
        let err = IoError::new(ErrorKind::AddrInUse, "port 8765 taken");
        let mapped: DeskPulseError = InfraError::from(err).into();
        match mapped {
            DeskPulseError::Network(msg) => assert!(msg.contains("8765")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn json_syntax_maps_to_protocol_error() {
        let err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let mapped: DeskPulseError = InfraError::from(err).into();
        assert!(matches!(mapped, DeskPulseError::Protocol(_)));
    }

    #[test]
    fn toml_maps_to_config_error() {
        let err = toml::from_str::<toml::Table>("= nope").unwrap_err();
        let mapped: DeskPulseError = InfraError::from(err).into();
        assert!(matches!(mapped, DeskPulseError::Config(_)));
    }

    #[tokio::test]
    async fn cancelled_task_maps_to_internal_error() {
        let handle = tokio::spawn(async { tokio::time::sleep(Duration::from_secs(60)).await });
        handle.abort();
        let err = handle.await.unwrap_err();
        let mapped: DeskPulseError = InfraError::from(err).into();
        match mapped {
            DeskPulseError::Internal(msg) => assert!(msg.contains("cancelled")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn elapsed_maps_to_internal_error() {
        let err = tokio::time::timeout(Duration::from_millis(1), std::future::pending::<()>()).await.unwrap_err();
        let mapped: DeskPulseError = InfraError::from(err).into();
        assert!(matches!(mapped, DeskPulseError::Internal(_)));
    }
}
