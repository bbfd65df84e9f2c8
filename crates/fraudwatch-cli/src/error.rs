use fraudwatch_warehouse::WarehouseError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Warehouse(error) => match error {
                WarehouseError::InvalidFilter(_) => 2,
                WarehouseError::Connection { .. } => 3,
                WarehouseError::Io(_) => 10,
                WarehouseError::Config(_) => 11,
                WarehouseError::DuckDb(_) | WarehouseError::QueryRejected(_) => 1,
            },
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }

    /// Follow-up advice printed under the error, if any.
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Warehouse(WarehouseError::Connection { .. }) => Some(
                "check the [warehouse] settings in your secrets file \
                 or FRAUDWATCH_WAREHOUSE__* variables",
            ),
            Self::Warehouse(WarehouseError::Config(_)) => {
                Some("see `fraudwatch --help` for the secrets file location")
            }
            _ => None,
        }
    }
}
