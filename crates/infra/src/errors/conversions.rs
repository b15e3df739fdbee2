//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use tollgate_domain::TollgateError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TollgateError);

impl From<InfraError> for TollgateError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TollgateError> for InfraError {
    fn from(value: TollgateError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTollgateError {
    fn into_tollgate(self) -> TollgateError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → TollgateError */
/* -------------------------------------------------------------------------- */

impl IntoTollgateError for KeyringError {
    fn into_tollgate(self) -> TollgateError {
        let description = self.to_string();

        match self {
            Self::NoEntry => TollgateError::Storage("keychain entry not found".into()),
            Self::BadEncoding(_) => {
                TollgateError::Storage("credential in keychain is not valid UTF-8".into())
            }
            Self::TooLong(name, limit) => TollgateError::Storage(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Self::Invalid(attr, reason) => {
                TollgateError::Storage(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Self::Ambiguous(entries) => TollgateError::Storage(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            Self::PlatformFailure(err) => {
                TollgateError::Storage(format!("keychain platform error: {err}"))
            }
            Self::NoStorageAccess(err) => {
                TollgateError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => TollgateError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        Self(value.into_tollgate())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TollgateError */
/* -------------------------------------------------------------------------- */

impl IntoTollgateError for HttpError {
    fn into_tollgate(self) -> TollgateError {
        if self.is_timeout() {
            return TollgateError::Transport("HTTP request timed out".into());
        }

        if self.is_connect() {
            return TollgateError::Transport("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            if code == 401 {
                return TollgateError::AuthRequired;
            }
            return TollgateError::Status {
                status: code,
                body: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        if self.is_builder() {
            return TollgateError::InvalidInput(format!("invalid request: {self}"));
        }

        TollgateError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_tollgate())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error / serde_json::Error → TollgateError */
/* -------------------------------------------------------------------------- */

impl IntoTollgateError for std::io::Error {
    fn into_tollgate(self) -> TollgateError {
        match self.kind() {
            std::io::ErrorKind::PermissionDenied => {
                TollgateError::Storage(format!("permission denied: {self}"))
            }
            _ => TollgateError::Storage(format!("I/O failure: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_tollgate())
    }
}

impl IntoTollgateError for serde_json::Error {
    fn into_tollgate(self) -> TollgateError {
        TollgateError::Storage(format!("malformed stored document: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(value.into_tollgate())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
