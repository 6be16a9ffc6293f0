//! Hub client error types.

use hublink_domain::error::HubLinkError;

/// Errors specific to the hub REST client.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("hub host must not be empty")]
    EmptyHost,

    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    /// Connection, TLS or timeout failure.
    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),

    /// The hub answered with a status of 400 or above.
    #[error("hub answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode hub response")]
    Decode(#[source] serde_json::Error),

    #[error("domain error")]
    Domain(#[source] HubLinkError),
}

impl HttpError {
    /// Convert into a [`HubLinkError`] for propagation across port boundaries.
    pub fn into_domain(self) -> HubLinkError {
        match self {
            Self::Domain(err) => err,
            Self::Status { status, body } => HubLinkError::Rejected { status, body },
            other => HubLinkError::Transport(Box::new(other)),
        }
    }
}

impl From<HttpError> for HubLinkError {
    fn from(err: HttpError) -> Self {
        err.into_domain()
    }
}

impl From<HubLinkError> for HttpError {
    fn from(err: HubLinkError) -> Self {
        Self::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hublink_domain::error::ValidationError;

    #[test]
    fn should_convert_status_to_rejected() {
        let err: HubLinkError = HttpError::Status {
            status: 409,
            body: "ERR_ITEM_ALREADY_EXIST".to_string(),
        }
        .into();
        assert!(err.is_already_exists());
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn should_convert_empty_host_to_transport_error() {
        let err: HubLinkError = HttpError::EmptyHost.into();
        assert!(matches!(err, HubLinkError::Transport(_)));
    }

    #[test]
    fn should_convert_domain_error_back_to_domain() {
        let http_err = HttpError::Domain(ValidationError::NoEventTypes.into());
        let back: HubLinkError = http_err.into();
        assert!(matches!(back, HubLinkError::Validation(ValidationError::NoEventTypes)));
    }

    #[test]
    fn should_display_status_error() {
        let err = HttpError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "hub answered 500: boom");
    }
}
