//! Request extractors for the caller's identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::constants::{MAX_OWNER_ID_LENGTH, X_OWNER_ID};
use crate::error::MintError;

/// The caller's identity, as forwarded by the upstream auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Owner {
    pub(crate) id: String,
}

impl Owner {
    fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > MAX_OWNER_ID_LENGTH {
            return None;
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(Self {
            id: value.to_string(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = MintError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let owner = parts
            .headers
            .get(X_OWNER_ID)
            .and_then(|value| value.to_str().ok())
            .and_then(Owner::from_header);

        async move { owner.ok_or(MintError::Unauthorized) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_header_validation() {
        assert_eq!(
            Owner::from_header(" user_42-a ").map(|owner| owner.id),
            Some("user_42-a".to_string())
        );
        assert!(Owner::from_header("").is_none());
        assert!(Owner::from_header("../etc").is_none());
        assert!(Owner::from_header("has space").is_none());
        assert!(Owner::from_header(&"a".repeat(MAX_OWNER_ID_LENGTH + 1)).is_none());
    }
}
