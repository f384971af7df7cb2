use url::Url;

use crate::shared::{errors::BindingError, types::TransportKind};

/// A validated endpoint for one transport kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportBinding {
    pub kind: TransportKind,
    pub url: Url,
}

impl TransportBinding {
    pub fn parse(kind: TransportKind, raw: &str) -> Result<Self, BindingError> {
        let url = Url::parse(raw.trim()).map_err(|source| BindingError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self { kind, url }),
            scheme => Err(BindingError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: scheme.to_string(),
            }),
        }
    }
}
