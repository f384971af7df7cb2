use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const DEFAULT_SSE_URL: &str = "https://mcp.deepwiki.com/sse";
pub const DEFAULT_STREAMABLE_HTTP_URL: &str = "https://mcp.context7.com/mcp";

/// Which of the two independent sessions an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Sse,
    StreamableHttp,
}

impl TransportKind {
    pub const ALL: [TransportKind; 2] = [TransportKind::Sse, TransportKind::StreamableHttp];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Sse => "sse",
            TransportKind::StreamableHttp => "streamable_http",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransportKind::Sse => "SSE",
            TransportKind::StreamableHttp => "Streamable HTTP",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            TransportKind::Sse => DEFAULT_SSE_URL,
            TransportKind::StreamableHttp => DEFAULT_STREAMABLE_HTTP_URL,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "streamable_http" | "streamable-http" | "http" => Ok(Self::StreamableHttp),
            other => Err(anyhow::anyhow!("unknown transport '{}'", other)),
        }
    }
}

/// Arguments are forwarded as opaque strings; no coercion against the schema.
pub type ParameterValues = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    pub name: String,
    pub arguments: ParameterValues,
}
