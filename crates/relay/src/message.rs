use serde::{Deserialize, Serialize};

/// Payload received from the companion app.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppMessage {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

impl AppMessage {
    pub fn method(&self) -> RelayMethod {
        RelayMethod::from_url(&self.url)
    }
}

/// What the remote endpoint is, judged by the URL's last path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMethod {
    Submit,
    Nonce,
    Other(String),
}

impl RelayMethod {
    pub fn from_url(url: &str) -> Self {
        let segment = url.rsplit('/').next().unwrap_or(url);
        match segment {
            "submit" => Self::Submit,
            "nonce" => Self::Nonce,
            other => Self::Other(other.to_string()),
        }
    }
}

/// JSON body of a score submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitBody {
    pub name: Option<String>,
    pub score: Option<i64>,
    pub mac: Option<String>,
    pub nonce: Option<String>,
    pub account_token: String,
}

impl SubmitBody {
    pub fn new(message: &AppMessage, account_token: String) -> Self {
        Self {
            name: message.name.clone(),
            score: message.score,
            mac: message.mac.clone(),
            nonce: message.nonce.clone(),
            account_token,
        }
    }
}

/// Message sent back to the companion app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundMessage {
    Nonce(String),
}
