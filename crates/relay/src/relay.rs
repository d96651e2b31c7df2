use crate::message::{AppMessage, OutboundMessage, RelayMethod, SubmitBody};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not deliver message to companion: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub trait HttpTransport {
    fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, RelayError>;
}

/// Device identity API.
pub trait AccountTokenSource {
    fn account_token(&self) -> String;
}

/// Channel back to the companion app.
pub trait CompanionSink {
    fn send(&mut self, message: OutboundMessage) -> Result<(), RelayError>;
}

impl CompanionSink for Vec<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) -> Result<(), RelayError> {
        self.push(message);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Submitted { status: u16 },
    NonceForwarded,
    /// The nonce endpoint answered with something other than 200; nothing was sent back.
    NonceDropped { status: u16 },
    Posted { status: u16 },
}

pub struct Relay<H, A, C> {
    http: H,
    tokens: A,
    companion: C,
}

impl<H: HttpTransport, A: AccountTokenSource, C: CompanionSink> Relay<H, A, C> {
    pub fn new(http: H, tokens: A, companion: C) -> Self {
        Self {
            http,
            tokens,
            companion,
        }
    }

    pub fn companion(&self) -> &C {
        &self.companion
    }

    pub fn into_parts(self) -> (H, A, C) {
        (self.http, self.tokens, self.companion)
    }

    /// Forward one companion message.
    pub fn handle(&mut self, message: &AppMessage) -> Result<RelayOutcome, RelayError> {
        let method = message.method();
        tracing::debug!(url = %message.url, ?method, "relaying app message");

        let body = match method {
            RelayMethod::Submit => {
                serde_json::to_string(&SubmitBody::new(message, self.tokens.account_token()))?
            }
            RelayMethod::Nonce | RelayMethod::Other(_) => String::new(),
        };
        let response = self.http.post(&message.url, &body)?;

        let outcome = match method {
            RelayMethod::Submit => RelayOutcome::Submitted {
                status: response.status,
            },
            RelayMethod::Nonce if response.status == 200 => {
                self.companion.send(OutboundMessage::Nonce(response.body))?;
                RelayOutcome::NonceForwarded
            }
            RelayMethod::Nonce => {
                tracing::warn!(status = response.status, "nonce request not accepted");
                RelayOutcome::NonceDropped {
                    status: response.status,
                }
            }
            RelayMethod::Other(_) => RelayOutcome::Posted {
                status: response.status,
            },
        };
        tracing::info!(?outcome, "app message relayed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHttp {
        status: u16,
        body: String,
        sent: Vec<(String, String)>,
    }

    impl HttpTransport for FakeHttp {
        fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, RelayError> {
            self.sent.push((url.to_string(), body.to_string()));
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    struct DownHttp;

    impl HttpTransport for DownHttp {
        fn post(&mut self, url: &str, _body: &str) -> Result<HttpResponse, RelayError> {
            Err(RelayError::Http {
                url: url.to_string(),
                reason: "connection refused".into(),
            })
        }
    }

    struct Token;

    impl AccountTokenSource for Token {
        fn account_token(&self) -> String {
            "acct-123".into()
        }
    }

    fn ok(body: &str) -> FakeHttp {
        FakeHttp {
            status: 200,
            body: body.into(),
            sent: Vec::new(),
        }
    }

    fn msg(url: &str) -> AppMessage {
        AppMessage {
            url: url.into(),
            ..AppMessage::default()
        }
    }

    #[test]
    fn nonce_is_forwarded_on_200() {
        let mut relay = Relay::new(ok("n-42"), Token, Vec::new());
        let outcome = relay.handle(&msg("https://h/api/nonce")).unwrap();
        assert_eq!(outcome, RelayOutcome::NonceForwarded);

        let (http, _, companion) = relay.into_parts();
        assert_eq!(http.sent, vec![("https://h/api/nonce".to_string(), String::new())]);
        assert_eq!(companion, vec![OutboundMessage::Nonce("n-42".into())]);
    }

    #[test]
    fn nonce_failure_sends_nothing_back() {
        let http = FakeHttp {
            status: 503,
            ..FakeHttp::default()
        };
        let mut relay = Relay::new(http, Token, Vec::new());
        assert_eq!(
            relay.handle(&msg("https://h/nonce")).unwrap(),
            RelayOutcome::NonceDropped { status: 503 }
        );
        assert!(relay.companion().is_empty());
    }

    #[test]
    fn submit_carries_account_token() {
        let mut relay = Relay::new(ok(""), Token, Vec::new());
        let message = AppMessage {
            url: "https://h/api/submit".into(),
            name: Some("ari".into()),
            score: Some(9),
            mac: Some("m".into()),
            nonce: Some("n".into()),
        };
        assert_eq!(
            relay.handle(&message).unwrap(),
            RelayOutcome::Submitted { status: 200 }
        );

        let (http, _, companion) = relay.into_parts();
        let body: serde_json::Value = serde_json::from_str(&http.sent[0].1).unwrap();
        assert_eq!(body["account_token"], "acct-123");
        assert_eq!(body["score"], 9);
        assert_eq!(body["name"], "ari");
        assert!(companion.is_empty());
    }

    #[test]
    fn other_endpoints_post_empty_body() {
        let mut relay = Relay::new(ok("ignored"), Token, Vec::new());
        assert_eq!(
            relay.handle(&msg("https://h/ping")).unwrap(),
            RelayOutcome::Posted { status: 200 }
        );
        let (http, _, companion) = relay.into_parts();
        assert_eq!(http.sent[0].1, "");
        assert!(companion.is_empty());
    }

    #[test]
    fn transport_errors_propagate() {
        let mut relay = Relay::new(DownHttp, Token, Vec::new());
        let err = relay.handle(&msg("https://h/nonce")).unwrap_err();
        assert!(matches!(err, RelayError::Http { .. }));
    }
}
