//! Token exchange against the auth endpoint.
//!
//! The request body is a small XML document carrying the account details; the
//! response is an XML document whose root element's first child holds the token.
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::params::Credentials;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth endpoint rejected credentials ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed token response: {0}")]
    MalformedResponse(#[from] quick_xml::Error),
    #[error("token response has no token element")]
    MissingToken,
    #[error("token response ended before the document was closed")]
    Truncated,
}

/// Short-lived credential for data requests. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Token(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

/// Render the XML body posted to the auth endpoint.
pub fn build_token_request(credentials: &Credentials) -> String {
    format!(
        "<token><username>{}</username><password>{}</password>\
         <client_id>{}</client_id><user_ip_address>{}</user_ip_address></token>",
        escape(credentials.username.as_str()),
        escape(credentials.password.as_str()),
        escape(credentials.client_id.as_str()),
        escape(credentials.user_ip_address.as_str()),
    )
}

/// Extract the token from an auth response: the text of the root's first child element.
///
/// The whole document is read, so trailing garbage or a missing root close fails.
pub fn parse_token(body: &str) -> Result<Token, AuthError> {
    let mut reader = Reader::from_reader(body.as_bytes());
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut first_child_seen = false;
    let mut capturing = false;
    let mut token = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => {
                depth += 1;
                if depth == 2 && !first_child_seen {
                    first_child_seen = true;
                    capturing = true;
                }
            }
            Event::Empty(_) if depth == 1 => first_child_seen = true,
            Event::Text(e) if capturing && depth == 2 => {
                token.push_str(&e.unescape()?);
            }
            Event::CData(e) if capturing && depth == 2 => {
                token.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(_) => {
                if depth == 2 {
                    capturing = false;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth != 0 {
        return Err(AuthError::Truncated);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(Token::new(token))
}

/// POST the credentials to `auth_url` and parse the returned token.
pub fn request_token(
    client: &Client,
    auth_url: &str,
    credentials: &Credentials,
) -> Result<Token, AuthError> {
    info!("Requesting token from {}", auth_url);
    debug!("Authenticating as {}", credentials.username);

    let response = client
        .post(auth_url)
        .header(CONTENT_TYPE, "application/xml")
        .body(build_token_request(credentials))
        .send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let token = parse_token(&body)?;
    info!("Token acquired");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::testing::{client, http_response, serve_once};
    use std::net::TcpListener;

    fn credentials() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: "p<&>ss".to_string(),
            client_id: "smapstack".to_string(),
            user_ip_address: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn request_body_escapes_values() {
        let body = build_token_request(&credentials());
        assert!(body.starts_with("<token><username>alice</username>"));
        assert!(body.contains("<password>p&lt;&amp;&gt;ss</password>"));
        assert!(body.contains("<user_ip_address>10.0.0.1</user_ip_address>"));
    }

    #[test]
    fn token_is_first_child_text() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
            <token><id>75E5CEBE-6BBB-2FB5-A613-0368A361D0B6</id><username>alice</username></token>"#;
        let token = parse_token(body).unwrap();
        assert_eq!(token.as_str(), "75E5CEBE-6BBB-2FB5-A613-0368A361D0B6");
    }

    #[test]
    fn token_ignores_surrounding_whitespace() {
        let compact = parse_token("<token><id>ABC-123</id></token>").unwrap();
        let padded = parse_token("<token>\n  <id>\n\t ABC-123 \n  </id>\n</token>\n").unwrap();
        assert_eq!(compact, padded);
    }

    #[test]
    fn missing_or_empty_token_is_rejected() {
        assert!(matches!(
            parse_token("<token></token>"),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            parse_token("<token><id/></token>"),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            parse_token("<token><id>   </id></token>"),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn malformed_xml_is_rejected() {
        assert!(parse_token("<token><id>abc</wrong></token>").is_err());
        assert!(matches!(
            parse_token("<token><id>abc</id><x></y></token>"),
            Err(AuthError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_token("<token><id>abc</id>"),
            Err(AuthError::Truncated | AuthError::MalformedResponse(_))
        ));
    }

    #[test]
    fn later_children_do_not_replace_token() {
        let token = parse_token("<token><id>abc</id><username>alice</username></token>").unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn token_request_posts_and_parses() {
        let (url, server) = serve_once(http_response(
            "200 OK",
            &["Content-Type: application/xml"],
            b"<token><id>T-1</id></token>",
        ));
        let token = request_token(&client(), url.as_str(), &credentials()).unwrap();
        server.join().unwrap();
        assert_eq!(token.as_str(), "T-1");
    }

    #[test]
    fn rejected_credentials_keep_body() {
        let (url, server) = serve_once(http_response(
            "401 Unauthorized",
            &[],
            b"<errors><error>Invalid username or password</error></errors>",
        ));
        let err = request_token(&client(), url.as_str(), &credentials()).unwrap_err();
        server.join().unwrap();
        match err {
            AuthError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "<errors><error>Invalid username or password</error></errors>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_response_is_malformed() {
        let (url, server) = serve_once(http_response("200 OK", &[], b"<token><id>x</id></nope>"));
        let err = request_token(&client(), url.as_str(), &credentials()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, AuthError::MalformedResponse(_)));
    }

    #[test]
    fn unreachable_endpoint_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = request_token(&client(), &format!("http://{}/tokens", addr), &credentials())
            .unwrap_err();
        assert!(matches!(err, AuthError::Http(_)));
    }

    #[test]
    fn debug_hides_token_value() {
        let token = Token::new("SECRET");
        assert!(!format!("{:?}", token).contains("SECRET"));
    }
}
