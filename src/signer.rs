use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::credentials::Credentials;

/// Signature method announced to the server. The secrets are sent as-is,
/// so the endpoint must be reached over TLS.
pub const SIGNATURE_METHOD: &str = "PLAINTEXT";

/// OAuth protocol version announced to the server
pub const OAUTH_VERSION: &str = "1.0";

/// Headers attached to a signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// Value of the `Authorization` header
    pub authorization: String,
}

impl AuthHeaders {
    /// All headers to send, in a stable order.
    ///
    /// `Expect` is sent empty so multipart uploads never wait on a
    /// `100 Continue` from the server.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Authorization".to_string(), self.authorization.clone()),
            ("Expect".to_string(), String::new()),
        ]
    }
}

/// Percent-encode a value using RFC 3986 rules: only `A-Z a-z 0-9 - _ . ~`
/// are left untouched and a space becomes `%20`.
pub fn percent_encode(value: &str) -> String {
    // form encoding differs from RFC 3986 on exactly three characters
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// Build the PLAINTEXT signing key: both secrets, encoded, joined by `&`.
pub fn signing_key(credentials: &Credentials) -> String {
    format!(
        "{}&{}",
        percent_encode(credentials.consumer_secret()),
        percent_encode(credentials.user_secret())
    )
}

/// Generate a single-use nonce derived from the timestamp and a random salt
pub fn generate_nonce(timestamp: i64) -> String {
    let salt: i64 = rand::thread_rng().gen_range(0..=1000);
    let digest = Sha256::digest((timestamp + salt).to_string().as_bytes());
    format!("{:x}", digest)
}

/// Sign a call with the current time and a fresh nonce
pub fn build_auth_header(credentials: &Credentials) -> AuthHeaders {
    let timestamp = Utc::now().timestamp();
    let nonce = generate_nonce(timestamp);
    build_auth_header_at(credentials, timestamp, &nonce)
}

/// Sign a call with an explicit timestamp and nonce
///
/// # Arguments
/// * `credentials` - Long-lived tokens and secrets
/// * `timestamp` - Unix time in seconds
/// * `nonce` - Single-use value for this call
pub fn build_auth_header_at(credentials: &Credentials, timestamp: i64, nonce: &str) -> AuthHeaders {
    let params: [(&str, String); 7] = [
        ("oauth_consumer_key", credentials.consumer_token.clone()),
        ("oauth_token", credentials.user_token.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
        ("oauth_version", OAUTH_VERSION.to_string()),
        ("oauth_signature", signing_key(credentials)),
    ];

    let values: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, percent_encode(value)))
        .collect();

    AuthHeaders {
        authorization: format!("OAuth {}", values.join(", ")),
    }
}
