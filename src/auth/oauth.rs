//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use super::credentials::Credentials;
use crate::flickr::ApiError;

type HmacSha1 = Hmac<Sha1>;

/// Ordered request parameters, repeated keys allowed.
pub type Params = Vec<(String, String)>;

const NONCE_LEN: usize = 32;

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Render parameters as a query string using the same encoding the signature
/// was computed with.
pub fn to_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs requests on behalf of one consumer (application key/secret).
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer: Credentials,
}

impl OAuthSigner {
    pub fn new(consumer: Credentials) -> Self {
        Self { consumer }
    }

    /// Return `params` extended with the protocol parameters and
    /// `oauth_signature`, ready to be sent as a query string.
    pub fn sign(
        &self,
        http_method: &str,
        url: &str,
        params: &[(String, String)],
        token: Option<&Credentials>,
    ) -> Result<Params, ApiError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp();
        self.sign_with(http_method, url, params, token, &nonce, timestamp)
    }

    fn sign_with(
        &self,
        http_method: &str,
        url: &str,
        params: &[(String, String)],
        token: Option<&Credentials>,
        nonce: &str,
        timestamp: i64,
    ) -> Result<Params, ApiError> {
        let mut signed: Params = params.to_vec();
        signed.push(("oauth_consumer_key".into(), self.consumer.token.clone()));
        signed.push(("oauth_nonce".into(), nonce.to_string()));
        signed.push(("oauth_signature_method".into(), "HMAC-SHA1".into()));
        signed.push(("oauth_timestamp".into(), timestamp.to_string()));
        if let Some(token) = token {
            signed.push(("oauth_token".into(), token.token.clone()));
        }
        signed.push(("oauth_version".into(), "1.0".into()));

        let base = base_string(http_method, url, &signed);
        let key = format!(
            "{}&{}",
            percent_encode(&self.consumer.secret),
            percent_encode(token.map(|t| t.secret.as_str()).unwrap_or(""))
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(base.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        signed.push(("oauth_signature".into(), signature));
        Ok(signed)
    }
}

/// `METHOD&encoded-url&encoded-params`, with parameters sorted by encoded
/// key, then encoded value.
fn base_string(http_method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        http_method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    fn value<'a>(params: &'a [(String, String)], key: &str) -> &'a str {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn test_percent_encode_unreserved_set() {
        assert_eq!(percent_encode("aZ09-._~"), "aZ09-._~");
        assert_eq!(percent_encode("a b+c/d=e&f!"), "a%20b%2Bc%2Fd%3De%26f%21");
    }

    #[test]
    fn test_base_string_sorts_encoded_params() {
        let base = base_string(
            "get",
            "https://api.flickr.com/services/rest",
            &[p("b", "2"), p("a", "x y"), p("a", "1")],
        );
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.flickr.com%2Fservices%2Frest&a%3D1%26a%3Dx%2520y%26b%3D2"
        );
    }

    // Worked example published with the HMAC-SHA1 signing guides.
    #[test]
    fn test_known_signature() {
        let signer = OAuthSigner::new(Credentials::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        ));
        let token = Credentials::new(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let signed = signer
            .sign_with(
                "POST",
                "https://api.twitter.com/1.1/statuses/update.json",
                &[
                    p("include_entities", "true"),
                    p("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ],
                Some(&token),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                1318622958,
            )
            .unwrap();
        assert_eq!(value(&signed, "oauth_signature"), "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_signature_matches_independent_hmac() {
        let signer = OAuthSigner::new(Credentials::new("key", "app secret"));
        let signed = signer
            .sign_with(
                "GET",
                "https://www.flickr.com/services/oauth/request_token",
                &[p("oauth_callback", "oob")],
                None,
                "abc",
                1_700_000_000,
            )
            .unwrap();

        let unsigned: Vec<_> = signed
            .iter()
            .filter(|(k, _)| k != "oauth_signature")
            .cloned()
            .collect();
        let base = base_string(
            "GET",
            "https://www.flickr.com/services/oauth/request_token",
            &unsigned,
        );
        // No token yet, so the key ends with a bare '&'.
        let mut mac = HmacSha1::new_from_slice(b"app%20secret&").unwrap();
        mac.update(base.as_bytes());
        let expected = BASE64.encode(mac.finalize().into_bytes());

        assert_eq!(value(&signed, "oauth_signature"), expected);
        assert_eq!(value(&signed, "oauth_callback"), "oob");
        assert!(!signed.iter().any(|(k, _)| k == "oauth_token"));
    }

    #[test]
    fn test_sign_uses_fresh_nonce() {
        let signer = OAuthSigner::new(Credentials::new("key", "secret"));
        let a = signer.sign("GET", "https://h/", &[], None).unwrap();
        let b = signer.sign("GET", "https://h/", &[], None).unwrap();
        assert_eq!(value(&a, "oauth_nonce").len(), NONCE_LEN);
        assert_ne!(value(&a, "oauth_nonce"), value(&b, "oauth_nonce"));
    }

    #[test]
    fn test_to_query_round_trips_through_url() {
        let q = to_query(&[p("text", "a b"), p("extras", "url_o,date_upload")]);
        assert_eq!(q, "text=a%20b&extras=url_o%2Cdate_upload");
        let parsed = url::Url::parse(&format!("https://h/?{q}")).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![p("text", "a b"), p("extras", "url_o,date_upload")]);
    }
}
