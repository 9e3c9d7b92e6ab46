/// URL endpoints for the Flickr REST API and its OAuth 1.0a services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub rest: String,
    pub request_token: String,
    pub authorize: String,
    pub access_token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_roots("https://api.flickr.com", "https://www.flickr.com")
    }
}

impl Endpoints {
    /// Endpoints under alternate API and web roots (used to point tests at a
    /// local server).
    pub fn with_roots(api_root: &str, web_root: &str) -> Self {
        let api_root = api_root.trim_end_matches('/');
        let web_root = web_root.trim_end_matches('/');
        Self {
            rest: format!("{api_root}/services/rest"),
            request_token: format!("{web_root}/services/oauth/request_token"),
            authorize: format!("{web_root}/services/oauth/authorize"),
            access_token: format!("{web_root}/services/oauth/access_token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let e = Endpoints::default();
        assert_eq!(e.rest, "https://api.flickr.com/services/rest");
        assert_eq!(
            e.request_token,
            "https://www.flickr.com/services/oauth/request_token"
        );
        assert_eq!(e.authorize, "https://www.flickr.com/services/oauth/authorize");
        assert_eq!(
            e.access_token,
            "https://www.flickr.com/services/oauth/access_token"
        );
    }

    #[test]
    fn test_roots_trailing_slash() {
        let e = Endpoints::with_roots("http://127.0.0.1:9/", "http://127.0.0.1:9");
        assert_eq!(e.rest, "http://127.0.0.1:9/services/rest");
        assert_eq!(e.authorize, "http://127.0.0.1:9/services/oauth/authorize");
    }
}
