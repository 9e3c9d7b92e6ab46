//! Photoset and photo metadata as returned by the Flickr REST API.
//!
//! Flickr renders many numeric fields as strings in some methods and as
//! numbers in others, so the deserializers here accept either form.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use super::error::ResolveError;

/// Image size variants Flickr serves for every photo.
///
/// All but `Original` are addressed by a suffix letter on the static URL;
/// `Original` prefers the `url_o` extra returned by the listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeVariant {
    Square,
    LargeSquare,
    Thumbnail,
    Small,
    Small320,
    Medium,
    Medium640,
    Medium800,
    Large,
    Original,
}

impl SizeVariant {
    /// Suffix letter appended to the static URL, `None` for the default size.
    pub fn suffix(self) -> Option<char> {
        match self {
            SizeVariant::Square => Some('s'),
            SizeVariant::LargeSquare => Some('q'),
            SizeVariant::Thumbnail => Some('t'),
            SizeVariant::Small => Some('m'),
            SizeVariant::Small320 => Some('n'),
            SizeVariant::Medium => None,
            SizeVariant::Medium640 => Some('z'),
            SizeVariant::Medium800 => Some('c'),
            SizeVariant::Large => Some('b'),
            SizeVariant::Original => Some('o'),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeVariant::Square => "square",
            SizeVariant::LargeSquare => "large-square",
            SizeVariant::Thumbnail => "thumbnail",
            SizeVariant::Small => "small",
            SizeVariant::Small320 => "small-320",
            SizeVariant::Medium => "medium",
            SizeVariant::Medium640 => "medium-640",
            SizeVariant::Medium800 => "medium-800",
            SizeVariant::Large => "large",
            SizeVariant::Original => "original",
        }
    }
}

impl std::fmt::Display for SizeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A photoset (album) from `flickr.photosets.getList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photoset {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub primary: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub server: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub farm: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub photos: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub videos: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count_views: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count_comments: u64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub can_comment: bool,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub date_create: Option<i64>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub date_update: Option<i64>,
    #[serde(default, deserialize_with = "content_string")]
    pub title: String,
    #[serde(default, deserialize_with = "content_string")]
    pub description: String,
}

/// A single photo or video from one of the photo listing calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    /// Photoset this photo was listed under. Lookup only; filled in by the
    /// fetcher, never sent by the API.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub photoset_id: Option<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub server: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub farm: u64,
    #[serde(default, deserialize_with = "content_string")]
    pub title: String,
    #[serde(rename = "ispublic", default, deserialize_with = "lenient_bool")]
    pub is_public: bool,
    #[serde(rename = "url_o", default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(rename = "originalformat", default, skip_serializing_if = "Option::is_none")]
    pub original_format: Option<String>,
    #[serde(rename = "dateupload", default, deserialize_with = "lenient_opt_i64")]
    pub date_upload: Option<i64>,
    #[serde(rename = "datetaken", default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
}

impl Photo {
    /// Resolve the source URL for the requested size.
    ///
    /// `Original` uses the explicit `url_o` when the listing returned one and
    /// otherwise falls back to the default-size static URL. Every other size
    /// is built from farm/server/id/secret.
    pub fn source_url(&self, size: SizeVariant) -> Result<Url, ResolveError> {
        let raw = match size {
            SizeVariant::Original => match self.original_url.as_deref() {
                Some(u) if !u.is_empty() => u.to_string(),
                _ => self.static_url(None, size)?,
            },
            other => self.static_url(other.suffix(), size)?,
        };
        Url::parse(&raw).map_err(|source| ResolveError::InvalidUrl {
            id: self.id.clone(),
            url: raw,
            source,
        })
    }

    fn static_url(&self, suffix: Option<char>, size: SizeVariant) -> Result<String, ResolveError> {
        if self.farm == 0 || self.server.is_empty() || self.secret.is_empty() {
            return Err(ResolveError::MissingUrl {
                id: self.id.clone(),
                size: size.as_str(),
            });
        }
        let base = format!(
            "https://farm{}.staticflickr.com/{}/{}_{}",
            self.farm, self.server, self.id, self.secret
        );
        Ok(match suffix {
            Some(c) => format!("{base}_{c}.jpg"),
            None => format!("{base}.jpg"),
        })
    }
}

/// The account behind the session, from `flickr.test.login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "content_string")]
    pub username: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Lenient::deserialize(d)? {
        Lenient::Str(s) => s,
        Lenient::Int(n) => n.to_string(),
        Lenient::Float(f) => f.to_string(),
        Lenient::Bool(b) => b.to_string(),
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    use serde::de::Error;
    match Lenient::deserialize(d)? {
        Lenient::Str(s) if s.is_empty() => Ok(0),
        Lenient::Str(s) => s.parse().map_err(D::Error::custom),
        Lenient::Int(n) => u64::try_from(n).map_err(D::Error::custom),
        Lenient::Float(f) => Ok(f as u64),
        Lenient::Bool(b) => Ok(b as u64),
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Lenient::deserialize(d)? {
        Lenient::Str(s) => matches!(s.as_str(), "1" | "true"),
        Lenient::Int(n) => n != 0,
        Lenient::Float(f) => f != 0.0,
        Lenient::Bool(b) => b,
    })
}

fn lenient_opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    use serde::de::Error;
    match Option::<Lenient>::deserialize(d)? {
        None => Ok(None),
        Some(Lenient::Str(s)) if s.is_empty() => Ok(None),
        Some(Lenient::Str(s)) => s.parse().map(Some).map_err(D::Error::custom),
        Some(Lenient::Int(n)) => Ok(Some(n)),
        Some(Lenient::Float(f)) => Ok(Some(f as i64)),
        Some(Lenient::Bool(_)) => Err(D::Error::custom("expected a timestamp")),
    }
}

/// Flickr wraps free text as `{"_content": "..."}` in most methods but
/// returns a bare string for photo titles.
fn content_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Plain(String),
        Wrapped {
            #[serde(rename = "_content", default)]
            content: String,
        },
    }
    Ok(match Text::deserialize(d)? {
        Text::Plain(s) => s,
        Text::Wrapped { content } => content,
    })
}
