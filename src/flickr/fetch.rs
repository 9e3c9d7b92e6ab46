//! Paginated listing calls.
//!
//! Every listing Flickr offers has the same envelope: a container object
//! holding `page`, `pages` and an array of records. The fetch loop below is
//! shared by all of them and is parameterized only by a [`Listing`] and a set
//! of fixed arguments.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;
use super::session::{args, Args, Session};
use super::types::{Photo, Photoset};

/// Largest page size the API accepts.
pub const PAGE_SIZE: u32 = 500;

/// Extras requested on photo listings so items carry their original URL and
/// timestamps without a per-photo follow-up call.
const PHOTO_EXTRAS: &str = "url_o,original_format,date_upload,date_taken";

/// Where a listing method puts its pagination envelope and its records.
#[derive(Debug, Clone, Copy)]
pub struct Listing {
    pub method: &'static str,
    pub container: &'static str,
    pub item: &'static str,
}

pub const PHOTOSET_LIST: Listing = Listing {
    method: "flickr.photosets.getList",
    container: "photosets",
    item: "photoset",
};

pub const PHOTOSET_PHOTOS: Listing = Listing {
    method: "flickr.photosets.getPhotos",
    container: "photoset",
    item: "photo",
};

pub const NOT_IN_SET: Listing = Listing {
    method: "flickr.photos.getNotInSet",
    container: "photos",
    item: "photo",
};

/// One decoded response: its records plus the API's total page count.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pages: u32,
}

fn decode_error(listing: &Listing, reason: impl Into<String>) -> ApiError {
    ApiError::Decode {
        method: listing.method.to_string(),
        reason: reason.into(),
    }
}

/// Pull the records and `pages` count out of a listing response.
pub fn decode_page<T: DeserializeOwned>(listing: &Listing, mut body: Value) -> Result<Page<T>, ApiError> {
    let container = body
        .get_mut(listing.container)
        .ok_or_else(|| decode_error(listing, format!("missing '{}' object", listing.container)))?;

    let pages = match &container["pages"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| decode_error(listing, "missing or invalid 'pages'"))?;
    let pages = u32::try_from(pages).map_err(|_| decode_error(listing, "'pages' out of range"))?;

    let items = match container.get_mut(listing.item).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(records) => serde_json::from_value(records)?,
    };

    Ok(Page { items, pages })
}

/// Fetch every page of a listing, in order, and concatenate the records.
///
/// Page 1 is always requested; the `pages` value of each response is the
/// authoritative last page. Pages are requested one after another, never in
/// parallel. A failure on any page discards everything fetched so far.
pub async fn paginate<T: DeserializeOwned>(
    session: &dyn Session,
    listing: &Listing,
    fixed_args: Args,
) -> Result<Vec<T>, ApiError> {
    let mut call_args = fixed_args;
    call_args.insert("per_page".to_string(), vec![PAGE_SIZE.to_string()]);

    let mut items: Vec<T> = Vec::new();
    let mut last_page: u32 = 1;
    let mut page: u32 = 1;

    while page <= last_page {
        call_args.insert("page".to_string(), vec![page.to_string()]);

        let wrap = |source: ApiError| ApiError::Page {
            method: listing.method.to_string(),
            page,
            source: Box::new(source),
        };
        let body = session.call(listing.method, &call_args).await.map_err(wrap)?;
        let batch: Page<T> = decode_page(listing, body).map_err(wrap)?;

        debug!(
            method = listing.method,
            page,
            pages = batch.pages,
            count = batch.items.len(),
            "Fetched listing page"
        );

        items.extend(batch.items);
        last_page = batch.pages;
        page += 1;
    }

    Ok(items)
}

/// All photosets owned by the session's user.
pub async fn fetch_collection_list(session: &dyn Session) -> Result<Vec<Photoset>, ApiError> {
    paginate(session, &PHOTOSET_LIST, Args::new()).await
}

/// All photos in one photoset, tagged with the photoset id.
pub async fn fetch_items_in_collection(
    session: &dyn Session,
    photoset_id: &str,
) -> Result<Vec<Photo>, ApiError> {
    let fixed = args([
        ("photoset_id", photoset_id.to_string()),
        ("extras", PHOTO_EXTRAS.to_string()),
    ]);
    let mut photos: Vec<Photo> = paginate(session, &PHOTOSET_PHOTOS, fixed).await?;
    for photo in &mut photos {
        photo.photoset_id = Some(photoset_id.to_string());
    }
    Ok(photos)
}

/// Photos that belong to no photoset.
pub async fn fetch_items_not_in_any_collection(session: &dyn Session) -> Result<Vec<Photo>, ApiError> {
    let fixed = args([("extras", PHOTO_EXTRAS.to_string())]);
    paginate(session, &NOT_IN_SET, fixed).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&str, &Args) -> Result<Value, ApiError> + Send + Sync>;

    /// Scripted session that records every call it receives.
    pub(crate) struct FakeSession {
        responder: Responder,
        pub(crate) calls: Mutex<Vec<(String, Args)>>,
    }

    impl FakeSession {
        pub(crate) fn new(
            responder: impl Fn(&str, &Args) -> Result<Value, ApiError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub(crate) fn pages_requested(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, a)| a["page"][0].clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl Session for FakeSession {
        async fn call(&self, method: &str, args: &Args) -> Result<Value, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), args.clone()));
            (self.responder)(method, args)
        }
    }

    pub(crate) fn page_number(args: &Args) -> usize {
        args["page"][0].parse().unwrap()
    }

    /// Build a photo listing response for page `page` of `sizes.len()` pages,
    /// numbering photo ids consecutively across pages.
    pub(crate) fn photo_page(container: &str, sizes: &[usize], page: usize) -> Value {
        let start: usize = sizes[..page - 1].iter().sum();
        let photos: Vec<Value> = (start..start + sizes[page - 1])
            .map(|i| json!({"id": i.to_string(), "secret": "s", "server": "1", "farm": 1}))
            .collect();
        json!({
            container: {"page": page, "pages": sizes.len(), "perpage": 500, "photo": photos},
            "stat": "ok"
        })
    }

    #[tokio::test]
    async fn test_paginate_concatenates_all_pages_in_order() {
        let sizes = [500, 500, 17];
        let session = FakeSession::new(move |_, a| Ok(photo_page("photos", &sizes, page_number(a))));

        let photos = fetch_items_not_in_any_collection(&session).await.unwrap();

        assert_eq!(photos.len(), 1017);
        let ids: Vec<usize> = photos.iter().map(|p| p.id.parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] + 1 == w[1]));
        assert_eq!(session.call_count(), 3);
        assert_eq!(session.pages_requested(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_paginate_sends_page_size_and_extras() {
        let session = FakeSession::new(|_, a| Ok(photo_page("photoset", &[2], page_number(a))));
        fetch_items_in_collection(&session, "72157").await.unwrap();

        let calls = session.calls.lock().unwrap();
        let (method, a) = &calls[0];
        assert_eq!(method, "flickr.photosets.getPhotos");
        assert_eq!(a["per_page"], vec!["500".to_string()]);
        assert_eq!(a["photoset_id"], vec!["72157".to_string()]);
        assert!(a["extras"][0].contains("url_o"));
        assert!(a["extras"][0].contains("date_upload"));
    }

    #[tokio::test]
    async fn test_items_in_collection_carry_photoset_id() {
        let session = FakeSession::new(|_, a| Ok(photo_page("photoset", &[3], page_number(a))));
        let photos = fetch_items_in_collection(&session, "99").await.unwrap();
        assert_eq!(photos.len(), 3);
        assert!(photos.iter().all(|p| p.photoset_id.as_deref() == Some("99")));
    }

    #[tokio::test]
    async fn test_empty_listing_fetches_single_page() {
        let session = FakeSession::new(|_, _| {
            Ok(json!({"photos": {"page": 1, "pages": 0, "perpage": 500, "total": 0, "photo": []}, "stat": "ok"}))
        });
        let photos = fetch_items_not_in_any_collection(&session).await.unwrap();
        assert!(photos.is_empty());
        assert_eq!(session.call_count(), 1);
    }

    #[tokio::test]
    async fn test_pages_as_string_is_accepted() {
        let session = FakeSession::new(|_, a| {
            let page = page_number(a);
            Ok(json!({"photos": {"page": page.to_string(), "pages": "2",
                "photo": [{"id": format!("p{page}")}]}, "stat": "ok"}))
        });
        let photos = fetch_items_not_in_any_collection(&session).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(session.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_on_later_page_discards_partial_result() {
        let sizes = [500, 500, 500];
        let session = FakeSession::new(move |m, a| {
            let page = page_number(a);
            if page == 2 {
                Err(ApiError::Remote {
                    method: m.to_string(),
                    code: 0,
                    message: "Sorry, the Flickr API service is not currently available.".into(),
                })
            } else {
                Ok(photo_page("photos", &sizes, page))
            }
        });

        let err = fetch_items_not_in_any_collection(&session).await.unwrap_err();
        match err {
            ApiError::Page { page, method, .. } => {
                assert_eq!(page, 2);
                assert_eq!(method, "flickr.photos.getNotInSet");
            }
            other => panic!("unexpected: {other:?}"),
        }
        // Page 3 is never requested once page 2 fails.
        assert_eq!(session.call_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_page_is_page_error() {
        let session = FakeSession::new(|_, _| Ok(json!({"stat": "ok", "unexpected": {}})));
        let err = fetch_collection_list(&session).await.unwrap_err();
        match err {
            ApiError::Page { source, .. } => assert!(matches!(*source, ApiError::Decode { .. })),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_collection_list_decodes_photosets() {
        let session = FakeSession::new(|_, _| {
            Ok(json!({"photosets": {"page": 1, "pages": 1, "perpage": 500, "total": 2, "photoset": [
                {"id": "1", "photos": 3, "videos": 0, "title": {"_content": "Vacation"},
                 "description": {"_content": ""}, "date_create": "1", "date_update": "2"},
                {"id": "2", "photos": "0", "videos": "1", "title": {"_content": "Clips"},
                 "description": {"_content": "videos"}}
            ]}, "stat": "ok"}))
        });
        let sets = fetch_collection_list(&session).await.unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].title, "Vacation");
        assert_eq!(sets[1].videos, 1);
        assert_eq!(session.calls.lock().unwrap()[0].0, "flickr.photosets.getList");
    }
}
