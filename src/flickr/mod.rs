//! Flickr REST layer: the call capability, response types and the shared
//! paginated fetch loop used for every listing method.

pub mod error;
pub mod fetch;
pub mod session;
pub mod types;

pub use error::{ApiError, ResolveError};
pub use fetch::{
    fetch_collection_list, fetch_items_in_collection, fetch_items_not_in_any_collection,
};
pub use session::{Args, Session};
pub use types::{Photo, Photoset, SizeVariant, User};

/// Resolve the account behind `session` via `flickr.test.login`.
///
/// Also serves as the session probe: an invalid token fails here.
pub async fn test_login(session: &dyn Session) -> Result<User, ApiError> {
    let mut body = session.call("flickr.test.login", &Args::new()).await?;
    let user = body
        .get_mut("user")
        .map(serde_json::Value::take)
        .ok_or_else(|| ApiError::Decode {
            method: "flickr.test.login".to_string(),
            reason: "missing 'user' object".to_string(),
        })?;
    Ok(serde_json::from_value(user)?)
}
