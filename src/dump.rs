//! JSON dump of everything fetched during a run.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::download::LibrarySnapshot;
use crate::flickr::User;

#[derive(Serialize)]
struct MetadataDump<'a> {
    user: &'a User,
    #[serde(flatten)]
    library: &'a LibrarySnapshot,
}

/// Write `{user, collections, not_in_any_collection}` as one pretty-printed
/// JSON document, replacing any previous dump.
pub async fn write_metadata_dump(path: &Path, user: &User, library: &LibrarySnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(&MetadataDump { user, library })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write metadata dump to {}", path.display()))?;
    tracing::info!("Wrote metadata dump to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::CollectionSnapshot;
    use serde_json::{json, Value};

    fn user() -> User {
        serde_json::from_value(json!({"id": "1@N00", "username": "jdoe"})).unwrap()
    }

    #[tokio::test]
    async fn test_dump_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta/dump.json");
        let library = LibrarySnapshot {
            collections: vec![
                CollectionSnapshot {
                    collection: serde_json::from_value(
                        json!({"id": "10", "title": {"_content": "Trip"}, "photos": "2"}),
                    )
                    .unwrap(),
                    items: Some(vec![serde_json::from_value(json!({
                        "id": "101", "secret": "s", "server": "1", "farm": 1,
                        "dateupload": "1291000000"
                    }))
                    .unwrap()]),
                },
                CollectionSnapshot {
                    collection: serde_json::from_value(json!({"id": "20"})).unwrap(),
                    items: None,
                },
            ],
            not_in_any_collection: None,
        };

        write_metadata_dump(&path, &user(), &library).await.unwrap();
        let dumped: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(dumped["user"]["id"], "1@N00");
        assert_eq!(dumped["collections"][0]["collection"]["title"], "Trip");
        assert_eq!(dumped["collections"][0]["collection"]["photos"], 2);
        assert_eq!(dumped["collections"][0]["items"][0]["id"], "101");
        assert_eq!(dumped["collections"][0]["items"][0]["dateupload"], 1291000000);
        assert!(dumped["collections"][1]["items"].is_null());
        assert!(dumped["not_in_any_collection"].is_null());
    }

    #[tokio::test]
    async fn test_dump_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, "stale content that is longer than the new dump will be, surely").unwrap();

        write_metadata_dump(&path, &user(), &LibrarySnapshot::default())
            .await
            .unwrap();
        let dumped: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(dumped["collections"], json!([]));
    }
}
