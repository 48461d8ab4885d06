//! Album service wire types
//!
//! The service speaks the GData JSON convention where element text lands
//! under a `$t` key. Only the fields the daemon reads are modeled; extra
//! fields in responses are ignored.

use serde::{Deserialize, Deserializer};

/// Deserialize a `$t` value that might arrive as a string or a bare number.
/// Ids are usually strings (e.g. "5109414847239937297") but some feed
/// revisions emit them numerically.
fn deserialize_flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct FlexibleStringVisitor;

    impl<'de> de::Visitor<'de> for FlexibleStringVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(FlexibleStringVisitor)
}

/// A GData JSON text node: `{"$t": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct TextNode {
    #[serde(rename = "$t", deserialize_with = "deserialize_flexible_string")]
    pub value: String,
}

/// Response from the create-photo call (`?alt=json`)
#[derive(Debug, Deserialize)]
pub struct PhotoEntryResponse {
    pub entry: PhotoEntry,
}

/// The created photo entry; only the id is needed, to address the
/// description patch that immediately follows.
#[derive(Debug, Deserialize)]
pub struct PhotoEntry {
    #[serde(rename = "gphoto$id")]
    pub id: TextNode,
    #[serde(default)]
    pub title: Option<TextNode>,
}

impl PhotoEntryResponse {
    /// Identifier of the newly created photo
    pub fn photo_id(&self) -> &str {
        &self.entry.id.value
    }
}

/// The account's album feed (`?alt=json`), used when connecting albums
#[derive(Debug, Deserialize)]
pub struct AlbumFeedResponse {
    pub feed: AlbumFeed,
}

#[derive(Debug, Deserialize)]
pub struct AlbumFeed {
    /// Absent entirely when the account has no albums
    #[serde(default)]
    pub entry: Vec<AlbumFeedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumFeedEntry {
    #[serde(rename = "gphoto$id")]
    pub id: TextNode,
    pub title: TextNode,
}

/// Flattened album info handed to the connect dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub album_id: String,
    pub album_name: String,
}

impl AlbumFeedResponse {
    /// Albums as (id, name) pairs in feed order
    pub fn albums(&self) -> Vec<RemoteAlbum> {
        self.feed
            .entry
            .iter()
            .map(|e| RemoteAlbum {
                album_id: e.id.value.clone(),
                album_name: e.title.value.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_create_photo_response() {
        let json = r#"{
            "entry": {
                "gphoto$id": {"$t": "5109414847239937297"},
                "title": {"$t": "http://example.com/cat.png"}
            }
        }"#;
        let resp: PhotoEntryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.photo_id(), "5109414847239937297");
        assert_eq!(
            resp.entry.title.as_ref().unwrap().value,
            "http://example.com/cat.png"
        );
    }

    #[test]
    fn test_deserialize_numeric_photo_id() {
        let json = r#"{"entry": {"gphoto$id": {"$t": 5109414847239937297}}}"#;
        let resp: PhotoEntryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.photo_id(), "5109414847239937297");
    }

    #[test]
    fn test_deserialize_create_response_extra_fields_ignored() {
        // The service returns many fields the daemon never reads
        let json = r#"{
            "version": "1.0",
            "encoding": "UTF-8",
            "entry": {
                "id": {"$t": "https://picasaweb.google.com/data/entry/..."},
                "gphoto$id": {"$t": "42"},
                "gphoto$width": {"$t": "1024"},
                "gphoto$size": {"$t": "123456"},
                "media$group": {"media$title": {"$t": "cat.png"}}
            }
        }"#;
        let resp: PhotoEntryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.photo_id(), "42");
    }

    #[test]
    fn test_deserialize_album_feed() {
        let json = r#"{
            "feed": {
                "entry": [
                    {"gphoto$id": {"$t": "100"}, "title": {"$t": "Vacation"}},
                    {"gphoto$id": {"$t": "200"}, "title": {"$t": "Clipped"}}
                ]
            }
        }"#;
        let resp: AlbumFeedResponse = serde_json::from_str(json).unwrap();
        let albums = resp.albums();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].album_id, "100");
        assert_eq!(albums[0].album_name, "Vacation");
        assert_eq!(albums[1].album_id, "200");
        assert_eq!(albums[1].album_name, "Clipped");
    }

    #[test]
    fn test_deserialize_album_feed_without_entries() {
        // An account with no albums omits the entry list entirely
        let json = r#"{"feed": {"title": {"$t": "someone"}}}"#;
        let resp: AlbumFeedResponse = serde_json::from_str(json).unwrap();
        assert!(resp.albums().is_empty());
    }
}
