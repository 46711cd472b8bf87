use reqwest::Client;
use serde_json::Value;

use crate::common::ApiResult;
use crate::session::model::Track;
use crate::spotify::{API_BASE, upstream_failure};

const SEARCH_LIMIT: u32 = 20;

/// One call against the Spotify search endpoint, results reshaped into the
/// session track shape.
pub async fn search_tracks(client: &Client, token: &str, query: &str) -> ApiResult<Vec<Track>> {
  let resp = client
    .get(format!("{}/search", API_BASE))
    .bearer_auth(token)
    .query(&[
      ("q", query),
      ("type", "track"),
      ("limit", &SEARCH_LIMIT.to_string()),
    ])
    .send()
    .await?;

  if !resp.status().is_success() {
    return Err(upstream_failure(resp).await);
  }

  let body: Value = resp.json().await?;
  let tracks = body["tracks"]["items"]
    .as_array()
    .map(|items| items.iter().filter_map(track_from_item).collect())
    .unwrap_or_default();
  Ok(tracks)
}

fn track_from_item(item: &Value) -> Option<Track> {
  let artists = item["artists"]
    .as_array()?
    .iter()
    .filter_map(|a| a["name"].as_str())
    .collect::<Vec<_>>()
    .join(", ");
  Some(Track {
    id: item["id"].as_str()?.to_string(),
    name: item["name"].as_str()?.to_string(),
    artists,
    album: item["album"]["name"].as_str().unwrap_or_default().to_string(),
    album_art: item["album"]["images"][0]["url"].as_str().map(str::to_string),
    duration: item["duration_ms"].as_u64().unwrap_or(0),
    uri: item["uri"].as_str()?.to_string(),
    preview_url: item["preview_url"].as_str().map(str::to_string),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn reshapes_search_item() {
    let item = json!({
      "id": "t1",
      "name": "Song",
      "uri": "spotify:track:t1",
      "duration_ms": 215_000,
      "preview_url": "https://p/t1",
      "artists": [{"name": "A"}, {"name": "B"}],
      "album": {"name": "Album", "images": [{"url": "https://img/640"}, {"url": "https://img/300"}]}
    });
    let track = track_from_item(&item).unwrap();
    assert_eq!(track.id, "t1");
    assert_eq!(track.artists, "A, B");
    assert_eq!(track.album, "Album");
    assert_eq!(track.album_art.as_deref(), Some("https://img/640"));
    assert_eq!(track.duration, 215_000);
    assert_eq!(track.preview_url.as_deref(), Some("https://p/t1"));
  }

  #[test]
  fn item_without_id_is_skipped() {
    let item = json!({"name": "Song", "uri": "spotify:track:t1", "artists": []});
    assert!(track_from_item(&item).is_none());
  }
}
