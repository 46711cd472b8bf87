use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::{ApiError, ApiResult};
use crate::spotify::{API_BASE, upstream_failure};

/// The closed set of playback actions the proxy understands. One action maps
/// to exactly one Spotify Web API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
  Play,
  Pause,
  Next,
  Previous,
  Volume,
  Current,
  Devices,
  Queue,
}

impl PlayerAction {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "play" => Some(Self::Play),
      "pause" => Some(Self::Pause),
      "next" => Some(Self::Next),
      "previous" => Some(Self::Previous),
      "volume" => Some(Self::Volume),
      "current" => Some(Self::Current),
      "devices" => Some(Self::Devices),
      "queue" => Some(Self::Queue),
      _ => None,
    }
  }
}

/// Payload envelope for the player endpoint; which fields matter depends on
/// the action.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerRequest {
  pub uris: Option<Vec<String>>,
  pub uri: Option<String>,
  pub position_ms: Option<u64>,
  pub volume: Option<u8>,
  pub device_id: Option<String>,
}

pub async fn execute(
  client: &Client,
  token: &str,
  action: PlayerAction,
  req: &PlayerRequest,
) -> ApiResult<Value> {
  let resp = match action {
    PlayerAction::Play => {
      let mut body = json!({});
      if let Some(uris) = &req.uris {
        body["uris"] = json!(uris);
      }
      if let Some(pos) = req.position_ms {
        body["position_ms"] = json!(pos);
      }
      let mut r = client
        .put(format!("{}/me/player/play", API_BASE))
        .bearer_auth(token)
        .json(&body);
      if let Some(device) = &req.device_id {
        r = r.query(&[("device_id", device)]);
      }
      r.send().await?
    }
    PlayerAction::Pause => {
      client
        .put(format!("{}/me/player/pause", API_BASE))
        .bearer_auth(token)
        .send()
        .await?
    }
    PlayerAction::Next => {
      client
        .post(format!("{}/me/player/next", API_BASE))
        .bearer_auth(token)
        .send()
        .await?
    }
    PlayerAction::Previous => {
      client
        .post(format!("{}/me/player/previous", API_BASE))
        .bearer_auth(token)
        .send()
        .await?
    }
    PlayerAction::Volume => {
      let volume = req.volume.ok_or(ApiError::MissingField("volume"))?;
      client
        .put(format!("{}/me/player/volume", API_BASE))
        .bearer_auth(token)
        .query(&[("volume_percent", volume.min(100).to_string())])
        .send()
        .await?
    }
    PlayerAction::Current => {
      client
        .get(format!("{}/me/player/currently-playing", API_BASE))
        .bearer_auth(token)
        .send()
        .await?
    }
    PlayerAction::Devices => {
      client
        .get(format!("{}/me/player/devices", API_BASE))
        .bearer_auth(token)
        .send()
        .await?
    }
    PlayerAction::Queue => {
      let uri = req
        .uri
        .as_deref()
        .ok_or(ApiError::MissingField("uri"))?;
      client
        .post(format!("{}/me/player/queue", API_BASE))
        .bearer_auth(token)
        .query(&[("uri", uri)])
        .send()
        .await?
    }
  };

  let status = resp.status();
  if !status.is_success() {
    return Err(upstream_failure(resp).await);
  }

  match action {
    PlayerAction::Current => {
      // 204 means nothing is playing
      if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(json!({ "success": true, "isPlaying": false }));
      }
      let body: Value = resp.json().await?;
      Ok(current_projection(&body))
    }
    PlayerAction::Devices => {
      let body: Value = resp.json().await?;
      Ok(devices_projection(&body))
    }
    // every mutation normalizes "no content" to plain success
    _ => Ok(json!({ "success": true })),
  }
}

/// The historical flat shape: track fields hoisted to the top level next to
/// the playback flags, unlike the session-shaped responses elsewhere.
fn current_projection(body: &Value) -> Value {
  let item = &body["item"];
  let artists = item["artists"]
    .as_array()
    .map(|a| {
      a.iter()
        .filter_map(|artist| artist["name"].as_str())
        .collect::<Vec<_>>()
        .join(", ")
    })
    .unwrap_or_default();
  json!({
    "success": true,
    "isPlaying": body["is_playing"].as_bool().unwrap_or(false),
    "progressMs": body["progress_ms"].as_u64().unwrap_or(0),
    "id": item["id"],
    "name": item["name"],
    "artists": artists,
    "album": item["album"]["name"],
    "albumArt": item["album"]["images"][0]["url"],
    "duration": item["duration_ms"].as_u64().unwrap_or(0),
    "uri": item["uri"],
  })
}

fn devices_projection(body: &Value) -> Value {
  let devices: Vec<Value> = body["devices"]
    .as_array()
    .map(|list| {
      list
        .iter()
        .map(|d| {
          json!({
            "id": d["id"],
            "name": d["name"],
            "type": d["type"],
            "isActive": d["is_active"].as_bool().unwrap_or(false),
            "volumePercent": d["volume_percent"],
          })
        })
        .collect()
    })
    .unwrap_or_default();
  json!({ "success": true, "devices": devices })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_the_full_action_set() {
    for name in ["play", "pause", "next", "previous", "volume", "current", "devices", "queue"] {
      assert!(PlayerAction::parse(name).is_some(), "{}", name);
    }
    assert!(PlayerAction::parse("rewind").is_none());
  }

  #[test]
  fn current_projection_flattens_track_fields() {
    let body = json!({
      "is_playing": true,
      "progress_ms": 42_000,
      "item": {
        "id": "t1",
        "name": "Song",
        "uri": "spotify:track:t1",
        "duration_ms": 200_000,
        "artists": [{"name": "A"}, {"name": "B"}],
        "album": {"name": "Album", "images": [{"url": "https://img/1"}]}
      }
    });
    let out = current_projection(&body);
    assert_eq!(out["success"], true);
    assert_eq!(out["isPlaying"], true);
    assert_eq!(out["progressMs"], 42_000);
    assert_eq!(out["id"], "t1");
    assert_eq!(out["artists"], "A, B");
    assert_eq!(out["albumArt"], "https://img/1");
  }

  #[test]
  fn devices_projection_maps_fields() {
    let body = json!({
      "devices": [
        {"id": "d1", "name": "Kitchen", "type": "Speaker", "is_active": true, "volume_percent": 60}
      ]
    });
    let out = devices_projection(&body);
    assert_eq!(out["devices"][0]["isActive"], true);
    assert_eq!(out["devices"][0]["volumePercent"], 60);
  }
}
