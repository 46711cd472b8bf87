use serde::{Deserialize, Serialize};

use crate::common::now_ms;

/// History keeps at most this many played tracks, oldest evicted first.
pub const HISTORY_CAP: usize = 50;
/// Reactions keep at most this many entries, oldest evicted first.
pub const REACTION_CAP: usize = 20;
/// A reaction disappears this long after it was posted.
pub const REACTION_TTL_MS: u64 = 5_000;
/// Sessions live for 24 hours from creation.
pub const SESSION_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
  pub id: String,
  pub name: String,
  /// Artist names pre-joined into one display string.
  pub artists: String,
  #[serde(default)]
  pub album: String,
  #[serde(default)]
  pub album_art: Option<String>,
  /// Duration in milliseconds.
  #[serde(default)]
  pub duration: u64,
  pub uri: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preview_url: Option<String>,
}

/// A track waiting in the queue, with its voting state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
  #[serde(flatten)]
  pub track: Track,
  pub added_by: String,
  pub added_by_id: String,
  pub added_at: u64,
  pub votes: u32,
  /// Opaque voter identifiers; the caller decides what identifies a voter.
  pub voted_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
  pub id: String,
  pub name: String,
  /// Bearer credential for playback fan-out, present only for guests who
  /// joined with a linked account. Never leaves the server via views.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
  pub joined_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedTrack {
  #[serde(flatten)]
  pub track: Track,
  pub played_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
  pub emoji: String,
  pub user: String,
  pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
  #[serde(flatten)]
  pub track: Track,
  pub requested_by: String,
  pub requested_by_id: String,
  pub requested_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  pub allow_voting: bool,
  pub allow_guest_remove: bool,
  pub auto_play: bool,
  pub sync_playback: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      allow_voting: true,
      allow_guest_remove: false,
      auto_play: true,
      sync_playback: false,
    }
  }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
  pub allow_voting: Option<bool>,
  pub allow_guest_remove: Option<bool>,
  pub auto_play: Option<bool>,
  pub sync_playback: Option<bool>,
}

impl Settings {
  pub fn apply(&mut self, patch: &SettingsPatch) {
    if let Some(v) = patch.allow_voting {
      self.allow_voting = v;
    }
    if let Some(v) = patch.allow_guest_remove {
      self.allow_guest_remove = v;
    }
    if let Some(v) = patch.auto_play {
      self.auto_play = v;
    }
    if let Some(v) = patch.sync_playback {
      self.sync_playback = v;
    }
  }
}

/// The full session record as persisted in the store. Contains bearer
/// credentials; API responses go through [`SessionView`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub code: String,
  pub host_id: String,
  pub host_name: String,
  pub host_token: String,
  pub queue: Vec<QueueItem>,
  pub guests: Vec<Guest>,
  pub history: Vec<PlayedTrack>,
  pub reactions: Vec<Reaction>,
  pub play_requests: Vec<PlayRequest>,
  pub current_track: Option<Track>,
  pub is_playing: bool,
  pub created_at: u64,
  pub last_activity: u64,
  pub settings: Settings,
}

impl Session {
  pub fn new(code: String, host_id: String, host_name: String, host_token: String) -> Self {
    let now = now_ms();
    Self {
      code,
      host_id,
      host_name,
      host_token,
      queue: Vec::new(),
      guests: Vec::new(),
      history: Vec::new(),
      reactions: Vec::new(),
      play_requests: Vec::new(),
      current_track: None,
      is_playing: false,
      created_at: now,
      last_activity: now,
      settings: Settings::default(),
    }
  }

  pub fn view(&self) -> SessionView {
    SessionView {
      code: self.code.clone(),
      host_id: self.host_id.clone(),
      host_name: self.host_name.clone(),
      queue: self.queue.clone(),
      guests: self.guests.iter().map(GuestView::from).collect(),
      history: self.history.clone(),
      reactions: self.reactions.clone(),
      play_requests: self.play_requests.clone(),
      current_track: self.current_track.clone(),
      is_playing: self.is_playing,
      created_at: self.created_at,
      last_activity: self.last_activity,
      settings: self.settings.clone(),
    }
  }
}

/// Guest as exposed to clients: the token never leaves the server, only the
/// fact that one is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestView {
  pub id: String,
  pub name: String,
  pub has_token: bool,
  pub joined_at: u64,
}

impl From<&Guest> for GuestView {
  fn from(guest: &Guest) -> Self {
    Self {
      id: guest.id.clone(),
      name: guest.name.clone(),
      has_token: guest.token.is_some(),
      joined_at: guest.joined_at,
    }
  }
}

/// Trimmed projection returned by the session API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  pub code: String,
  pub host_id: String,
  pub host_name: String,
  pub queue: Vec<QueueItem>,
  pub guests: Vec<GuestView>,
  pub history: Vec<PlayedTrack>,
  pub reactions: Vec<Reaction>,
  pub play_requests: Vec<PlayRequest>,
  pub current_track: Option<Track>,
  pub is_playing: bool,
  pub created_at: u64,
  pub last_activity: u64,
  pub settings: Settings,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn track(id: &str) -> Track {
    Track {
      id: id.to_string(),
      name: format!("track {}", id),
      artists: "artist".to_string(),
      album: "album".to_string(),
      album_art: None,
      duration: 180_000,
      uri: format!("spotify:track:{}", id),
      preview_url: None,
    }
  }

  #[test]
  fn view_hides_tokens() {
    let mut session = Session::new(
      "ABC234".into(),
      "host-1".into(),
      "Alice".into(),
      "host-token".into(),
    );
    session.guests.push(Guest {
      id: "g1".into(),
      name: "Bob".into(),
      token: Some("guest-token".into()),
      joined_at: 1,
    });
    session.queue.push(QueueItem {
      track: track("t1"),
      added_by: "Bob".into(),
      added_by_id: "g1".into(),
      added_at: 1,
      votes: 1,
      voted_by: vec!["g1".into()],
    });

    let json = serde_json::to_string(&session.view()).unwrap();
    assert!(!json.contains("host-token"));
    assert!(!json.contains("guest-token"));
    assert!(json.contains("\"hasToken\":true"));
  }

  #[test]
  fn queue_item_serializes_flat() {
    let item = QueueItem {
      track: track("t1"),
      added_by: "Alice".into(),
      added_by_id: "host-1".into(),
      added_at: 1,
      votes: 1,
      voted_by: vec!["host-1".into()],
    };
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["id"], "t1");
    assert_eq!(value["addedBy"], "Alice");
    assert_eq!(value["votes"], 1);
  }

  #[test]
  fn settings_patch_merges() {
    let mut settings = Settings::default();
    settings.apply(&SettingsPatch {
      allow_guest_remove: Some(true),
      ..Default::default()
    });
    assert!(settings.allow_guest_remove);
    assert!(settings.allow_voting);
    assert!(settings.auto_play);
  }
}
