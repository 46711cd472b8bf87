//! Session mutations, kept free of HTTP concerns so the queue and lifecycle
//! rules are unit-testable. Handlers load the record, call one of these, and
//! persist the whole record back (read-modify-write, no isolation).

use crate::common::{ApiError, ApiResult};
use crate::session::model::{
  Guest, PlayRequest, PlayedTrack, QueueItem, Reaction, Session, SettingsPatch, Track,
  HISTORY_CAP, REACTION_CAP, REACTION_TTL_MS,
};

/// Upsert a guest by id. Rejoining merges name and token, which is how a
/// guest refreshes a rotated bearer token without duplicating themselves.
pub fn join(session: &mut Session, id: String, name: String, token: Option<String>, now: u64) {
  if let Some(guest) = session.guests.iter_mut().find(|g| g.id == id) {
    guest.name = name;
    if token.is_some() {
      guest.token = token;
    }
  } else {
    session.guests.push(Guest {
      id,
      name,
      token,
      joined_at: now,
    });
  }
  session.last_activity = now;
}

pub fn leave(session: &mut Session, guest_id: &str, now: u64) {
  session.guests.retain(|g| g.id != guest_id);
  session.last_activity = now;
}

pub fn update_guest_token(session: &mut Session, guest_id: &str, token: String, now: u64) {
  if let Some(guest) = session.guests.iter_mut().find(|g| g.id == guest_id) {
    guest.token = Some(token);
    session.last_activity = now;
  }
}

/// Queue a track. Duplicates by track id are rejected; the adder starts the
/// track at one vote (their own).
pub fn add_track(
  session: &mut Session,
  track: Track,
  added_by: String,
  added_by_id: String,
  now: u64,
) -> ApiResult<()> {
  if session.queue.iter().any(|item| item.track.id == track.id) {
    return Err(ApiError::BadRequest(format!(
      "track already in queue: {}",
      track.id
    )));
  }
  session.queue.push(QueueItem {
    track,
    added_by,
    added_by_id: added_by_id.clone(),
    added_at: now,
    votes: 1,
    voted_by: vec![added_by_id],
  });
  session.last_activity = now;
  Ok(())
}

/// Toggle a vote. A repeat vote by the same identifier retracts the previous
/// one; votes never go negative. The queue is re-sorted by descending votes
/// after every toggle; the sort is stable so ties keep their relative order.
pub fn vote(session: &mut Session, track_id: &str, voter: &str, now: u64) -> ApiResult<u32> {
  let item = session
    .queue
    .iter_mut()
    .find(|item| item.track.id == track_id)
    .ok_or_else(|| ApiError::NotFound(format!("track not in queue: {}", track_id)))?;

  if let Some(pos) = item.voted_by.iter().position(|v| v == voter) {
    item.voted_by.remove(pos);
    item.votes = item.votes.saturating_sub(1);
  } else {
    item.voted_by.push(voter.to_string());
    item.votes += 1;
  }
  let votes = item.votes;

  session.queue.sort_by(|a, b| b.votes.cmp(&a.votes));
  session.last_activity = now;
  Ok(votes)
}

/// Remove a queued track. Allowed for the host, the track's original adder,
/// or anyone when `allowGuestRemove` is on.
pub fn remove_track(
  session: &mut Session,
  track_id: &str,
  requester: &str,
  now: u64,
) -> ApiResult<()> {
  let pos = session
    .queue
    .iter()
    .position(|item| item.track.id == track_id)
    .ok_or_else(|| ApiError::NotFound(format!("track not in queue: {}", track_id)))?;

  let allowed = requester == session.host_id
    || requester == session.queue[pos].added_by_id
    || session.settings.allow_guest_remove;
  if !allowed {
    return Err(ApiError::Forbidden(
      "only the host or the adder can remove this track".to_string(),
    ));
  }

  session.queue.remove(pos);
  session.last_activity = now;
  Ok(())
}

/// Pop the queue head into `currentTrack`, pushing the previous current track
/// (if any) to history first.
pub fn play_next(session: &mut Session, now: u64) -> ApiResult<Track> {
  if session.queue.is_empty() {
    return Err(ApiError::BadRequest("queue is empty".to_string()));
  }
  let item = session.queue.remove(0);
  let track = item.track;
  archive_current(session, now);
  session.current_track = Some(track.clone());
  session.is_playing = true;
  session.last_activity = now;
  Ok(track)
}

/// The caller already started this exact track on the player; record it as
/// current with the same history-push-before-overwrite rule as `play_next`.
pub fn set_current_track(session: &mut Session, track: Track, now: u64) {
  archive_current(session, now);
  session.current_track = Some(track);
  session.is_playing = true;
  session.last_activity = now;
}

fn archive_current(session: &mut Session, now: u64) {
  if let Some(prev) = session.current_track.take() {
    session.history.push(PlayedTrack {
      track: prev,
      played_at: now,
    });
    if session.history.len() > HISTORY_CAP {
      let excess = session.history.len() - HISTORY_CAP;
      session.history.drain(..excess);
    }
  }
}

pub fn update_settings(session: &mut Session, patch: &SettingsPatch, now: u64) {
  session.settings.apply(patch);
  session.last_activity = now;
}

pub fn react(session: &mut Session, emoji: String, user: String, now: u64) {
  session.reactions.push(Reaction {
    emoji,
    user,
    timestamp: now,
  });
  if session.reactions.len() > REACTION_CAP {
    let excess = session.reactions.len() - REACTION_CAP;
    session.reactions.drain(..excess);
  }
  session.last_activity = now;
}

/// Drop reactions past their 5s lifetime. Called lazily from `get`; returns
/// whether anything was removed so the handler knows to persist.
pub fn prune_reactions(session: &mut Session, now: u64) -> bool {
  let before = session.reactions.len();
  session
    .reactions
    .retain(|r| now.saturating_sub(r.timestamp) < REACTION_TTL_MS);
  session.reactions.len() != before
}

/// File a play request; one pending request per track id.
pub fn request_play(
  session: &mut Session,
  track: Track,
  requested_by: String,
  requested_by_id: String,
  now: u64,
) -> ApiResult<()> {
  if session.play_requests.iter().any(|r| r.track.id == track.id) {
    return Err(ApiError::BadRequest(format!(
      "track already requested: {}",
      track.id
    )));
  }
  session.play_requests.push(PlayRequest {
    track,
    requested_by,
    requested_by_id,
    requested_at: now,
  });
  session.last_activity = now;
  Ok(())
}

/// Accept and dismiss both come down to clearing the pending request.
pub fn clear_request(session: &mut Session, track_id: &str, now: u64) {
  session.play_requests.retain(|r| r.track.id != track_id);
  session.last_activity = now;
}

/// Every bearer token in the session: host first, then token-bearing guests
/// in join order. This is the fan-out target list.
pub fn all_tokens(session: &Session) -> Vec<String> {
  let mut tokens = vec![session.host_token.clone()];
  tokens.extend(session.guests.iter().filter_map(|g| g.token.clone()));
  tokens
}
