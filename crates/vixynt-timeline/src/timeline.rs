use tracing::{debug, info};

use crate::model::{
    Clip, ClipId, MediaKind, TextOverlay, Track, TrackId, Transition, TransitionKind,
};

/// Timeline pixels per second at zoom 1.
pub const BASE_PIXELS_PER_SECOND: f64 = 50.0;
/// Neither half of a split may be shorter than this.
pub const MIN_SPLIT_FRAGMENT: f64 = 0.1;
/// Trim gestures never shrink a clip below this.
pub const MIN_TRIM_DURATION: f64 = 0.5;
/// Two clips closer than this are adjacent for transition purposes.
pub const ADJACENCY_GAP: f64 = 0.5;
pub const DEFAULT_TRANSITION_DURATION: f64 = 0.5;
pub const TRANSITION_DURATION_RANGE: (f64, f64) = (0.25, 3.0);
/// Length given to freshly imported media until the host reports the real one.
pub const DEFAULT_CLIP_DURATION: f64 = 10.0;

pub fn pixels_per_second(zoom: f64) -> f64 {
    BASE_PIXELS_PER_SECOND * zoom
}

/// Render seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Clip state captured when a trim gesture starts. Deltas are always applied
/// relative to this, not to the live clip.
#[derive(Clone, Debug, PartialEq)]
pub struct TrimOrigin {
    pub clip_id: ClipId,
    pub x: f64,
    pub duration: f64,
    pub trim_start: f64,
}

/// Multi-track clip timeline.
///
/// Clips live in one flat list and reference their track by id; the clips on
/// a track are always derived by filtering.
#[derive(Clone, Debug)]
pub struct Timeline {
    clips: Vec<Clip>,
    tracks: Vec<Track>,
    transitions: Vec<Transition>,
    overlays: Vec<TextOverlay>,
    next_id: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// An empty timeline with one video and one audio track.
    pub fn new() -> Self {
        Self {
            clips: Vec::new(),
            tracks: vec![
                Track {
                    id: "video-1".into(),
                    kind: MediaKind::Video,
                },
                Track {
                    id: "audio-1".into(),
                    kind: MediaKind::Audio,
                },
            ],
            transitions: Vec::new(),
            overlays: Vec::new(),
            next_id: 0,
        }
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    fn clip_mut(&mut self, id: &str) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    /// Clips placed on `track_id`, in insertion order.
    pub fn clips_on_track<'a>(&'a self, track_id: &'a str) -> impl Iterator<Item = &'a Clip> {
        self.clips
            .iter()
            .filter(move |c| c.track_id.as_deref() == Some(track_id))
    }

    /// Clips that have not been placed on any track yet.
    pub fn media_bin(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(|c| !c.is_placed())
    }

    /// Append a track, numbered after the existing tracks of that kind.
    pub fn add_track(&mut self, kind: MediaKind) -> TrackId {
        let mut n = self.tracks.iter().filter(|t| t.kind == kind).count() + 1;
        let mut id = format!("{}-{n}", kind.as_str());
        while self.track(&id).is_some() {
            n += 1;
            id = format!("{}-{n}", kind.as_str());
        }
        self.tracks.push(Track {
            id: id.clone(),
            kind,
        });
        id
    }

    /// Add a media file to the bin with default timing.
    pub fn import_media(&mut self, name: &str, src: &str) -> ClipId {
        let id = self.fresh_id("clip");
        let kind = MediaKind::from_file_name(name);
        debug!(%id, name, kind = kind.as_str(), "media imported");
        self.clips.push(Clip {
            id: id.clone(),
            kind,
            src: src.to_string(),
            name: name.to_string(),
            x: 0.0,
            duration: DEFAULT_CLIP_DURATION,
            trim_start: 0.0,
            trim_end: 0.0,
            track_id: None,
            volume: 1.0,
            speed: 1.0,
        });
        id
    }

    /// Insert a fully specified clip, e.g. when loading a saved project.
    pub fn insert_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Split the placed clip under the playhead in two. Returns the id of the
    /// new right-hand clip, or `None` if there was no clip or either half
    /// would be shorter than [`MIN_SPLIT_FRAGMENT`].
    pub fn split_clip_at_playhead(&mut self, current_time: f64) -> Option<ClipId> {
        let idx = self
            .clips
            .iter()
            .position(|c| c.is_placed() && c.contains_time(current_time))?;

        let original = self.clips[idx].clone();
        let split_point = current_time - original.x;
        if split_point <= MIN_SPLIT_FRAGMENT || split_point >= original.duration - MIN_SPLIT_FRAGMENT
        {
            debug!(
                clip = %original.id,
                split_point,
                "split rejected, too close to clip edge"
            );
            return None;
        }

        let id = self.fresh_id("clip");
        let right = Clip {
            id: id.clone(),
            x: current_time,
            duration: original.duration - split_point,
            trim_start: original.trim_start + split_point,
            ..original
        };

        self.clips[idx].duration = split_point;
        info!(left = %self.clips[idx].id, right = %id, at = current_time, "clip split");
        self.clips.push(right);
        Some(id)
    }

    pub fn begin_trim(&self, clip_id: &str) -> Option<TrimOrigin> {
        let clip = self.clip(clip_id)?;
        Some(TrimOrigin {
            clip_id: clip.id.clone(),
            x: clip.x,
            duration: clip.duration,
            trim_start: clip.trim_start,
        })
    }

    /// Drag the left edge by `delta` seconds from where the gesture started.
    /// The clip trims into its source; the right edge stays put until a
    /// clamp kicks in.
    pub fn trim_left(&mut self, origin: &TrimOrigin, delta: f64) -> bool {
        let Some(clip) = self.clip_mut(&origin.clip_id) else {
            return false;
        };
        clip.x = (origin.x + delta).max(0.0);
        clip.duration = (origin.duration - delta).max(MIN_TRIM_DURATION);
        clip.trim_start = (origin.trim_start + delta).max(0.0);
        true
    }

    /// Drag the right edge by `delta` seconds from where the gesture started.
    pub fn trim_right(&mut self, origin: &TrimOrigin, delta: f64) -> bool {
        let Some(clip) = self.clip_mut(&origin.clip_id) else {
            return false;
        };
        clip.duration = (origin.duration + delta).max(MIN_TRIM_DURATION);
        true
    }

    /// Place a clip on `track_id` at the second under `pointer_px`.
    pub fn drop_on_track(
        &mut self,
        clip_id: &str,
        track_id: &str,
        pointer_px: f64,
        zoom: f64,
    ) -> bool {
        if self.track(track_id).is_none() || zoom <= 0.0 {
            return false;
        }
        let x = (pointer_px / pixels_per_second(zoom)).max(0.0);
        let Some(clip) = self.clip_mut(clip_id) else {
            return false;
        };
        clip.track_id = Some(track_id.to_string());
        clip.x = x;
        debug!(clip = clip_id, track = track_id, x, "clip dropped");
        true
    }

    pub fn move_clip(&mut self, clip_id: &str, x: f64) -> bool {
        match self.clip_mut(clip_id) {
            Some(clip) => {
                clip.x = x.max(0.0);
                true
            }
            None => false,
        }
    }

    pub fn set_volume(&mut self, clip_id: &str, volume: f64) -> bool {
        match self.clip_mut(clip_id) {
            Some(clip) => {
                clip.volume = volume.max(0.0);
                true
            }
            None => false,
        }
    }

    /// Speeds must be strictly positive; anything else is ignored.
    pub fn set_speed(&mut self, clip_id: &str, speed: f64) -> bool {
        if speed.is_nan() || speed <= 0.0 {
            return false;
        }
        match self.clip_mut(clip_id) {
            Some(clip) => {
                clip.speed = speed;
                true
            }
            None => false,
        }
    }

    /// Remove a clip together with every transition that references it.
    pub fn remove_clip(&mut self, clip_id: &str) -> Option<Clip> {
        let idx = self.clips.iter().position(|c| c.id == clip_id)?;
        let clip = self.clips.remove(idx);
        let before = self.transitions.len();
        self.transitions.retain(|t| !t.references(clip_id));
        debug!(
            clip = clip_id,
            transitions_removed = before - self.transitions.len(),
            "clip removed"
        );
        Some(clip)
    }

    fn has_transition(&self, from: &str, to: &str) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from_clip_id == from && t.to_clip_id == to)
    }

    /// Insert a default crossfade between the earliest pair of adjacent
    /// clips on the same video track that has none yet.
    pub fn add_transition(&mut self) -> Option<String> {
        let mut video: Vec<&Clip> = self
            .clips
            .iter()
            .filter(|c| {
                c.track_id
                    .as_deref()
                    .and_then(|t| self.track(t))
                    .is_some_and(|t| t.kind == MediaKind::Video)
            })
            .collect();
        video.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut pair = None;
        for (i, first) in video.iter().enumerate() {
            let Some(next) = video[i + 1..]
                .iter()
                .find(|c| c.track_id == first.track_id)
            else {
                continue;
            };
            if (first.end() - next.x).abs() < ADJACENCY_GAP
                && !self.has_transition(&first.id, &next.id)
            {
                pair = Some((first.id.clone(), next.id.clone()));
                break;
            }
        }

        let (from, to) = pair?;
        let id = self.fresh_id("trans");
        info!(%id, %from, %to, "transition added");
        self.transitions.push(Transition {
            id: id.clone(),
            from_clip_id: from,
            to_clip_id: to,
            kind: TransitionKind::Crossfade,
            duration: DEFAULT_TRANSITION_DURATION,
        });
        Some(id)
    }

    /// Change a transition's style and/or length. Duration is clamped to
    /// [`TRANSITION_DURATION_RANGE`].
    pub fn update_transition(
        &mut self,
        id: &str,
        kind: Option<TransitionKind>,
        duration: Option<f64>,
    ) -> bool {
        let Some(t) = self.transitions.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(kind) = kind {
            t.kind = kind;
        }
        if let Some(d) = duration {
            let (lo, hi) = TRANSITION_DURATION_RANGE;
            t.duration = d.clamp(lo, hi);
        }
        true
    }

    pub fn remove_transition(&mut self, id: &str) -> bool {
        let before = self.transitions.len();
        self.transitions.retain(|t| t.id != id);
        self.transitions.len() != before
    }

    /// Add a default text overlay starting at `at` seconds.
    pub fn add_text_overlay(&mut self, at: f64) -> String {
        let id = self.fresh_id("text");
        self.overlays.push(TextOverlay::new(id.clone(), at.max(0.0)));
        id
    }

    pub fn update_text_overlay(&mut self, id: &str, f: impl FnOnce(&mut TextOverlay)) -> bool {
        match self.overlays.iter_mut().find(|t| t.id == id) {
            Some(overlay) => {
                f(overlay);
                true
            }
            None => false,
        }
    }

    pub fn remove_text_overlay(&mut self, id: &str) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|t| t.id != id);
        self.overlays.len() != before
    }

    pub fn visible_text_overlays(&self, t: f64) -> impl Iterator<Item = &TextOverlay> {
        self.overlays.iter().filter(move |o| o.is_visible_at(t))
    }

    /// End time of the last placed clip.
    pub fn duration(&self) -> f64 {
        self.clips
            .iter()
            .filter(|c| c.is_placed())
            .map(Clip::end)
            .fold(0.0, f64::max)
    }
}
