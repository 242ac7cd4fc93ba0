use serde::{Deserialize, Serialize};

pub type ClipId = String;
pub type TrackId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "ogg", "flac"];

impl MediaKind {
    /// Guess the media kind from a file name. Anything that is not a known
    /// audio extension is treated as video.
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Audio
        } else {
            Self::Video
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// A time-bounded reference to a media source. `track_id == None` means the
/// clip sits in the media bin and has not been placed yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
    pub name: String,
    /// Timeline position in seconds.
    pub x: f64,
    pub duration: f64,
    /// Seconds skipped at the start of the source.
    pub trim_start: f64,
    pub trim_end: f64,
    pub track_id: Option<TrackId>,
    pub volume: f64,
    pub speed: f64,
}

impl Clip {
    pub fn end(&self) -> f64 {
        self.x + self.duration
    }

    pub fn is_placed(&self) -> bool {
        self.track_id.is_some()
    }

    /// Whether `t` falls in `[x, x + duration)`.
    pub fn contains_time(&self, t: f64) -> bool {
        t >= self.x && t < self.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    Crossfade,
    FadeBlack,
    FadeWhite,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    Dissolve,
    Zoom,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 9] = [
        Self::Crossfade,
        Self::FadeBlack,
        Self::FadeWhite,
        Self::WipeLeft,
        Self::WipeRight,
        Self::WipeUp,
        Self::WipeDown,
        Self::Dissolve,
        Self::Zoom,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Crossfade => "Cross Fade",
            Self::FadeBlack => "Fade to Black",
            Self::FadeWhite => "Fade to White",
            Self::WipeLeft => "Wipe Left",
            Self::WipeRight => "Wipe Right",
            Self::WipeUp => "Wipe Up",
            Self::WipeDown => "Wipe Down",
            Self::Dissolve => "Dissolve",
            Self::Zoom => "Zoom",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: String,
    pub from_clip_id: ClipId,
    pub to_clip_id: ClipId,
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    pub duration: f64,
}

impl Transition {
    pub fn references(&self, clip_id: &str) -> bool {
        self.from_clip_id == clip_id || self.to_clip_id == clip_id
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Text drawn over the video while the playhead is inside its time range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    pub id: String,
    pub content: String,
    /// Position in percent of the frame.
    pub x: f64,
    pub y: f64,
    pub start_time: f64,
    pub duration: f64,
    pub font_size: u32,
    pub color: String,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    pub has_background: bool,
    pub background_color: String,
}

impl TextOverlay {
    pub fn new(id: String, start_time: f64) -> Self {
        Self {
            id,
            content: "New Text".into(),
            x: 50.0,
            y: 50.0,
            start_time,
            duration: 5.0,
            font_size: 48,
            color: "#FFFFFF".into(),
            font_family: "Arial".into(),
            bold: true,
            italic: false,
            align: TextAlign::Center,
            has_background: false,
            background_color: "rgba(0,0,0,0.5)".into(),
        }
    }

    /// Inclusive on both ends.
    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.start_time + self.duration
    }
}
