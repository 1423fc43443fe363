use serde::Serialize;
use std::time::Duration;

/// Identifies the item a media command or event belongs to.
///
/// Both the position and the id are carried so events that outlive a
/// refresh (same index, different item) can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemKey {
    pub index: usize,
    pub id: String,
}

impl ItemKey {
    pub fn new(index: usize, id: impl Into<String>) -> Self {
        Self { index, id: id.into() }
    }
}

/// Load lifecycle of one item's media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ItemPhase {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Errored,
}

/// Per-item transport state as shown by the feed view.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ItemPlaybackState {
    pub phase: ItemPhase,
    pub is_playing: bool,
    pub is_muted: bool,
    pub position_ratio: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub duration: Option<Duration>,
}

impl ItemPlaybackState {
    pub fn is_loading(&self) -> bool {
        self.phase == ItemPhase::Loading
    }

    pub fn has_error(&self) -> bool {
        self.phase == ItemPhase::Errored
    }

    pub fn display_text(&self) -> &str {
        match self.phase {
            ItemPhase::Unloaded => "",
            ItemPhase::Loading => "Loading...",
            ItemPhase::Errored => "Video unavailable",
            ItemPhase::Ready if self.is_playing => "Playing",
            ItemPhase::Ready => "Paused",
        }
    }
}

/// Status reported by the media resource of one item.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadStart,
    Loaded { duration: Option<Duration> },
    Error { reason: String },
    Progress { ratio: f32, duration_known: bool },
    Finished,
}

/// Transport actions the controller issues to a media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    Play { muted: bool },
    Pause,
    SetMuted(bool),
    ReplayFromStart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub target: ItemKey,
    pub action: MediaAction,
}

impl MediaCommand {
    pub fn new(target: ItemKey, action: MediaAction) -> Self {
        Self { target, action }
    }
}

/// Whatever owns the actual video resources implements this.
pub trait MediaSink {
    fn apply(&mut self, command: &MediaCommand);
}

/// Writes every command to the log and does nothing else.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl MediaSink for LoggingSink {
    fn apply(&mut self, command: &MediaCommand) {
        log::info!(
            "Media #{} ({}): {:?}",
            command.target.index,
            command.target.id,
            command.action
        );
    }
}

/// Keeps every command it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<MediaCommand>,
}

impl RecordingSink {
    pub fn take(&mut self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl MediaSink for RecordingSink {
    fn apply(&mut self, command: &MediaCommand) {
        self.commands.push(command.clone());
    }
}
