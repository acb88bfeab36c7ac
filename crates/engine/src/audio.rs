use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

pub const MUTE_STORAGE_KEY: &str = "pirates-muted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
}

/// Frequency in Hz and duration in seconds. A frequency of zero is a rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq: f32,
    pub secs: f32,
}

const fn note(freq: f32, secs: f32) -> Note {
    Note { freq, secs }
}

/// Synthesis recipe for a cue. Notes overlap: each starts at 70% of the
/// previous one's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueShape {
    pub waveform: Waveform,
    pub gain: f32,
    pub notes: &'static [Note],
    /// Exponential pitch glide towards this frequency over the first note.
    pub glide_to: Option<f32>,
}

const CLICK_NOTES: &[Note] = &[note(880.0, 0.08)];
const CORRECT_NOTES: &[Note] = &[note(523.0, 0.12), note(659.0, 0.12), note(784.0, 0.18)];
const WRONG_NOTES: &[Note] = &[note(400.0, 0.15), note(300.0, 0.2)];
const DROP_NOTES: &[Note] = &[note(200.0, 0.12)];
const BADGE_NOTES: &[Note] = &[
    note(523.0, 0.1),
    note(659.0, 0.1),
    note(784.0, 0.1),
    note(1047.0, 0.2),
];
const SPLASH_NOTES: &[Note] = &[note(0.0, 0.4)];
const LAUNCH_NOTES: &[Note] = &[note(200.0, 0.35)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Click,
    Correct,
    Wrong,
    Drop,
    Badge,
    Splash,
    Launch,
}

impl SoundCue {
    pub const ALL: [SoundCue; 7] = [
        Self::Click,
        Self::Correct,
        Self::Wrong,
        Self::Drop,
        Self::Badge,
        Self::Splash,
        Self::Launch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::Drop => "drop",
            Self::Badge => "badge",
            Self::Splash => "splash",
            Self::Launch => "launch",
        }
    }

    pub fn shape(self) -> CueShape {
        match self {
            Self::Click => CueShape {
                waveform: Waveform::Sine,
                gain: 0.1,
                notes: CLICK_NOTES,
                glide_to: None,
            },
            Self::Correct => CueShape {
                waveform: Waveform::Sine,
                gain: 0.12,
                notes: CORRECT_NOTES,
                glide_to: None,
            },
            Self::Wrong => CueShape {
                waveform: Waveform::Sawtooth,
                gain: 0.08,
                notes: WRONG_NOTES,
                glide_to: None,
            },
            Self::Drop => CueShape {
                waveform: Waveform::Triangle,
                gain: 0.15,
                notes: DROP_NOTES,
                glide_to: None,
            },
            Self::Badge => CueShape {
                waveform: Waveform::Sine,
                gain: 0.1,
                notes: BADGE_NOTES,
                glide_to: None,
            },
            Self::Splash => CueShape {
                waveform: Waveform::Noise,
                gain: 0.1,
                notes: SPLASH_NOTES,
                glide_to: None,
            },
            Self::Launch => CueShape {
                waveform: Waveform::Sawtooth,
                gain: 0.08,
                notes: LAUNCH_NOTES,
                glide_to: Some(800.0),
            },
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MusicTrack {
    Login,
    Level1,
    Level2,
    Level3,
    GaryIsland,
    Victory,
}

impl MusicTrack {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Level1 => "level1",
            Self::Level2 => "level2",
            Self::Level3 => "level3",
            Self::GaryIsland => "garyIsland",
            Self::Victory => "victory",
        }
    }

    /// Background track for an act; acts past the last level play the island theme.
    pub fn for_act(act: u8) -> Self {
        match act {
            0 | 1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            _ => Self::GaryIsland,
        }
    }
}

impl fmt::Display for MusicTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever actually makes noise. Calls are fire-and-forget.
pub trait AudioBackend {
    fn play_cue(&mut self, cue: SoundCue);
    fn start_track(&mut self, track: MusicTrack);
    fn stop_music(&mut self);
}

/// Backend for terminals: every cue becomes a debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudio;

impl AudioBackend for TracingAudio {
    fn play_cue(&mut self, cue: SoundCue) {
        let shape = cue.shape();
        debug!(cue = %cue, notes = shape.notes.len(), "sound_cue_played");
    }

    fn start_track(&mut self, track: MusicTrack) {
        debug!(track = %track, "music_started");
    }

    fn stop_music(&mut self) {
        debug!("music_stopped");
    }
}

/// Cue dispatch plus the persisted mute preference.
pub struct SoundBoard {
    backend: Box<dyn AudioBackend>,
    storage: Box<dyn KeyValueStore>,
    muted: bool,
    current_track: Option<MusicTrack>,
    playing: bool,
}

impl SoundBoard {
    /// Anything other than a stored `"true"` starts unmuted.
    pub fn load(backend: Box<dyn AudioBackend>, storage: Box<dyn KeyValueStore>) -> Self {
        let muted = match storage.get(MUTE_STORAGE_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(error) => {
                warn!(error = %error, "mute_preference_load_failed");
                false
            }
        };
        Self {
            backend,
            storage,
            muted,
            current_track: None,
            playing: false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_track(&self) -> Option<MusicTrack> {
        self.current_track
    }

    pub fn is_music_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self, cue: SoundCue) {
        if self.muted {
            return;
        }
        self.backend.play_cue(cue);
    }

    /// While muted the track is only remembered, to start on unmute.
    pub fn start_music(&mut self, track: MusicTrack) {
        if self.muted {
            self.current_track = Some(track);
            return;
        }
        if self.playing && self.current_track == Some(track) {
            return;
        }
        self.halt_playback();
        self.backend.start_track(track);
        self.current_track = Some(track);
        self.playing = true;
    }

    pub fn stop_music(&mut self) {
        self.halt_playback();
        self.current_track = None;
    }

    /// Flips and persists the preference. Muting stops playback but keeps the
    /// track so unmuting picks it back up.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        info!(muted = self.muted, "mute_toggled");
        let encoded = if self.muted { "true" } else { "false" };
        if let Err(error) = self.storage.set(MUTE_STORAGE_KEY, encoded) {
            warn!(error = %error, "mute_preference_save_failed");
        }

        if self.muted {
            self.halt_playback();
        } else if let Some(track) = self.current_track {
            self.start_music(track);
        }
        self.muted
    }

    /// Mutes for this run only, leaving the stored preference alone.
    pub fn force_mute(&mut self) {
        self.muted = true;
        self.halt_playback();
    }

    fn halt_playback(&mut self) {
        if self.playing {
            self.backend.stop_music();
            self.playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::storage::MemoryKeyValueStore;

    #[derive(Debug, Clone, PartialEq)]
    enum Played {
        Cue(SoundCue),
        Track(MusicTrack),
        Stop,
    }

    #[derive(Clone, Default)]
    struct RecordingAudio {
        log: Rc<RefCell<Vec<Played>>>,
    }

    impl AudioBackend for RecordingAudio {
        fn play_cue(&mut self, cue: SoundCue) {
            self.log.borrow_mut().push(Played::Cue(cue));
        }

        fn start_track(&mut self, track: MusicTrack) {
            self.log.borrow_mut().push(Played::Track(track));
        }

        fn stop_music(&mut self) {
            self.log.borrow_mut().push(Played::Stop);
        }
    }

    fn board(storage: MemoryKeyValueStore) -> (SoundBoard, RecordingAudio) {
        let audio = RecordingAudio::default();
        let board = SoundBoard::load(Box::new(audio.clone()), Box::new(storage));
        (board, audio)
    }

    #[test]
    fn mute_preference_loads_and_persists() {
        let storage = MemoryKeyValueStore::new().with_entry(MUTE_STORAGE_KEY, "true");
        let (mut sound, _) = board(storage.clone());
        assert!(sound.is_muted());

        assert!(!sound.toggle_mute());
        assert_eq!(
            storage.get(MUTE_STORAGE_KEY).expect("get").as_deref(),
            Some("false")
        );

        let garbage = MemoryKeyValueStore::new().with_entry(MUTE_STORAGE_KEY, "yes please");
        let (sound, _) = board(garbage);
        assert!(!sound.is_muted());
    }

    #[test]
    fn cues_are_dropped_while_muted() {
        let (mut sound, audio) = board(MemoryKeyValueStore::new());
        sound.play(SoundCue::Click);
        sound.toggle_mute();
        sound.play(SoundCue::Wrong);
        assert_eq!(*audio.log.borrow(), vec![Played::Cue(SoundCue::Click)]);
    }

    #[test]
    fn same_track_is_not_restarted() {
        let (mut sound, audio) = board(MemoryKeyValueStore::new());
        sound.start_music(MusicTrack::Login);
        sound.start_music(MusicTrack::Login);
        sound.start_music(MusicTrack::Level1);
        assert_eq!(
            *audio.log.borrow(),
            vec![
                Played::Track(MusicTrack::Login),
                Played::Stop,
                Played::Track(MusicTrack::Level1),
            ]
        );
    }

    #[test]
    fn unmute_resumes_remembered_track() {
        let storage = MemoryKeyValueStore::new().with_entry(MUTE_STORAGE_KEY, "true");
        let (mut sound, audio) = board(storage);
        sound.start_music(MusicTrack::GaryIsland);
        assert!(!sound.is_music_playing());
        assert!(audio.log.borrow().is_empty());

        sound.toggle_mute();
        assert!(sound.is_music_playing());
        sound.toggle_mute();
        assert!(!sound.is_music_playing());
        assert_eq!(sound.current_track(), Some(MusicTrack::GaryIsland));
        assert_eq!(
            *audio.log.borrow(),
            vec![Played::Track(MusicTrack::GaryIsland), Played::Stop]
        );
    }

    #[test]
    fn track_names_match_content_keys() {
        let parsed: MusicTrack = serde_json::from_str("\"garyIsland\"").expect("parse");
        assert_eq!(parsed, MusicTrack::GaryIsland);
        assert_eq!(
            serde_json::to_string(&MusicTrack::Level2).expect("encode"),
            "\"level2\""
        );
        assert_eq!(MusicTrack::for_act(4), MusicTrack::GaryIsland);
    }

    #[test]
    fn launch_glides_upward() {
        let shape = SoundCue::Launch.shape();
        assert_eq!(shape.glide_to, Some(800.0));
        assert!(SoundCue::ALL.iter().all(|cue| !cue.shape().notes.is_empty()));
    }
}
