//! Audio engine for real-time MIDI synthesis.
//!
//! Provides a high-level interface for playing MIDI notes and timelines
//! using rustysynth for synthesis and rodio for audio output. Timeline
//! events are scheduled on the audio thread against a sample clock, so
//! audio timing never depends on how often the UI redraws.

use super::soundfont::{find_bank_file, PresetInfo, SoundFontTable};
use super::{EngineError, SynthEngine, TransportClock};
use crate::midi::{
    bank_for_channel, EventKind, Timeline, TimelineEvent, CC_BANK_SELECT_LSB, CC_EXPRESSION,
    CC_PAN, CC_VOLUME, CHANNEL_COUNT,
};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Delay in seconds between the transport starting and the first event sounding.
pub const START_DELAY: f64 = 0.1;

/// Control change: all sound off.
const CC_ALL_SOUND_OFF: u8 = 120;

/// Control change: all notes off.
const CC_ALL_NOTES_OFF: u8 = 123;

/// Initial (volume, pan, expression) of every channel.
const DEFAULT_CONTROLS: [u8; 3] = [100, 64, 127];

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not playing, position reset to start.
    Stopped,
    /// Currently playing.
    Playing,
    /// Paused at current position.
    Paused,
}

impl PlaybackState {
    /// State after the transport is moved to `time` seconds.
    ///
    /// A stopped transport moved away from zero is cued there: it becomes
    /// paused so the next play continues from the new position.
    pub fn after_seek(self, time: f64) -> Self {
        match self {
            PlaybackState::Stopped if time > 0.0 => PlaybackState::Paused,
            other => other,
        }
    }
}

/// Transport frame count at which an event starting at `time` is due.
fn seek_frames(time: f64) -> u64 {
    ((time.max(0.0) + START_DELAY) * SAMPLE_RATE as f64).ceil() as u64
}

/// Shared state between the audio engine and the audio source.
/// Uses atomics for lock-free reads from the UI thread.
struct SharedState {
    /// Whether the timeline is advancing.
    playing: AtomicBool,
    /// Frames rendered since the transport started from zero (or was seeked).
    position_frames: AtomicU64,
}

/// Everything the audio thread touches, behind one lock.
struct SynthCore {
    /// One synthesizer per loaded SoundFont.
    synths: Vec<Synthesizer>,
    table: SoundFontTable,
    /// Synthesizer currently serving each channel.
    channel_synth: [usize; CHANNEL_COUNT],
    bank_lsb: [u8; CHANNEL_COUNT],
    /// Last (volume, pan, expression) per channel, replayed into new synths.
    controls: [[u8; 3]; CHANNEL_COUNT],
    timeline: Arc<Timeline>,
    /// Next timeline event to schedule.
    cursor: usize,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
}

impl SynthCore {
    fn new() -> Self {
        Self {
            synths: Vec::new(),
            table: SoundFontTable::new(),
            channel_synth: [0; CHANNEL_COUNT],
            bank_lsb: [0; CHANNEL_COUNT],
            controls: [DEFAULT_CONTROLS; CHANNEL_COUNT],
            timeline: Arc::new(Timeline::default()),
            cursor: 0,
            scratch_left: vec![0.0; BUFFER_SIZE],
            scratch_right: vec![0.0; BUFFER_SIZE],
        }
    }

    fn synth_for(&mut self, channel: u8) -> Option<&mut Synthesizer> {
        let index = *self.channel_synth.get(channel as usize)?;
        self.synths.get_mut(index)
    }

    fn channel_bank(&self, channel: u8) -> u16 {
        let lsb = self.bank_lsb.get(channel as usize).copied().unwrap_or(0);
        bank_for_channel(channel, lsb)
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        if let Some(synth) = self.synth_for(channel) {
            synth.note_on(channel as i32, note as i32, velocity as i32);
        }
    }

    fn note_off(&mut self, channel: u8, note: u8) {
        if let Some(synth) = self.synth_for(channel) {
            synth.note_off(channel as i32, note as i32);
        }
    }

    /// Sends a controller change to every synthesizer so switching
    /// SoundFonts mid-song keeps the channel's mix.
    fn controller(&mut self, channel: u8, controller: u8, value: u8) {
        let Some(controls) = self.controls.get_mut(channel as usize) else {
            return;
        };
        match controller {
            CC_VOLUME => controls[0] = value,
            CC_PAN => controls[1] = value,
            CC_EXPRESSION => controls[2] = value,
            CC_BANK_SELECT_LSB => self.bank_lsb[channel as usize] = value,
            _ => {}
        }
        for synth in &mut self.synths {
            // Control change is MIDI command 0xB0
            synth.process_midi_message(channel as i32, 0xB0, controller as i32, value as i32);
        }
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        let ch = channel as usize;
        if ch >= CHANNEL_COUNT {
            return;
        }
        let bank = self.channel_bank(channel);
        let current = self.channel_synth[ch];
        let target = self.table.lookup(program, bank).unwrap_or(current);
        if target != current {
            if let Some(old) = self.synths.get_mut(current) {
                old.process_midi_message(channel as i32, 0xB0, CC_ALL_NOTES_OFF as i32, 0);
            }
            self.channel_synth[ch] = target;
        }
        if let Some(synth) = self.synth_for(channel) {
            // Program change is MIDI command 0xC0 (192)
            synth.process_midi_message(channel as i32, 0xC0, program as i32, 0);
        }
    }

    fn stop_channel(&mut self, channel: u8) {
        for synth in &mut self.synths {
            synth.process_midi_message(channel as i32, 0xB0, CC_ALL_SOUND_OFF as i32, 0);
        }
    }

    fn all_notes_off(&mut self, immediate: bool) {
        for synth in &mut self.synths {
            synth.note_off_all(immediate);
        }
    }

    fn apply(&mut self, event: &TimelineEvent) {
        match event.kind {
            EventKind::NoteOn { note, velocity } => self.note_on(event.channel, note, velocity),
            EventKind::NoteOff { note, .. } => self.note_off(event.channel, note),
            EventKind::Controller { controller, value } => {
                self.controller(event.channel, controller, value)
            }
            EventKind::ProgramChange { program } => self.program_change(event.channel, program),
        }
    }

    /// Applies every event due at or before `now` seconds.
    fn dispatch_due(&mut self, now: f64) {
        while let Some(event) = self.timeline.get(self.cursor).copied() {
            if event.start_time + START_DELAY > now {
                break;
            }
            self.apply(&event);
            self.cursor += 1;
        }
    }

    /// Moves the scheduler to the first event at or after `time` and puts
    /// every channel's volume, pan and expression back to their values at
    /// that point.
    fn seek(&mut self, time: f64) {
        self.all_notes_off(true);
        self.cursor = self.timeline.queue_index(time);
        let state = self.timeline.control_state_at(self.cursor);
        for (channel, controls) in state.iter().enumerate() {
            let values = [controls.volume, controls.pan, controls.expression];
            let restored = [CC_VOLUME, CC_PAN, CC_EXPRESSION]
                .into_iter()
                .zip(values)
                .zip(DEFAULT_CONTROLS);
            for ((controller, value), default) in restored {
                self.controller(channel as u8, controller, value.unwrap_or(default));
            }
        }
    }

    /// Mixes all synthesizers into the output buffers.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
        let len = left.len().min(self.scratch_left.len());
        for synth in &mut self.synths {
            synth.render(&mut self.scratch_left[..len], &mut self.scratch_right[..len]);
            for i in 0..len {
                left[i] += self.scratch_left[i];
                right[i] += self.scratch_right[i];
            }
        }
    }

    fn add_soundfont(&mut self, mut synth: Synthesizer, presets: &[PresetInfo]) -> usize {
        for (channel, controls) in self.controls.iter().enumerate() {
            for (cc, value) in [CC_VOLUME, CC_PAN, CC_EXPRESSION].iter().zip(controls) {
                synth.process_midi_message(channel as i32, 0xB0, *cc as i32, *value as i32);
            }
        }
        let index = self.synths.len();
        self.synths.push(synth);
        self.table.register(index, presets);
        index
    }
}

/// Audio source that generates samples from the synthesizers.
/// Implements rodio's Source trait for playback.
struct SynthSource {
    core: Arc<Mutex<SynthCore>>,
    state: Arc<SharedState>,
    /// Left channel buffer.
    left_buf: Vec<f32>,
    /// Right channel buffer.
    right_buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(core: Arc<Mutex<SynthCore>>, state: Arc<SharedState>) -> Self {
        Self {
            core,
            state,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }

    fn refill(&mut self) {
        if let Ok(mut core) = self.core.lock() {
            if self.state.playing.load(Ordering::Relaxed) {
                let frames =
                    self.state.position_frames.load(Ordering::Relaxed) + BUFFER_SIZE as u64;
                core.dispatch_due(frames as f64 / SAMPLE_RATE as f64);
                self.state.position_frames.store(frames, Ordering::Relaxed);
            }
            core.render(&mut self.left_buf, &mut self.right_buf);
        } else {
            // Only fill with silence if we can't get the lock
            self.left_buf.fill(0.0);
            self.right_buf.fill(0.0);
        }
        self.buf_pos = 0;
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            self.refill();
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}

/// Reads a SoundFont and lists its presets.
fn read_soundfont(path: &Path) -> Result<(Arc<SoundFont>, Vec<PresetInfo>), EngineError> {
    let file = File::open(path).map_err(|source| EngineError::SoundFontIo {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let soundfont = SoundFont::new(&mut reader).map_err(|e| EngineError::SoundFontParse {
        path: path.to_path_buf(),
        message: format!("{:?}", e),
    })?;

    let presets = soundfont
        .get_presets()
        .iter()
        .filter_map(|preset| {
            let program = u8::try_from(preset.get_patch_number()).ok()?;
            let bank = u16::try_from(preset.get_bank_number()).ok()?;
            (program < 128).then(|| PresetInfo {
                program,
                bank,
                name: preset.get_name().to_string(),
            })
        })
        .collect();

    Ok((Arc::new(soundfont), presets))
}

/// The main audio engine for MIDI synthesis and playback.
///
/// Owns the synthesizers, the audio output and the transport of the
/// currently loaded timeline.
pub struct AudioEngine {
    core: Arc<Mutex<SynthCore>>,
    state: Arc<SharedState>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    /// Audio output handle for playback.
    _stream_handle: OutputStreamHandle,
    /// Sink carrying the synth source; paused while suspended.
    sink: Sink,
    playback_state: PlaybackState,
    /// Directory searched for lazily loaded banks.
    soundfont_dir: PathBuf,
    /// Every SoundFont loaded so far, in load order.
    soundfont_paths: Vec<PathBuf>,
}

impl AudioEngine {
    /// Creates a new audio engine with the specified SoundFont.
    ///
    /// Audio output starts suspended; it resumes on the first live input
    /// or when playback starts.
    ///
    /// # Arguments
    ///
    /// * `soundfont_path` - Path to the initial SoundFont file
    /// * `soundfont_dir` - Directory holding per-program bank files
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The SoundFont file cannot be read
    /// - The SoundFont is invalid
    /// - Audio output cannot be initialized
    pub fn new<P: AsRef<Path>>(
        soundfont_path: P,
        soundfont_dir: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        let core = Arc::new(Mutex::new(SynthCore::new()));
        let state = Arc::new(SharedState {
            playing: AtomicBool::new(false),
            position_frames: AtomicU64::new(0),
        });

        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| EngineError::Output(e.to_string()))?;
        let sink = Sink::try_new(&stream_handle).map_err(|e| EngineError::Output(e.to_string()))?;
        sink.pause();
        sink.append(SynthSource::new(Arc::clone(&core), Arc::clone(&state)));

        let mut engine = Self {
            core,
            state,
            _stream: stream,
            _stream_handle: stream_handle,
            sink,
            playback_state: PlaybackState::Stopped,
            soundfont_dir: soundfont_dir.into(),
            soundfont_paths: Vec::new(),
        };
        engine.load_soundfont(soundfont_path)?;
        Ok(engine)
    }

    fn with_core<R>(&self, f: impl FnOnce(&mut SynthCore) -> R) -> Option<R> {
        match self.core.lock() {
            Ok(mut core) => Some(f(&mut core)),
            Err(_) => {
                tracing::error!("Synth lock poisoned");
                None
            }
        }
    }

    /// Loads an additional SoundFont. Its presets take precedence over
    /// those of previously loaded SoundFonts.
    ///
    /// # Returns
    ///
    /// The index of the new SoundFont
    pub fn load_soundfont<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, EngineError> {
        let path = path.as_ref();
        let (soundfont, presets) = read_soundfont(path)?;
        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| EngineError::Synthesizer(format!("{:?}", e)))?;

        let index = self
            .with_core(|core| core.add_soundfont(synth, &presets))
            .ok_or_else(|| EngineError::Synthesizer("synth lock poisoned".to_string()))?;
        self.soundfont_paths.push(path.to_path_buf());
        tracing::info!(?path, presets = presets.len(), index, "Loaded SoundFont");
        Ok(index)
    }

    /// Makes sure some loaded SoundFont provides `program` in `bank`,
    /// fetching `<soundfont_dir>/<NNN>.sf2|.sf3` otherwise.
    pub fn ensure_bank(&mut self, program: u8, bank: u16) -> Result<(), EngineError> {
        let loaded = self
            .with_core(|core| core.table.lookup(program, bank).is_some())
            .unwrap_or(false);
        if loaded {
            return Ok(());
        }
        match find_bank_file(&self.soundfont_dir, program, bank) {
            Some(path) => self.load_soundfont(path).map(|_| ()),
            None => Err(EngineError::MissingBank {
                program,
                bank,
                dir: self.soundfont_dir.clone(),
            }),
        }
    }

    /// Returns the paths of all loaded SoundFonts.
    pub fn soundfont_paths(&self) -> &[PathBuf] {
        &self.soundfont_paths
    }

    /// Returns the bank a channel currently resolves programs in.
    pub fn channel_bank(&self, channel: u8) -> u16 {
        self.with_core(|core| core.channel_bank(channel))
            .unwrap_or_else(|| bank_for_channel(channel, 0))
    }

    /// Returns the instrument name for a program, or a fallback name.
    pub fn instrument_name(&self, program: u8, bank: u16) -> String {
        self.with_core(|core| core.table.instrument_name(program, bank).map(str::to_string))
            .flatten()
            .unwrap_or_else(|| format!("Program {}", program))
    }

    /// Replaces the timeline. Playback stops and rewinds.
    pub fn load_timeline(&mut self, timeline: Arc<Timeline>) {
        self.stop();
        self.with_core(|core| {
            core.timeline = timeline;
            core.cursor = 0;
        });
    }

    /// Starts the timeline from the beginning.
    pub fn play(&mut self) -> Result<(), EngineError> {
        let state = Arc::clone(&self.state);
        self.with_core(|core| {
            core.all_notes_off(true);
            core.cursor = 0;
            state.position_frames.store(0, Ordering::Relaxed);
        });
        self.start_transport()
    }

    /// Continues the timeline from the paused position.
    pub fn resume_playback(&mut self) -> Result<(), EngineError> {
        self.start_transport()
    }

    fn start_transport(&mut self) -> Result<(), EngineError> {
        self.resume()?;
        self.state.playing.store(true, Ordering::Relaxed);
        self.playback_state = PlaybackState::Playing;
        Ok(())
    }

    /// Pauses the timeline, keeping its position.
    pub fn pause(&mut self) {
        self.state.playing.store(false, Ordering::Relaxed);
        self.with_core(|core| core.all_notes_off(false));
        self.playback_state = PlaybackState::Paused;
    }

    /// Stops playback and resets position.
    pub fn stop(&mut self) {
        let state = Arc::clone(&self.state);
        self.with_core(|core| {
            state.playing.store(false, Ordering::Relaxed);
            core.all_notes_off(true);
            core.cursor = 0;
            state.position_frames.store(0, Ordering::Relaxed);
        });
        self.playback_state = PlaybackState::Stopped;
    }

    /// Moves the transport to `time` seconds of timeline time.
    ///
    /// Sounding notes are cut and the channel mix is restored to its state
    /// at `time`; scheduling continues with the first event starting at or
    /// after `time`. A stopped transport is cued at the new position.
    pub fn seek(&mut self, time: f64) {
        let state = Arc::clone(&self.state);
        let time = time.max(0.0);
        self.with_core(|core| {
            core.seek(time);
            state.position_frames.store(seek_frames(time), Ordering::Relaxed);
        });
        self.playback_state = self.playback_state.after_seek(time);
    }

    /// Returns the start time of the last timeline event.
    pub fn total_time(&self) -> f64 {
        self.with_core(|core| core.timeline.total_time())
            .unwrap_or(0.0)
    }

    /// Returns the current playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.playback_state
    }

    /// Returns whether the timeline is advancing.
    pub fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::Relaxed)
    }
}

impl SynthEngine for AudioEngine {
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.with_core(|core| core.note_on(channel, note, velocity));
    }

    fn note_off(&mut self, channel: u8, note: u8, _velocity: u8) {
        self.with_core(|core| core.note_off(channel, note));
    }

    fn stop_channel_notes(&mut self, channel: u8) {
        self.with_core(|core| core.stop_channel(channel));
    }

    fn set_volume(&mut self, channel: u8, value: u8) {
        self.with_core(|core| core.controller(channel, CC_VOLUME, value));
    }

    fn set_pan(&mut self, channel: u8, value: u8) {
        self.with_core(|core| core.controller(channel, CC_PAN, value));
    }

    fn set_expression(&mut self, channel: u8, value: u8) {
        self.with_core(|core| core.controller(channel, CC_EXPRESSION, value));
    }

    fn set_program_change(&mut self, channel: u8, program: u8) -> Result<(), EngineError> {
        let bank = self.channel_bank(channel);
        self.ensure_bank(program, bank)?;
        self.with_core(|core| core.program_change(channel, program));
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.sink.is_paused()
    }

    fn suspend(&mut self) -> Result<(), EngineError> {
        self.sink.pause();
        tracing::debug!("Audio output suspended");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if self.sink.is_paused() {
            self.sink.play();
            tracing::debug!("Audio output resumed");
        }
        Ok(())
    }
}

impl TransportClock for AudioEngine {
    fn current_time(&self) -> f64 {
        self.state.position_frames.load(Ordering::Relaxed) as f64 / SAMPLE_RATE as f64
    }

    fn start_delay(&self) -> f64 {
        START_DELAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::DRUM_BANK;

    fn core_with(events: Vec<TimelineEvent>) -> SynthCore {
        let mut core = SynthCore::new();
        core.timeline = Arc::new(Timeline::new(events));
        core
    }

    #[test]
    fn test_dispatch_respects_start_delay() {
        let mut core = core_with(vec![
            TimelineEvent::new(0.0, 0, EventKind::NoteOn { note: 60, velocity: 100 }),
            TimelineEvent::new(0.5, 0, EventKind::NoteOff { note: 60, velocity: 0 }),
        ]);

        core.dispatch_due(0.05);
        assert_eq!(core.cursor, 0);

        core.dispatch_due(START_DELAY);
        assert_eq!(core.cursor, 1);

        core.dispatch_due(0.55);
        assert_eq!(core.cursor, 1);

        core.dispatch_due(0.6);
        assert_eq!(core.cursor, 2);

        // Past the end stays at the end
        core.dispatch_due(100.0);
        assert_eq!(core.cursor, 2);
    }

    #[test]
    fn test_controller_state_is_tracked() {
        let mut core = SynthCore::new();
        core.controller(2, CC_VOLUME, 30);
        core.controller(2, CC_PAN, 10);
        core.controller(2, CC_EXPRESSION, 90);
        assert_eq!(core.controls[2], [30, 10, 90]);
        assert_eq!(core.controls[3], DEFAULT_CONTROLS);

        core.controller(4, CC_BANK_SELECT_LSB, 8);
        assert_eq!(core.channel_bank(4), 8);
        assert_eq!(core.channel_bank(9), DRUM_BANK);
    }

    #[test]
    fn test_timeline_events_update_core_state() {
        let mut core = core_with(vec![
            TimelineEvent::new(0.0, 1, EventKind::Controller { controller: 7, value: 42 }),
            TimelineEvent::new(0.0, 1, EventKind::ProgramChange { program: 12 }),
        ]);
        core.dispatch_due(1.0);
        assert_eq!(core.cursor, 2);
        assert_eq!(core.controls[1][0], 42);
        // No SoundFont provides program 12, so the channel keeps its synth
        assert_eq!(core.channel_synth[1], 0);
    }

    #[test]
    fn test_seek_restores_channel_mix() {
        let mut core = core_with(vec![
            TimelineEvent::new(1.0, 1, EventKind::Controller { controller: CC_PAN, value: 20 }),
            TimelineEvent::new(2.0, 1, EventKind::Controller { controller: CC_VOLUME, value: 30 }),
            TimelineEvent::new(2.5, 3, EventKind::Controller { controller: CC_EXPRESSION, value: 5 }),
        ]);
        core.dispatch_due(3.0);
        assert_eq!(core.controls[1], [30, 20, 127]);
        assert_eq!(core.controls[3], [100, 64, 5]);

        // Back before the volume change: pan survives, volume returns to default
        core.seek(1.5);
        assert_eq!(core.cursor, 1);
        assert_eq!(core.controls[1], [100, 20, 127]);
        assert_eq!(core.controls[3], DEFAULT_CONTROLS);

        core.seek(0.0);
        assert_eq!(core.controls[1], DEFAULT_CONTROLS);

        core.seek(2.6);
        assert_eq!(core.cursor, 3);
        assert_eq!(core.controls[1], [30, 20, 127]);
        assert_eq!(core.controls[3], [100, 64, 5]);
    }

    #[test]
    fn test_seek_position_is_timeline_time() {
        let mut core = core_with(vec![
            TimelineEvent::new(2.0, 0, EventKind::NoteOn { note: 60, velocity: 100 }),
            TimelineEvent::new(4.0, 0, EventKind::NoteOff { note: 60, velocity: 0 }),
        ]);
        core.seek(2.0);
        let now = seek_frames(2.0) as f64 / SAMPLE_RATE as f64;
        assert!((now - START_DELAY - 2.0).abs() < 1e-3);

        // The event at the sought time is due immediately
        core.dispatch_due(now);
        assert_eq!(core.cursor, 1);
    }

    #[test]
    fn test_seek_while_stopped_cues_position() {
        assert_eq!(PlaybackState::Stopped.after_seek(12.0), PlaybackState::Paused);
        assert_eq!(PlaybackState::Stopped.after_seek(0.0), PlaybackState::Stopped);
        assert_eq!(PlaybackState::Playing.after_seek(12.0), PlaybackState::Playing);
        assert_eq!(PlaybackState::Paused.after_seek(0.0), PlaybackState::Paused);
    }
}
