use anyhow::{Context, Result};
use rand::Rng;
use rodio::Source;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::world::EntityId;

/// Decoded clip metadata. Sample playback belongs to the host engine; the
/// core only needs enough to persist, schedule and describe emitters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub channels: u16,
    pub sample_rate: u32,
    pub duration: Duration,
}

impl AudioClip {
    pub fn decode_wav(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Opening audio file {}", path.display()))?;
        let decoder = rodio::Decoder::new(BufReader::new(file))
            .with_context(|| format!("Decoding audio clip {}", path.display()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let duration = decoder.total_duration().unwrap_or(Duration::ZERO);
        Ok(Self { channels, sample_rate, duration })
    }
}

/// Bookkeeping list of audio entities currently in the scene. Mutations are
/// tolerant: unknown ids and an empty registry are no-ops, never faults.
#[derive(Debug, Default)]
pub struct AudioRegistry {
    tracked: Vec<EntityId>,
}

impl AudioRegistry {
    pub fn add(&mut self, id: EntityId) {
        if !self.tracked.contains(&id) {
            self.tracked.push(id);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.tracked.retain(|tracked| *tracked != id);
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.tracked.contains(&id)
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechCue {
    pub clip_index: usize,
    pub start: Duration,
}

/// Guided-speech playlist for play mode: clips run in order with a fixed
/// pause after each one.
#[derive(Debug, Clone)]
pub struct SpeechPlaylist {
    clips: Vec<Duration>,
    gap: Duration,
}

impl SpeechPlaylist {
    pub fn new(clips: Vec<Duration>, gap: Duration) -> Self {
        Self { clips, gap }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn timeline(&self) -> Vec<SpeechCue> {
        let mut cues = Vec::with_capacity(self.clips.len());
        let mut start = Duration::ZERO;
        for (clip_index, clip) in self.clips.iter().enumerate() {
            cues.push(SpeechCue { clip_index, start });
            start += *clip + self.gap;
        }
        cues
    }

    pub fn total_duration(&self) -> Duration {
        self.clips.iter().map(|clip| *clip + self.gap).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbienceCue {
    pub delay: Duration,
    pub volume: f32,
}

/// Randomized re-trigger window for ambient emitters: each roll yields the
/// next playback delay and a fresh volume.
#[derive(Debug, Clone, Copy)]
pub struct AmbienceTimer {
    pub min_delay: f32,
    pub max_delay: f32,
}

impl AmbienceTimer {
    pub fn roll(&self, rng: &mut impl Rng) -> AmbienceCue {
        let delay = rng.gen_range(self.min_delay..self.max_delay);
        let volume = rng.gen_range(0.1_f32..1.0);
        AmbienceCue { delay: Duration::from_secs_f32(delay), volume }
    }
}

impl Default for AmbienceTimer {
    fn default() -> Self {
        Self { min_delay: 7.0, max_delay: 15.0 }
    }
}
