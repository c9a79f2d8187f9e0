//! Timeline segmentation into fixed-length chunks.
//!
//! The chunker owns chunk identity: every window gets a fresh unique id at
//! creation, and chunks are immutable once indexed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel transcript value for chunks without detected speech.
pub const NO_SPEECH: &str = "(no speech)";

/// Sentinel caption value for chunks where visual analysis failed.
pub const NO_CAPTION: &str = "Visual analysis unavailable.";

/// A fixed-length time window of the source video with its generated id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Unique chunk id.
    pub id: Uuid,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

impl TimeWindow {
    /// Duration of this window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Mid-point of this window, used for frame sampling.
    pub fn mid_point(&self) -> f64 {
        self.start + (self.end - self.start) / 2.0
    }
}

/// A fully extracted video chunk: one window with its three representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoChunk {
    pub window: TimeWindow,
    /// Transcript text, or [`NO_SPEECH`] when transcription yielded nothing.
    pub transcript: String,
    /// Visual caption text, or [`NO_CAPTION`] when captioning failed.
    pub caption: String,
    /// Visual embedding (dimension Dv); None if the visual step failed.
    pub visual_embedding: Option<Vec<f32>>,
    /// Textual embedding (dimension Dt); None if the textual step failed.
    pub text_embedding: Option<Vec<f32>>,
}

impl VideoChunk {
    /// Deterministic combined text for the textual channel, tagged with the
    /// chunk's time range.
    pub fn combined_text(&self) -> String {
        format!(
            "Time: {}-{}s. Transcript: {}. Visual Scene: {}",
            self.window.start, self.window.end, self.transcript, self.caption
        )
    }
}

/// Splits a video's timeline into fixed-length windows.
pub struct TimelineChunker {
    window_seconds: f64,
}

impl TimelineChunker {
    /// Create a chunker with the given window length in seconds.
    pub fn new(window_seconds: u32) -> Self {
        Self {
            window_seconds: window_seconds as f64,
        }
    }

    /// Produce the window sequence covering `[0, duration)` exactly once.
    ///
    /// Windows are contiguous and non-overlapping; the last window may be
    /// shorter than the configured length. A duration shorter than one window
    /// yields a single window `[0, duration)`.
    pub fn windows(&self, duration: f64) -> impl Iterator<Item = TimeWindow> + '_ {
        let len = self.window_seconds;
        let mut start = 0.0;

        std::iter::from_fn(move || {
            if start >= duration {
                return None;
            }
            let end = (start + len).min(duration);
            let window = TimeWindow {
                id: Uuid::new_v4(),
                start,
                end,
            };
            start += len;
            Some(window)
        })
    }

    /// Number of windows a given duration will produce.
    pub fn window_count(&self, duration: f64) -> usize {
        if duration <= 0.0 {
            0
        } else {
            (duration / self.window_seconds).ceil() as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_coverage() {
        let chunker = TimelineChunker::new(30);
        let windows: Vec<_> = chunker.windows(65.0).collect();

        assert_eq!(windows.len(), 3);
        assert_eq!((windows[0].start, windows[0].end), (0.0, 30.0));
        assert_eq!((windows[1].start, windows[1].end), (30.0, 60.0));
        assert_eq!((windows[2].start, windows[2].end), (60.0, 65.0));

        // Contiguous, non-overlapping
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_even_division() {
        let chunker = TimelineChunker::new(30);
        let windows: Vec<_> = chunker.windows(90.0).collect();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].duration(), 30.0);
        assert_eq!(windows[2].end, 90.0);
    }

    #[test]
    fn test_short_video_single_window() {
        let chunker = TimelineChunker::new(30);
        let windows: Vec<_> = chunker.windows(12.5).collect();

        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (0.0, 12.5));
    }

    #[test]
    fn test_ids_are_unique() {
        let chunker = TimelineChunker::new(30);
        let windows: Vec<_> = chunker.windows(300.0).collect();
        let mut ids: Vec<_> = windows.iter().map(|w| w.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), windows.len());
    }

    #[test]
    fn test_window_count_matches() {
        let chunker = TimelineChunker::new(30);
        for duration in [0.0, 1.0, 29.9, 30.0, 65.0, 90.0, 3600.0] {
            let count = chunker.windows(duration).count();
            assert_eq!(count, chunker.window_count(duration), "duration {duration}");
        }
    }

    #[test]
    fn test_combined_text_is_deterministic() {
        let chunk = VideoChunk {
            window: TimeWindow {
                id: Uuid::new_v4(),
                start: 30.0,
                end: 60.0,
            },
            transcript: "hello".to_string(),
            caption: "a red car".to_string(),
            visual_embedding: None,
            text_embedding: None,
        };

        assert_eq!(
            chunk.combined_text(),
            "Time: 30-60s. Transcript: hello. Visual Scene: a red car"
        );
    }
}
