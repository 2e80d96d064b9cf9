//! Timing of the stages of one exchange

use std::time::{Duration, Instant};

/// A simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Per-stage latencies of one exchange
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExchangeTimings {
    /// Speech recognition time (ms)
    pub stt_ms: Option<u64>,

    /// Time to first streamed fragment (ms)
    pub first_token_ms: Option<u64>,

    /// Total completion time (ms)
    pub completion_ms: Option<u64>,

    /// Speech synthesis time (ms)
    pub tts_ms: Option<u64>,
}

impl ExchangeTimings {
    /// Sum of the recorded stages
    pub fn total_ms(&self) -> u64 {
        [self.stt_ms, self.completion_ms, self.tts_ms]
            .iter()
            .flatten()
            .sum()
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(stt) = self.stt_ms {
            parts.push(format!("STT: {}ms", stt));
        }
        if let Some(ttft) = self.first_token_ms {
            parts.push(format!("TTFT: {}ms", ttft));
        }
        if let Some(llm) = self.completion_ms {
            parts.push(format!("LLM: {}ms", llm));
        }
        if let Some(tts) = self.tts_ms {
            parts.push(format!("TTS: {}ms", tts));
        }
        parts.push(format!("Total: {}ms", self.total_ms()));

        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch() {
        let sw = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(sw.elapsed() >= Duration::from_millis(10));
        assert!(sw.elapsed_ms() >= 10);
    }

    #[test]
    fn test_timings_summary() {
        let timings = ExchangeTimings {
            stt_ms: Some(200),
            first_token_ms: Some(150),
            completion_ms: Some(500),
            tts_ms: Some(100),
        };

        assert_eq!(timings.total_ms(), 800);
        assert_eq!(
            timings.summary(),
            "STT: 200ms | TTFT: 150ms | LLM: 500ms | TTS: 100ms | Total: 800ms"
        );
    }

    #[test]
    fn test_text_only_summary() {
        let timings = ExchangeTimings {
            completion_ms: Some(42),
            ..Default::default()
        };
        assert_eq!(timings.summary(), "LLM: 42ms | Total: 42ms");
    }
}
