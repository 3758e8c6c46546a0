//! JSON-lines metrics sink.
//!
//! Every finished episode becomes one line on the wrapped writer, tagged
//! with the instance that produced it. Event firings are written as they
//! happen so a consumer can follow them live.

use std::io::Write;

use homeostat_core::{EpisodeSummary, MetricsSink};
use homeostat_types::{Action, ResourceKind};
use serde::Serialize;
use tracing::warn;

/// One output line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    /// A finished episode.
    Episode {
        instance: u32,
        #[serde(flatten)]
        summary: &'a EpisodeSummary,
    },
    /// An event-bus firing.
    Event {
        instance: u32,
        episode: u32,
        tag: &'a str,
    },
}

/// Writes episode summaries and event firings as JSON lines.
pub struct JsonLinesSink<W> {
    instance: u32,
    episode: u32,
    writer: W,
    failed_writes: u32,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink for `instance` writing to `writer`.
    pub const fn new(instance: u32, writer: W) -> Self {
        Self {
            instance,
            episode: 0,
            writer,
            failed_writes: 0,
        }
    }

    fn emit(&mut self, line: &Line<'_>) {
        let result = serde_json::to_string(line)
            .map_err(std::io::Error::other)
            .and_then(|mut text| {
                text.push('\n');
                // One write per line keeps lines from different
                // instances whole on a shared stdout.
                self.writer.write_all(text.as_bytes())?;
                self.writer.flush()
            });
        if let Err(error) = result {
            self.failed_writes = self.failed_writes.saturating_add(1);
            warn!(
                instance = self.instance,
                failed_writes = self.failed_writes,
                %error,
                "Failed to write metrics line"
            );
        }
    }
}

impl<W: Write + Send> MetricsSink for JsonLinesSink<W> {
    fn episode_begin(&mut self, episode: u32) {
        self.episode = episode;
    }

    fn record_action(&mut self, _tick: u64, _action: Action) {}

    fn record_consumption(&mut self, _kind: ResourceKind) {}

    fn record_collision(&mut self, _damage: f64) {}

    fn record_event(&mut self, tag: &str) {
        let line = Line::Event {
            instance: self.instance,
            episode: self.episode,
            tag,
        };
        self.emit(&line);
    }

    fn episode_end(&mut self, summary: &EpisodeSummary) {
        let line = Line::Episode {
            instance: self.instance,
            summary,
        };
        self.emit(&line);
    }
}
