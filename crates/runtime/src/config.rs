//! Runtime configuration structures and loaders.
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration shared by the frame loop and its channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Wall-clock time between two scheduler ticks.
    pub frame_interval: Duration,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    /// Capacity of the handle command queue.
    pub command_buffer_size: usize,
    /// Stop after this many frames. `None` runs until shutdown.
    pub max_frames: Option<u64>,
    /// Stop once no episode is pending after the first frame.
    pub stop_when_idle: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            event_buffer_size: 256,
            command_buffer_size: 32,
            max_frames: None,
            stop_when_idle: false,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SCENE_FRAME_MS` - Milliseconds between frames (default: 16)
    /// - `SCENE_EVENT_BUFFER` - Event bus capacity per topic (default: 256)
    /// - `SCENE_COMMAND_BUFFER` - Command queue size (default: 32)
    /// - `SCENE_MAX_FRAMES` - Frame budget, unlimited when unset
    /// - `SCENE_STOP_WHEN_IDLE` - Stop once nothing is running: 1/true/yes/on or
    ///   0/false/no/off (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>(&lookup, "SCENE_FRAME_MS") {
            config.frame_interval = Duration::from_millis(ms.max(1));
        }

        if let Some(capacity) = read_env::<usize>(&lookup, "SCENE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>(&lookup, "SCENE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config.max_frames = read_env::<u64>(&lookup, "SCENE_MAX_FRAMES");

        if let Some(stop) = lookup("SCENE_STOP_WHEN_IDLE").and_then(|raw| parse_flag(&raw)) {
            config.stop_when_idle = stop;
        }

        config
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn stop_when_idle(mut self, stop: bool) -> Self {
        self.stop_when_idle = stop;
        self
    }
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}

/// Reads a boolean switch. A bare (empty) variable counts as set.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        assert_eq!(
            RuntimeConfig::from_lookup(lookup(&[])),
            RuntimeConfig::default()
        );
    }

    #[test]
    fn reads_every_variable() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("SCENE_FRAME_MS", "5"),
            ("SCENE_EVENT_BUFFER", "8"),
            ("SCENE_COMMAND_BUFFER", "4"),
            ("SCENE_MAX_FRAMES", "120"),
            ("SCENE_STOP_WHEN_IDLE", "true"),
        ]));

        assert_eq!(config.frame_interval, Duration::from_millis(5));
        assert_eq!(config.event_buffer_size, 8);
        assert_eq!(config.command_buffer_size, 4);
        assert_eq!(config.max_frames, Some(120));
        assert!(config.stop_when_idle);
    }

    #[test]
    fn zero_capacities_are_clamped() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("SCENE_FRAME_MS", "0"),
            ("SCENE_EVENT_BUFFER", "0"),
            ("SCENE_COMMAND_BUFFER", "0"),
        ]));

        assert_eq!(config.frame_interval, Duration::from_millis(1));
        assert_eq!(config.event_buffer_size, 1);
        assert_eq!(config.command_buffer_size, 1);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("SCENE_MAX_FRAMES", "soon"),
            ("SCENE_STOP_WHEN_IDLE", ""),
        ]));

        assert_eq!(config.max_frames, None);
        assert!(config.stop_when_idle);

        let config = RuntimeConfig::from_lookup(lookup(&[("SCENE_STOP_WHEN_IDLE", "maybe")]));
        assert!(!config.stop_when_idle);
    }

    #[test]
    fn zero_and_off_disable_stop_when_idle() {
        for value in ["0", "false", "off", "no", " OFF "] {
            let config = RuntimeConfig::from_lookup(lookup(&[("SCENE_STOP_WHEN_IDLE", value)]));
            assert!(!config.stop_when_idle, "{value:?} should disable");
        }

        for value in ["1", "yes", "on", "TRUE"] {
            let config = RuntimeConfig::from_lookup(lookup(&[("SCENE_STOP_WHEN_IDLE", value)]));
            assert!(config.stop_when_idle, "{value:?} should enable");
        }
    }
}
