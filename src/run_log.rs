use std::time::Instant;
use serde::{Serialize, Deserialize};

use crate::grid::Coord;

/// Simulation events worth keeping after a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A planner was built against a loaded map
    Started { algorithm: String, rows: usize, cols: usize, start: Coord, reward: Coord },
    /// One tick finished with the agent at `cell`
    Tick { tick: usize, cell: Coord, status: String },
    /// Q-Learning began a new episode at `cell`
    EpisodeRestarted { episode: usize, cell: Coord },
    /// Q-Learning switched from training to testing
    TrainingFinished { episode: usize },
    /// A best path became available
    PathReady { path: Vec<Coord> },
    /// The driver stopped ticking
    Stopped { ticks: usize, reason: String },
}

/// Logged event with timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub event: RunEvent,
}

/// Run logger
pub struct RunLog {
    start_time: Instant,
    events: Vec<LoggedEvent>,
}

impl RunLog {
    pub fn new() -> Self {
        RunLog {
            start_time: Instant::now(),
            events: Vec::new(),
        }
    }

    /// Log an event with current timestamp
    pub fn log(&mut self, event: RunEvent) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.events.push(LoggedEvent { timestamp_ms, event });
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut ticks = 0;
        let mut episodes = 0;
        let mut path_len = None;
        let mut stop_reason = None;

        for logged in &self.events {
            match &logged.event {
                RunEvent::Tick { .. } => ticks += 1,
                RunEvent::EpisodeRestarted { .. } => episodes += 1,
                RunEvent::PathReady { path } => path_len = Some(path.len()),
                RunEvent::Stopped { reason, .. } => stop_reason = Some(reason.clone()),
                _ => {}
            }
        }

        let duration = self.events.last().map(|e| e.timestamp_ms).unwrap_or(0);

        format!(
            "Run Duration: {}ms\n\
             Ticks: {}, Episode restarts: {}\n\
             Best path: {}\n\
             Stopped: {}",
            duration,
            ticks,
            episodes,
            path_len.map(|n| format!("{} cells", n)).unwrap_or_else(|| "none".to_string()),
            stop_reason.unwrap_or_else(|| "still running".to_string()),
        )
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}
