use anyhow::Result;
use ctrlf_core::{MarkerObservation, Selection};
use ctrlf_session::SessionEvent;
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path, time::Duration};

#[derive(Debug, Deserialize)]
struct EventScriptFile {
    steps: Vec<EventScriptStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct EventScriptStepDef {
    #[serde(default)]
    at_ms: u64,
    event: ScriptedEvent,
}

/// Recorded input, as written in script files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptedEvent {
    Marker(MarkerObservation),
    Select {
        #[serde(default)]
        name: Option<String>,
    },
    Reset,
}

impl ScriptedEvent {
    fn into_session_event(self) -> SessionEvent {
        match self {
            Self::Marker(observation) => SessionEvent::AnchorObserved(observation),
            Self::Select { name } => {
                SessionEvent::SelectionChanged(Selection::from_search(name.as_deref()))
            }
            Self::Reset => SessionEvent::Reset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub at: Duration,
    pub event: SessionEvent,
}

/// Replays recorded marker detections and selection changes.
///
/// Scripts are a list of `{at_ms, event}` steps, executed in file order.
#[derive(Debug)]
pub struct EventScript {
    pending: VecDeque<ScriptStep>,
}

impl EventScript {
    /// Load an event script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Load an event script from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: EventScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("event script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_at: Option<u64> = None;
        for step in file.steps {
            if let Some(prev) = last_at {
                if step.at_ms < prev {
                    anyhow::bail!("event script steps must be sorted by at_ms");
                }
            }
            last_at = Some(step.at_ms);

            pending.push_back(ScriptStep {
                at: Duration::from_millis(step.at_ms),
                event: step.event.into_session_event(),
            });
        }

        Ok(Self { pending })
    }

    /// Offset of the next pending step from the start of the replay.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.front().map(|step| step.at)
    }

    /// Drain and return all events scheduled at or before `elapsed`.
    pub fn drain_ready(&mut self, elapsed: Duration) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while self.pending.front().is_some_and(|step| step.at <= elapsed) {
            if let Some(step) = self.pending.pop_front() {
                events.push(step.event);
            }
        }
        events
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlf_core::DVec3;

    #[test]
    fn event_script_rejects_unsorted_steps() {
        let json = r#"{
            "steps": [
                {"at_ms": 20, "event": {"type": "reset"}},
                {"at_ms": 10, "event": {"type": "reset"}}
            ]
        }"#;
        let err = EventScript::from_str(json).unwrap_err();
        assert!(
            err.to_string().contains("sorted by at_ms"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn event_script_rejects_empty_steps() {
        let err = EventScript::from_str(r#"{"steps": []}"#).unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn event_script_drains_in_order() {
        let json = r#"{
            "steps": [
                {"at_ms": 0, "event": {"type": "select", "name": "keys"}},
                {"at_ms": 0, "event": {"type": "marker", "payload": "ctrlF_app", "position": [0, 0, 0]}},
                {"at_ms": 50, "event": {"type": "marker", "payload": "ctrlF_app"}},
                {"at_ms": 100, "event": {"type": "select"}},
                {"at_ms": 150, "event": {"type": "reset"}}
            ]
        }"#;
        let mut script = EventScript::from_str(json).expect("script should parse");
        assert_eq!(script.next_due(), Some(Duration::ZERO));

        assert_eq!(
            script.drain_ready(Duration::ZERO),
            vec![
                SessionEvent::SelectionChanged(Selection::Named("keys".into())),
                SessionEvent::AnchorObserved(MarkerObservation::at("ctrlF_app", DVec3::ZERO)),
            ]
        );
        assert!(script.drain_ready(Duration::from_millis(49)).is_empty());
        assert_eq!(
            script.drain_ready(Duration::from_millis(100)),
            vec![
                SessionEvent::AnchorObserved(MarkerObservation {
                    payload: "ctrlF_app".into(),
                    position: None,
                }),
                SessionEvent::SelectionChanged(Selection::All),
            ]
        );
        assert_eq!(
            script.drain_ready(Duration::from_secs(1)),
            vec![SessionEvent::Reset]
        );
        assert!(script.is_finished());
        assert_eq!(script.next_due(), None);
    }
}
