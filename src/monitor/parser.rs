//! Block-format listing parser
//!
//! The listing command prints one multi-line block per service. Each line of
//! interest carries a field marker; everything else is noise. Grammar:
//!
//! ```text
//! name / pid / type marker  -> store field value in the in-progress buffer
//! state marker              -> classify value, emit buffered record, reset
//! any other line            -> ignored
//! ```
//!
//! Marker detection is substring containment so indentation and surrounding
//! decoration do not matter. The synonym tables below carry the known locale
//! variants; adding a platform or locale means adding a marker string, not a
//! new conditional.

use super::inventory::{ServiceRecord, ServiceState};

const NAME_MARKERS: [&str; 3] = ["NOMBRE_DE_SERVICIO:", "NOMBRE_SERVICIO:", "SERVICE_NAME:"];
const PID_MARKERS: [&str; 1] = ["PID"];
const TYPE_MARKERS: [&str; 2] = ["TIPO", "TYPE"];
const STATE_MARKERS: [&str; 2] = ["ESTADO", "STATE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Name,
    Pid,
    Type,
    State,
}

/// First marker whose substring appears in the line. Markers are checked in
/// field order; the tables use spellings that do not overlap across concepts,
/// so a state line can never be mistaken for a name line or vice versa.
fn classify_line(line: &str) -> Option<Marker> {
    if NAME_MARKERS.iter().any(|marker| line.contains(marker)) {
        Some(Marker::Name)
    } else if PID_MARKERS.iter().any(|marker| line.contains(marker)) {
        Some(Marker::Pid)
    } else if TYPE_MARKERS.iter().any(|marker| line.contains(marker)) {
        Some(Marker::Type)
    } else if STATE_MARKERS.iter().any(|marker| line.contains(marker)) {
        Some(Marker::State)
    } else {
        None
    }
}

fn field_value(line: &str) -> Option<String> {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn classify_state(value: Option<&str>) -> ServiceState {
    match value {
        Some(value) if value.contains("RUNNING") => ServiceState::Running,
        Some(value) if value.contains("STOPPED") => ServiceState::Stopped,
        _ => ServiceState::Failed,
    }
}

#[derive(Debug, Default)]
struct RecordBuffer {
    name: Option<String>,
    pid: Option<String>,
    service_type: Option<String>,
}

impl RecordBuffer {
    /// Emit with whatever fields accumulated since the last emission, then
    /// reset. A missing name becomes a blank one.
    fn emit(&mut self, state: ServiceState) -> ServiceRecord {
        ServiceRecord {
            name: self.name.take().unwrap_or_default(),
            state,
            pid: self.pid.take(),
            service_type: self.service_type.take(),
        }
    }
}

pub fn parse(raw: &str) -> Vec<ServiceRecord> {
    let mut records = Vec::new();
    let mut buffer = RecordBuffer::default();

    for line in raw.lines() {
        match classify_line(line) {
            Some(Marker::Name) => buffer.name = field_value(line),
            Some(Marker::Pid) => buffer.pid = field_value(line),
            Some(Marker::Type) => buffer.service_type = field_value(line),
            Some(Marker::State) => {
                let value = field_value(line);
                let state = classify_state(value.as_deref());
                records.push(buffer.emit(state));
            }
            None => {}
        }
    }

    records
}
