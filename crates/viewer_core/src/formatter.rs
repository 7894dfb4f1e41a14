//! Turns loosely-typed telemetry records into [`Event`]s and display labels.
//!
//! Every "guess the shape" rule lives here: the discriminant lookup, the
//! structural sniffing fallback and the per-category field extraction.

use serde_json::{Map, Value};
use shared::{domain::Category, error::ParseError};

const DISCRIMINANT_FIELDS: [&str; 2] = ["type", "tipo"];

const MOVEMENT_ID: &str = "movimiento_id";
const STATUS_CODE: &str = "status_clave";
const STATUS_TEXT: &str = "status_texto";
const OBSTACLE_CODE: &str = "obstaculo_clave";
const OBSTACLE_TEXT: &str = "obstaculo_texto";
const SEQUENCE_ID: &str = "secuencia_id";
const SEQUENCE_NAME: &str = "nombre";
const MODE: &str = "modo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementEvent {
    pub status_code: Option<String>,
    pub text: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleEvent {
    pub code: Option<String>,
    pub text: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSequenceEvent {
    pub sequence_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Movement(MovementEvent),
    Obstacle(ObstacleEvent),
    DemoSequence(DemoSequenceEvent),
    /// A record nothing recognised; kept so unexpected payloads stay visible.
    Unknown { raw: Value },
}

impl Event {
    pub fn category(&self) -> Option<Category> {
        match self {
            Event::Movement(_) => Some(Category::Movement),
            Event::Obstacle(_) => Some(Category::Obstacle),
            Event::DemoSequence(_) => Some(Category::DemoSequence),
            Event::Unknown { .. } => None,
        }
    }
}

enum Tag {
    Category(Category),
    Discard,
}

fn tag_for(discriminant: &str) -> Option<Tag> {
    match discriminant {
        "movimiento:nuevo" => Some(Tag::Category(Category::Movement)),
        "obstaculo:nuevo" => Some(Tag::Category(Category::Obstacle)),
        "secuencia:demo_creada" | "secuencia:demo_reproducida" => {
            Some(Tag::Category(Category::DemoSequence))
        }
        "hello" | "ping" | "pong" => Some(Tag::Discard),
        _ => None,
    }
}

/// Classifies a raw payload.
///
/// Returns `Ok(None)` for protocol chatter (hello/ping) that carries no
/// event. An explicit discriminant always beats structural sniffing.
pub fn classify(raw: &Value) -> Result<Option<Event>, ParseError> {
    let Value::Object(record) = raw else {
        return Err(ParseError::for_value(raw));
    };

    match discriminant(record).and_then(tag_for) {
        Some(Tag::Discard) => return Ok(None),
        Some(Tag::Category(category)) => return Ok(Some(build(category, record))),
        None => {}
    }

    let event = match sniff(record) {
        Some(category) => build(category, record),
        None => Event::Unknown { raw: raw.clone() },
    };
    Ok(Some(event))
}

/// Builds the event for a record whose category is already known, e.g. a
/// row returned by one of the per-category history endpoints.
pub fn normalize(category: Category, raw: &Value) -> Result<Event, ParseError> {
    match raw {
        Value::Object(record) => Ok(build(category, record)),
        other => Err(ParseError::for_value(other)),
    }
}

pub fn label(event: &Event) -> String {
    match event {
        Event::Movement(movement) => {
            let base = movement.text.clone().unwrap_or_else(|| {
                format!("status {}", movement.status_code.as_deref().unwrap_or("?"))
            });
            with_mode(base, movement.mode.as_deref())
        }
        Event::Obstacle(obstacle) => {
            let base = obstacle
                .text
                .clone()
                .or_else(|| {
                    obstacle
                        .code
                        .as_deref()
                        .and_then(obstacle_text)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    format!("Obstáculo {}", obstacle.code.as_deref().unwrap_or("?"))
                });
            with_mode(base, obstacle.mode.as_deref())
        }
        Event::DemoSequence(sequence) => sequence.name.clone().unwrap_or_else(|| {
            format!(
                "Secuencia #{}",
                sequence.sequence_id.as_deref().unwrap_or("?")
            )
        }),
        Event::Unknown { raw } => escape_html(&raw.to_string()),
    }
}

pub fn obstacle_text(code: &str) -> Option<&'static str> {
    match code.trim().parse::<i64>().ok()? {
        1 => Some("Obstáculo al frente"),
        2 => Some("Obstáculo a la izquierda"),
        3 => Some("Obstáculo a la derecha"),
        4 => Some("Detenido"),
        5 => Some("Retrocede"),
        _ => None,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn with_mode(base: String, mode: Option<&str>) -> String {
    match mode {
        Some(mode) => format!("{base} ({mode})"),
        None => base,
    }
}

fn discriminant(record: &Map<String, Value>) -> Option<&str> {
    DISCRIMINANT_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|tag| !tag.is_empty())
}

fn sniff(record: &Map<String, Value>) -> Option<Category> {
    if is_truthy(record, MOVEMENT_ID) || is_truthy(record, STATUS_CODE) {
        Some(Category::Movement)
    } else if is_truthy(record, OBSTACLE_CODE) {
        Some(Category::Obstacle)
    } else if is_truthy(record, SEQUENCE_ID) || is_truthy(record, SEQUENCE_NAME) {
        Some(Category::DemoSequence)
    } else {
        None
    }
}

fn build(category: Category, record: &Map<String, Value>) -> Event {
    match category {
        Category::Movement => Event::Movement(MovementEvent {
            status_code: code_field(record, STATUS_CODE),
            text: text_field(record, STATUS_TEXT),
            mode: text_field(record, MODE),
        }),
        Category::Obstacle => Event::Obstacle(ObstacleEvent {
            code: code_field(record, OBSTACLE_CODE),
            text: text_field(record, OBSTACLE_TEXT),
            mode: text_field(record, MODE),
        }),
        Category::DemoSequence => Event::DemoSequence(DemoSequenceEvent {
            sequence_id: code_field(record, SEQUENCE_ID),
            name: text_field(record, SEQUENCE_NAME),
        }),
    }
}

/// `null`, `false`, `0` and `""` count as absent.
fn is_truthy(record: &Map<String, Value>, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Codes and ids: any present, non-null value, so `0` still renders.
fn code_field(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Human text: only non-empty strings or numbers.
fn text_field(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/formatter_tests.rs"]
mod tests;
