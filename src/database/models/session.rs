use chrono::{DateTime, Utc};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    InPerson,
    Telehealth,
}

text_enum!(SessionType, "session type", {
    InPerson => "in_person",
    Telehealth => "telehealth",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

text_enum!(SessionStatus, "session status", {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub video_room_sid: Option<String>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub session_type: SessionType,
    pub created_by: Uuid,
}

/// Structured note layouts. Each has a fixed, ordered list of text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    FreeForm,
    Soap,
    Birp,
    Dap,
    Pirp,
    Girp,
}

text_enum!(TemplateType, "template type", {
    FreeForm => "free_form",
    Soap => "soap",
    Birp => "birp",
    Dap => "dap",
    Pirp => "pirp",
    Girp => "girp",
});

impl TemplateType {
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            TemplateType::FreeForm => &["content"],
            TemplateType::Soap => &["subjective", "objective", "assessment", "plan"],
            TemplateType::Birp => &["behavior", "intervention", "response", "plan"],
            TemplateType::Dap => &["data", "assessment", "plan"],
            TemplateType::Pirp => &["problem", "intervention", "response", "plan"],
            TemplateType::Girp => &["goals", "intervention", "response", "plan"],
        }
    }
}

/// Note body as `(field, text)` pairs. Serializes as a JSON object whose keys
/// keep insertion order, so a normalized note reads in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteContent(Vec<(String, String)>);

impl NoteContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == field).map(|(_, v)| v.as_str())
    }

    /// Replaces the value of an existing field in place, appends otherwise
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == field) {
            Some(entry) => entry.1 = value,
            None => self.0.push((field, value)),
        }
    }

    /// Template fields first, in template order, then any other fields as they were.
    /// JSONB does not keep key order, so rows read back from Postgres pass through here.
    pub fn in_template_order(self, template: TemplateType) -> Self {
        let fields = template.fields();
        let (mut ordered, rest): (Vec<_>, Vec<_>) = self
            .0
            .into_iter()
            .partition(|(k, _)| fields.contains(&k.as_str()));
        ordered.sort_by_key(|(k, _)| fields.iter().position(|f| *f == k.as_str()));
        ordered.extend(rest);
        Self(ordered)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NoteContent {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut content = NoteContent::new();
        for (k, v) in iter {
            content.insert(k, v);
        }
        content
    }
}

impl Serialize for NoteContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct NoteContentVisitor;

impl<'de> Visitor<'de> for NoteContentVisitor {
    type Value = NoteContent;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of note field names to text")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut content = NoteContent::new();
        while let Some((k, v)) = access.next_entry::<String, String>()? {
            content.insert(k, v);
        }
        Ok(content)
    }
}

impl<'de> Deserialize<'de> for NoteContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NoteContentVisitor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionNote {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub session_id: Option<Uuid>,
    pub template_type: TemplateType,
    pub content: NoteContent,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSessionNote {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub session_id: Option<Uuid>,
    pub template_type: TemplateType,
    pub content: NoteContent,
    pub created_by: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_fields() {
        for template in TemplateType::ALL {
            assert!(!template.fields().is_empty(), "{template} has no fields");
        }
        assert_eq!(TemplateType::Dap.fields(), &["data", "assessment", "plan"]);
    }

    #[test]
    fn note_content_serializes_in_insertion_order() {
        let content: NoteContent = [("subjective", "a"), ("objective", "b"), ("assessment", "c"), ("plan", "d")]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&content).unwrap(),
            r#"{"subjective":"a","objective":"b","assessment":"c","plan":"d"}"#
        );

        let parsed: NoteContent = serde_json::from_str(r#"{"plan":"x","behavior":"y"}"#).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["plan", "behavior"]);
    }

    #[test]
    fn reordering_follows_the_template() {
        let scrambled: NoteContent = [("plan", "p"), ("extra", "e"), ("behavior", "b"), ("response", "r")]
            .into_iter()
            .collect();
        let ordered = scrambled.in_template_order(TemplateType::Birp);
        assert_eq!(ordered.keys().collect::<Vec<_>>(), vec!["behavior", "response", "plan", "extra"]);
        assert_eq!(ordered.get("plan"), Some("p"));
    }

    #[test]
    fn template_names_round_trip_through_text() {
        assert_eq!("girp".parse::<TemplateType>().unwrap(), TemplateType::Girp);
        assert_eq!(TemplateType::FreeForm.as_str(), "free_form");
        assert!("sbar".parse::<TemplateType>().is_err());
    }
}
