//! JSON:API documents exchanged with the `/dois` endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// DataCite metadata attributes (creators, titles, types, ...). The schema is
/// owned by DataCite, so this stays an untyped JSON object.
pub type Metadata = Map<String, Value>;

/// Lifecycle transition requested alongside a POST to `/dois`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    /// Make the DOI findable.
    Publish,
    /// Register the DOI without listing it in search.
    Register,
    /// Move a findable DOI back to registered.
    Hide,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Publish => "publish",
            Event::Register => "register",
            Event::Hide => "hide",
        }
    }
}

/// Top level `{"data": {...}}` document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub data: DoiRecord,
}

/// A DOI resource as returned by `GET /dois/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DoiRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Metadata,
}

impl DoiRecord {
    pub fn from_attributes(attributes: Metadata) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    /// The DOI, preferring the resource id over the `doi` attribute.
    pub fn doi(&self) -> Option<&str> {
        self.id.as_deref().or_else(|| self.attribute("doi"))
    }

    /// Landing page the DOI resolves to.
    pub fn url(&self) -> Option<&str> {
        self.attribute("url")
    }

    /// `draft`, `registered` or `findable`.
    pub fn state(&self) -> Option<&str> {
        self.attribute("state")
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

impl Envelope {
    pub fn new(attributes: Metadata) -> Self {
        Self {
            data: DoiRecord::from_attributes(attributes),
        }
    }
}
