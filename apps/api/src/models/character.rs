use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identifier assigned by the backend. The backend may send it as a
/// JSON string or number; it is always carried as a string here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
    Uint(u64),
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => RecordId(s),
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Uint(n) => RecordId(n.to_string()),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Float(f64),
    Text(String),
    Null(()),
}

/// Accepts a JSON number or a numeric string. Anything else reads as absent.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match RawInt::deserialize(deserializer)? {
        RawInt::Int(n) => Some(n),
        RawInt::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        RawInt::Text(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A character record as stored by the backend.
///
/// Every displayed field is optional: records written by older clients may
/// lack some of them, and the sheet substitutes placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_user: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub level: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub strength: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub dexterity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub constitution: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub intelligence: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub wisdom: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub charisma: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub hit_points: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub armor_class: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub initiative: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub speed: Option<i64>,
    #[serde(default)]
    pub background: Option<String>,
}

impl Character {
    /// True if the record belongs to the given user.
    pub fn is_owned_by(&self, user_id: &RecordId) -> bool {
        self.id_user.as_ref() == Some(user_id)
    }
}

/// Creation form for a character. `id_user` is filled from the session,
/// never from the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCharacter {
    #[serde(default, skip_deserializing)]
    pub id_user: Option<RecordId>,
    pub name: String,
    pub race: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub level: i64,
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
    pub hit_points: i64,
    pub armor_class: i64,
    pub initiative: i64,
    pub speed: i64,
    #[serde(default)]
    pub background: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub id_character: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub id_character: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub level_spell: Option<i64>,
}
