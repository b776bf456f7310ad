/// Character records as served by the public character API.
///
/// Only the fields the game shows are decoded; everything else in the
/// payload (episodes, location, timestamps) is ignored.

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub origin: Origin,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Origin {
    #[serde(default)]
    pub name: String,
}

impl Character {
    /// Hints in reveal order: species first, origin last.
    /// Empty and "unknown" values are skipped.
    pub fn hints(&self) -> Vec<(&'static str, &str)> {
        [
            ("Species", self.species.as_str()),
            ("Status", self.status.as_str()),
            ("Origin", self.origin.name.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty() && !v.eq_ignore_ascii_case("unknown"))
        .collect()
    }
}

/// The batch endpoint answers with an array, except when asked for a
/// single id, where it answers with a bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Batch {
    Many(Vec<Character>),
    One(Character),
}

/// Decode a batch payload, normalizing a single object to a one-element list.
pub fn decode_batch(body: &str) -> Result<Vec<Character>, serde_json::Error> {
    let batch: Batch = serde_json::from_str(body)?;
    Ok(match batch {
        Batch::Many(list) => list,
        Batch::One(c) => vec![c],
    })
}
