//! Relationship attributes come back either as bare ids or as expanded
//! documents, depending on query depth. Both collapse to the id.
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RelationRef {
    Id(String),
    Document {
        #[serde(rename = "$id")]
        id: String,
    },
}

impl RelationRef {
    fn into_id(self) -> String {
        match self {
            RelationRef::Id(id) | RelationRef::Document { id } => id,
        }
    }
}

pub(crate) fn one<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RelationRef::deserialize(deserializer).map(RelationRef::into_id)
}

pub(crate) fn many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Option::<Vec<RelationRef>>::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(RelationRef::into_id)
        .collect())
}
