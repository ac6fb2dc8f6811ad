use serde::Deserialize;

use super::coerce;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    #[serde(default, deserialize_with = "coerce::lenient_string")]
    pub name: String,
}
