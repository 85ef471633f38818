use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Deserialize an optional boolean query parameter. Query values always
/// arrive as strings, and flattened param structs buffer them as such,
/// so "true"/"false" are parsed here; empty strings are `None`.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref() {
        None | Some("") => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean: {}",
            other
        ))),
    }
}

/// Deserialize an optional UUID query parameter, treating empty strings as
/// `None` instead of a parse failure.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        school_id: Option<Uuid>,
    }

    #[test]
    fn test_empty_string_is_none() {
        let params: Params = serde_json::from_str(r#"{"school_id":""}"#).unwrap();
        assert!(params.school_id.is_none());
    }

    #[test]
    fn test_valid_uuid_parses() {
        let id = Uuid::new_v4();
        let params: Params =
            serde_json::from_str(&format!(r#"{{"school_id":"{}"}}"#, id)).unwrap();
        assert_eq!(params.school_id, Some(id));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(serde_json::from_str::<Params>(r#"{"school_id":"not-a-uuid"}"#).is_err());
    }

    #[derive(Deserialize)]
    struct BoolParams {
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        include_deleted: Option<bool>,
    }

    #[test]
    fn test_bool_parses_from_query_strings() {
        let params: BoolParams = serde_json::from_str(r#"{"include_deleted":"true"}"#).unwrap();
        assert_eq!(params.include_deleted, Some(true));

        let params: BoolParams = serde_json::from_str(r#"{"include_deleted":"false"}"#).unwrap();
        assert_eq!(params.include_deleted, Some(false));

        let params: BoolParams = serde_json::from_str(r#"{"include_deleted":""}"#).unwrap();
        assert_eq!(params.include_deleted, None);

        assert!(serde_json::from_str::<BoolParams>(r#"{"include_deleted":"yes"}"#).is_err());
    }
}
