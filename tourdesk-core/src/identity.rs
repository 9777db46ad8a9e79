use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-local traveler key handed to the dashboard. Never sent to the backend.
///
/// The generation is bumped on every booking-list fetch, so an id issued by an earlier
/// fetch can never be mistaken for one issued by the current fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EphemeralId {
    generation: u64,
    index: u32,
}

impl EphemeralId {
    pub fn new(generation: u64, index: u32) -> Self {
        Self { generation, index }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for EphemeralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.generation, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed traveler key: {0}")]
pub struct ParseEphemeralIdError(pub String);

impl FromStr for EphemeralId {
    type Err = ParseEphemeralIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (generation, index) = s
            .split_once('-')
            .ok_or_else(|| ParseEphemeralIdError(s.to_string()))?;
        let generation = generation
            .parse()
            .map_err(|_| ParseEphemeralIdError(s.to_string()))?;
        let index = index
            .parse()
            .map_err(|_| ParseEphemeralIdError(s.to_string()))?;
        Ok(Self { generation, index })
    }
}

impl From<EphemeralId> for String {
    fn from(id: EphemeralId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EphemeralId {
    type Error = ParseEphemeralIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = EphemeralId::new(3, 17);
        assert_eq!(id.to_string(), "3-17");
        assert_eq!("3-17".parse::<EphemeralId>().unwrap(), id);
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!("317".parse::<EphemeralId>().is_err());
        assert!("a-1".parse::<EphemeralId>().is_err());
        assert!("1-".parse::<EphemeralId>().is_err());
        assert!("-1-2".parse::<EphemeralId>().is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = EphemeralId::new(2, 0);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"2-0\"");
        let back: EphemeralId = serde_json::from_str("\"2-0\"").unwrap();
        assert_eq!(back, id);
    }
}
