use lapin::ExchangeKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The routing algorithm of an exchange.
///
/// `Other` carries broker-specific types such as `x-consistent-hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExchangeType {
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
    Other(String),
}

impl ExchangeType {
    pub fn as_str(&self) -> &str {
        match self {
            ExchangeType::Direct => "direct",
            ExchangeType::Fanout => "fanout",
            ExchangeType::Topic => "topic",
            ExchangeType::Headers => "headers",
            ExchangeType::Other(name) => name,
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExchangeType::from(s))
    }
}

impl From<&str> for ExchangeType {
    fn from(s: &str) -> Self {
        match s {
            "direct" => ExchangeType::Direct,
            "fanout" => ExchangeType::Fanout,
            "topic" => ExchangeType::Topic,
            "headers" => ExchangeType::Headers,
            other => ExchangeType::Other(other.to_string()),
        }
    }
}

impl From<ExchangeType> for ExchangeKind {
    fn from(kind: ExchangeType) -> Self {
        match kind {
            ExchangeType::Direct => ExchangeKind::Direct,
            ExchangeType::Fanout => ExchangeKind::Fanout,
            ExchangeType::Topic => ExchangeKind::Topic,
            ExchangeType::Headers => ExchangeKind::Headers,
            ExchangeType::Other(name) => ExchangeKind::Custom(name),
        }
    }
}

impl Serialize for ExchangeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExchangeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ExchangeType::from(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types() {
        assert_eq!(ExchangeType::from("direct"), ExchangeType::Direct);
        assert_eq!(ExchangeType::from("fanout"), ExchangeType::Fanout);
        assert_eq!(ExchangeType::from("topic"), ExchangeType::Topic);
        assert_eq!(ExchangeType::from("headers"), ExchangeType::Headers);
    }

    #[test]
    fn unknown_types_are_kept_verbatim() {
        let kind = ExchangeType::from("x-consistent-hash");
        assert_eq!(kind, ExchangeType::Other("x-consistent-hash".to_string()));
        assert_eq!(kind.to_string(), "x-consistent-hash");
    }

    #[test]
    fn defaults_to_direct() {
        assert_eq!(ExchangeType::default(), ExchangeType::Direct);
    }

    #[test]
    fn converts_to_lapin_kind() {
        assert!(matches!(ExchangeKind::from(ExchangeType::Topic), ExchangeKind::Topic));
        match ExchangeKind::from(ExchangeType::Other("x-delayed-message".into())) {
            ExchangeKind::Custom(name) => assert_eq!(name, "x-delayed-message"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn serde_uses_plain_strings() {
        let kind: ExchangeType = serde_json::from_str("\"fanout\"").unwrap();
        assert_eq!(kind, ExchangeType::Fanout);
        assert_eq!(serde_json::to_string(&ExchangeType::Headers).unwrap(), "\"headers\"");
    }
}
