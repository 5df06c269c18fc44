use serde::{Deserialize, Serialize};

/// One named call argument. Values are raw bytes; text values are UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub key: String,
    #[serde(with = "hex")]
    pub value: Vec<u8>,
}

/// Ordered argument pairs of a contract call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractArgs(Vec<Argument>);

impl ContractArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl AsRef<[u8]>) -> Self {
        self.push(key, value);
        self
    }

    /// Duplicate keys are kept; `get` returns the first.
    pub fn push(&mut self, key: &str, value: impl AsRef<[u8]>) {
        self.0.push(Argument {
            key: key.to_string(),
            value: value.as_ref().to_vec(),
        });
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_slice())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_key() {
        let args = ContractArgs::new().with("pid", "alice").with("pk", [9u8; 32]);
        assert_eq!(args.get_str("pid"), Some("alice"));
        assert_eq!(args.get("pk").map(<[u8]>::len), Some(32));
        assert!(args.get("r").is_none());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn non_utf8_value_is_not_text() {
        let args = ContractArgs::new().with("tid", [0xffu8, 0xfe]);
        assert!(args.get("tid").is_some());
        assert!(args.get_str("tid").is_none());
    }

    #[test]
    fn serializes_values_as_hex() {
        let args = ContractArgs::new().with("tid", "a");
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"[{"key":"tid","value":"61"}]"#);
    }
}
