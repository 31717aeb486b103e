//! Account metadata held by the registry

use std::fmt;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::PasswordHash;

/// Display name of an account: free text or a structured JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountLabel {
    /// Plain display name
    Plain(String),
    /// Structured metadata; its `name` field (if any) is the display name
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl AccountLabel {
    /// Human-readable name
    pub fn display_name(&self) -> &str {
        match self {
            AccountLabel::Plain(name) => name,
            AccountLabel::Structured(info) => info
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default(),
        }
    }
}

impl Default for AccountLabel {
    fn default() -> Self {
        AccountLabel::Plain(String::new())
    }
}

impl From<&str> for AccountLabel {
    fn from(name: &str) -> Self {
        AccountLabel::Plain(name.to_string())
    }
}

impl From<String> for AccountLabel {
    fn from(name: String) -> Self {
        AccountLabel::Plain(name)
    }
}

impl fmt::Display for AccountLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account address
    pub address: Address,
    /// Identifier of the secret record
    pub id: Uuid,
    /// Display name
    pub label: AccountLabel,
    /// Salted hash of the account password; `None` when unknown
    pub password_hash: Option<PasswordHash>,
    /// Hint shown when asking for the password
    #[serde(default)]
    pub password_hint: String,
}

/// Lookup key for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRef {
    Address(Address),
    Id(Uuid),
}

impl From<Address> for AccountRef {
    fn from(address: Address) -> Self {
        AccountRef::Address(address)
    }
}

impl From<Uuid> for AccountRef {
    fn from(id: Uuid) -> Self {
        AccountRef::Id(id)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Address(address) => write!(f, "{}", address),
            AccountRef::Id(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_untagged_serde() {
        let plain: AccountLabel = serde_json::from_value(json!("Alice")).unwrap();
        assert_eq!(plain, AccountLabel::Plain("Alice".to_string()));

        let structured: AccountLabel =
            serde_json::from_value(json!({"name": "Bob", "color": "blue"})).unwrap();
        assert!(matches!(structured, AccountLabel::Structured(_)));
        assert_eq!(structured.display_name(), "Bob");

        assert_eq!(serde_json::to_value(&plain).unwrap(), json!("Alice"));
    }

    #[test]
    fn test_structured_without_name() {
        let label: AccountLabel = serde_json::from_value(json!({"tag": 1})).unwrap();
        assert_eq!(label.display_name(), "");
        assert_eq!(label.to_string(), "");
    }

    #[test]
    fn test_account_serde_roundtrip() {
        let account = Account {
            address: Address::repeat_byte(0x11),
            id: Uuid::new_v4(),
            label: "Alice".into(),
            password_hash: None,
            password_hint: "pet name".to_string(),
        };

        let json = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, account);
    }

    #[test]
    fn test_account_ref_conversions() {
        let addr = Address::repeat_byte(0x22);
        let id = Uuid::new_v4();
        assert_eq!(AccountRef::from(addr), AccountRef::Address(addr));
        assert_eq!(AccountRef::from(id), AccountRef::Id(id));
        assert_eq!(AccountRef::Id(id).to_string(), id.to_string());
    }
}
