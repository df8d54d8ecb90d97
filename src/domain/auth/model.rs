//! Authentication credentials and modes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{EMobilityAccountId, EMobilityProviderId};
use crate::support::errors::IdParseError;

const MAX_TOKEN_LEN: usize = 64;

/// RFID card UID or similar local token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthToken(String);

impl AuthToken {
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdParseError::Empty { kind: "auth token" });
        }
        if text.len() > MAX_TOKEN_LEN || !text.chars().all(|c| c.is_ascii_graphic()) {
            return Err(IdParseError::malformed("auth token", text));
        }
        Ok(Self(text.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AuthToken {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AuthToken> for String {
    fn from(token: AuthToken) -> Self {
        token.0
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric PIN, 4 to 8 digits
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinCode(String);

impl PinCode {
    pub fn parse(text: &str) -> Result<Self, IdParseError> {
        let text = text.trim();
        if !(4..=8).contains(&text.len()) || !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdParseError::malformed("PIN", "****"));
        }
        Ok(Self(text.to_string()))
    }
}

// Never print the PIN itself
impl fmt::Debug for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PinCode(****)")
    }
}

impl TryFrom<String> for PinCode {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PinCode> for String {
    fn from(pin: PinCode) -> Self {
        pin.0
    }
}

/// Credential presented to start or stop charging
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AuthIdentification {
    AuthToken(AuthToken),
    /// Authorised remotely by the driver's e-mobility provider
    RemoteIdentification(EMobilityAccountId),
    Pin(PinCode),
}

impl AuthIdentification {
    pub fn token(text: &str) -> Result<Self, IdParseError> {
        AuthToken::parse(text).map(Self::AuthToken)
    }

    pub fn remote(text: &str) -> Result<Self, IdParseError> {
        EMobilityAccountId::parse(text).map(Self::RemoteIdentification)
    }
}

impl fmt::Display for AuthIdentification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthToken(token) => write!(f, "token:{token}"),
            Self::RemoteIdentification(account) => write!(f, "remote:{account}"),
            Self::Pin(_) => f.write_str("pin:****"),
        }
    }
}

/// Authentication mode offered by a charging station
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum AuthenticationMode {
    RfidMifareClassic,
    RfidMifareDesFire,
    RfidCalypso,
    Pin,
    /// Remote authorisation, optionally limited to one provider
    RemoteAuth {
        provider: Option<EMobilityProviderId>,
    },
    PlugAndCharge,
    DirectPayment,
}

impl AuthenticationMode {
    pub fn accepts(&self, auth: &AuthIdentification) -> bool {
        match (self, auth) {
            (
                Self::RfidMifareClassic | Self::RfidMifareDesFire | Self::RfidCalypso,
                AuthIdentification::AuthToken(_),
            ) => true,
            (Self::Pin, AuthIdentification::Pin(_)) => true,
            (Self::RemoteAuth { provider: None }, AuthIdentification::RemoteIdentification(_)) => {
                true
            }
            (
                Self::RemoteAuth {
                    provider: Some(provider),
                },
                AuthIdentification::RemoteIdentification(account),
            ) => {
                let owner = account.provider_id();
                owner.country() == provider.country() && owner.code() == provider.code()
            }
            (Self::PlugAndCharge, AuthIdentification::RemoteIdentification(_)) => true,
            _ => false,
        }
    }
}

/// Set of modes a station offers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthenticationModes(Vec<AuthenticationMode>);

impl AuthenticationModes {
    pub fn new(modes: impl IntoIterator<Item = AuthenticationMode>) -> Self {
        let mut unique: Vec<AuthenticationMode> = Vec::new();
        for mode in modes {
            if !unique.contains(&mode) {
                unique.push(mode);
            }
        }
        Self(unique)
    }

    /// RFID and unrestricted remote authorisation
    pub fn standard() -> Self {
        Self::new([
            AuthenticationMode::RfidMifareClassic,
            AuthenticationMode::RfidMifareDesFire,
            AuthenticationMode::RemoteAuth { provider: None },
        ])
    }

    pub fn accepts(&self, auth: &AuthIdentification) -> bool {
        self.0.iter().any(|mode| mode.accepts(auth))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthenticationMode> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_normalised() {
        let token = AuthToken::parse(" 04a2b3c4 ").unwrap();
        assert_eq!(token.as_str(), "04A2B3C4");
        assert!(AuthToken::parse("").is_err());
        assert!(AuthToken::parse("with space").is_err());
        assert!(AuthToken::parse(&"A".repeat(65)).is_err());
    }

    #[test]
    fn pin_is_hidden_in_debug_output() {
        let pin = PinCode::parse("1234").unwrap();
        assert_eq!(format!("{pin:?}"), "PinCode(****)");
        assert_eq!(AuthIdentification::Pin(pin).to_string(), "pin:****");
        assert!(PinCode::parse("12").is_err());
        assert!(PinCode::parse("12ab").is_err());
    }

    #[test]
    fn rfid_modes_accept_tokens_only() {
        let token = AuthIdentification::token("AABBCCDD").unwrap();
        let remote = AuthIdentification::remote("DE-GDF-C12345678").unwrap();
        assert!(AuthenticationMode::RfidMifareClassic.accepts(&token));
        assert!(!AuthenticationMode::RfidMifareClassic.accepts(&remote));
        assert!(AuthenticationMode::PlugAndCharge.accepts(&remote));
        assert!(!AuthenticationMode::DirectPayment.accepts(&token));
    }

    #[test]
    fn remote_auth_can_be_limited_to_a_provider() {
        let gdf = AuthIdentification::remote("DE-GDF-C12345678").unwrap();
        let other = AuthIdentification::remote("DE-ABC-C12345678").unwrap();
        let mode = AuthenticationMode::RemoteAuth {
            provider: Some(EMobilityProviderId::parse("DE*GDF").unwrap()),
        };
        assert!(mode.accepts(&gdf));
        assert!(!mode.accepts(&other));
    }

    #[test]
    fn modes_are_deduplicated() {
        let modes = AuthenticationModes::new([
            AuthenticationMode::Pin,
            AuthenticationMode::Pin,
            AuthenticationMode::DirectPayment,
        ]);
        assert_eq!(modes.iter().count(), 2);
        assert!(modes.accepts(&AuthIdentification::Pin(PinCode::parse("9999").unwrap())));
    }

    #[test]
    fn auth_identification_serde_shape() {
        let auth = AuthIdentification::token("aabb").unwrap();
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["type"], "AuthToken");
        assert_eq!(json["value"], "AABB");
    }
}
