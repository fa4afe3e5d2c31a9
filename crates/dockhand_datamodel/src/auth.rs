use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Registry used when a descriptor does not name one.
pub const DEFAULT_REGISTRY: &str = "https://index.docker.io/v1";

/// Credentials for authenticated registry operations. The Engine expects
/// them base64-encoded as JSON in the `X-Registry-Auth` request header,
/// with exactly these lowercase keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    pub serveraddress: String,
    pub email: String,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            serveraddress: DEFAULT_REGISTRY.to_owned(),
            email: String::new(),
        }
    }
}

impl RegistryAuth {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            serveraddress: DEFAULT_REGISTRY.to_owned(),
            email: email.into(),
        }
    }

    pub fn with_registry(mut self, serveraddress: impl Into<String>) -> Self {
        self.serveraddress = serveraddress.into();
        self
    }

    /// Value for the `X-Registry-Auth` header: base64 over the JSON body.
    pub fn header_value(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(STANDARD.encode(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_is_base64_json() {
        let auth = RegistryAuth::new("ishmael", "call-me", "ishmael@pequod.sea");
        let header = auth.header_value().unwrap();

        let decoded = STANDARD.decode(header).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

        assert_eq!(json["username"], "ishmael");
        assert_eq!(json["password"], "call-me");
        assert_eq!(json["serveraddress"], DEFAULT_REGISTRY);
        assert_eq!(json["email"], "ishmael@pequod.sea");
    }

    #[test]
    fn default_points_at_public_registry() {
        let auth = RegistryAuth::default();
        assert_eq!(auth.serveraddress, "https://index.docker.io/v1");
    }
}
