//! Provider block settings with environment fallbacks

use crate::api::{Client, ClientConfig};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER";
pub const ENV_INSECURE: &str = "AWS_INSECURE";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSettings {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub insecure: bool,
    pub timeout_seconds: Option<u64>,
}

impl ProviderSettings {
    /// Values from the provider block win over the environment
    pub fn from_config(config: &DynamicValue) -> Result<Self, Diagnostic> {
        let region = config_string(config, "region")?
            .or_else(|| env_string(ENV_REGION))
            .or_else(|| env_string(ENV_DEFAULT_REGION));
        let endpoint = config_string(config, "endpoint")?.or_else(|| env_string(ENV_ENDPOINT));
        let insecure = config
            .get_optional_bool(&AttributePath::new("insecure"))
            .map_err(|e| invalid_attribute("insecure", e))?
            .or_else(|| env_string(ENV_INSECURE).and_then(|v| v.parse::<bool>().ok()))
            .unwrap_or(false);
        let timeout_seconds = config
            .get_optional_number(&AttributePath::new("timeout_seconds"))
            .map_err(|e| invalid_attribute("timeout_seconds", e))?
            .map(|n| n as u64);

        Ok(Self {
            region,
            endpoint,
            insecure,
            timeout_seconds,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout_seconds: self.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            insecure: self.insecure,
        }
    }

    /// An explicit endpoint takes precedence over the regional one
    pub fn build_client(&self) -> Result<Client, Diagnostic> {
        let result = match (&self.endpoint, &self.region) {
            (Some(endpoint), _) => Client::with_config(endpoint, self.client_config()),
            (None, Some(region)) => Client::for_region(region, self.client_config()),
            (None, None) => {
                return Err(Diagnostic::error(
                    "region is required",
                    format!(
                        "Set region in the provider configuration or the {} environment variable, \
                         or point endpoint at a Cognito-compatible service",
                        ENV_REGION
                    ),
                ))
            }
        };

        result.map_err(|e| Diagnostic::error("Failed to create API client", e.to_string()))
    }
}

fn config_string(config: &DynamicValue, name: &str) -> Result<Option<String>, Diagnostic> {
    Ok(config
        .get_optional_string(&AttributePath::new(name))
        .map_err(|e| invalid_attribute(name, e))?
        .filter(|s| !s.is_empty()))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn invalid_attribute(name: &str, err: tfplug::TfplugError) -> Diagnostic {
    Diagnostic::error(format!("Invalid {}", name), err.to_string())
        .with_attribute(AttributePath::new(name))
}
