//! LLM provider registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ChatRpcError, Precondition, Result};
use crate::registry::ConnectionReport;
use crate::rpc::RpcClient;
use crate::session::flight::FlightGuard;

/// JSON-RPC method names of the provider registry.
pub mod methods {
    pub const GET_PROVIDERS: &str = "llm.get_providers";
    pub const GET_PROVIDER_MODELS: &str = "llm.get_provider_models";
    pub const CREATE_PROVIDER: &str = "llm.create_provider";
    pub const UPDATE_PROVIDER: &str = "llm.update_provider";
    pub const DELETE_PROVIDER: &str = "llm.delete_provider";
    pub const TEST_PROVIDER_CONNECTION: &str = "llm.test_provider_connection";
    pub const SEND_MESSAGE: &str = "llm.send_message";
}

/// Connection state of a cached provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    /// Never tested
    #[default]
    Unknown,
    /// A connection test is running
    Testing,
    /// The last test succeeded
    Available,
    /// The last test failed
    Error,
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderStatus::Unknown => "unknown",
            ProviderStatus::Testing => "testing",
            ProviderStatus::Available => "available",
            ProviderStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A configured LLM backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(rename = "type", default)]
    pub provider_type: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(rename = "apiBase", default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(skip)]
    pub status: ProviderStatus,
    #[serde(skip)]
    pub error: Option<String>,
}

impl Provider {
    /// Api key with everything but the last four characters hidden.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

/// Cached view of the backend's LLM providers.
#[derive(Debug)]
pub struct ProviderRegistry {
    client: Arc<RpcClient>,
    providers: RwLock<Vec<Provider>>,
    last_error: RwLock<Option<String>>,
    sending: AtomicBool,
}

impl ProviderRegistry {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            providers: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
            sending: AtomicBool::new(false),
        }
    }

    fn set_error(&self, error: Option<String>) {
        *self.last_error.write().unwrap_or_else(PoisonError::into_inner) = error;
    }

    fn with_provider(&self, name: &str, f: impl FnOnce(&mut Provider)) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(provider) = providers.iter_mut().find(|p| p.name == name) {
            f(provider);
        }
    }

    /// Refresh the cache. On failure the cache is emptied and the error kept.
    pub async fn fetch(&self) -> Vec<Provider> {
        let fetched = match self
            .client
            .call::<_, Option<Vec<Provider>>>(methods::GET_PROVIDERS, json!({}))
            .await
        {
            Ok(list) => {
                self.set_error(None);
                list.unwrap_or_default()
            }
            Err(e) => {
                tracing::warn!("Failed to load LLM providers: {:#}", e);
                self.set_error(Some(e.to_string()));
                Vec::new()
            }
        };
        tracing::debug!(count = fetched.len(), "Provider list refreshed");
        *self.providers.write().unwrap_or_else(PoisonError::into_inner) = fetched.clone();
        fetched
    }

    pub fn providers(&self) -> Vec<Provider> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Provider> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Models offered by `name`.
    ///
    /// Falls back to the cached provider's list when the call fails or
    /// returns no list.
    pub async fn models(&self, name: &str) -> Vec<String> {
        let result = self
            .client
            .call_value(methods::GET_PROVIDER_MODELS, json!({ "provider_name": name }))
            .await;
        match result {
            Ok(value) => {
                if let Some(models) = value.get("models").and_then(Value::as_array) {
                    let models: Vec<String> = models
                        .iter()
                        .filter_map(|m| match m {
                            Value::String(s) => Some(s.clone()),
                            Value::Object(o) => o
                                .get("id")
                                .or_else(|| o.get("name"))
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            _ => None,
                        })
                        .collect();
                    self.with_provider(name, |p| p.models = models.clone());
                    return models;
                }
                tracing::warn!(provider = name, "Model listing returned no models, using cached list");
            }
            Err(e) => {
                tracing::warn!(provider = name, "Failed to list models: {:#}", e);
            }
        }
        self.get(name).map(|p| p.models).unwrap_or_default()
    }

    /// Register a new provider, then refresh the cache.
    pub async fn create(&self, provider: &Provider) -> Result<()> {
        self.client
            .call_value(methods::CREATE_PROVIDER, json!({ "provider_data": provider }))
            .await?;
        tracing::info!(provider = %provider.name, "Created LLM provider");
        self.fetch().await;
        Ok(())
    }

    /// Replace a provider's settings, then refresh the cache.
    pub async fn update(&self, name: &str, provider: &Provider) -> Result<()> {
        self.client
            .call_value(
                methods::UPDATE_PROVIDER,
                json!({ "provider_name": name, "provider_data": provider }),
            )
            .await?;
        tracing::info!(provider = name, "Updated LLM provider");
        self.fetch().await;
        Ok(())
    }

    /// Delete a provider. Returns the backend's success flag.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let value = self
            .client
            .call_value(methods::DELETE_PROVIDER, json!({ "provider_name": name }))
            .await?;
        let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
        if success {
            self.providers
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|p| p.name != name);
            tracing::info!(provider = name, "Deleted LLM provider");
        }
        Ok(success)
    }

    /// Test the backend's connection to a provider and record the status.
    pub async fn test_connection(&self, name: &str) -> ConnectionReport {
        self.with_provider(name, |p| p.status = ProviderStatus::Testing);
        let report = match self
            .client
            .call::<_, ConnectionReport>(
                methods::TEST_PROVIDER_CONNECTION,
                json!({ "provider_name": name }),
            )
            .await
        {
            Ok(report) => report,
            Err(e) => ConnectionReport::failed(e.to_string()),
        };
        self.with_provider(name, |p| {
            if report.success {
                p.status = ProviderStatus::Available;
                p.error = None;
            } else {
                p.status = ProviderStatus::Error;
                p.error = report.message.clone();
            }
        });
        tracing::info!(provider = name, success = report.success, "Provider connection tested");
        report
    }

    /// Send a raw message list straight to a provider, bypassing sessions.
    ///
    /// The provider's completion is returned as-is. A failure is recorded
    /// as the registry's last error and propagated.
    pub async fn send_message(
        &self,
        name: &str,
        messages: &[Value],
        model: Option<&str>,
    ) -> Result<Value> {
        let _sending = FlightGuard::mark(&self.sending);
        self.set_error(None);

        let mut params = json!({ "provider_name": name, "messages": messages });
        if let Some(model) = model {
            params["model"] = json!(model);
        }
        match self.client.call_value(methods::SEND_MESSAGE, params).await {
            Ok(value) => {
                tracing::debug!(provider = name, count = messages.len(), "Message sent to provider");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(provider = name, "Failed to send message to provider: {:#}", e);
                self.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Whether a direct provider message is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Check that `provider` is known and offers `model`.
    ///
    /// A provider with an empty model list accepts any model.
    pub fn validate_selection(&self, provider: &str, model: &str) -> Result<()> {
        let Some(entry) = self.get(provider) else {
            return Err(ChatRpcError::from(Precondition::UnknownProvider(provider.to_string())).into());
        };
        if !entry.models.is_empty() && !entry.models.iter().any(|m| m == model) {
            return Err(ChatRpcError::from(Precondition::UnknownModel {
                provider: provider.to_string(),
                model: model.to_string(),
            })
            .into());
        }
        Ok(())
    }
}
