//! Agent registry: the fixed, process-lifetime panel of agents

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use super::profile::PanelDefinition;
use crate::agent::Agent;
use crate::error::{PanelError, Result};
use crate::providers::{ChatProvider, ProviderKind, ProvidersConfig};

/// Holds one [`Agent`] per panel entry and one adapter per provider kind.
/// Immutable once built.
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<Agent>>,
    providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AgentRegistry {
    /// Build adapters from explicit credentials, then bind every panel entry.
    ///
    /// Only providers the panel actually names are constructed, so a missing
    /// key for an unused provider is not an error.
    pub fn load(panel: PanelDefinition, config: &ProvidersConfig) -> Result<Self> {
        let mut providers = HashMap::new();
        for kind in panel.providers() {
            debug!("AgentRegistry: constructing {} adapter", kind);
            providers.insert(kind, config.build(kind)?);
        }
        Self::with_providers(panel, providers)
    }

    /// Bind panel entries to prebuilt adapters
    pub fn with_providers(
        panel: PanelDefinition,
        providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
    ) -> Result<Self> {
        let mut agents = BTreeMap::new();
        for spec in panel.into_specs() {
            let provider = providers.get(&spec.provider).cloned().ok_or_else(|| {
                PanelError::Configuration(format!(
                    "no '{}' provider configured for agent '{}'",
                    spec.provider, spec.name
                ))
            })?;
            agents.insert(spec.name.clone(), Arc::new(Agent::new(spec, provider)));
        }

        info!(
            "AgentRegistry: loaded {} agents across {} providers",
            agents.len(),
            providers.len()
        );

        Ok(Self { agents, providers })
    }

    /// Look up an agent by name
    pub fn resolve(&self, name: &str) -> Result<Arc<Agent>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| PanelError::Configuration(format!("unknown agent '{}'", name)))
    }

    /// Fail with every missing name at once
    pub fn require(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.agents.contains_key(*n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PanelError::Configuration(format!(
                "panel is missing required agents: {}",
                missing.join(", ")
            )))
        }
    }

    /// Agent names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::PanelEntry;
    use crate::providers::{ProviderSettings, ResponseFormat};

    fn entry(provider: ProviderKind) -> PanelEntry {
        PanelEntry {
            model_name: "model".to_string(),
            prompt: "prompt".to_string(),
            api_provider: provider,
            response_format: ResponseFormat::Text,
        }
    }

    fn panel() -> PanelDefinition {
        PanelDefinition::new()
            .with_entry("Judge", entry(ProviderKind::OpenAi))
            .with_entry("Friend", entry(ProviderKind::OpenAi))
            .with_entry("Oracle", entry(ProviderKind::Meta))
    }

    fn openai_only() -> ProvidersConfig {
        ProvidersConfig {
            openai: Some(ProviderSettings::new("sk-test-key")),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_and_resolve() {
        let registry = AgentRegistry::load(panel(), &openai_only()).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["Friend", "Judge", "Oracle"]);
        let judge = registry.resolve("Judge").unwrap();
        assert_eq!(judge.name(), "Judge");
    }

    #[test]
    fn test_agents_share_one_adapter_per_provider() {
        let registry = AgentRegistry::load(panel(), &openai_only()).unwrap();
        assert_eq!(registry.providers.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_is_configuration_error() {
        let registry = AgentRegistry::load(panel(), &openai_only()).unwrap();
        let err = registry.resolve("Astrologer").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Astrologer"));
    }

    #[test]
    fn test_load_fails_on_missing_credential() {
        let panel = panel().with_entry("Psychologist", entry(ProviderKind::Anthropic));
        let err = AgentRegistry::load(panel, &openai_only()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unused_provider_key_not_required() {
        let panel = PanelDefinition::new().with_entry("Friend", entry(ProviderKind::OpenAi));
        assert!(AgentRegistry::load(panel, &openai_only()).is_ok());
    }

    #[test]
    fn test_with_providers_missing_adapter() {
        let err = AgentRegistry::with_providers(panel(), HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("no 'openai' provider"));
    }

    #[test]
    fn test_require_lists_all_missing() {
        let registry = AgentRegistry::load(panel(), &openai_only()).unwrap();
        assert!(registry.require(&["Judge", "Friend"]).is_ok());
        let err = registry.require(&["Judge", "Summarizer", "Psychologist"]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Summarizer"));
        assert!(text.contains("Psychologist"));
        assert!(!text.contains("Judge,"));
    }
}
