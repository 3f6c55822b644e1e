/// Provider credentials, read once at startup and passed explicitly into the
/// pipeline. Every key is optional: an absent key means that provider is
/// skipped, not an error.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub anthropic_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub quote_api_key: Option<String>,
}

impl ProviderCredentials {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            groq_api_key: non_empty_var("GROQ_API_KEY"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            quote_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
        }
    }

    pub fn has_inference_provider(&self) -> bool {
        self.anthropic_api_key.is_some()
            || self.groq_api_key.is_some()
            || self.openai_api_key.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
