// Configuration management module
// TOML settings, provider credentials and the interactive setup

pub mod credentials;
pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use credentials::{CLAUDE_API_KEY_VAR, CredentialError, Credentials, GOOGLE_API_KEY_VAR};
pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, ConversationConfig, DataConfig, EmbeddingConfig, ProviderConfig,
    RetrievalConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
