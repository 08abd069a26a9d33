use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_language_model_url")]
    pub language_model_url: String,
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8005
}

fn default_language_model_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_embedding_dims() -> usize {
    384
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("EXPLAIN_").from_env::<Self>()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            language_model_url: default_language_model_url(),
            embedding_dims: default_embedding_dims(),
        }
    }
}
