use std::path::PathBuf;

/// Default listen port
const DEFAULT_PORT: u16 = 5000;

/// Server configuration resolved from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Resolve configuration from environment variables.
    ///
    /// `PORT` overrides the listen port. `PARTY_SIGNUP_DATA_DIR` overrides
    /// the data directory, which otherwise lives under the platform's
    /// per-user data directory.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = std::env::var("PARTY_SIGNUP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());

        Self { port, data_dir }
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("party-signup"))
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}
