use clap::Parser;
use shared::Identity;
use std::time::Duration;

/// Runtime settings for the relay server. Every flag can also be given
/// through the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Turn-synchronized relay for two-player artillery duels")]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// The only origin allowed by CORS
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,

    /// Delay between a shot and the turn passing to the opponent
    #[arg(long, env = "TURN_DELAY_MS", default_value_t = 3000)]
    pub turn_delay_ms: u64,

    /// Reject shots from the player who does not hold the turn
    #[arg(long, env = "ENFORCE_TURNS")]
    pub enforce_turns: bool,

    #[arg(long, env = "ISHAN_PASSWORD", default_value = "ishu1", hide_env_values = true)]
    pub ishan_password: String,

    #[arg(long, env = "SAKSHI_PASSWORD", default_value = "sakku2", hide_env_values = true)]
    pub sakshi_password: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub const fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }

    pub fn password_for(&self, identity: Identity) -> &str {
        match identity {
            Identity::Ishan => &self.ishan_password,
            Identity::Sakshi => &self.sakshi_password,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            allowed_origin: "http://localhost:3000".to_string(),
            turn_delay_ms: 3000,
            enforce_turns: false,
            ishan_password: "ishu1".to_string(),
            sakshi_password: "sakku2".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "artillery-server",
            "--host",
            "0.0.0.0",
            "--port",
            "4000",
            "--turn-delay-ms",
            "500",
            "--enforce-turns",
        ]);
        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert_eq!(config.turn_delay(), Duration::from_millis(500));
        assert!(config.enforce_turns);
    }

    #[test]
    fn default_matches_compiled_in_credentials() {
        let config = ServerConfig::default();
        assert_eq!(config.password_for(Identity::Ishan), "ishu1");
        assert_eq!(config.password_for(Identity::Sakshi), "sakku2");
        assert_eq!(config.turn_delay(), Duration::from_secs(3));
    }
}
