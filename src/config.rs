use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Hosted Postgres backend; unset means in-memory stores (dev only)
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,

    // Badge minting function endpoint
    pub functions_url: Option<String>,
    pub default_mint_chain: String,

    // Redis
    pub redis_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;

        let supabase_url = std::env::var("SUPABASE_URL").ok();
        let functions_url = std::env::var("FUNCTIONS_URL").ok().or_else(|| {
            supabase_url
                .as_ref()
                .map(|url| format!("{}/functions/v1", url.trim_end_matches('/')))
        });

        let config = Self {
            environment: environment.clone(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            supabase_url,
            supabase_service_key: std::env::var("SUPABASE_SERVICE_KEY").ok(),

            functions_url,
            default_mint_chain: std::env::var("DEFAULT_MINT_CHAIN")
                .unwrap_or_else(|_| "base".to_string()),

            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.supabase_url {
            Some(url) => {
                if !url.starts_with("http") {
                    bail!("SUPABASE_URL must be HTTP(S) URL");
                }
                if self.supabase_service_key.is_none() {
                    bail!("SUPABASE_SERVICE_KEY required when SUPABASE_URL is set");
                }
            }
            None => {
                if matches!(self.environment, Environment::Production) {
                    bail!("SUPABASE_URL required in production");
                }
            }
        }

        if let Some(url) = &self.functions_url {
            if !url.starts_with("http") {
                bail!("FUNCTIONS_URL must be HTTP(S) URL");
            }
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
