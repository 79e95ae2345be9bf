use anyhow::{Context, Result};
use clap::Parser;
use std::env::{self, VarError};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: String,
    pub database_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Recipe REST API")]
pub struct Args {
    /// Host to bind to (overrides RECIPE_API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides RECIPE_API_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where recipe images are written (overrides RECIPE_API_UPLOADS_DIR)
    #[arg(long)]
    pub uploads_dir: Option<String>,

    /// Database URL (overrides RECIPE_API_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// CLI values win over the environment, which wins over built-in defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let env_host = lookup("RECIPE_API_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match lookup("RECIPE_API_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing RECIPE_API_PORT value `{}`", value))?,
            Err(VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading RECIPE_API_PORT"),
        };
        let env_uploads =
            lookup("RECIPE_API_UPLOADS_DIR").unwrap_or_else(|_| "./data/uploads".into());
        let env_db = lookup("RECIPE_API_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/recipes.db".into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            uploads_dir: args.uploads_dir.unwrap_or(env_uploads),
            database_url: args.database_url.unwrap_or(env_db),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_without_env_or_args() {
        let cfg = AppConfig::merge(Args::default(), lookup_from(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.uploads_dir, "./data/uploads");
        assert_eq!(cfg.database_url, "sqlite://./data/recipes.db");
    }

    #[test]
    fn args_override_env() {
        let args = Args {
            port: Some(8080),
            ..Args::default()
        };
        let lookup = lookup_from(&[("RECIPE_API_PORT", "9000"), ("RECIPE_API_HOST", "127.0.0.1")]);
        let cfg = AppConfig::merge(args, lookup).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::merge(Args::default(), lookup_from(&[("RECIPE_API_PORT", "nope")]))
            .unwrap_err();
        assert!(err.to_string().contains("RECIPE_API_PORT"));
    }
}
