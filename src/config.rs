/*!
 * Runtime configuration loaded from the process environment.
 */

use crate::error::{Result, WardenError};

/// Deployment execution mode: `Test` uses a synthetic instance identity and
/// shorter backoffs; `Develop` talks to real infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Test,
    Develop,
}

impl ExecutionMode {
    fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "develop" => Ok(Self::Develop),
            other => Err(WardenError::Config(format!(
                "EXECUTION_MODE must be 'Test' or 'Develop', got {:?}",
                other
            ))),
        }
    }
}

/// The `tenant::stack::secret` shared-secret triple (spec §6).
#[derive(Debug, Clone)]
pub struct SharedSecret {
    pub tenant: String,
    pub stack: String,
    pub secret: String,
}

impl SharedSecret {
    fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(3, "::");
        let tenant = parts.next().filter(|s| !s.is_empty());
        let stack = parts.next().filter(|s| !s.is_empty());
        let secret = parts.next().filter(|s| !s.is_empty());
        match (tenant, stack, secret) {
            (Some(tenant), Some(stack), Some(secret)) => Ok(Self {
                tenant: tenant.to_string(),
                stack: stack.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(WardenError::Config(
                "SHARED_SECRET must have the form tenant::stack::secret".to_string(),
            )),
        }
    }
}

/// Every environment-derived setting the scanner reads at startup (spec
/// §6). Optional fields are absent when the corresponding connector
/// credential isn't configured for this deployment.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    pub deployment_type: Option<String>,
    pub sentry_dsn_data_scanning: Option<String>,
    pub execution_mode: ExecutionMode,
    pub customer_account_id: Option<String>,
    pub cors_origins: Vec<String>,
    pub server_domain: Option<String>,
    pub shared_secret: SharedSecret,
    pub aws_default_region: Option<String>,
    pub rds_database_user: Option<String>,
    pub github_token: Option<String>,
    pub github_username: Option<String>,
    pub bitbucket_login: Option<String>,
    pub bitbucket_password: Option<String>,
    pub gitlab_token: Option<String>,
    pub max_python_processes: usize,
    pub encrypt_iterations: u32,
    pub secret_token: String,
    pub default_encoding: String,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn required_env_var(key: &str) -> Result<String> {
    env_var(key).ok_or_else(|| WardenError::Config(format!("{key} is required")))
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    match env_var(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| WardenError::Config(format!("{key} must be a non-negative integer, got {v:?}"))),
    }
}

fn parse_u32_env(key: &str, default: u32) -> Result<u32> {
    match env_var(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| WardenError::Config(format!("{key} must be a non-negative integer, got {v:?}"))),
    }
}

impl WardenConfig {
    /// Load every setting from the process environment (spec §6).
    pub fn from_env() -> Result<Self> {
        let execution_mode = match env_var("EXECUTION_MODE") {
            Some(raw) => ExecutionMode::parse(&raw)?,
            None => ExecutionMode::Develop,
        };

        let cors_origins = env_var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let shared_secret = SharedSecret::parse(&required_env_var("SHARED_SECRET")?)?;

        Ok(Self {
            deployment_type: env_var("DEPLOYMENT_TYPE"),
            sentry_dsn_data_scanning: env_var("SENTRY_DSN_DATA_SCANNING"),
            execution_mode,
            customer_account_id: env_var("CUSTOMER_ACCOUNT_ID"),
            cors_origins,
            server_domain: env_var("SERVER_DOMAIN"),
            shared_secret,
            aws_default_region: env_var("AWS_DEFAULT_REGION"),
            rds_database_user: env_var("RDS_DATABASE_USER"),
            github_token: env_var("GITHUB_TOKEN"),
            github_username: env_var("GITHUB_USERNAME"),
            bitbucket_login: env_var("BITBUCKET_LOGIN"),
            bitbucket_password: env_var("BITBUCKET_PASSWORD"),
            gitlab_token: env_var("GITLAB_TOKEN"),
            max_python_processes: parse_usize_env("MAX_PYTHON_PROCESSES", 5)?,
            encrypt_iterations: parse_u32_env("ENCRYPT_ITERATIONS", 100_000)?,
            secret_token: required_env_var("SECRET_TOKEN")?,
            default_encoding: env_var("DEFAULT_ENCODING").unwrap_or_else(|| "UTF-8".to_string()),
        })
    }

    pub fn is_test_mode(&self) -> bool {
        self.execution_mode == ExecutionMode::Test
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "DEPLOYMENT_TYPE",
            "SENTRY_DSN_DATA_SCANNING",
            "EXECUTION_MODE",
            "CUSTOMER_ACCOUNT_ID",
            "CORS_ORIGINS",
            "SERVER_DOMAIN",
            "SHARED_SECRET",
            "AWS_DEFAULT_REGION",
            "RDS_DATABASE_USER",
            "GITHUB_TOKEN",
            "GITHUB_USERNAME",
            "BITBUCKET_LOGIN",
            "BITBUCKET_PASSWORD",
            "GITLAB_TOKEN",
            "MAX_PYTHON_PROCESSES",
            "ENCRYPT_ITERATIONS",
            "SECRET_TOKEN",
            "DEFAULT_ENCODING",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_secret_token_fails() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SHARED_SECRET", "tenant::stack::secret");
        let err = WardenConfig::from_env().unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
        clear_env();
    }

    #[test]
    fn shared_secret_requires_three_parts() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SHARED_SECRET", "tenant::stack");
        std::env::set_var("SECRET_TOKEN", "t");
        let err = WardenConfig::from_env().unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
        clear_env();
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SHARED_SECRET", "acme::prod::shhh");
        std::env::set_var("SECRET_TOKEN", "top-secret");
        let config = WardenConfig::from_env().unwrap();
        assert_eq!(config.max_python_processes, 5);
        assert_eq!(config.encrypt_iterations, 100_000);
        assert_eq!(config.default_encoding, "UTF-8");
        assert_eq!(config.execution_mode, ExecutionMode::Develop);
        assert_eq!(config.shared_secret.tenant, "acme");
        assert_eq!(config.shared_secret.stack, "prod");
        assert_eq!(config.shared_secret.secret, "shhh");
        clear_env();
    }

    #[test]
    fn cors_origins_split_on_comma() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SHARED_SECRET", "acme::prod::shhh");
        std::env::set_var("SECRET_TOKEN", "top-secret");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        let config = WardenConfig::from_env().unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        clear_env();
    }

    #[test]
    fn execution_mode_rejects_unknown_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("SHARED_SECRET", "acme::prod::shhh");
        std::env::set_var("SECRET_TOKEN", "top-secret");
        std::env::set_var("EXECUTION_MODE", "Staging");
        let err = WardenConfig::from_env().unwrap_err();
        assert!(matches!(err, WardenError::Config(_)));
        clear_env();
    }
}
