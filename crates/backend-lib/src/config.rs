// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::PasswordScheme;

/// Environment variable prefix, nested keys split on `__`
pub const ENV_PREFIX: &str = "SCRIBE_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Smallest token size accepted (128 bits)
pub const MIN_TOKEN_BYTES: usize = 16;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Data directory for the flat-file store
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Password hashing settings
    pub password: PasswordSettings,
    /// Token and salt sizes
    pub tokens: TokenSettings,
}

/// Password hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    /// Scheme used for newly set passwords
    pub scheme: PasswordScheme,
    /// scrypt cost parameter (log2 of N)
    pub scrypt_log_n: u8,
}

/// Random value sizes, in bytes of entropy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Session token and series size
    pub token_bytes: usize,
    /// Password salt size
    pub salt_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            password: PasswordSettings::default(),
            tokens: TokenSettings::default(),
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::default(),
            scrypt_log_n: scrypt::Params::RECOMMENDED_LOG_N,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            token_bytes: 32,
            salt_bytes: 16,
        }
    }
}

impl Settings {
    /// Layered sources: defaults, then `config.{toml,yaml,json}`, then env
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Yaml::file("config.yaml"))
            .merge(Json::file("config.json"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from the default locations
    pub fn load() -> Result<Self> {
        let settings: Settings = Self::figment().extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an explicit file; env vars still take precedence
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let base = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => base.merge(Yaml::file(path)),
            Some("json") => base.merge(Json::file(path)),
            _ => base.merge(Toml::file(path)),
        };
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would weaken credentials or break startup
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.tokens.token_bytes < MIN_TOKEN_BYTES {
            bail!(
                "token_bytes must be at least {MIN_TOKEN_BYTES}, got {}",
                self.tokens.token_bytes
            );
        }
        // SaltString holds at most 64 base64 chars
        if !(8..=48).contains(&self.tokens.salt_bytes) {
            bail!("salt_bytes must be between 8 and 48, got {}", self.tokens.salt_bytes);
        }
        if scrypt::Params::new(self.password.scrypt_log_n, 8, 1, scrypt::Params::RECOMMENDED_LEN)
            .is_err()
        {
            bail!("invalid scrypt_log_n: {}", self.password.scrypt_log_n);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.password.scheme, PasswordScheme::Scrypt);
        assert_eq!(settings.tokens.token_bytes, 32);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let settings = Settings::default();

        let mut invalid = settings.clone();
        invalid.log_level = "loud".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = settings.clone();
        invalid.tokens.token_bytes = 8;
        assert!(invalid.validate().is_err());

        let mut invalid = settings.clone();
        invalid.tokens.salt_bytes = 64;
        assert!(invalid.validate().is_err());

        let mut invalid = settings;
        invalid.password.scrypt_log_n = 64;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_load_settings_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                data_dir = "test_data"
                log_level = "debug"

                [password]
                scheme = "argon2"
                "#,
            )?;
            jail.set_env("SCRIBE_LOG_LEVEL", "warn");
            jail.set_env("SCRIBE_TOKENS__TOKEN_BYTES", "48");

            let settings = Settings::load().map_err(|e| e.to_string())?;
            assert_eq!(settings.data_dir, PathBuf::from("test_data"));
            // env wins over the file
            assert_eq!(settings.log_level, "warn");
            assert_eq!(settings.password.scheme, PasswordScheme::Argon2);
            assert_eq!(settings.tokens.token_bytes, 48);
            assert_eq!(settings.tokens.salt_bytes, 16);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scribe.yaml",
                "log_format: json\npassword:\n  scheme: hmac-sha1\n",
            )?;

            let settings = Settings::load_from("scribe.yaml").map_err(|e| e.to_string())?;
            assert_eq!(settings.log_format, LogFormat::Json);
            assert_eq!(settings.password.scheme, PasswordScheme::HmacSha1);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("SCRIBE_TOKENS__TOKEN_BYTES", "4");
            assert!(Settings::load().is_err());
            Ok(())
        });
    }
}
