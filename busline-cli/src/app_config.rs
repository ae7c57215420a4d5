use busline_core::{BookingPolicy, CoreResult, RatingScale};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_rating_min")]
    pub rating_min: f64,
    #[serde(default = "default_rating_max")]
    pub rating_max: f64,
    #[serde(default)]
    pub refund_cutoff_days: i64,
}

fn default_filter() -> String { "busline=info".to_string() }
fn default_rating_min() -> f64 { 0.0 }
fn default_rating_max() -> f64 { 5.0 }

impl BusinessRules {
    pub fn policy(&self) -> CoreResult<BookingPolicy> {
        let scale = RatingScale::new(self.rating_min, self.rating_max)?;
        BookingPolicy::new(scale, self.refund_cutoff_days)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layered load: `default`, then `$RUN_MODE`, then `local`, then
    /// `BUSLINE__*` environment variables. Every file is optional.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("logging.filter", default_filter())?
            .set_default("business_rules.rating_min", default_rating_min())?
            .set_default("business_rules.rating_max", default_rating_max())?
            .set_default("business_rules.refund_cutoff_days", 0)?
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::from(dir.join("local")).required(false))
            // Eg. `BUSLINE__BUSINESS_RULES__REFUND_CUTOFF_DAYS=2`
            .add_source(config::Environment::with_prefix("BUSLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_files() {
        let config = Config::load_from("does-not-exist").expect("Failed to load defaults");
        assert_eq!(config.logging.filter, "busline=info");

        let policy = config.business_rules.policy().unwrap();
        assert_eq!(policy, BookingPolicy::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = env::temp_dir().join(format!("busline-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            "[business_rules]\nrating_min = 1.0\nrating_max = 10.0\nrefund_cutoff_days = 2\n",
        )
        .unwrap();

        let config = Config::load_from(&dir).expect("Failed to load config");
        let policy = config.business_rules.policy().unwrap();
        assert_eq!(policy.rating_scale, RatingScale::new(1.0, 10.0).unwrap());
        assert_eq!(policy.refund_cutoff_days, 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let rules = BusinessRules {
            rating_min: 5.0,
            rating_max: 1.0,
            refund_cutoff_days: 0,
        };
        assert!(rules.policy().is_err());
    }
}
