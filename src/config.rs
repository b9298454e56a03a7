//! Configuration loading and validation
//!
//! The configuration is read once (TOML) and validated before anything uses
//! it. Every section has defaults, so a file only needs the keys it changes:
//!
//! ```toml
//! benchmark = 0.35
//! tariff_focus = ["8471", "8517"]
//!
//! [rates]
//! state_vat = 0.20
//!
//! [[value_buckets]]
//! min = 0
//! max = 100000
//! label = "LIGHT"
//!
//! [[value_buckets]]
//! min = 100000
//! label = "HEAVY"
//!
//! [simulation]
//! base_date = "2024-01-01"
//!
//! [scenarios]
//! reduced_state_vat = 0.12
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::drawback::DrawbackRules;
use crate::error::{Result, TaxError};
use crate::models::SeverityCategory;
use crate::tax::burden::{ClassificationTable, SeverityThresholds};
use crate::tax::recommendation::RecommendationRules;
use crate::tax::scenarios::ScenarioRules;
use crate::tax::TaxRates;

/// Value range `[min, max)` with its label; `max = None` is open-ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBucket {
    pub min: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    pub label: String,
}

impl ValueBucket {
    pub fn new(min: Decimal, max: Option<Decimal>, label: &str) -> Self {
        Self {
            min,
            max,
            label: label.to_string(),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.max.is_some()
    }
}

/// Check buckets are ascending, contiguous and end with one open bucket
pub fn validate_buckets(buckets: &[ValueBucket]) -> std::result::Result<(), TaxError> {
    let Some((last, bounded)) = buckets.split_last() else {
        return Err(TaxError::config("no value buckets configured"));
    };
    if bounded.is_empty() {
        return Err(TaxError::config(
            "at least one bounded value bucket is required for sampling",
        ));
    }
    if last.max.is_some() {
        return Err(TaxError::config(format!(
            "last value bucket '{}' must be unbounded",
            last.label
        )));
    }
    if buckets[0].min < Decimal::ZERO {
        return Err(TaxError::config(format!(
            "value bucket '{}' starts below zero",
            buckets[0].label
        )));
    }

    for (index, bucket) in bounded.iter().enumerate() {
        let Some(max) = bucket.max else {
            return Err(TaxError::config(format!(
                "only the last value bucket may be unbounded ('{}' is not last)",
                bucket.label
            )));
        };
        if max <= bucket.min {
            return Err(TaxError::config(format!(
                "value bucket '{}' is not ascending ({} >= {})",
                bucket.label, bucket.min, max
            )));
        }
        let next = &buckets[index + 1];
        if next.min != max {
            return Err(TaxError::config(format!(
                "gap or overlap between value buckets '{}' (max {}) and '{}' (min {})",
                bucket.label, max, next.label, next.min
            )));
        }
    }

    let mut labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
    labels.sort_unstable();
    labels.dedup();
    if labels.len() != buckets.len() {
        return Err(TaxError::config("value bucket labels must be unique"));
    }

    Ok(())
}

fn default_buckets() -> Vec<ValueBucket> {
    vec![
        ValueBucket::new(Decimal::ZERO, Some(Decimal::from(50_000)), "LIGHT"),
        ValueBucket::new(Decimal::from(50_000), Some(Decimal::from(200_000)), "MEDIUM"),
        ValueBucket::new(Decimal::from(200_000), Some(Decimal::from(1_000_000)), "HEAVY"),
        ValueBucket::new(Decimal::from(1_000_000), None, "OVERLOADED"),
    ]
}

/// Parameters for synthetic operation generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub count: usize,
    pub seed: Option<u64>,
    pub exchange_rate_min: Decimal,
    pub exchange_rate_max: Decimal,
    /// State VAT rates drawn per operation; empty means use `rates.state_vat`
    pub state_vat_choices: Vec<Decimal>,
    pub entity_ids: Vec<String>,
    pub base_date: NaiveDate,
    pub date_spread_days: u32,
    pub quantity: u32,
    /// Share of imports that get a simulated export leg
    pub export_fraction: Decimal,
    pub export_delay_min_days: u32,
    pub export_delay_max_days: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            seed: None,
            exchange_rate_min: Decimal::new(45, 1),
            exchange_rate_max: Decimal::new(65, 1),
            state_vat_choices: vec![
                Decimal::new(12, 2),
                Decimal::new(17, 2),
                Decimal::new(18, 2),
            ],
            entity_ids: vec![
                "00000000".to_string(),
                "11111111".to_string(),
                "22222222".to_string(),
            ],
            base_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            date_spread_days: 300,
            quantity: 100,
            export_fraction: Decimal::new(3, 1),
            export_delay_min_days: 30,
            export_delay_max_days: 365,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> std::result::Result<(), TaxError> {
        if self.exchange_rate_min <= Decimal::ZERO || self.exchange_rate_max < self.exchange_rate_min
        {
            return Err(TaxError::config(format!(
                "invalid exchange rate band [{}, {}]",
                self.exchange_rate_min, self.exchange_rate_max
            )));
        }
        if let Some(rate) = self
            .state_vat_choices
            .iter()
            .find(|r| **r < Decimal::ZERO || **r >= Decimal::ONE)
        {
            return Err(TaxError::config(format!("invalid VAT rate choice: {}", rate)));
        }
        if self.entity_ids.is_empty() || self.entity_ids.iter().any(|e| e.trim().is_empty()) {
            return Err(TaxError::config("simulation needs non-empty entity ids"));
        }
        if self.quantity == 0 {
            return Err(TaxError::config("simulated quantity must be positive"));
        }
        if self.export_fraction < Decimal::ZERO || self.export_fraction > Decimal::ONE {
            return Err(TaxError::config(format!(
                "export fraction must be within [0, 1], got {}",
                self.export_fraction
            )));
        }
        if self.export_delay_min_days > self.export_delay_max_days {
            return Err(TaxError::config("export delay range is inverted"));
        }
        Ok(())
    }
}

/// Immutable run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference effective tax rate the burden index is normalized by
    pub benchmark: Decimal,
    pub tariff_focus: Vec<String>,
    pub rates: TaxRates,
    pub value_buckets: Vec<ValueBucket>,
    pub severity: SeverityThresholds,
    pub simulation: SimulationConfig,
    pub drawback: DrawbackRules,
    pub recommendation: RecommendationRules,
    pub scenarios: ScenarioRules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            benchmark: Decimal::new(20, 2),
            tariff_focus: vec!["8471".to_string(), "8517".to_string(), "8542".to_string()],
            rates: TaxRates::default(),
            value_buckets: default_buckets(),
            severity: SeverityThresholds::default(),
            simulation: SimulationConfig::default(),
            drawback: DrawbackRules::default(),
            recommendation: RecommendationRules::default(),
            scenarios: ScenarioRules::default(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("invalid configuration TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Explicit path, else the user config file if present, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }

    pub fn validate(&self) -> std::result::Result<(), TaxError> {
        if self.benchmark <= Decimal::ZERO {
            return Err(TaxError::config(format!(
                "benchmark must be positive, got {}",
                self.benchmark
            )));
        }
        self.rates.validate().map_err(|e| match e {
            TaxError::Domain(msg) => TaxError::Config(msg),
            other => other,
        })?;
        validate_buckets(&self.value_buckets)?;
        self.severity.table()?;
        if self.tariff_focus.is_empty() || self.tariff_focus.iter().any(|c| c.trim().is_empty()) {
            return Err(TaxError::config("tariff focus list must hold non-empty codes"));
        }
        self.simulation.validate()?;
        self.drawback.validate()?;
        self.scenarios.validate()?;
        Ok(())
    }

    pub fn severity_table(&self) -> std::result::Result<ClassificationTable<SeverityCategory>, TaxError> {
        self.severity.table()
    }

    /// Absolute classification table keyed on each bucket's lower bound
    pub fn value_table(&self) -> std::result::Result<ClassificationTable<String>, TaxError> {
        validate_buckets(&self.value_buckets)?;
        ClassificationTable::new(
            self.value_buckets
                .iter()
                .map(|b| (b.min, b.label.clone()))
                .collect(),
        )
    }

    /// Buckets the generator may sample FOB values from
    pub fn sampling_buckets(&self) -> Vec<&ValueBucket> {
        self.value_buckets.iter().filter(|b| b.is_bounded()).collect()
    }
}

/// `<config home>/tributec/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("tributec").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling_buckets().len(), 3);
        assert_eq!(config.value_table().unwrap().len(), 4);
    }

    #[test]
    fn test_bucket_gap_is_rejected() {
        let buckets = vec![
            ValueBucket::new(dec!(0), Some(dec!(100)), "A"),
            ValueBucket::new(dec!(150), None, "B"),
        ];
        let err = validate_buckets(&buckets).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn test_non_ascending_bucket_is_rejected() {
        let buckets = vec![
            ValueBucket::new(dec!(100), Some(dec!(50)), "A"),
            ValueBucket::new(dec!(50), None, "B"),
        ];
        assert!(validate_buckets(&buckets).unwrap_err().is_config());
    }

    #[test]
    fn test_missing_unbounded_bucket_is_rejected() {
        let buckets = vec![
            ValueBucket::new(dec!(0), Some(dec!(100)), "A"),
            ValueBucket::new(dec!(100), Some(dec!(200)), "B"),
        ];
        let err = validate_buckets(&buckets).unwrap_err();
        assert!(err.to_string().contains("unbounded"));

        let buckets = vec![
            ValueBucket::new(dec!(0), None, "A"),
            ValueBucket::new(dec!(100), None, "B"),
        ];
        assert!(validate_buckets(&buckets).is_err());

        assert!(validate_buckets(&[ValueBucket::new(dec!(0), None, "A")]).is_err());
        assert!(validate_buckets(&[]).is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            benchmark = 0.35
            tariff_focus = ["8517"]

            [rates]
            state_vat = 0.20

            [simulation]
            count = 10
            seed = 42
            base_date = "2023-06-01"

            [drawback]
            window_days = 180

            [scenarios]
            reduced_state_vat = 0.07
            "#,
        )
        .unwrap();

        assert_eq!(config.benchmark, dec!(0.35));
        assert_eq!(config.rates.state_vat, dec!(0.20));
        assert_eq!(config.rates.import_duty, dec!(0.60));
        assert_eq!(config.simulation.count, 10);
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.drawback.window_days, 180);
        assert_eq!(config.drawback.min_quantity_ratio, dec!(0.9));
        assert_eq!(config.scenarios.reduced_state_vat, dec!(0.07));
        assert_eq!(config.scenarios.tax_share_alert, dec!(0.60));
        assert_eq!(config.value_buckets, default_buckets());
    }

    #[test]
    fn test_invalid_toml_values_are_rejected() {
        let err = Config::from_toml("[rates]\nstate_vat = 1.0\n").unwrap_err();
        assert!(format!("{:?}", err).contains("invalid VAT rate"));

        let err = Config::from_toml("benchmark = 0\n").unwrap_err();
        assert!(format!("{:?}", err).contains("benchmark"));

        let err = Config::from_toml("[scenarios]\nreduced_state_vat = 1.5\n").unwrap_err();
        assert!(format!("{:?}", err).contains("reduced VAT rate"));

        let err = Config::from_toml(
            "[[value_buckets]]\nmin = 0\nmax = 10\nlabel = \"A\"\n\n[[value_buckets]]\nmin = 20\nlabel = \"B\"\n",
        )
        .unwrap_err();
        assert!(format!("{:?}", err).contains("gap"));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "benchmark = 0.35\n").unwrap();
        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.benchmark, dec!(0.35));

        let missing = dir.path().join("missing.toml");
        assert!(Config::load(&missing).is_err());
    }
}
