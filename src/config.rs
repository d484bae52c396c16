use crate::extract::MetricRule;
use crate::histogram::{HistogramPatterns, DEFAULT_READ_PATTERN, DEFAULT_WRITE_PATTERN};
use crate::topology::TopologyConfig;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Simulator ticks per nanosecond (1 tick = 1 ps).
pub const TICKS_PER_NS: f64 = 1000.0;

/// Binary megabyte used for bandwidth columns.
pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StatsConfig {
    pub units: UnitsConfig,
    pub topology: TopologyConfig,
    pub histogram: HistogramConfig,
    /// Extra metric rules, appended after the built-in ones.
    pub metrics: Vec<MetricRuleConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    pub ticks_per_ns: f64,
    pub bytes_per_megabyte: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub read_pattern: String,
    pub write_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricRuleConfig {
    pub name: String,
    /// Regex with exactly one capture group holding the value.
    pub pattern: String,
    pub unit: String,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Linear conversion applied to a found value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionConfig {
    #[default]
    None,
    TicksToNs,
    BytesToMegabytes,
    Divide(f64),
}

// --- Default implementations ---

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            ticks_per_ns: TICKS_PER_NS,
            bytes_per_megabyte: BYTES_PER_MEGABYTE,
        }
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            read_pattern: DEFAULT_READ_PATTERN.to_string(),
            write_pattern: DEFAULT_WRITE_PATTERN.to_string(),
        }
    }
}

/// Errors produced while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidPattern {
        name: String,
        source: regex::Error,
    },
    CaptureGroups {
        name: String,
        expected: usize,
        found: usize,
    },
    InvalidDivisor {
        name: String,
        value: f64,
    },
    DuplicateMetric {
        name: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::InvalidPattern { name, source } => {
                write!(f, "invalid pattern for {name}: {source}")
            }
            ConfigError::CaptureGroups {
                name,
                expected,
                found,
            } => write!(
                f,
                "pattern for {name} must have {expected} capture group(s), found {found}"
            ),
            ConfigError::InvalidDivisor { name, value } => {
                write!(f, "divisor for {name} must be positive and finite, got {value}")
            }
            ConfigError::DuplicateMetric { name } => write!(f, "duplicate metric name {name}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Load and parse a config file.
pub fn load_config(path: &Path) -> Result<StatsConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Validated, compiled settings the commands run with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rules: Vec<MetricRule>,
    pub histogram: HistogramPatterns,
}

impl Settings {
    /// Built-in defaults when `path` is `None`, otherwise the given file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config");
                load_config(p)?
            }
            None => StatsConfig::default(),
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &StatsConfig) -> Result<Self, ConfigError> {
        let settings = Self {
            rules: config.metric_rules()?,
            histogram: config.histogram_patterns()?,
        };
        tracing::debug!(rules = settings.rules.len(), "resolved settings");
        Ok(settings)
    }
}

impl StatsConfig {
    /// Built-in topology rules followed by the configured extras, compiled.
    pub fn metric_rules(&self) -> Result<Vec<MetricRule>, ConfigError> {
        let ticks_per_ns = check_divisor("units.ticks_per_ns", self.units.ticks_per_ns)?;
        let bytes_per_mb =
            check_divisor("units.bytes_per_megabyte", self.units.bytes_per_megabyte)?;

        let builtin = self.topology.builtin_metrics();
        let mut seen = HashSet::new();
        builtin
            .iter()
            .chain(&self.metrics)
            .map(|rule| {
                if !seen.insert(rule.name.clone()) {
                    return Err(ConfigError::DuplicateMetric {
                        name: rule.name.clone(),
                    });
                }
                let divisor = match rule.conversion {
                    ConversionConfig::None => None,
                    ConversionConfig::TicksToNs => Some(ticks_per_ns),
                    ConversionConfig::BytesToMegabytes => Some(bytes_per_mb),
                    ConversionConfig::Divide(d) => Some(check_divisor(&rule.name, d)?),
                };
                let regex = compile(&rule.name, &rule.pattern, 1)?;
                Ok(MetricRule::new(&rule.name, regex, &rule.unit, divisor))
            })
            .collect()
    }

    pub fn histogram_patterns(&self) -> Result<HistogramPatterns, ConfigError> {
        Ok(HistogramPatterns::new(
            compile("histogram.read_pattern", &self.histogram.read_pattern, 3)?,
            compile("histogram.write_pattern", &self.histogram.write_pattern, 3)?,
        ))
    }
}

fn check_divisor(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidDivisor {
            name: name.to_string(),
            value,
        })
    }
}

/// Compile `pattern`, requiring exactly `groups` capture groups.
fn compile(name: &str, pattern: &str, groups: usize) -> Result<Regex, ConfigError> {
    let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        name: name.to_string(),
        source: e,
    })?;
    // captures_len counts the implicit whole-match group.
    let found = regex.captures_len() - 1;
    if found != groups {
        return Err(ConfigError::CaptureGroups {
            name: name.to_string(),
            expected: groups,
            found,
        });
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.rules.len(), 16);
        assert_eq!(settings.rules[0].name(), "cpu_ipc");
        assert_eq!(settings.rules[0].divisor(), None);
        assert_eq!(settings.rules[3].divisor(), Some(TICKS_PER_NS));
        assert_eq!(settings.rules[8].divisor(), Some(BYTES_PER_MEGABYTE));
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[units]
ticks_per_ns = 1.0

[topology]
memory_controllers = [{ name = "mem_ctrl0", label = "dram0" }]

[histogram]
read_pattern = 'board\.(ctrl\d+)\.rdQLenPdf::(\d+)\s+(\d+)'

[[metrics]]
name = "sim_seconds"
pattern = 'simSeconds\s+([\d\.]+)'
unit = "s"

[[metrics]]
name = "trafficgen_read_gbps"
pattern = 'system\.trafficgen\.readBW\s+([\d\.]+)'
unit = "Gb/s"
conversion = { divide = 125000000.0 }
"#;
        let config: StatsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.units.ticks_per_ns, 1.0);
        assert_eq!(config.units.bytes_per_megabyte, BYTES_PER_MEGABYTE);
        assert_eq!(config.topology.cpu, "cpu");
        assert_eq!(config.topology.memory_controllers.len(), 1);
        assert_eq!(config.histogram.write_pattern, DEFAULT_WRITE_PATTERN);
        assert_eq!(config.metrics[0].conversion, ConversionConfig::None);
        assert_eq!(config.metrics[1].conversion, ConversionConfig::Divide(125000000.0));

        let settings = Settings::from_config(&config).unwrap();
        // 10 cpu/cache/trafficgen rules + 3 for one controller + 2 extras
        assert_eq!(settings.rules.len(), 15);
        assert_eq!(settings.rules[13].name(), "sim_seconds");
        assert_eq!(settings.rules[3].divisor(), Some(1.0));
        assert_eq!(settings.rules[14].divisor(), Some(125000000.0));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: StatsConfig = toml::from_str("").unwrap();
        assert_eq!(config.units.ticks_per_ns, TICKS_PER_NS);
        assert_eq!(config.topology.memory_controllers.len(), 2);
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn test_unknown_conversion_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("simstats.toml");
        std::fs::write(
            &path,
            "[[metrics]]\nname = \"x\"\npattern = 'x\\s+(\\d+)'\nunit = \"u\"\nconversion = \"furlongs\"\n",
        )
        .unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_metric_pattern_needs_one_group() {
        let config = StatsConfig {
            metrics: vec![MetricRuleConfig {
                name: "pair".into(),
                pattern: r"(\w+)\s+(\d+)".into(),
                unit: "u".into(),
                conversion: ConversionConfig::None,
            }],
            ..StatsConfig::default()
        };
        let err = config.metric_rules().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CaptureGroups {
                expected: 1,
                found: 2,
                ..
            }
        ));

        let none = StatsConfig {
            metrics: vec![MetricRuleConfig {
                name: "bare".into(),
                pattern: r"simSeconds".into(),
                unit: "s".into(),
                conversion: ConversionConfig::None,
            }],
            ..StatsConfig::default()
        };
        assert!(matches!(
            none.metric_rules().unwrap_err(),
            ConfigError::CaptureGroups { found: 0, .. }
        ));
    }

    #[test]
    fn test_histogram_pattern_needs_three_groups() {
        let config = StatsConfig {
            histogram: HistogramConfig {
                read_pattern: r"(mem_ctrl\d+)\.rdQLenPdf::(\d+)".into(),
                ..HistogramConfig::default()
            },
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.histogram_patterns().unwrap_err(),
            ConfigError::CaptureGroups { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let config = StatsConfig {
            metrics: vec![MetricRuleConfig {
                name: "broken".into(),
                pattern: r"simSeconds\s+(".into(),
                unit: "s".into(),
                conversion: ConversionConfig::None,
            }],
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.metric_rules().unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_non_positive_divisors_rejected() {
        let config = StatsConfig {
            units: UnitsConfig {
                ticks_per_ns: 0.0,
                ..UnitsConfig::default()
            },
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.metric_rules().unwrap_err(),
            ConfigError::InvalidDivisor { .. }
        ));

        let config = StatsConfig {
            metrics: vec![MetricRuleConfig {
                name: "neg".into(),
                pattern: r"x\s+([\d\.]+)".into(),
                unit: "u".into(),
                conversion: ConversionConfig::Divide(-2.0),
            }],
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.metric_rules().unwrap_err(),
            ConfigError::InvalidDivisor { .. }
        ));
    }

    #[test]
    fn test_duplicate_metric_rejected() {
        let config = StatsConfig {
            metrics: vec![MetricRuleConfig {
                name: "cpu_ipc".into(),
                pattern: r"ipc\s+([\d\.]+)".into(),
                unit: "x".into(),
                conversion: ConversionConfig::None,
            }],
            ..StatsConfig::default()
        };
        assert!(matches!(
            config.metric_rules().unwrap_err(),
            ConfigError::DuplicateMetric { .. }
        ));
    }
}
