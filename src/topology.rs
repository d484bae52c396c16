//! Description of the simulated system whose statistics we post-process.
//!
//! The traffic-generator setup is a timing CPU with split L1 caches, a shared
//! L2 behind a crossbar, a synthetic traffic generator on the memory bus and
//! one LPDDR5 controller per address range. Only the object names matter
//! here: they determine which statistic lines the built-in metric rules look
//! for.

use crate::config::{ConversionConfig, MetricRuleConfig};
use serde::Deserialize;

pub const UNIT_IPC: &str = "Instructions per cycle";
pub const UNIT_CPI: &str = "Cycles per instruction";
pub const UNIT_MISS_RATE: &str = "Misses per access";
pub const UNIT_NS: &str = "ns";
pub const UNIT_MBPS: &str = "MB/s";

/// Object names in the simulated system.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Root object name, prefixed to every statistic.
    pub namespace: String,
    pub cpu: String,
    /// Instruction cache, a child of the CPU.
    pub icache: String,
    /// Data cache, a child of the CPU.
    pub dcache: String,
    pub traffic_generator: String,
    pub memory_controllers: Vec<MemoryControllerConfig>,
}

/// A DRAM controller and the short label its metrics are reported under.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MemoryControllerConfig {
    /// Simulator object name, e.g. `mem_ctrl1`.
    pub name: String,
    /// Metric name prefix, e.g. `dram1`.
    pub label: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            namespace: "system".to_string(),
            cpu: "cpu".to_string(),
            icache: "icache".to_string(),
            dcache: "dcache".to_string(),
            traffic_generator: "trafficgen".to_string(),
            memory_controllers: vec![
                MemoryControllerConfig {
                    name: "mem_ctrl1".to_string(),
                    label: "dram1".to_string(),
                },
                MemoryControllerConfig {
                    name: "mem_ctrl2".to_string(),
                    label: "dram2".to_string(),
                },
            ],
        }
    }
}

impl TopologyConfig {
    /// Built-in metric rules for this topology, in output column order.
    pub fn builtin_metrics(&self) -> Vec<MetricRuleConfig> {
        let ns = &self.namespace;
        let cpu = format!("{ns}.{}", self.cpu);
        let tgen = format!("{ns}.{}", self.traffic_generator);

        let mut rules = vec![
            stat_rule("cpu_ipc", &format!("{cpu}.ipc"), UNIT_IPC, ConversionConfig::None),
            stat_rule("cpu_cpi", &format!("{cpu}.cpi"), UNIT_CPI, ConversionConfig::None),
        ];

        for (prefix, cache) in [("icache", &self.icache), ("dcache", &self.dcache)] {
            let path = format!("{cpu}.{cache}");
            rules.push(stat_rule(
                &format!("{prefix}_miss_rate"),
                &format!("{path}.overallMissRate::total"),
                UNIT_MISS_RATE,
                ConversionConfig::None,
            ));
            rules.push(stat_rule(
                &format!("{prefix}_avg_miss_latency"),
                &format!("{path}.demandAvgMissLatency::total"),
                UNIT_NS,
                ConversionConfig::TicksToNs,
            ));
        }

        rules.extend([
            stat_rule(
                "trafficgen_avg_read_latency",
                &format!("{tgen}.avgReadLatency"),
                UNIT_NS,
                ConversionConfig::TicksToNs,
            ),
            stat_rule(
                "trafficgen_avg_write_latency",
                &format!("{tgen}.avgWriteLatency"),
                UNIT_NS,
                ConversionConfig::TicksToNs,
            ),
            stat_rule(
                "trafficgen_read_bw",
                &format!("{tgen}.readBW"),
                UNIT_MBPS,
                ConversionConfig::BytesToMegabytes,
            ),
            stat_rule(
                "trafficgen_write_bw",
                &format!("{tgen}.writeBW"),
                UNIT_MBPS,
                ConversionConfig::BytesToMegabytes,
            ),
        ]);

        for ctrl in &self.memory_controllers {
            let dram = format!("{ns}.{}.dram", ctrl.name);
            let label = &ctrl.label;
            rules.extend([
                stat_rule(
                    &format!("{label}_avg_mem_acc_lat"),
                    &format!("{dram}.avgMemAccLat"),
                    UNIT_NS,
                    ConversionConfig::TicksToNs,
                ),
                stat_rule(
                    &format!("{label}_avg_rd_bw"),
                    &format!("{dram}.bwRead::total"),
                    UNIT_MBPS,
                    ConversionConfig::BytesToMegabytes,
                ),
                stat_rule(
                    &format!("{label}_avg_wr_bw"),
                    &format!("{dram}.bwWrite::total"),
                    UNIT_MBPS,
                    ConversionConfig::BytesToMegabytes,
                ),
            ]);
        }

        rules
    }
}

/// A rule matching `<stat path> <decimal value>`.
fn stat_rule(name: &str, stat: &str, unit: &str, conversion: ConversionConfig) -> MetricRuleConfig {
    MetricRuleConfig {
        name: name.to_string(),
        pattern: format!(r"{}\s+([\d\.]+)", regex::escape(stat)),
        unit: unit.to_string(),
        conversion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builtin_metric_order() {
        let names: Vec<String> = TopologyConfig::default()
            .builtin_metrics()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "cpu_ipc",
                "cpu_cpi",
                "icache_miss_rate",
                "icache_avg_miss_latency",
                "dcache_miss_rate",
                "dcache_avg_miss_latency",
                "trafficgen_avg_read_latency",
                "trafficgen_avg_write_latency",
                "trafficgen_read_bw",
                "trafficgen_write_bw",
                "dram1_avg_mem_acc_lat",
                "dram1_avg_rd_bw",
                "dram1_avg_wr_bw",
                "dram2_avg_mem_acc_lat",
                "dram2_avg_rd_bw",
                "dram2_avg_wr_bw",
            ]
        );
    }

    #[test]
    fn test_builtin_patterns_escape_stat_names() {
        let rules = TopologyConfig::default().builtin_metrics();
        let icache = rules.iter().find(|r| r.name == "icache_miss_rate").unwrap();
        assert_eq!(
            icache.pattern,
            r"system\.cpu\.icache\.overallMissRate::total\s+([\d\.]+)"
        );
        assert_eq!(icache.unit, UNIT_MISS_RATE);
    }

    #[test]
    fn test_builtin_units_and_conversions() {
        let rules = TopologyConfig::default().builtin_metrics();
        let get = |name: &str| rules.iter().find(|r| r.name == name).unwrap();

        assert_eq!(get("cpu_ipc").conversion, ConversionConfig::None);
        assert_eq!(get("dram2_avg_mem_acc_lat").unit, UNIT_NS);
        assert_eq!(get("dram2_avg_mem_acc_lat").conversion, ConversionConfig::TicksToNs);
        assert_eq!(get("trafficgen_write_bw").unit, UNIT_MBPS);
        assert_eq!(
            get("trafficgen_write_bw").conversion,
            ConversionConfig::BytesToMegabytes
        );
    }

    #[test]
    fn test_custom_topology_names() {
        let topology = TopologyConfig {
            namespace: "board".into(),
            traffic_generator: "tg".into(),
            memory_controllers: vec![MemoryControllerConfig {
                name: "ddr0".into(),
                label: "ddr0".into(),
            }],
            ..TopologyConfig::default()
        };
        let rules = topology.builtin_metrics();
        assert_eq!(rules.len(), 13);

        let bw = rules.iter().find(|r| r.name == "ddr0_avg_rd_bw").unwrap();
        assert_eq!(bw.pattern, r"board\.ddr0\.dram\.bwRead::total\s+([\d\.]+)");
        let tg = rules.iter().find(|r| r.name == "trafficgen_read_bw").unwrap();
        assert!(tg.pattern.starts_with(r"board\.tg\.readBW"));
    }
}
