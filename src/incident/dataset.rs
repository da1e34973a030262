//! Synthetic incident dataset for demos.
//!
//! The generator is seeded, so the same `(count, seed)` pair always produces
//! the same records and the same ids. Re-ingesting a generated dataset is
//! therefore an update of existing documents, never a duplication.

use super::model::{IncidentRecord, Severity};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::path::Path;

pub const DEFAULT_DATASET_SIZE: usize = 200;
pub const DEFAULT_SEED: u64 = 42;

struct Scenario {
    incident_type: &'static str,
    descriptions: &'static [&'static str],
    equipment: &'static [(&'static str, &'static str)],
    severities: &'static [Severity],
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        incident_type: "PIPELINE_LEAK",
        descriptions: &[
            "8-inch crude oil pipeline developed a pinhole leak at weld joint. Approximately 10 barrels of crude oil released before isolation. Containment booms deployed.",
            "Corrosion-induced pipeline failure detected by pressure monitoring system. 6-inch gas pipeline section isolated. No injuries reported.",
            "Pipeline pigging operation revealed internal corrosion. Precautionary shutdown of 2km section. Inspection team dispatched.",
        ],
        equipment: &[("PIPE", "Pipeline"), ("PIG", "Pig Launcher"), ("VLV", "Control Valve"), ("PT", "Pressure Transmitter")],
        severities: &[Severity::High, Severity::High, Severity::Medium],
    },
    Scenario {
        incident_type: "EQUIPMENT_FAILURE",
        descriptions: &[
            "Centrifugal pump bearing failure causing production shutdown. Replacement parts ordered, estimated 48-hour downtime.",
            "Gas compressor unit experienced unplanned shutdown due to high vibration alarm. Production reduced by 15%.",
            "Wellhead control panel malfunctioned during routine operations. Manual override engaged. Root cause investigation initiated.",
            "Blowout preventer stack pressure test failed. Well operations suspended pending BOP inspection and certification.",
        ],
        equipment: &[("PUMP", "Centrifugal Pump"), ("COMP", "Gas Compressor"), ("WCP", "Wellhead Control Panel"), ("BOP", "BOP Stack")],
        severities: &[Severity::Medium, Severity::Medium, Severity::Medium, Severity::High],
    },
    Scenario {
        incident_type: "H2S_GAS_RELEASE",
        descriptions: &[
            "H2S gas detector alarmed at 15 ppm in production facility. Non-essential personnel evacuated. Ventilation system activated.",
            "Sour crude oil spill in tank battery area triggered H2S monitors. Emergency response team deployed with SCBA equipment.",
            "H2S concentration reached 50 ppm during workover operations. Operations halted, wind direction assessed, muster point activated.",
        ],
        equipment: &[("H2S", "H2S Monitor"), ("GD", "Gas Detector"), ("VENT", "Ventilation System")],
        severities: &[Severity::High, Severity::High, Severity::Critical],
    },
    Scenario {
        incident_type: "PERSONNEL_INJURY",
        descriptions: &[
            "Rig floor worker sustained hand laceration while making pipe connection. First aid administered on site. No lost time incident.",
            "Operator slipped on wet deck surface causing ankle sprain. Medical evaluation completed. OSHA recordable incident.",
            "Worker struck by dropped wrench from elevated work platform. Hard hat prevented serious injury. Near-miss investigation initiated.",
        ],
        equipment: &[("DP", "Drill Pipe"), ("SLP", "Slips"), ("TNG", "Tongs"), ("HRN", "Safety Harness")],
        severities: &[Severity::Medium, Severity::Low, Severity::High],
    },
    Scenario {
        incident_type: "WELL_BLOWOUT",
        descriptions: &[
            "Uncontrolled well flow detected during drilling operations at 8500ft depth. BOP closed, well kill operation initiated with kill fluid circulation.",
            "Gas kick encountered during tripping operations. Pit gain observed. Well shut in with annular preventer. Well control team mobilized.",
        ],
        equipment: &[("BOP", "BOP"), ("MP", "Mud Pump"), ("KL", "Kill Line")],
        severities: &[Severity::Critical, Severity::Critical],
    },
    Scenario {
        incident_type: "FIRE_EXPLOSION",
        descriptions: &[
            "Flash fire occurred in wellbay area during hot work permit activities. Fire extinguished within 3 minutes. Minor burns to 1 worker.",
            "Gas cloud ignited from flare stack malfunction. Explosion heard within 500m radius. Emergency shutdown system activated automatically.",
        ],
        equipment: &[("FLR", "Flare Stack"), ("FSS", "Fire Suppression System"), ("ESD", "ESD System")],
        severities: &[Severity::Critical, Severity::Critical],
    },
    Scenario {
        incident_type: "NEAR_MISS",
        descriptions: &[
            "Near-miss: truck driver came within 2 meters of open wellbore during routine deliveries. Safety barriers were inadequate.",
            "Near-miss: pressure buildup in separator exceeded 90% of relief valve set point. Operator intervened before relief valve activation.",
            "Near-miss: lifting sling found to be worn beyond inspection limits before crane lift operation. Lift halted, equipment replaced.",
        ],
        equipment: &[("CRN", "Crane"), ("SEP", "Separator"), ("BAR", "Safety Barriers")],
        severities: &[Severity::Low, Severity::Medium, Severity::Medium],
    },
    Scenario {
        incident_type: "ENVIRONMENTAL_RELEASE",
        descriptions: &[
            "Produced water overflow from storage pit due to valve failure. Estimated 50 barrels released. Soil remediation commenced.",
            "Chemical spill of scale inhibitor during dosing operation. 20 liters released. Secondary containment contained spill.",
            "Crude oil sheen detected on water surface near platform. Source identified as overboard discharge from separator. Operations adjusted.",
        ],
        equipment: &[("TANK", "Storage Tank"), ("CIS", "Chemical Injection System"), ("SEP", "Separator")],
        severities: &[Severity::High, Severity::Medium, Severity::High],
    },
];

const LOCATIONS: &[&str] = &[
    "Permian Basin Alpha",
    "Gulf Coast Platform B7",
    "Eagle Ford Shale",
    "Bakken North",
    "Marcellus Appalachian",
];

const TEAMS: &[&str] = &[
    "Emergency Response",
    "Well Control",
    "HSE Team",
    "Operations",
    "Maintenance",
    "Environmental",
];

const ROOT_CAUSES: &[&str] = &[
    "mechanical failure",
    "human error",
    "process deviation",
    "equipment degradation",
    "design deficiency",
];

const REMEDIATIONS: &[&str] = &[
    "Maintenance order raised",
    "Equipment replaced",
    "Procedure reviewed",
    "Training initiated",
    "Design modification planned",
];

/// Baseline sensor readings (vibration Hz, temperature °C, pressure psi) and
/// how far each severity step pushes them away from normal operation.
const SENSOR_BASELINE: (f64, f64, f64) = (60.0, 45.0, 1200.0);
const SENSOR_STEP: (f64, f64, f64) = (30.0, 12.0, 350.0);

fn severity_step(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.0,
        Severity::Medium => 1.0,
        Severity::High => 2.0,
        Severity::Critical => 3.0,
    }
}

fn cost_range(severity: Severity) -> (f64, f64) {
    match severity {
        Severity::Critical => (500_000.0, 10_000_000.0),
        Severity::High => (50_000.0, 500_000.0),
        Severity::Medium => (5_000.0, 50_000.0),
        Severity::Low => (500.0, 5_000.0),
    }
}

fn downtime_range(severity: Severity) -> (f64, f64) {
    match severity {
        Severity::Critical => (2.0, 48.0),
        Severity::High => (4.0, 72.0),
        Severity::Medium => (8.0, 168.0),
        Severity::Low => (0.0, 24.0),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn sample_reading(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(normal) => round_to(normal.sample(rng).max(0.0), 1),
        Err(_) => round_to(mean, 1),
    }
}

fn generate_incident(rng: &mut StdRng, number: usize) -> IncidentRecord {
    let scenario = &SCENARIOS[rng.random_range(0..SCENARIOS.len())];
    let description = scenario.descriptions.choose(rng).copied().unwrap_or_default();
    let severity = scenario.severities.choose(rng).copied().unwrap_or(Severity::Medium);
    let (equipment_prefix, _) = scenario.equipment.choose(rng).copied().unwrap_or(("EQ", ""));
    let location = LOCATIONS.choose(rng).copied().unwrap_or_default();
    let team = TEAMS.choose(rng).copied().unwrap_or_default();
    let root_cause = ROOT_CAUSES.choose(rng).copied().unwrap_or_default();
    let remediation = REMEDIATIONS.choose(rng).copied().unwrap_or_default();

    let step = severity_step(severity);
    let vibration = sample_reading(rng, SENSOR_BASELINE.0 + SENSOR_STEP.0 * step, 8.0);
    let temperature = sample_reading(rng, SENSOR_BASELINE.1 + SENSOR_STEP.1 * step, 4.0);
    let pressure = sample_reading(rng, SENSOR_BASELINE.2 + SENSOR_STEP.2 * step, 90.0);

    let (cost_lo, cost_hi) = cost_range(severity);
    let (down_lo, down_hi) = downtime_range(severity);

    IncidentRecord {
        incident_id: format!("INC-{:04}", number),
        incident_type: Some(scenario.incident_type.to_string()),
        location: Some(location.to_string()),
        well_id: Some(format!("WELL-{:03}", rng.random_range(1..=50))),
        equipment_id: Some(format!(
            "{}-{:04}",
            equipment_prefix,
            rng.random_range(1..=9999)
        )),
        description: Some(description.to_string()),
        sensor_vibration_hz: Some(vibration),
        sensor_temp_celsius: Some(temperature),
        sensor_pressure_psi: Some(pressure),
        severity: Some(severity),
        root_cause: Some(format!(
            "Preliminary assessment indicates {}",
            root_cause
        )),
        remediation: Some(format!(
            "Immediate isolation and assessment. {}.",
            remediation
        )),
        assigned_team: Some(team.to_string()),
        cost_usd: Some(round_to(rng.random_range(cost_lo..cost_hi), 2)),
        downtime_hours: Some(round_to(rng.random_range(down_lo..down_hi), 1)),
        recurrence_count: Some(rng.random_range(0..=5)),
    }
}

/// Generate `count` incidents numbered from `INC-0001`.
pub fn generate_dataset(count: usize, seed: u64) -> Vec<IncidentRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=count).map(|n| generate_incident(&mut rng, n)).collect()
}

/// Write a dataset as pretty JSON, creating parent directories as needed.
pub fn save_dataset(path: &Path, records: &[IncidentRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write dataset to {:?}", path))
}
