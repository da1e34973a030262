//! Fixed incident analytics: a set of ES|QL reports over the incident index.
//!
//! These are the canned views behind the dashboard; free-form questions go
//! to the hosted analytics agent instead.

use crate::elastic::{ElasticClient, ElasticError, EsqlTable};
use async_trait::async_trait;
use clap::ValueEnum;
use std::fmt;
use tracing::{info, warn};

/// Locations listed by [`ReportSection::HighRiskLocations`].
pub const TOP_LOCATIONS: usize = 10;
/// Equipment listed by [`ReportSection::EquipmentFailures`].
pub const TOP_EQUIPMENT: usize = 20;

/// Anything that can run an ES|QL query.
#[async_trait]
pub trait EsqlSource: Send + Sync {
    async fn esql(&self, query: &str) -> Result<EsqlTable, ElasticError>;
}

#[async_trait]
impl EsqlSource for ElasticClient {
    async fn esql(&self, query: &str) -> Result<EsqlTable, ElasticError> {
        ElasticClient::esql(self, query).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportSection {
    /// Totals, critical and repeat incidents, cost and downtime.
    Summary,
    /// Incident count per severity level.
    Severity,
    /// Count, cost and downtime per incident type.
    Types,
    /// Locations ranked by a severity-weighted risk score.
    HighRiskLocations,
    /// Mean, min and max downtime per incident type.
    Downtime,
    /// Equipment with the most incidents.
    EquipmentFailures,
}

impl ReportSection {
    pub const ALL: [ReportSection; 6] = [
        ReportSection::Summary,
        ReportSection::Severity,
        ReportSection::Types,
        ReportSection::HighRiskLocations,
        ReportSection::Downtime,
        ReportSection::EquipmentFailures,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Executive Summary",
            Self::Severity => "Severity Distribution",
            Self::Types => "Incident Types",
            Self::HighRiskLocations => "High-Risk Locations",
            Self::Downtime => "Downtime by Incident Type",
            Self::EquipmentFailures => "Equipment Failures",
        }
    }

    /// ES|QL for this section against `index`.
    pub fn query(&self, index: &str) -> String {
        match self {
            Self::Summary => format!(
                "FROM {index}
| STATS total_incidents = COUNT(*),
    critical_incidents = COUNT(*) WHERE severity == \"CRITICAL\",
    repeat_incidents = COUNT(*) WHERE recurrence_count > 0,
    total_cost_usd = SUM(cost_usd),
    total_downtime_hours = SUM(downtime_hours),
    avg_downtime_hours = AVG(downtime_hours)"
            ),
            Self::Severity => format!(
                "FROM {index}
| WHERE severity IS NOT NULL
| STATS incidents = COUNT(*) BY severity
| SORT incidents DESC"
            ),
            Self::Types => format!(
                "FROM {index}
| WHERE incident_type IS NOT NULL
| STATS incidents = COUNT(*),
    total_cost_usd = SUM(cost_usd),
    avg_downtime_hours = AVG(downtime_hours),
    recurrences = SUM(recurrence_count)
  BY incident_type
| SORT incidents DESC"
            ),
            Self::HighRiskLocations => format!(
                "FROM {index}
| WHERE location IS NOT NULL
| EVAL severity_score = CASE(severity == \"CRITICAL\", 4, severity == \"HIGH\", 3, severity == \"MEDIUM\", 2, 1)
| STATS incidents = COUNT(*),
    avg_severity = AVG(severity_score),
    critical = COUNT(*) WHERE severity == \"CRITICAL\",
    total_cost_usd = SUM(cost_usd)
  BY location
| EVAL risk_score = ROUND(avg_severity * incidents + critical * 20, 1)
| SORT risk_score DESC
| LIMIT {TOP_LOCATIONS}"
            ),
            Self::Downtime => format!(
                "FROM {index}
| WHERE incident_type IS NOT NULL AND downtime_hours IS NOT NULL
| STATS mean_downtime_hours = AVG(downtime_hours),
    min_downtime_hours = MIN(downtime_hours),
    max_downtime_hours = MAX(downtime_hours),
    incidents = COUNT(*)
  BY incident_type
| SORT mean_downtime_hours ASC"
            ),
            Self::EquipmentFailures => format!(
                "FROM {index}
| WHERE equipment_id IS NOT NULL
| STATS failures = COUNT(*),
    avg_cost_usd = AVG(cost_usd),
    total_downtime_hours = SUM(downtime_hours),
    max_recurrence = MAX(recurrence_count)
  BY equipment_id
| SORT failures DESC
| LIMIT {TOP_EQUIPMENT}"
            ),
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One section of a report. A failed query fails only its own section.
#[derive(Debug)]
pub struct SectionResult {
    pub section: ReportSection,
    pub table: Result<EsqlTable, ElasticError>,
}

/// Run `sections` in order against `index`.
///
/// An authorization failure stops the report, since every later query
/// would fail the same way. Other failures are kept per section.
pub async fn run_report(
    source: &dyn EsqlSource,
    index: &str,
    sections: &[ReportSection],
) -> Result<Vec<SectionResult>, ElasticError> {
    let mut results = Vec::with_capacity(sections.len());
    for &section in sections {
        let table = match source.esql(&section.query(index)).await {
            Ok(t) => {
                info!(section = %section, rows = t.values.len(), "Report section ready");
                Ok(t)
            }
            Err(e) if e.is_auth() => return Err(e),
            Err(e) => {
                warn!(section = %section, error = %e, "Report section failed");
                Err(e)
            }
        };
        results.push(SectionResult { section, table });
    }
    Ok(results)
}
