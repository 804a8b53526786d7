use serde::{Deserialize, Serialize};

use super::RenderError;

/// Complete input for one report render.
///
/// Assembled by the calling system; the engine never mutates it. Every field
/// except `name`/`slug` is optional in the JSON shape and falls back to a
/// documented default when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuditRecord {
    pub name: String,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub supply: Option<String>,
    pub description: Option<String>,
    pub slug: String,
    pub platform: Option<String>,
    /// Explicit logo location; when absent the logo is looked up by slug.
    pub logo: Option<String>,
    pub contract_info: ContractInfo,
    pub socials: Socials,
    pub timeline: Timeline,
    pub overview: RiskOverview,
    pub critical: Option<SeverityCounts>,
    #[serde(alias = "high")]
    pub major: Option<SeverityCounts>,
    pub medium: Option<SeverityCounts>,
    #[serde(alias = "low")]
    pub minor: Option<SeverityCounts>,
    #[serde(alias = "info")]
    pub informational: Option<SeverityCounts>,
    pub findings: Vec<Finding>,
    pub token_distribution: Option<TokenDistribution>,
    pub scores: Scores,
    pub confidence: Option<String>,
    pub kyc: Option<Kyc>,
    pub graphs: Graphs,
}

impl AuditRecord {
    /// Parse a record from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|e| RenderError::InvalidRecord(e.to_string()))
    }

    /// Counts for one tier, zero-filled when the tier is absent
    pub fn tier(&self, severity: Severity) -> SeverityCounts {
        let counts = match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.major,
            Severity::Medium => &self.medium,
            Severity::Low => &self.minor,
            Severity::Informational => &self.informational,
        };
        counts.clone().unwrap_or_default()
    }

    /// True when the record supplies at least one severity tier
    pub fn has_tier_counts(&self) -> bool {
        [
            &self.critical,
            &self.major,
            &self.medium,
            &self.minor,
            &self.informational,
        ]
        .iter()
        .any(|tier| tier.is_some())
    }

    pub fn confidence_label(&self) -> &str {
        self.confidence
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Medium")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractInfo {
    pub address: Option<String>,
    pub language: Option<String>,
    pub owner: Option<String>,
    pub verified: Option<bool>,
    pub compiler: Option<String>,
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Socials {
    pub website: Option<String>,
    pub telegram: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
}

impl Socials {
    /// Non-empty links in display order
    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("Website", &self.website),
            ("Telegram", &self.telegram),
            ("Twitter", &self.twitter),
            ("GitHub", &self.github),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

/// Audit milestones as ISO-8601 date strings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub request: Option<String>,
    pub onboarding: Option<String>,
    pub preview: Option<String>,
    pub release: Option<String>,
}

/// Automated risk flags; `true` means the risk was detected
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskOverview {
    pub honeypot: Option<bool>,
    pub hidden_owner: Option<bool>,
    pub mint: Option<bool>,
    pub blacklist: Option<bool>,
    pub whitelist: Option<bool>,
    pub proxy_check: Option<bool>,
    pub pause_transfer: Option<bool>,
    pub anti_whale: Option<bool>,
    pub trading_cooldown: Option<bool>,
    pub self_destruct: Option<bool>,
    pub external_call: Option<bool>,
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
}

impl RiskOverview {
    pub fn flags(&self) -> Vec<(&'static str, Option<bool>)> {
        vec![
            ("Honeypot", self.honeypot),
            ("Hidden Owner", self.hidden_owner),
            ("Mint Function", self.mint),
            ("Blacklist", self.blacklist),
            ("Whitelist", self.whitelist),
            ("Proxy Contract", self.proxy_check),
            ("Pausable Transfers", self.pause_transfer),
            ("Anti-Whale", self.anti_whale),
            ("Trading Cooldown", self.trading_cooldown),
            ("Self Destruct", self.self_destruct),
            ("External Call", self.external_call),
        ]
    }
}

/// Aggregate counts for one severity tier.
///
/// `found >= pending + resolved` is expected but not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityCounts {
    pub found: u32,
    pub pending: u32,
    pub resolved: u32,
}

impl SeverityCounts {
    pub fn is_consistent(&self) -> bool {
        self.found >= self.pending.saturating_add(self.resolved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "critical", alias = "CRITICAL")]
    Critical,
    #[serde(alias = "high", alias = "Major", alias = "major")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low", alias = "Minor", alias = "minor")]
    Low,
    #[serde(alias = "informational", alias = "Info", alias = "info")]
    Informational,
}

impl Severity {
    /// Fixed precedence used for grouping and tables
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
        }
    }

    /// Critical and High findings get the urgent treatment
    pub fn is_priority(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Severity::Critical => {
                "Can lead to loss of funds or control of the contract. Must be fixed before deployment."
            }
            Severity::High => {
                "Can significantly affect contract behaviour or user funds under specific conditions."
            }
            Severity::Medium => {
                "Unexpected behaviour that does not directly put funds at risk but should be addressed."
            }
            Severity::Low => "Minor deviations from best practice with limited impact.",
            Severity::Informational => {
                "Style, readability or gas suggestions with no security impact."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingStatus {
    #[serde(alias = "detected")]
    Detected,
    #[serde(alias = "pass", alias = "Passed")]
    Pass,
    #[serde(rename = "Not Detected", alias = "NotDetected", alias = "not detected")]
    NotDetected,
    #[serde(alias = "fail", alias = "Failed")]
    Fail,
    #[serde(alias = "acknowledge", alias = "Acknowledged", alias = "acknowledged")]
    Acknowledge,
}

/// Icon drawn next to a finding's status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Pending,
    Resolved,
    Ack,
}

impl FindingStatus {
    /// A finding is active unless its status is a passing/clean one
    pub fn is_active(&self) -> bool {
        !matches!(self, FindingStatus::Pass | FindingStatus::NotDetected)
    }

    pub fn icon(&self) -> StatusIcon {
        match self {
            FindingStatus::Detected | FindingStatus::Fail => StatusIcon::Pending,
            FindingStatus::Pass | FindingStatus::NotDetected => StatusIcon::Resolved,
            FindingStatus::Acknowledge => StatusIcon::Ack,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FindingStatus::Detected => "Detected",
            FindingStatus::Pass => "Pass",
            FindingStatus::NotDetected => "Not Detected",
            FindingStatus::Fail => "Fail",
            FindingStatus::Acknowledge => "Acknowledged",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub status: FindingStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub alleviation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenDistribution {
    pub enabled: bool,
    pub allocations: Vec<Allocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Scores on a 0-100 scale
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scores {
    pub owner: Option<u8>,
    pub social: Option<u8>,
    pub security: Option<u8>,
    pub auditor: Option<u8>,
    pub overall: Option<u8>,
}

impl Scores {
    pub fn entries(&self) -> Vec<(&'static str, Option<u8>)> {
        vec![
            ("Security", self.security),
            ("Owner", self.owner),
            ("Social", self.social),
            ("Auditor", self.auditor),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kyc {
    pub provider: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub members: Option<String>,
}

impl Kyc {
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Provider", &self.provider),
            ("Status", &self.status),
            ("Verified On", &self.date),
            ("Certificate", &self.url),
            ("Verified Members", &self.members),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Graphs {
    pub call_graph: bool,
    pub call_graph_url: Option<String>,
    pub inheritance: bool,
    pub inheritance_url: Option<String>,
}

impl Graphs {
    /// Diagrams whose flag and URL are both present
    pub fn enabled(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if self.call_graph {
            if let Some(url) = self.call_graph_url.as_deref().filter(|u| !u.trim().is_empty()) {
                out.push(("Call Graph", url));
            }
        }
        if self.inheritance {
            if let Some(url) = self.inheritance_url.as_deref().filter(|u| !u.trim().is_empty()) {
                out.push(("Inheritance Graph", url));
            }
        }
        out
    }
}
