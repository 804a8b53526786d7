use tracing::debug;

use crate::types::{AuditRecord, Finding, Severity, SeverityCounts};

/// Active findings of one severity, in their original order
#[derive(Debug, Clone)]
pub struct SeverityGroup<'a> {
    pub severity: Severity,
    pub findings: Vec<&'a Finding>,
}

/// Partition the active findings by severity.
///
/// Groups come out in `Severity::ALL` order and empty groups are dropped.
/// Findings keep their relative order within a group.
pub fn group_active(findings: &[Finding]) -> Vec<SeverityGroup<'_>> {
    Severity::ALL
        .iter()
        .map(|&severity| SeverityGroup {
            severity,
            findings: findings
                .iter()
                .filter(|f| f.severity == severity && f.status.is_active())
                .collect(),
        })
        .filter(|group| !group.findings.is_empty())
        .collect()
}

pub fn active_count(findings: &[Finding]) -> usize {
    findings.iter().filter(|f| f.status.is_active()).count()
}

/// Counts for the findings summary table, one row per tier.
///
/// Tiers supplied by the record are shown as-is (missing ones as zero). A
/// record without any tier counts gets them derived from its findings.
pub fn tier_counts(record: &AuditRecord) -> Vec<(Severity, SeverityCounts)> {
    if !record.has_tier_counts() && !record.findings.is_empty() {
        return Severity::ALL
            .iter()
            .map(|&severity| {
                let mut counts = SeverityCounts::default();
                for finding in record.findings.iter().filter(|f| f.severity == severity) {
                    counts.found += 1;
                    if finding.status.is_active() {
                        counts.pending += 1;
                    } else {
                        counts.resolved += 1;
                    }
                }
                (severity, counts)
            })
            .collect();
    }

    Severity::ALL
        .iter()
        .map(|&severity| {
            let counts = record.tier(severity);
            if !counts.is_consistent() {
                debug!(
                    "{} tier of {} has found={} < pending+resolved={}",
                    severity.label(),
                    record.slug,
                    counts.found,
                    counts.pending.saturating_add(counts.resolved)
                );
            }
            (severity, counts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FindingStatus;

    fn finding(id: &str, severity: Severity, status: FindingStatus) -> Finding {
        Finding {
            id: id.to_string(),
            title: format!("Finding {}", id),
            severity,
            status,
            category: None,
            description: None,
            location: None,
            recommendation: None,
            alleviation: None,
        }
    }

    #[test]
    fn test_groups_follow_fixed_precedence_and_skip_empty() {
        let findings = vec![
            finding("1", Severity::Low, FindingStatus::Detected),
            finding("2", Severity::Critical, FindingStatus::Fail),
            finding("3", Severity::Informational, FindingStatus::Acknowledge),
            finding("4", Severity::Critical, FindingStatus::Detected),
        ];
        let groups = group_active(&findings);
        let order: Vec<_> = groups.iter().map(|g| g.severity).collect();
        assert_eq!(
            order,
            vec![Severity::Critical, Severity::Low, Severity::Informational]
        );
        let ids: Vec<_> = groups[0].findings.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_inactive_findings_are_filtered() {
        let findings = vec![
            finding("1", Severity::High, FindingStatus::Pass),
            finding("2", Severity::High, FindingStatus::NotDetected),
        ];
        assert!(group_active(&findings).is_empty());
        assert_eq!(active_count(&findings), 0);
    }

    #[test]
    fn test_tier_counts_derived_when_record_has_none() {
        let record = AuditRecord {
            findings: vec![
                finding("1", Severity::Medium, FindingStatus::Detected),
                finding("2", Severity::Medium, FindingStatus::Pass),
            ],
            ..Default::default()
        };
        let counts = tier_counts(&record);
        assert_eq!(counts[2].0, Severity::Medium);
        assert_eq!(
            counts[2].1,
            SeverityCounts { found: 2, pending: 1, resolved: 1 }
        );
        assert_eq!(counts[0].1, SeverityCounts::default());
    }

    #[test]
    fn test_supplied_tiers_are_shown_as_is() {
        let record = AuditRecord {
            critical: Some(SeverityCounts { found: 1, pending: 3, resolved: 3 }),
            findings: vec![finding("1", Severity::Low, FindingStatus::Detected)],
            ..Default::default()
        };
        let counts = tier_counts(&record);
        assert_eq!(counts[0].1.pending, 3);
        assert_eq!(counts[3].1, SeverityCounts::default());
    }
}
