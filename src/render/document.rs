use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use crate::assets::{Icon, ImageSet, ResolvedAssets};
use crate::layout::{FontFace, FontSet, FontStyle, Geometry, Page, PageManager, Section};
use crate::types::{AuditRecord, RenderError};

use super::context::RenderContext;
use super::finalize::stamp_footers;
use super::sections::SECTIONS;

/// Metadata written to the PDF Info dictionary
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

/// A laid-out report: pages of draw ops plus the resources they reference
#[derive(Debug, Clone)]
pub struct Document {
    pub geometry: Geometry,
    pub pages: Vec<Page>,
    pub fonts: FontSet,
    pub images: ImageSet,
    pub info: DocumentInfo,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Section markers across all pages, in document order
    pub fn sections(&self) -> Vec<Section> {
        self.pages.iter().flat_map(|page| page.sections()).collect()
    }

    /// Index of the page `section` starts on
    pub fn section_page(&self, section: Section) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.sections().any(|s| s == section))
    }
}

/// Everything about a render that is not the record itself
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub org_name: String,
    pub geometry: Geometry,
    pub generated: DateTime<Utc>,
    /// Logo keys in lookup order; the first that decodes is used
    pub logo_keys: Vec<String>,
    pub font_regular: Option<String>,
    pub font_bold: Option<String>,
}

impl DocumentOptions {
    pub fn new(org_name: impl Into<String>) -> Self {
        Self {
            org_name: org_name.into(),
            geometry: Geometry::default(),
            generated: Utc::now(),
            logo_keys: Vec::new(),
            font_regular: None,
            font_bold: None,
        }
    }
}

/// Every asset key a render of `record` may draw
pub fn asset_keys(record: &AuditRecord, options: &DocumentOptions) -> Vec<String> {
    let mut keys: Vec<String> = Icon::ALL.iter().map(Icon::key).collect();
    keys.extend(options.logo_keys.iter().cloned());
    keys.extend(options.font_regular.iter().cloned());
    keys.extend(options.font_bold.iter().cloned());
    keys.extend(
        record
            .graphs
            .enabled()
            .into_iter()
            .map(|(_, url)| url.to_string()),
    );
    let mut seen = HashSet::new();
    keys.retain(|key| seen.insert(key.clone()));
    keys
}

fn font_name(key: &str) -> &str {
    let file = key.rsplit(['/', '\\']).next().unwrap_or(key);
    file.split('.').next().unwrap_or(file)
}

fn load_font(assets: &ResolvedAssets, key: Option<&str>, style: FontStyle) -> FontFace {
    let Some(key) = key else {
        return FontFace::helvetica(style);
    };
    let Some(bytes) = assets.get(key) else {
        return FontFace::helvetica(style);
    };
    match FontFace::from_truetype(font_name(key), bytes.clone()) {
        Ok(face) => face,
        Err(e) => {
            warn!("Font {} unusable, falling back to Helvetica: {}", key, e);
            FontFace::helvetica(style)
        }
    }
}

/// Lay out `record` into pages.
///
/// Runs the sections in order on one thread. `checkpoint` is called before
/// each section and before the footer pass; an error from it aborts the
/// render.
pub fn layout_document(
    record: &AuditRecord,
    assets: &ResolvedAssets,
    options: &DocumentOptions,
    checkpoint: &mut dyn FnMut() -> Result<(), RenderError>,
) -> Result<Document, RenderError> {
    let fonts = FontSet {
        regular: load_font(assets, options.font_regular.as_deref(), FontStyle::Regular),
        bold: load_font(assets, options.font_bold.as_deref(), FontStyle::Bold),
    };

    let keys = asset_keys(record, options);
    let images = ImageSet::decode(assets, keys.iter().map(String::as_str));
    let logo_key = options
        .logo_keys
        .iter()
        .map(String::as_str)
        .find(|key| images.contains(key));

    let ctx = RenderContext {
        record,
        fonts: &fonts,
        images: &images,
        org_name: &options.org_name,
        generated: options.generated,
        logo_key,
    };

    let mut pm = PageManager::new(options.geometry);
    for (section, render) in SECTIONS {
        checkpoint()?;
        let before = pm.page_count();
        render(&mut pm, &ctx)?;
        trace!(?section, pages = pm.page_count() - before, "section laid out");
    }
    checkpoint()?;

    let mut pages = pm.into_pages();
    let footer = format!("Generated on {}", ctx.generated_label());
    stamp_footers(&mut pages, &options.geometry, &fonts, &options.org_name, &footer);

    Ok(Document {
        geometry: options.geometry,
        pages,
        fonts,
        images,
        info: DocumentInfo {
            title: format!("{} Security Audit", record.name),
            author: options.org_name.clone(),
            created: options.generated,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::bundled;
    use crate::layout::{DrawOp, PageKind};
    use crate::types::{
        Finding, FindingStatus, Graphs, Kyc, Severity, SeverityCounts, Socials, TokenDistribution,
    };

    fn finding(id: &str, severity: Severity, status: FindingStatus) -> Finding {
        Finding {
            id: id.to_string(),
            title: format!("Issue {}", id),
            severity,
            status,
            category: Some("Logic".to_string()),
            description: Some("The function does not validate its input.".to_string()),
            location: Some("Token.sol#L42".to_string()),
            recommendation: Some("Add a require statement.".to_string()),
            alleviation: None,
        }
    }

    fn record(findings: Vec<Finding>) -> AuditRecord {
        AuditRecord {
            name: "Example Token".to_string(),
            slug: "example-token".to_string(),
            findings,
            ..Default::default()
        }
    }

    fn warm_assets() -> ResolvedAssets {
        let mut assets = ResolvedAssets::default();
        for icon in Icon::ALL {
            assets.insert(icon.key(), bundled::lookup(icon.name()).unwrap().to_vec());
        }
        assets
    }

    fn layout(record: &AuditRecord) -> Document {
        let options = DocumentOptions::new("Test Org");
        layout_document(record, &warm_assets(), &options, &mut || Ok(())).unwrap()
    }

    /// Texts drawn between the markers of `section` and the next section
    fn section_texts(doc: &Document, section: Section) -> Vec<String> {
        let mut inside = false;
        let mut out = Vec::new();
        for page in &doc.pages {
            for op in &page.ops {
                match op {
                    DrawOp::Marker(s) => inside = *s == section,
                    DrawOp::Text { text, .. } if inside => out.push(text.clone()),
                    _ => {}
                }
            }
        }
        out
    }

    #[test]
    fn test_critical_and_informational_scenario() {
        let mut record = record(vec![
            finding("F-1", Severity::Critical, FindingStatus::Detected),
            finding("F-2", Severity::Informational, FindingStatus::Detected),
        ]);
        record.critical = Some(SeverityCounts { found: 1, pending: 1, resolved: 0 });
        record.informational = Some(SeverityCounts { found: 1, pending: 1, resolved: 0 });

        let doc = layout(&record);
        let sections = doc.sections();
        assert!(!sections.contains(&Section::SocialLinks));
        assert!(!sections.contains(&Section::Kyc));
        assert!(!sections.contains(&Section::TokenDistribution));

        let details = section_texts(&doc, Section::DetailedFindings);
        let critical = details.iter().position(|t| t == "Critical Issues (1)").unwrap();
        let info = details
            .iter()
            .position(|t| t == "Informational Issues (1)")
            .unwrap();
        assert!(critical < info);
        assert_eq!(details.iter().filter(|t| t.ends_with("Issues (1)")).count(), 2);
        assert!(details.iter().any(|t| t == "URGENT"));

        let summary = section_texts(&doc, Section::FindingsSummary);
        let row = summary.iter().position(|t| t == "Critical").unwrap();
        assert_eq!(summary[row + 1], "1");
    }

    #[test]
    fn test_all_pass_renders_affirmation_only() {
        let doc = layout(&record(vec![
            finding("F-1", Severity::High, FindingStatus::Pass),
            finding("F-2", Severity::Low, FindingStatus::Pass),
        ]));
        let details = section_texts(&doc, Section::DetailedFindings);
        assert!(details.iter().any(|t| t == "No Critical Findings"));
        assert!(!details.iter().any(|t| t.ends_with(")") && t.contains("Issues (")));
        assert!(!details.iter().any(|t| t.starts_with("F-")));
    }

    #[test]
    fn test_only_active_findings_are_detailed() {
        let doc = layout(&record(vec![
            finding("F-1", Severity::High, FindingStatus::Pass),
            finding("F-2", Severity::High, FindingStatus::NotDetected),
            finding("F-3", Severity::High, FindingStatus::Acknowledge),
            finding("F-4", Severity::Medium, FindingStatus::Fail),
        ]));
        let details = section_texts(&doc, Section::DetailedFindings);
        assert!(details.iter().any(|t| t.starts_with("F-3")));
        assert!(details.iter().any(|t| t.starts_with("F-4")));
        assert!(!details.iter().any(|t| t.starts_with("F-1") || t.starts_with("F-2")));
        assert!(details.iter().any(|t| t == "High Issues (1)"));
    }

    #[test]
    fn test_sections_follow_fixed_order() {
        let mut record = record(vec![finding("F-1", Severity::Low, FindingStatus::Detected)]);
        record.socials = Socials {
            website: Some("https://example.com".to_string()),
            ..Default::default()
        };
        record.token_distribution = Some(TokenDistribution {
            enabled: true,
            allocations: vec![crate::types::Allocation {
                name: "Team".to_string(),
                amount: 100.0,
                description: None,
            }],
        });
        let doc = layout(&record);
        assert_eq!(
            doc.sections(),
            vec![
                Section::Cover,
                Section::ExecutiveSummary,
                Section::ProjectInfo,
                Section::Timeline,
                Section::TokenDistribution,
                Section::FindingsSummary,
                Section::DetailedFindings,
                Section::RiskOverview,
                Section::SocialLinks,
            ]
        );
        assert_eq!(doc.section_page(Section::Cover), Some(0));
        assert_eq!(doc.section_page(Section::ExecutiveSummary), Some(1));
    }

    #[test]
    fn test_disabled_distribution_takes_no_space() {
        let mut with = record(vec![]);
        with.token_distribution = Some(TokenDistribution {
            enabled: false,
            allocations: vec![crate::types::Allocation {
                name: "Team".to_string(),
                amount: 1.0,
                description: None,
            }],
        });
        let without = record(vec![]);

        let a = layout(&with);
        let b = layout(&without);
        assert_eq!(a.sections(), b.sections());
        assert_eq!(a.page_count(), b.page_count());
        assert_eq!(a.pages.last().unwrap().ops, b.pages.last().unwrap().ops);
    }

    #[test]
    fn test_kyc_block_when_any_field_present() {
        let mut record = record(vec![]);
        record.kyc = Some(Kyc {
            provider: Some("Assure".to_string()),
            status: Some("   ".to_string()),
            ..Default::default()
        });
        let doc = layout(&record);
        assert!(doc.sections().contains(&Section::Kyc));

        let texts = section_texts(&doc, Section::Kyc);
        assert!(texts.iter().any(|t| t == "KYC Verification"));
        assert!(texts.iter().any(|t| t == "Assure"));
        // Blank fields get no row
        assert!(!texts.iter().any(|t| t == "Status"));
    }

    #[test]
    fn test_blank_kyc_takes_no_space() {
        let mut blank = record(vec![]);
        blank.kyc = Some(Kyc {
            provider: Some(String::new()),
            members: Some("  ".to_string()),
            ..Default::default()
        });
        let mut empty = record(vec![]);
        empty.kyc = Some(Kyc::default());
        let without = record(vec![]);

        let reference = layout(&without);
        for doc in [layout(&blank), layout(&empty)] {
            assert!(!doc.sections().contains(&Section::Kyc));
            assert_eq!(doc.sections(), reference.sections());
            assert_eq!(doc.page_count(), reference.page_count());
            assert_eq!(doc.pages.last().unwrap().ops, reference.pages.last().unwrap().ops);
        }
    }

    #[test]
    fn test_diagram_image_is_placed() {
        let url = "https://cdn.example.com/graphs/call.png";
        let mut record = record(vec![]);
        record.graphs = Graphs {
            call_graph: true,
            call_graph_url: Some(url.to_string()),
            ..Default::default()
        };
        let mut assets = warm_assets();
        assets.insert(url, bundled::lookup("pass").unwrap().to_vec());

        let options = DocumentOptions::new("Test Org");
        let doc = layout_document(&record, &assets, &options, &mut || Ok(())).unwrap();
        assert!(doc.sections().contains(&Section::Diagrams));
        assert!(section_texts(&doc, Section::Diagrams).iter().any(|t| t == "Call Graph"));
        assert!(doc.images.contains(url));
        assert!(doc.pages.iter().any(|p| p.image_keys().any(|k| k == url)));
    }

    #[test]
    fn test_unloaded_diagram_keeps_title_only() {
        let url = "https://cdn.example.com/graphs/inheritance.png";
        let mut record = record(vec![]);
        record.graphs = Graphs {
            inheritance: true,
            inheritance_url: Some(url.to_string()),
            // Flag without a URL is skipped
            call_graph: true,
            ..Default::default()
        };
        let doc = layout(&record);
        assert!(doc.sections().contains(&Section::Diagrams));

        let texts = section_texts(&doc, Section::Diagrams);
        assert!(texts.iter().any(|t| t == "Inheritance Graph"));
        assert!(!texts.iter().any(|t| t == "Call Graph"));
        assert!(!doc.pages.iter().any(|p| p.image_keys().any(|k| k == url)));
    }

    #[test]
    fn test_long_finding_head_is_wrapped_not_cut() {
        let mut long = finding("F-7", Severity::Critical, FindingStatus::Detected);
        long.title = "Unchecked return value of low level call in the fee distributor ".repeat(4);
        long.location = Some("contracts/distribution/FeeDistributor.sol#L120-L188 ".repeat(3));
        let doc = layout(&record(vec![long.clone()]));

        let details = section_texts(&doc, Section::DetailedFindings);
        assert!(!details.iter().any(|t| t.ends_with("...")));
        let joined = details.join(" ");
        let title = format!("F-7 {}", long.title.split_whitespace().collect::<Vec<_>>().join(" "));
        assert!(joined.contains(&title));
        let location = long.location.unwrap();
        let last = location.split_whitespace().last().unwrap();
        assert_eq!(joined.matches(last).count(), 3);
        assert_eq!(details.iter().filter(|t| t.starts_with("F-7")).count(), 1);
    }

    #[test]
    fn test_footer_on_every_body_page() {
        let findings = (0..30)
            .map(|i| finding(&format!("F-{}", i), Severity::Medium, FindingStatus::Detected))
            .collect();
        let doc = layout(&record(findings));
        let total = doc.page_count();
        assert!(total > 3);

        assert_eq!(doc.pages[0].kind, PageKind::Cover);
        assert!(!doc.pages[0].texts().any(|t| t.starts_with("Page ")));
        for (i, page) in doc.pages.iter().enumerate().skip(1) {
            let stamp = format!("Page {} of {}", i + 1, total);
            assert!(page.texts().any(|t| t == stamp), "missing {}", stamp);
        }
    }

    #[test]
    fn test_cursor_never_passes_bottom_margin() {
        let mut long = finding("F-1", Severity::Critical, FindingStatus::Detected);
        long.description = Some("overflowing description text ".repeat(400));
        let doc = layout(&record(vec![long]));
        let bottom = doc.geometry.bottom_limit();

        for page in &doc.pages {
            // Footer ops are appended after the body ops and sit below the margin
            let body = page
                .ops
                .iter()
                .take_while(|op| !matches!(op, DrawOp::Line { y1, .. } if *y1 > bottom));
            for op in body {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y <= bottom + 0.01);
                }
            }
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let record = record(vec![
            finding("F-1", Severity::Critical, FindingStatus::Detected),
            finding("F-2", Severity::Low, FindingStatus::Acknowledge),
        ]);
        let mut options = DocumentOptions::new("Test Org");
        let assets = warm_assets();
        let a = layout_document(&record, &assets, &options, &mut || Ok(())).unwrap();
        options.generated = a.info.created;
        let b = layout_document(&record, &assets, &options, &mut || Ok(())).unwrap();
        assert_eq!(a.page_count(), b.page_count());
        assert_eq!(a.sections(), b.sections());
    }

    #[test]
    fn test_checkpoint_error_aborts() {
        let options = DocumentOptions::new("Test Org");
        let mut calls = 0;
        let result = layout_document(&record(vec![]), &warm_assets(), &options, &mut || {
            calls += 1;
            if calls > 2 {
                Err(RenderError::DeadlineExceeded)
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(RenderError::DeadlineExceeded)));
    }

    #[test]
    fn test_missing_icons_are_omitted() {
        let options = DocumentOptions::new("Test Org");
        let record = record(vec![finding("F-1", Severity::High, FindingStatus::Detected)]);
        let doc =
            layout_document(&record, &ResolvedAssets::default(), &options, &mut || Ok(())).unwrap();
        assert!(doc.images.is_empty());
        assert!(doc.pages.iter().all(|p| p.image_keys().next().is_none()));
        assert!(section_texts(&doc, Section::DetailedFindings)
            .iter()
            .any(|t| t == "High Issues (1)"));
    }

    #[test]
    fn test_font_name_from_key() {
        assert_eq!(font_name("https://cdn.example.com/fonts/Inter-Bold.ttf"), "Inter-Bold");
        assert_eq!(font_name("fonts/Inter.ttf"), "Inter");
    }
}
