//! # Lab Guides
//!
//! Markdown guides split into typed sections, and a per-process cache.
//!
//! A guide is plain markdown with HTML comment markers:
//!
//! ```text
//! # Lab 01: GenAI
//! intro text            <- header
//! <!-- section:overview -->
//! ...
//! <!-- section:layer:1 -->
//! ...
//! ```
//!
//! Recognised markers: `overview`, `prerequisites`, `setup`, `layer:N`,
//! `exam-tips`, `summary`. A line holding an unknown marker is dropped.

use crate::{Catalog, LabDefinition, LabTrackError, Tier};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static SECTION_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<!--\s*section:([\w:-]+)\s*-->").ok());

// =============================================================================
// PARSING
// =============================================================================

/// Kind of a guide section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SectionKind {
    Overview,
    Prerequisites,
    Setup,
    /// `number` is `None` when the marker's suffix is not an integer.
    Layer { number: Option<u32> },
    ExamTips,
    Summary,
}

impl SectionKind {
    fn from_marker(marker: &str) -> Option<Self> {
        if let Some(rest) = marker.strip_prefix("layer:") {
            return Some(SectionKind::Layer {
                number: leading_integer(rest),
            });
        }
        match marker {
            "overview" => Some(SectionKind::Overview),
            "prerequisites" => Some(SectionKind::Prerequisites),
            "setup" => Some(SectionKind::Setup),
            "layer" => Some(SectionKind::Layer { number: None }),
            "exam-tips" => Some(SectionKind::ExamTips),
            "summary" => Some(SectionKind::Summary),
            _ => None,
        }
    }
}

/// Leading decimal digits of `s`, e.g. `"3b"` -> 3.
fn leading_integer(s: &str) -> Option<u32> {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(pos, _)| pos);
    s[..end].parse().ok()
}

/// One typed block of guide markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideSection {
    #[serde(flatten)]
    pub kind: SectionKind,
    /// Trimmed markdown between this marker and the next.
    pub content: String,
}

/// A parsed lab guide.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabGuide {
    /// Trimmed text before the first marker.
    pub header: String,
    pub sections: Vec<GuideSection>,
}

impl LabGuide {
    /// First section of the given kind.
    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&GuideSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    /// The section for layer `number`.
    #[must_use]
    pub fn layer(&self, number: u32) -> Option<&GuideSection> {
        self.section(SectionKind::Layer {
            number: Some(number),
        })
    }
    /// Sections shown for `lab_id` at `tier`.
    ///
    /// Non-layer sections and unnumbered layer sections are always kept. A
    /// numbered layer section is kept only if that layer is visible at `tier`.
    #[must_use]
    pub fn sections_for_tier(
        &self,
        catalog: &Catalog,
        lab_id: &str,
        tier: Tier,
    ) -> Vec<&GuideSection> {
        let visible: Vec<u32> = catalog
            .layers_for_tier(lab_id, tier)
            .iter()
            .map(|layer| layer.id)
            .collect();
        self.sections
            .iter()
            .filter(|section| match section.kind {
                SectionKind::Layer {
                    number: Some(number),
                } => visible.contains(&number),
                _ => true,
            })
            .collect()
    }
}

/// Split raw guide markdown into header and sections.
#[must_use]
pub fn parse_lab_markdown(raw: &str) -> LabGuide {
    let Some(marker_re) = SECTION_MARKER.as_ref() else {
        return LabGuide {
            header: raw.trim().to_string(),
            sections: Vec::new(),
        };
    };

    let mut header: Option<String> = None;
    let mut sections = Vec::new();
    let mut current: Option<SectionKind> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in raw.split('\n') {
        let Some(captures) = marker_re.captures(line) else {
            buffer.push(line);
            continue;
        };

        match (&header, current) {
            (None, _) => header = Some(buffer.join("\n").trim().to_string()),
            (Some(_), Some(kind)) => sections.push(GuideSection {
                kind,
                content: buffer.join("\n").trim().to_string(),
            }),
            (Some(_), None) => {}
        }
        buffer.clear();

        let marker = captures.get(1).map_or("", |m| m.as_str());
        match SectionKind::from_marker(marker) {
            Some(kind) => current = Some(kind),
            None => tracing::debug!(marker, "skipping unknown guide section marker"),
        }
    }

    match header {
        None => LabGuide {
            header: buffer.join("\n").trim().to_string(),
            sections,
        },
        Some(header) => {
            if let Some(kind) = current {
                sections.push(GuideSection {
                    kind,
                    content: buffer.join("\n").trim().to_string(),
                });
            }
            LabGuide { header, sections }
        }
    }
}

// =============================================================================
// SOURCES
// =============================================================================

/// Where raw guide markdown comes from.
pub trait GuideSource: Send + Sync {
    /// Read the guide stored at `guide_file` (e.g. `docs/labs/01-genai.md`).
    fn fetch(&self, guide_file: &str) -> io::Result<String>;
}

/// Reads guides from a docs directory.
///
/// `guide_file` paths carry a `docs/` prefix which is resolved against
/// `root` instead.
#[derive(Debug, Clone)]
pub struct FsGuideSource {
    root: PathBuf,
}

impl FsGuideSource {
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem path a guide file resolves to.
    #[must_use]
    pub fn resolve(&self, guide_file: &str) -> PathBuf {
        self.root
            .join(guide_file.strip_prefix("docs/").unwrap_or(guide_file))
    }
}

impl GuideSource for FsGuideSource {
    fn fetch(&self, guide_file: &str) -> io::Result<String> {
        fs::read_to_string(self.resolve(guide_file))
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Fetch-once cache of parsed guides, keyed by lab id.
///
/// Only successful fetches are cached; a failed fetch is retried on the
/// next request.
pub struct GuideCache<S> {
    source: S,
    guides: Mutex<BTreeMap<String, Arc<LabGuide>>>,
}

impl<S: GuideSource> GuideCache<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            guides: Mutex::new(BTreeMap::new()),
        }
    }

    /// Parsed guide for `lab`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns `LabTrackError::GuideUnavailable` if the source cannot
    /// provide the guide.
    pub fn get(&self, lab: &LabDefinition) -> Result<Arc<LabGuide>, LabTrackError> {
        if let Some(guide) = self.cached(&lab.lab_id) {
            return Ok(guide);
        }

        let raw = self
            .source
            .fetch(&lab.guide_file)
            .map_err(|e| LabTrackError::GuideUnavailable {
                lab_id: lab.lab_id.clone(),
                reason: e.to_string(),
            })?;
        let guide = Arc::new(parse_lab_markdown(&raw));
        tracing::debug!(lab_id = %lab.lab_id, sections = guide.sections.len(), "guide loaded");

        let mut guides = self.guides.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            guides.entry(lab.lab_id.clone()).or_insert(guide),
        ))
    }

    /// The guide for `lab_id` if already fetched.
    #[must_use]
    pub fn cached(&self, lab_id: &str) -> Option<Arc<LabGuide>> {
        self.guides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lab_id)
            .cloned()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GUIDE: &str = "# Lab 01\nIntro line\n\
<!-- section:overview -->\nWhat you build.\n\n\
<!-- section:layer:1 -->\n  Step one  \n\
<!-- section:bogus -->\nstill layer one\n\
<!-- section:exam-tips -->\nTip.\n";

    #[test]
    fn splits_sections_and_header() {
        let guide = parse_lab_markdown(GUIDE);
        assert_eq!(guide.header, "# Lab 01\nIntro line");
        let kinds: Vec<_> = guide.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Overview,
                SectionKind::Layer { number: Some(1) },
                SectionKind::Layer { number: Some(1) },
                SectionKind::ExamTips,
            ]
        );
        assert_eq!(guide.sections[0].content, "What you build.");
        assert_eq!(guide.layer(1).map(|s| s.content.as_str()), Some("Step one"));
        assert_eq!(guide.sections[2].content, "still layer one");
    }

    #[test]
    fn tier_filter_hides_layers_above_selection() {
        let raw = "<!-- section:overview -->\nIntro\n\
<!-- section:layer:1 -->\nOne\n\
<!-- section:layer:4 -->\nFour\n\
<!-- section:layer:6 -->\nSix\n\
<!-- section:layer -->\nUnnumbered\n\
<!-- section:summary -->\nDone";
        let guide = parse_lab_markdown(raw);
        let catalog = Catalog::builtin();
        let contents = |tier| {
            guide
                .sections_for_tier(catalog, "generative", tier)
                .iter()
                .map(|section| section.content.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(contents(Tier::Core), ["Intro", "One", "Unnumbered", "Done"]);
        assert_eq!(
            contents(Tier::Advanced),
            ["Intro", "One", "Four", "Unnumbered", "Done"]
        );
        assert_eq!(contents(Tier::Expert).len(), 6);
        assert_eq!(
            guide.sections_for_tier(catalog, "nope", Tier::Expert).len(),
            3
        );
    }

    #[test]
    fn no_markers_is_all_header() {
        let guide = parse_lab_markdown("  just text\nmore  ");
        assert_eq!(guide.header, "just text\nmore");
        assert!(guide.sections.is_empty());
    }

    #[test]
    fn unparsable_layer_number() {
        let guide = parse_lab_markdown("<!-- section:layer:x -->\nbody");
        assert_eq!(guide.header, "");
        assert_eq!(
            guide.sections,
            vec![GuideSection {
                kind: SectionKind::Layer { number: None },
                content: "body".to_string(),
            }]
        );
    }

    #[test]
    fn leading_unknown_marker_drops_preamble_content() {
        let guide = parse_lab_markdown("top\n<!-- section:draft -->\nlost\n<!-- section:summary -->\nend");
        assert_eq!(guide.header, "top");
        assert_eq!(guide.sections.len(), 1);
        assert_eq!(guide.sections[0].kind, SectionKind::Summary);
    }

    #[test]
    fn section_kind_json_shape() {
        let section = GuideSection {
            kind: SectionKind::Layer { number: Some(2) },
            content: "x".to_string(),
        };
        let json = serde_json::to_value(&section).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "layer", "number": 2, "content": "x"}));
    }

    #[test]
    fn fs_source_strips_docs_prefix() {
        let source = FsGuideSource::new("/srv/docs");
        assert_eq!(
            source.resolve("docs/labs/01-genai.md"),
            PathBuf::from("/srv/docs/labs/01-genai.md")
        );
        assert_eq!(
            source.resolve("labs/02-rag.md"),
            PathBuf::from("/srv/docs/labs/02-rag.md")
        );
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl GuideSource for CountingSource {
        fn fetch(&self, _guide_file: &str) -> io::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
            } else {
                Ok(GUIDE.to_string())
            }
        }
    }

    fn lab() -> LabDefinition {
        LabDefinition {
            lab_id: "generative".to_string(),
            guide_file: "docs/labs/01-genai.md".to_string(),
            setup: Vec::new(),
            layers: Vec::new(),
        }
    }

    #[test]
    fn cache_fetches_once() {
        let cache = GuideCache::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let first = cache.get(&lab()).expect("guide");
        let second = cache.get(&lab()).expect("guide");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let cache = GuideCache::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        assert!(matches!(
            cache.get(&lab()),
            Err(LabTrackError::GuideUnavailable { .. })
        ));
        assert!(cache.get(&lab()).is_err());
        assert!(cache.cached("generative").is_none());
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
    }
}
