use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::verdict::Verdict;

/// One search hit backing an assumption. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl Evidence {
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        Self::field(&self.title)
    }

    pub fn url(&self) -> Option<&str> {
        Self::field(&self.url)
    }

    pub fn content(&self) -> Option<&str> {
        Self::field(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub assumption: String,
    pub evidence: Vec<Evidence>,
}

/// Assumption -> ranked evidence, in the order assumptions were generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceSet {
    entries: Vec<EvidenceEntry>,
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A repeated assumption keeps its original position.
    pub fn insert(&mut self, assumption: String, evidence: Vec<Evidence>) {
        match self.entries.iter_mut().find(|e| e.assumption == assumption) {
            Some(entry) => entry.evidence = evidence,
            None => self.entries.push(EvidenceEntry {
                assumption,
                evidence,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceEntry> {
        self.entries.iter()
    }

    pub fn assumptions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.assumption.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Title/url of the top hit for every assumption that has one.
    pub fn sources(&self) -> Vec<SourceLink> {
        self.entries
            .iter()
            .filter_map(|e| e.evidence.first())
            .map(|top| SourceLink {
                title: top.title().unwrap_or("No Title").to_string(),
                url: top.url().filter(|u| is_web_url(u)).unwrap_or("#").to_string(),
            })
            .collect()
    }
}

/// Only http(s) links are rendered; anything else (`javascript:`, `data:`) is dropped.
fn is_web_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

impl FromIterator<(String, Vec<Evidence>)> for EvidenceSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Evidence>)>>(iter: I) -> Self {
        let mut set = EvidenceSet::new();
        for (assumption, evidence) in iter {
            set.insert(assumption, evidence);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
}

/// LLM reasoning for one assumption against its top evidence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub assumption: String,
    pub reasoning: String,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing message about how a stage went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Stage output that may have been degraded. Soft failures show up as
/// notices next to an empty or partial value, never as an `Err`.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Staged<T> {
    pub fn is_degraded(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n.level, NoticeLevel::Warning | NoticeLevel::Error))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NoAssumptions,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub statement: String,
    pub status: RunStatus,
    /// Synthesized narrative, or the fixed message when nothing could be checked.
    pub summary: String,
    pub verdict: Verdict,
    pub evidence: EvidenceSet,
    pub judgments: Vec<Judgment>,
    pub sources: Vec<SourceLink>,
    pub notices: Vec<Notice>,
    pub checked_at: DateTime<Utc>,
}

/// Incremental progress for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineEvent {
    Generating,
    Assumptions { assumptions: Vec<String> },
    Fetching { count: usize },
    Fetched { assumption: String, hits: usize },
    Judgment { judgment: Judgment },
    Synthesizing { judgments: usize },
    Notice { notice: Notice },
    Done { verdict: Verdict },
}
