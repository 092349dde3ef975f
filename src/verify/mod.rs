pub mod prompts;
pub mod types;
pub mod verdict;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::llm::TextGenerator;
use crate::search::EvidenceSearch;

use types::{
    Evidence, EvidenceSet, Judgment, Notice, PipelineEvent, RunStatus, Staged, VerificationReport,
};
use verdict::check_result;

/// Optional listener for pipeline progress. Sends never block and a gone
/// receiver is ignored.
#[derive(Clone, Default)]
pub struct Progress(Option<mpsc::UnboundedSender<PipelineEvent>>);

impl Progress {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(Some(tx)), rx)
    }

    pub fn send(&self, event: PipelineEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }

    fn notice(&self, notices: &mut Vec<Notice>, notice: Notice) {
        self.send(PipelineEvent::Notice {
            notice: notice.clone(),
        });
        notices.push(notice);
    }
}

/// Statement -> assumptions -> evidence -> judgments -> verdict.
pub struct Pipeline {
    llm: Arc<dyn TextGenerator>,
    search: Arc<dyn EvidenceSearch>,
    eval_delay: Duration,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        search: Arc<dyn EvidenceSearch>,
        eval_delay: Duration,
    ) -> Self {
        Self {
            llm,
            search,
            eval_delay,
        }
    }

    /// Ask the LLM for checkable questions. Any failure yields an empty list.
    pub async fn generate_assumptions(
        &self,
        statement: &str,
        progress: &Progress,
    ) -> Staged<Vec<String>> {
        let mut notices = Vec::new();
        let prompt = prompts::assumptions_prompt(statement);

        let assumptions = match self
            .llm
            .generate(&prompt, Some(prompts::SYSTEM_INSTRUCTION))
            .await
        {
            Ok(response) => {
                let assumptions = parse_assumptions(&response);
                debug!(count = assumptions.len(), "Assumptions parsed");
                if assumptions.is_empty() {
                    warn!(statement, "LLM returned no assumptions");
                    progress.notice(&mut notices, Notice::error("Failed to identify assumptions."));
                } else {
                    progress.notice(&mut notices, Notice::success("Key assumptions identified."));
                }
                assumptions
            }
            Err(e) => {
                error!(statement, error = %e, "Error generating assertions");
                progress.notice(&mut notices, Notice::error("Failed to identify assumptions."));
                Vec::new()
            }
        };

        Staged {
            value: assumptions,
            notices,
        }
    }

    /// Search every assumption at once and wait for all of them.
    pub async fn fetch_all_evidence(
        &self,
        assumptions: &[String],
        progress: &Progress,
    ) -> Staged<EvidenceSet> {
        let mut notices = Vec::new();
        progress.send(PipelineEvent::Fetching {
            count: assumptions.len(),
        });

        let handles = assumptions.iter().cloned().map(|assumption| {
            let search = Arc::clone(&self.search);
            let progress = progress.clone();
            tokio::spawn(async move {
                let (assumption, evidence) = fetch_evidence(search.as_ref(), assumption).await;
                progress.send(PipelineEvent::Fetched {
                    assumption: assumption.clone(),
                    hits: evidence.len(),
                });
                (assumption, evidence)
            })
        });

        let mut set = EvidenceSet::new();
        for (assumption, joined) in assumptions.iter().zip(join_all(handles).await) {
            match joined {
                Ok((assumption, evidence)) => set.insert(assumption, evidence),
                Err(e) => {
                    error!(assumption = %assumption, error = %e, "Search task aborted");
                    set.insert(assumption.clone(), Vec::new());
                }
            }
        }

        info!(
            assumptions = set.len(),
            with_evidence = set.iter().filter(|e| !e.evidence.is_empty()).count(),
            "Evidence fetched"
        );
        progress.notice(
            &mut notices,
            Notice::success("Online verification results retrieved."),
        );

        Staged {
            value: set,
            notices,
        }
    }

    /// Judge each assumption against its top-ranked hit, one call at a time.
    pub async fn evaluate_assumptions(
        &self,
        statement: &str,
        evidence: &EvidenceSet,
        progress: &Progress,
    ) -> Staged<Vec<Judgment>> {
        let mut notices = Vec::new();
        let mut judgments = Vec::new();
        progress.notice(&mut notices, Notice::info("Evaluating each key assumption..."));
        if evidence.is_empty() {
            debug!(statement, "Nothing to evaluate");
        }

        for entry in evidence.iter() {
            let assumption = entry.assumption.trim();

            let Some(top) = entry.evidence.first() else {
                warn!(assumption, "No results found for assertion");
                progress.notice(
                    &mut notices,
                    Notice::warning(format!("No search results found for '{}'.", assumption)),
                );
                continue;
            };

            let Some(content) = top.content() else {
                error!(assumption, url = ?top.url(), "Top search result has no content");
                progress.notice(
                    &mut notices,
                    Notice::error(format!("Error processing context for '{}'.", assumption)),
                );
                continue;
            };

            let prompt = prompts::evaluation_prompt(assumption, content, statement);
            match self.llm.generate(&prompt, None).await {
                Ok(reasoning) => {
                    let judgment = Judgment {
                        assumption: assumption.to_string(),
                        reasoning,
                        source_url: top.url().map(String::from),
                        source_title: top.title().map(String::from),
                    };
                    debug!(
                        assumption,
                        reasoning_len = judgment.reasoning.len(),
                        "Assumption evaluated"
                    );
                    progress.send(PipelineEvent::Judgment {
                        judgment: judgment.clone(),
                    });
                    judgments.push(judgment);

                    if !self.eval_delay.is_zero() {
                        tokio::time::sleep(self.eval_delay).await;
                    }
                }
                Err(e) => {
                    error!(assumption, error = %e, "Error generating evaluation for assertion");
                    progress.notice(
                        &mut notices,
                        Notice::error(format!("Failed to evaluate assertion '{}'.", assumption)),
                    );
                }
            }
        }

        progress.notice(&mut notices, Notice::success("All key assumptions evaluated."));
        Staged {
            value: judgments,
            notices,
        }
    }

    /// Merge judgments into one narrative. Failures propagate.
    pub async fn synthesize(&self, reasoning: &[String]) -> Result<String> {
        let prompt = prompts::synthesis_prompt(reasoning);
        self.llm
            .generate(&prompt, None)
            .await
            .context("Failed to synthesize overall evaluation")
    }

    /// Run the whole pipeline for one statement.
    pub async fn run(&self, statement: &str, progress: &Progress) -> Result<VerificationReport> {
        info!(statement, "Verification run started");
        let mut notices = Vec::new();

        progress.send(PipelineEvent::Generating);
        let generated = self.generate_assumptions(statement, progress).await;
        notices.extend(generated.notices);
        let assumptions = generated.value;

        if assumptions.is_empty() {
            info!(statement, "No assumptions, stopping");
            let summary = prompts::NO_ASSUMPTIONS_MESSAGE.to_string();
            let verdict = check_result(&summary);
            progress.send(PipelineEvent::Done { verdict });
            return Ok(VerificationReport {
                statement: statement.to_string(),
                status: RunStatus::NoAssumptions,
                summary,
                verdict,
                evidence: EvidenceSet::new(),
                judgments: Vec::new(),
                sources: Vec::new(),
                notices,
                checked_at: chrono::Utc::now(),
            });
        }

        progress.send(PipelineEvent::Assumptions {
            assumptions: assumptions.clone(),
        });

        let fetched = self.fetch_all_evidence(&assumptions, progress).await;
        notices.extend(fetched.notices);
        let evidence = fetched.value;

        let evaluated = self
            .evaluate_assumptions(statement, &evidence, progress)
            .await;
        if evaluated.is_degraded() {
            warn!(
                judged = evaluated.value.len(),
                assumptions = evidence.len(),
                "Some assumptions were not evaluated"
            );
        }
        notices.extend(evaluated.notices);
        let judgments = evaluated.value;

        progress.send(PipelineEvent::Synthesizing {
            judgments: judgments.len(),
        });
        let reasoning: Vec<String> = judgments.iter().map(|j| j.reasoning.clone()).collect();
        let summary = self.synthesize(&reasoning).await?;
        let verdict = check_result(&summary);

        info!(
            %verdict,
            assumptions = evidence.len(),
            judgments = judgments.len(),
            "Verification run complete"
        );
        progress.send(PipelineEvent::Done { verdict });

        Ok(VerificationReport {
            statement: statement.to_string(),
            status: RunStatus::Completed,
            summary,
            verdict,
            sources: evidence.sources(),
            evidence,
            judgments,
            notices,
            checked_at: chrono::Utc::now(),
        })
    }
}

/// Search for one assumption. A failed search maps to no evidence.
pub async fn fetch_evidence(
    search: &dyn EvidenceSearch,
    assumption: String,
) -> (String, Vec<Evidence>) {
    match search.search(&assumption).await {
        Ok(results) => {
            debug!(assumption = %assumption, hits = results.len(), "Search complete");
            (assumption, results)
        }
        Err(e) => {
            error!(assumption = %assumption, error = %e, "Error fetching search results");
            (assumption, Vec::new())
        }
    }
}

/// Split an LLM bullet list into one assumption per line.
pub fn parse_assumptions(response: &str) -> Vec<String> {
    response
        .lines()
        .map(|line| strip_bullet(&line.replace('*', "")).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();

    // "- " / "+ " / "• " bullets; a sign glued to a number stays
    let mut chars = line.chars();
    let line = match (chars.next(), chars.next()) {
        (Some(marker @ ('-' | '+' | '•')), next) if next.map_or(true, char::is_whitespace) => {
            line[marker.len_utf8()..].trim_start()
        }
        _ => line,
    };

    // "1. " / "2) " numbering
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < line.len() {
        let mut chars = rest.chars();
        if matches!(chars.next(), Some('.' | ')'))
            && chars.next().map_or(true, char::is_whitespace)
        {
            return rest[1..].trim();
        }
    }
    line.trim()
}
