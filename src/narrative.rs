//! Narrative interpretation of a comparison report
//!
//! Sits outside the statistics engine: it reads a finished
//! [`ComparisonReport`] (or one [`StudentProfile`]) and writes prose for
//! teachers. Two generators:
//!
//! - [`TemplateNarrator`]: rule-based sentences per benchmark status plus three
//!   recommendations sampled from a fixed list (seedable)
//! - `RemoteNarrator` (feature `remote-narrative`): asks a messages-style LLM
//!   API and falls back to the template narrator on any failure

use crate::analysis::{BenchmarkStatus, ComparisonReport, StudentProfile};
use crate::catalog::{Assessment, Locale, MetricCatalog};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt::Write as _;

/// Number of recommendations drawn per narrative
pub const RECOMMENDATION_COUNT: usize = 3;

pub const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Encourage regular reading practice to improve fluency.",
    "Provide targeted exercises for developing skills.",
    "Praise students for strengths and encourage progress in weaker areas.",
    "Implement review sessions to reinforce basics.",
    "Use educational games to make learning more engaging.",
    "Encourage students to verbalize reasoning when solving problems.",
    "Suggest group activities to promote peer learning.",
    "Set achievable short-term goals to maintain motivation.",
];

/// Group mean below this share of the Mastery threshold reads as low
const LOW_PERFORMANCE_RATIO: f64 = 0.75;

/// One metric of one group, as a narrator sees it
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub code: String,
    pub name: String,
    pub assessment: Option<Assessment>,
    pub mean: Option<f64>,
    pub status: BenchmarkStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLines {
    pub group: String,
    pub metrics: Vec<MetricLine>,
}

/// Mean of group means against the Mastery threshold
#[derive(Debug, Clone, PartialEq)]
pub struct OverallLine {
    pub name: String,
    pub mean: f64,
    pub mastery: f64,
}

/// Whether a summary describes groups or one student
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarrativeFocus {
    #[default]
    Groups,
    Student,
}

/// Report facts a narrator needs, with display names already localized
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeSummary {
    pub focus: NarrativeFocus,
    /// Grouping dimension, or the student identifier
    pub group_by: String,
    pub groups: Vec<GroupLines>,
    pub overall: Vec<OverallLine>,
}

impl NarrativeSummary {
    pub fn from_report(report: &ComparisonReport, catalog: &MetricCatalog, locale: Locale) -> Self {
        let groups = report
            .group_names()
            .map(|group| GroupLines {
                group: group.to_string(),
                metrics: report
                    .analysed_metrics
                    .iter()
                    .map(|code| MetricLine {
                        code: code.clone(),
                        name: catalog.display_name(code, locale).to_string(),
                        assessment: catalog.get(code).map(|d| d.assessment),
                        mean: report.stats(group, code).and_then(|s| s.mean()),
                        status: report
                            .status(group, code)
                            .unwrap_or(BenchmarkStatus::Unknown),
                    })
                    .collect(),
            })
            .collect();

        let overall = report
            .analysed_metrics
            .iter()
            .filter_map(|code| {
                let def = catalog.get(code)?;
                let means: Vec<f64> = report
                    .group_names()
                    .filter_map(|g| report.stats(g, code)?.mean())
                    .collect();
                let mean = crate::stats::mean(&means)?;
                Some(OverallLine {
                    name: def.display_name(locale).to_string(),
                    mean,
                    mastery: def.mastery,
                })
            })
            .collect();

        Self {
            focus: NarrativeFocus::Groups,
            group_by: report.group_by.to_string(),
            groups,
            overall,
        }
    }

    /// One student's scores as a single group of lines
    pub fn from_profile(profile: &StudentProfile, catalog: &MetricCatalog, locale: Locale) -> Self {
        let metrics = profile
            .indicators
            .iter()
            .map(|indicator| MetricLine {
                code: indicator.metric.clone(),
                name: catalog.display_name(&indicator.metric, locale).to_string(),
                assessment: Some(indicator.assessment),
                mean: indicator.score,
                status: indicator.status,
            })
            .collect();

        Self {
            focus: NarrativeFocus::Student,
            group_by: profile.id.clone(),
            groups: vec![GroupLines {
                group: profile.id.clone(),
                metrics,
            }],
            overall: Vec::new(),
        }
    }
}

/// Produces a free-text interpretation of a summary
pub trait NarrativeGenerator {
    fn name(&self) -> &'static str;

    fn generate(&mut self, summary: &NarrativeSummary) -> String;
}

/// Rule-based statements without recommendations
pub fn rule_based_text(summary: &NarrativeSummary) -> String {
    let mut out = String::new();

    match summary.focus {
        NarrativeFocus::Groups => {
            let _ = writeln!(out, "Comparison by {}:", summary.group_by);
        }
        NarrativeFocus::Student => {
            let _ = writeln!(out, "Student {}:", summary.group_by);
        }
    }
    for line in &summary.overall {
        let verdict = if line.mean < LOW_PERFORMANCE_RATIO * line.mastery {
            "Overall low performance in"
        } else if line.mean < line.mastery {
            "Average level achieved for"
        } else {
            "Good level in"
        };
        let _ = writeln!(out, "- {} {} (average: {:.1}).", verdict, line.name, line.mean);
    }

    for group in &summary.groups {
        if summary.focus == NarrativeFocus::Groups {
            let _ = writeln!(out, "\n### {}", group.group);
        }
        for assessment in [Assessment::Egra, Assessment::Egma] {
            let lines: Vec<String> = group
                .metrics
                .iter()
                .filter(|m| m.assessment == Some(assessment))
                .filter_map(status_sentence)
                .collect();
            if lines.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}:", assessment.as_str().to_uppercase());
            for line in lines {
                let _ = writeln!(out, "- {}", line);
            }
        }
    }

    out
}

fn status_sentence(metric: &MetricLine) -> Option<String> {
    let mean = metric.mean?;
    let sentence = match metric.status {
        BenchmarkStatus::Mastery => format!("Confirmed mastery in {} ({:.1}).", metric.name, mean),
        BenchmarkStatus::Developing => format!(
            "Developing skill in {} ({:.1}). Recommended: targeted support.",
            metric.name, mean
        ),
        BenchmarkStatus::Emerging => format!(
            "Low performance in {} ({:.1}). Recommended: additional practice.",
            metric.name, mean
        ),
        BenchmarkStatus::Unknown => return None,
    };
    Some(sentence)
}

/// Prompt sent to a remote model
pub fn group_prompt(summary: &NarrativeSummary) -> String {
    match summary.focus {
        NarrativeFocus::Groups => format!(
            "Here is a summary of a group of students' performance:\n{}\n\
             Please write a concise interpretation and suggest appropriate recommendations for this group.",
            rule_based_text(summary)
        ),
        NarrativeFocus::Student => format!(
            "Here are the student's results:\n{}\n\
             Please write a concise overall interpretation and suggest appropriate recommendations for this student.",
            rule_based_text(summary)
        ),
    }
}

/// Template narrator with sampled recommendations
pub struct TemplateNarrator {
    rng: StdRng,
}

impl TemplateNarrator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible recommendation sampling
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn recommendations(&mut self) -> Vec<&'static str> {
        FALLBACK_RECOMMENDATIONS
            .choose_multiple(&mut self.rng, RECOMMENDATION_COUNT)
            .copied()
            .collect()
    }
}

impl Default for TemplateNarrator {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrativeGenerator for TemplateNarrator {
    fn name(&self) -> &'static str {
        "template"
    }

    fn generate(&mut self, summary: &NarrativeSummary) -> String {
        let mut out = rule_based_text(summary);
        out.push_str("\nEducational recommendations:\n");
        for rec in self.recommendations() {
            let _ = writeln!(out, "- {}", rec);
        }
        out.push_str(match summary.focus {
            NarrativeFocus::Groups => {
                "\nRegular monitoring will help adapt activities to each group's progress.\n"
            }
            NarrativeFocus::Student => {
                "\nRegular monitoring will help adapt activities to the student's progress.\n"
            }
        });
        out
    }
}

#[cfg(feature = "remote-narrative")]
pub use remote::RemoteNarrator;

#[cfg(feature = "remote-narrative")]
mod remote {
    use super::{group_prompt, NarrativeGenerator, NarrativeSummary, TemplateNarrator};
    use anyhow::{Context, Result};
    use std::time::Duration;

    const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &str = "2023-06-01";
    const MODEL: &str = "claude-3-haiku-20240307";
    const MAX_TOKENS: u32 = 500;
    const TEMPERATURE: f64 = 0.7;
    const SYSTEM_PROMPT: &str = "You are an educational specialist interpreting assessment data \
         and providing useful insights and recommendations for teachers.";
    const PLACEHOLDER_KEY: &str = "your_api_key_here";
    const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// LLM-backed narrator; any failure yields the template narrative
    pub struct RemoteNarrator {
        api_key: Option<String>,
        endpoint: String,
        client: reqwest::blocking::Client,
        fallback: TemplateNarrator,
    }

    impl RemoteNarrator {
        /// Reads `ANTHROPIC_API_KEY`
        pub fn from_env(fallback: TemplateNarrator) -> Self {
            let api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty() && k != PLACEHOLDER_KEY);
            Self::new(api_key, ENDPOINT, fallback)
        }

        pub fn new(
            api_key: Option<String>,
            endpoint: impl Into<String>,
            fallback: TemplateNarrator,
        ) -> Self {
            let client = match reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
            {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(
                        "Cannot configure narrative HTTP client ({}), requests run without a timeout",
                        e
                    );
                    reqwest::blocking::Client::new()
                }
            };
            Self {
                api_key,
                endpoint: endpoint.into(),
                client,
                fallback,
            }
        }

        fn request(&self, api_key: &str, prompt: &str) -> Result<String> {
            let body = serde_json::json!({
                "model": MODEL,
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
                "system": SYSTEM_PROMPT,
                "messages": [{"role": "user", "content": prompt}],
            });

            let response: serde_json::Value = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body)
                .send()
                .context("Failed to reach narrative API")?
                .error_for_status()
                .context("Narrative API returned an error status")?
                .json()
                .context("Failed to decode narrative API response")?;

            response["content"][0]["text"]
                .as_str()
                .map(str::to_string)
                .context("Narrative API response has no text content")
        }
    }

    impl NarrativeGenerator for RemoteNarrator {
        fn name(&self) -> &'static str {
            "remote"
        }

        fn generate(&mut self, summary: &NarrativeSummary) -> String {
            let Some(api_key) = self.api_key.clone() else {
                tracing::info!("No ANTHROPIC_API_KEY set, using template narrative");
                return self.fallback.generate(summary);
            };

            match self.request(&api_key, &group_prompt(summary)) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Remote narrative failed, using template: {:#}", e);
                    self.fallback.generate(summary)
                }
            }
        }
    }

}

/// Which narrator to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NarrativeKind {
    #[default]
    Template,
    Remote,
}

/// Build the requested narrator; `Remote` degrades to templates without the feature
pub fn narrator(kind: NarrativeKind, seed: Option<u64>) -> Box<dyn NarrativeGenerator> {
    let template = seed.map_or_else(TemplateNarrator::new, TemplateNarrator::with_seed);
    match kind {
        NarrativeKind::Template => Box::new(template),
        #[cfg(feature = "remote-narrative")]
        NarrativeKind::Remote => Box::new(RemoteNarrator::from_env(template)),
        #[cfg(not(feature = "remote-narrative"))]
        NarrativeKind::Remote => {
            tracing::warn!("Built without remote-narrative feature, using template narrative");
            Box::new(template)
        }
    }
}
