//! Prompt complexity analysis and regime classification.
//!
//! The analyzer scores a prompt on two independent heuristic axes
//! (syntactic structure and semantic load) and classifies the combined
//! score into a reasoning regime. It is pure: deterministic for identical
//! input, no I/O, never calls a backend, and never fails — degenerate or
//! empty prompts simply score at the low end.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Threshold below which a prompt is classified as low complexity.
pub const LOW_THRESHOLD: f64 = 40.0;
/// Threshold at or above which a prompt is classified as high complexity.
pub const HIGH_THRESHOLD: f64 = 80.0;

/// Reasoning regime selected for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Direct single-call reasoning.
    Low,
    /// Bounded self-refinement.
    Medium,
    /// Decompose-solve-integrate.
    High,
}

impl Regime {
    /// Classify a combined complexity score.
    ///
    /// Total over the reals: every score maps to exactly one regime.
    pub fn from_combined(combined: f64) -> Self {
        if combined < LOW_THRESHOLD {
            Regime::Low
        } else if combined < HIGH_THRESHOLD {
            Regime::Medium
        } else {
            Regime::High
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Complexity score for a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityScore {
    /// Structural component (length, sentences, punctuation).
    pub syntactic: f64,
    /// Content component (vocabulary, multi-part markers, reasoning cues).
    pub semantic: f64,
    /// `syntactic + semantic`.
    pub combined: f64,
    /// Regime implied by the combined score.
    pub regime: Regime,
}

impl ComplexityScore {
    pub fn new(syntactic: f64, semantic: f64) -> Self {
        let combined = syntactic + semantic;
        Self {
            syntactic,
            semantic,
            combined,
            regime: Regime::from_combined(combined),
        }
    }
}

// Markers that indicate a prompt is asking for several things at once.
static MULTI_PART_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(first(ly)?|second(ly)?|third(ly)?|then|next|also|additionally|furthermore|moreover|finally|step\s*\d+|\d+[.)]\s)",
    )
    .expect("invalid regex")
});

// Cues that the prompt wants reasoning rather than recall.
static REASONING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(analy[sz]e|compare|contrast|evaluate|explain\s+why|justify|derive|prove|design|architect|optimi[sz]e|trade.?offs?|implications?|synthesi[sz]e|integrate)\b",
    )
    .expect("invalid regex")
});

/// Heuristic prompt complexity analyzer.
#[derive(Debug, Clone, Default)]
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score a prompt and classify its regime.
    pub fn analyze(&self, prompt: &str) -> ComplexityScore {
        let syntactic = self.syntactic_score(prompt);
        let semantic = self.semantic_score(prompt);
        let score = ComplexityScore::new(syntactic, semantic);
        tracing::debug!(
            syntactic = score.syntactic,
            semantic = score.semantic,
            combined = score.combined,
            regime = %score.regime,
            "analyzed prompt complexity"
        );
        score
    }

    /// Structural features: token volume, sentence count, sentence length,
    /// punctuation density. Each component is capped so the axis saturates
    /// instead of growing without bound.
    fn syntactic_score(&self, text: &str) -> f64 {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return 0.0;
        }

        let sentences = text
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1);

        let word_component = (words.len().min(120) as f64 / 120.0) * 35.0;
        let sentence_component = (sentences.min(8) as f64) * 2.5;

        let avg_words = words.len() as f64 / sentences as f64;
        let length_component = (avg_words.min(30.0) / 30.0) * 10.0;

        let chars = text.chars().count().max(1);
        let punct = text
            .chars()
            .filter(|c| matches!(c, ',' | ';' | ':' | '.' | '!' | '?' | '(' | ')'))
            .count();
        let punct_component = ((punct as f64 / chars as f64) * 100.0).min(10.0);

        word_component + sentence_component + length_component + punct_component
    }

    /// Content features: vocabulary diversity, multi-part question markers,
    /// reasoning cues, and stacked questions.
    fn semantic_score(&self, text: &str) -> f64 {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return 0.0;
        }

        let unique: std::collections::HashSet<&String> = words.iter().collect();
        let vocabulary_component = (unique.len().min(80) as f64 / 80.0) * 20.0;

        let multi_part = MULTI_PART_PATTERN.find_iter(text).count();
        let multi_part_component = ((multi_part as f64) * 5.0).min(20.0);

        let reasoning = REASONING_PATTERN.find_iter(text).count();
        let reasoning_component = ((reasoning as f64) * 4.0).min(12.0);

        let questions = text.matches('?').count();
        let question_component = ((questions.saturating_sub(1) as f64) * 3.0).min(9.0);

        vocabulary_component + multi_part_component + reasoning_component + question_component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_thresholds_are_total() {
        assert_eq!(Regime::from_combined(0.0), Regime::Low);
        assert_eq!(Regime::from_combined(39.999), Regime::Low);
        assert_eq!(Regime::from_combined(40.0), Regime::Medium);
        assert_eq!(Regime::from_combined(79.999), Regime::Medium);
        assert_eq!(Regime::from_combined(80.0), Regime::High);
        assert_eq!(Regime::from_combined(1000.0), Regime::High);
        assert_eq!(Regime::from_combined(-5.0), Regime::Low);
    }

    #[test]
    fn test_score_scenarios() {
        // syntactic=10, semantic=10 -> combined=20 -> LOW
        let score = ComplexityScore::new(10.0, 10.0);
        assert_eq!(score.combined, 20.0);
        assert_eq!(score.regime, Regime::Low);

        // syntactic=30, semantic=40 -> combined=70 -> MEDIUM
        let score = ComplexityScore::new(30.0, 40.0);
        assert_eq!(score.combined, 70.0);
        assert_eq!(score.regime, Regime::Medium);

        // syntactic=50, semantic=45 -> combined=95 -> HIGH
        let score = ComplexityScore::new(50.0, 45.0);
        assert_eq!(score.combined, 95.0);
        assert_eq!(score.regime, Regime::High);
    }

    #[test]
    fn test_empty_prompt_scores_low() {
        let analyzer = ComplexityAnalyzer::new();
        let score = analyzer.analyze("");
        assert_eq!(score.combined, 0.0);
        assert_eq!(score.regime, Regime::Low);

        let score = analyzer.analyze("   \n\t ");
        assert_eq!(score.combined, 0.0);
        assert_eq!(score.regime, Regime::Low);
    }

    #[test]
    fn test_trivial_question_is_low() {
        let analyzer = ComplexityAnalyzer::new();
        let score = analyzer.analyze("What is 2 + 2?");
        assert_eq!(score.regime, Regime::Low);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let analyzer = ComplexityAnalyzer::new();
        let prompt = "Compare the design trade-offs of the two architectures.";
        assert_eq!(analyzer.analyze(prompt), analyzer.analyze(prompt));
    }

    #[test]
    fn test_longer_prompt_scores_at_least_as_high() {
        let analyzer = ComplexityAnalyzer::new();
        let short = "Explain why the cache misses.";
        let long = format!("{} {} {}", short, short, short);
        assert!(analyzer.analyze(&long).combined >= analyzer.analyze(short).combined);
    }

    #[test]
    fn test_multi_part_prompt_reaches_medium() {
        let analyzer = ComplexityAnalyzer::new();
        let prompt = "First, analyze the failure modes of the consensus layer. \
                      Second, compare the recovery strategies under partition. \
                      Third, evaluate the trade-offs between latency and durability. \
                      Then explain why the leader election stalls under load. \
                      Finally, design a mitigation and justify the implications.";
        let score = analyzer.analyze(prompt);
        assert!(
            score.combined >= 40.0,
            "expected at least medium, got {}",
            score.combined
        );
    }

    #[test]
    fn test_elaborate_prompt_reaches_high() {
        let analyzer = ComplexityAnalyzer::new();
        let mut prompt = String::new();
        for i in 0..15 {
            prompt.push_str(&format!(
                "Step {}: analyze and compare the design trade-offs, \
                 then explain why the architecture degrades under load? ",
                i
            ));
        }
        let score = analyzer.analyze(&prompt);
        assert_eq!(
            score.regime,
            Regime::High,
            "expected high, got combined={}",
            score.combined
        );
    }
}
