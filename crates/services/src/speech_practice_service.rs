use cakap_core::SimilarityScorer;
use cakap_core::model::ScoreResult;
use rand::Rng;
use tracing::debug;

use crate::error::PromptError;

/// Non-empty list of phrases the learner is asked to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    prompts: Vec<String>,
}

impl PromptSet {
    /// Build a set from raw prompts, dropping blank entries.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Empty` if no non-blank prompt remains.
    pub fn new(prompts: impl IntoIterator<Item = String>) -> Result<Self, PromptError> {
        let prompts: Vec<String> = prompts
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();
        if prompts.is_empty() {
            return Err(PromptError::Empty);
        }
        Ok(Self { prompts })
    }

    /// Parse a prompt CSV: one record per prompt, first column only.
    ///
    /// There is no header row. A leading UTF-8 BOM is ignored and quoted
    /// fields may span lines.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Csv` for unreadable records and
    /// `PromptError::Empty` if the content holds no prompts.
    pub fn from_csv(content: &str) -> Result<Self, PromptError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut prompts = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| PromptError::Csv(err.to_string()))?;
            if let Some(first) = record.get(0) {
                prompts.push(first.to_owned());
            }
        }
        Self::new(prompts)
    }

    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Pick a prompt uniformly at random.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> &str {
        let index = rng.random_range(0..self.prompts.len());
        &self.prompts[index]
    }
}

/// Speaking drill: choose a prompt, then score what the learner said.
#[derive(Debug, Clone)]
pub struct SpeechPracticeService {
    scorer: SimilarityScorer,
    prompts: PromptSet,
}

impl SpeechPracticeService {
    #[must_use]
    pub fn new(prompts: PromptSet) -> Self {
        Self {
            scorer: SimilarityScorer::new(),
            prompts,
        }
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn next_prompt<R: Rng>(&self, rng: &mut R) -> &str {
        self.prompts.pick(rng)
    }

    /// Score a recognized transcript against the prompt it answers.
    #[must_use]
    pub fn evaluate(&self, prompt: &str, transcript: &str) -> ScoreResult {
        let result = self.scorer.score_result(prompt, transcript);
        debug!(prompt, transcript, percent = result.percent, "scored speech attempt");
        result
    }
}
