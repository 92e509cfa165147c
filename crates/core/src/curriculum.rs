use crate::model::LevelConfig;

const BEGINNER: [&str; 10] = [
    "Basic Greetings and Introductions",
    "Numbers and Counting",
    "Colors and Shapes",
    "Family Members",
    "Days of the Week",
    "Common Objects",
    "Basic Verbs",
    "Simple Sentences",
    "Question Words",
    "Review and Practice",
];

const INTERMEDIATE: [&str; 15] = [
    "Past Tense Verbs",
    "Future Tense",
    "Adjectives and Descriptions",
    "Prepositions",
    "Complex Sentences",
    "Conditional Statements",
    "Business Vocabulary",
    "Travel Phrases",
    "Food and Dining",
    "Shopping and Money",
    "Health and Body",
    "Weather and Seasons",
    "Hobbies and Interests",
    "Technology Terms",
    "Review and Assessment",
];

const EXPERT: [&str; 20] = [
    "Advanced Grammar Structures",
    "Idioms and Expressions",
    "Academic Vocabulary",
    "Professional Communication",
    "Literary Analysis",
    "Debate and Argumentation",
    "Cultural References",
    "Advanced Writing Techniques",
    "Public Speaking",
    "Business Negotiations",
    "Technical Documentation",
    "Research and Citations",
    "Critical Thinking",
    "Advanced Listening",
    "Pronunciation Mastery",
    "Slang and Colloquialisms",
    "Regional Dialects",
    "Translation Techniques",
    "Final Project",
    "Certification Exam",
];

/// Ordered list of level configurations.
///
/// Order matters: each level unlocks when the one before it is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    levels: Vec<LevelConfig>,
}

impl Curriculum {
    #[must_use]
    pub fn new(levels: Vec<LevelConfig>) -> Self {
        Self { levels }
    }

    /// The shipped three-tier course: Beginner (10), Intermediate (15), Expert (20).
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            level("beginner", "Beginner", &BEGINNER),
            level("intermediate", "Intermediate", &INTERMEDIATE),
            level("expert", "Expert", &EXPERT),
        ])
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelConfig] {
        &self.levels
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::standard()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn level(id: &str, name: &str, titles: &[&str]) -> LevelConfig {
    LevelConfig::new(
        id,
        name,
        titles.len() as u32,
        titles.iter().map(|t| (*t).to_owned()).collect(),
    )
}
