//! Weighted regex rule table for task classification.

use super::{select_class, TaskClass, TaskClassifier};
use regex::Regex;

/// Built-in rule table. Every pattern is matched against lower-cased input.
const DEFAULT_RULES: &[(TaskClass, &[&str])] = &[
    (
        TaskClass::Embedding,
        &[
            r"\bembed(ding|dings)?\b",
            r"\bvectori[sz]e\b",
            r"\bvector (representation|embedding)s?\b",
            r"\bencode (this|the|these)\b",
        ],
    ),
    (
        TaskClass::Similarity,
        &[
            r"\bsimilar(ity)?\b",
            r"\b\w+ similar to\b",
            r"\bcompare\b",
            r"\bsemantic(ally)? (match|close|related)\b",
            r"\bclosest\b",
            r"\brelated to\b",
        ],
    ),
    (
        TaskClass::Clustering,
        &[
            r"\bclusters?\b",
            r"\bclustering\b",
            r"\bgroup (these|the|them|similar)\b",
            r"\bcategori[sz]e\b",
            r"\bsegment\b",
        ],
    ),
    (
        TaskClass::DocumentAnalysis,
        &[
            r"\banaly[sz]e (this|the|my) (document|file|report|pdf|contract|paper)\b",
            r"\bsummari[sz]e\b",
            r"\bsummary of\b",
            r"\bextract (the )?(key|main|entities|information)\b",
            r"\bkey points\b",
        ],
    ),
    (
        TaskClass::Search,
        &[
            r"\bsearch\b",
            r"\bfind\b",
            r"\blook up\b",
            r"\bretrieve\b",
            r"\blocate\b",
        ],
    ),
    (
        TaskClass::Conversation,
        &[
            r"^(hi|hello|hey|good (morning|afternoon|evening))\b",
            r"\bhow are you\b",
            r"\bthank(s| you)\b",
            r"\bchat\b",
            r"\blet'?s talk\b",
            r"\bwho are you\b",
        ],
    ),
    (
        TaskClass::Reasoning,
        &[
            r"\bwhy\b",
            r"\bexplain (why|how)\b",
            r"\breason(ing)?\b",
            r"\bstep by step\b",
            r"\bprove\b",
            r"\bdeduce\b",
            r"\bsolve\b",
            r"\bcalculate\b",
            r"\blogic(al)?\b",
        ],
    ),
    (
        TaskClass::CodeGeneration,
        &[
            r"\b(write|generate|create|implement) (a |an |the |some )?(\w+ )?(code|function|script|program|class|method|module)\b",
            r"\bcode\b",
            r"\bdebug\b",
            r"\brefactor\b",
            r"\bcompile\b",
            r"\b(rust|python|javascript|typescript|java|golang|sql)\b",
            r"```",
        ],
    ),
    (
        TaskClass::TextGeneration,
        &[
            r"\bwrite (a|an|me|some)\b",
            r"\bpoem\b",
            r"\bstory\b",
            r"\bessay\b",
            r"\bcompose\b",
            r"\bdraft\b",
            r"\bgenerate (a |some )?text\b",
            r"\blyrics\b",
        ],
    ),
    (
        TaskClass::QuestionAnswering,
        &[
            r"^(what|who|when|where|which|how)\b",
            r"\?\s*$",
            r"\bwhat is\b",
            r"\bdefine\b",
            r"\bwhat does\b",
        ],
    ),
];

/// Ordered pattern set for one task class.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub class: TaskClass,
    pub patterns: Vec<Regex>,
}

impl PatternRule {
    /// Compile a rule from raw pattern strings.
    pub fn new(class: TaskClass, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { class, patterns })
    }

    /// Number of pattern matches in already lower-cased text.
    fn score(&self, lowered: &str) -> usize {
        self.patterns
            .iter()
            .map(|p| p.find_iter(lowered).count())
            .sum()
    }
}

/// Keyword/regex classifier: score = number of pattern matches per class.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<PatternRule>,
}

impl PatternClassifier {
    /// Build a classifier from a custom rule table.
    pub fn with_rules(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Per-class scores for the given text, in rule-table order.
    pub fn scores(&self, text: &str) -> Vec<(TaskClass, usize)> {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Vec::new();
        }
        self.rules
            .iter()
            .map(|rule| (rule.class, rule.score(&lowered)))
            .collect()
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(class, patterns)| {
                PatternRule::new(*class, patterns).expect("built-in classification pattern")
            })
            .collect();
        Self { rules }
    }
}

impl TaskClassifier for PatternClassifier {
    fn classify(&self, text: &str) -> TaskClass {
        select_class(&self.scores(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> TaskClass {
        PatternClassifier::default().classify(text)
    }

    #[test]
    fn default_rules_cover_every_class() {
        let classifier = PatternClassifier::default();
        for class in TaskClass::ALL {
            assert!(
                classifier.rules.iter().any(|r| r.class == class),
                "no rule for {}",
                class
            );
        }
    }

    #[test]
    fn similar_documents_request_is_similarity() {
        assert_eq!(
            classify("find documents similar to this report"),
            TaskClass::Similarity
        );
    }

    #[test]
    fn poem_request_is_text_generation() {
        assert_eq!(classify("write a poem about the sea"), TaskClass::TextGeneration);
    }

    #[test]
    fn code_request_beats_generic_writing() {
        assert_eq!(
            classify("write a function in python that sorts a list"),
            TaskClass::CodeGeneration
        );
    }

    #[test]
    fn questions_are_question_answering() {
        assert_eq!(
            classify("What is the capital of France?"),
            TaskClass::QuestionAnswering
        );
    }

    #[test]
    fn explanation_requests_are_reasoning() {
        assert_eq!(classify("explain why the sky is blue"), TaskClass::Reasoning);
    }

    #[test]
    fn greetings_are_conversation() {
        assert_eq!(classify("hello there, how are you"), TaskClass::Conversation);
    }

    #[test]
    fn retrieval_family_is_recognized() {
        assert_eq!(
            classify("cluster these customer reviews into groups"),
            TaskClass::Clustering
        );
        assert_eq!(
            classify("generate embeddings for these sentences"),
            TaskClass::Embedding
        );
        assert_eq!(
            classify("search the knowledge base for refund policy"),
            TaskClass::Search
        );
        assert_eq!(classify("summarize this contract"), TaskClass::DocumentAnalysis);
    }

    #[test]
    fn empty_and_unmatched_input_default_to_conversation() {
        assert_eq!(classify(""), TaskClass::Conversation);
        assert_eq!(classify("   "), TaskClass::Conversation);
        assert_eq!(classify("zzz qqq"), TaskClass::Conversation);
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(
            classify("FIND DOCUMENTS SIMILAR TO THIS REPORT"),
            TaskClass::Similarity
        );
    }

    #[test]
    fn custom_rules_replace_the_table() {
        let classifier = PatternClassifier::with_rules(vec![PatternRule::new(
            TaskClass::Search,
            &[r"\bpoem\b"],
        )
        .unwrap()]);
        assert_eq!(classifier.classify("a poem"), TaskClass::Search);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(PatternRule::new(TaskClass::Search, &["("]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn classification_is_deterministic(text in ".{0,200}") {
                let classifier = PatternClassifier::default();
                let first = classifier.classify(&text);
                let second = classifier.classify(&text);
                prop_assert_eq!(first, second);
            }
        }
    }
}
