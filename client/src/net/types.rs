//! Wire DTOs for the ARIA backend.
//!
//! DESIGN
//! ======
//! Panel payloads are read leniently: every field defaults when absent or
//! `null`, and counters accept integers, floats or numeric strings since the
//! backend is not strict about types. A refresh should only fail when the shape is wrong,
//! never because one counter arrived as `3.0`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize a non-negative counter from any JSON number or `null`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Deserialize a float, keeping `null` and unparseable values as `None`.
fn lenient_opt_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Deserialize any field, reading an explicit `null` as the default.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize a float from any JSON number or `null`.
fn lenient_float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: Option<String>,
    pub confidence: Option<f64>,
    pub learning_stats: Option<LearningSnapshot>,
    /// Emotion the reply was given in (emotion-aware chat only).
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub learned_something: bool,
}

/// Learning counters attached to a chat reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningSnapshot {
    #[serde(deserialize_with = "lenient_count")]
    pub total_conversations: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Positive,
    Negative,
}

impl FeedbackKind {
    /// Star rating the backend expects alongside the feedback tag.
    #[must_use]
    pub fn rating(self) -> u8 {
        match self {
            Self::Positive => 5,
            Self::Negative => 1,
        }
    }
}

// =============================================================================
// AUTO LEARNING
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AutoLearningStatus {
    #[serde(deserialize_with = "null_default")]
    pub is_running: bool,
    #[serde(deserialize_with = "null_default")]
    pub current_session_active: bool,
    #[serde(deserialize_with = "null_default")]
    pub knowledge_stats: Map<String, Value>,
    #[serde(deserialize_with = "lenient_count")]
    pub active_topics: u64,
    #[serde(deserialize_with = "null_default")]
    pub last_session: SessionSummary,
    /// `"advanced"` when the advanced extractor is active.
    #[serde(deserialize_with = "null_default")]
    pub system_type: String,
    #[serde(deserialize_with = "lenient_count")]
    pub total_knowledge: u64,
    #[serde(deserialize_with = "lenient_float")]
    pub avg_confidence: f64,
    #[serde(deserialize_with = "null_default")]
    pub statistics: ExtractionStatistics,
}

impl AutoLearningStatus {
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        self.system_type == "advanced"
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSummary {
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub kind: String,
    pub last_session: Option<String>,
    #[serde(deserialize_with = "lenient_float")]
    pub quality: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub topics_learned: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractionStatistics {
    #[serde(deserialize_with = "lenient_count")]
    pub articles_processed: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub successful_extractions: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub failed_extractions: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub sources_accessed: u64,
}

/// Session flavours accepted by `/api/auto_learning/trigger_session`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Quick,
    Deep,
}

impl SessionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
        }
    }
}

// =============================================================================
// KNOWLEDGE (teach / export)
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LearningStats {
    #[serde(deserialize_with = "lenient_count")]
    pub knowledge_entries: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub learned_patterns: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub long_term_patterns: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub short_term_memory: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub vocabulary_size: u64,
    #[serde(deserialize_with = "lenient_float")]
    pub average_feedback: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportedKnowledge {
    #[serde(deserialize_with = "null_default")]
    pub concepts: Map<String, Value>,
    #[serde(deserialize_with = "null_default")]
    pub successful_patterns: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SystemComparison {
    #[serde(deserialize_with = "null_default")]
    pub basic_system: SystemProfile,
    #[serde(deserialize_with = "null_default")]
    pub advanced_system: SystemProfile,
    #[serde(deserialize_with = "null_default")]
    pub recommendation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SystemProfile {
    #[serde(deserialize_with = "null_default")]
    pub available: bool,
    #[serde(deserialize_with = "null_default")]
    pub features: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    #[serde(deserialize_with = "null_default")]
    pub available: bool,
    #[serde(deserialize_with = "null_default")]
    pub features: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub sources: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KnowledgeHit {
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub topic: String,
    #[serde(deserialize_with = "null_default")]
    pub content: String,
    #[serde(deserialize_with = "null_default")]
    pub source_name: String,
    #[serde(deserialize_with = "lenient_float")]
    pub confidence_score: f64,
}

// =============================================================================
// DICTIONARY
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DictionaryStats {
    #[serde(deserialize_with = "lenient_count")]
    pub total_words: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub words_learned_today: u64,
    #[serde(deserialize_with = "null_default")]
    pub learning_enabled: bool,
    #[serde(deserialize_with = "null_default")]
    pub last_session: DictionarySession,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DictionarySession {
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub words_learned: u64,
    #[serde(deserialize_with = "lenient_float")]
    pub success_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WordSummary {
    #[serde(deserialize_with = "null_default")]
    pub word: String,
    #[serde(deserialize_with = "null_default")]
    pub definition: String,
    #[serde(deserialize_with = "null_default")]
    pub part_of_speech: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WordEntry {
    #[serde(deserialize_with = "null_default")]
    pub word: String,
    #[serde(deserialize_with = "null_default")]
    pub definition: String,
    #[serde(deserialize_with = "null_default")]
    pub part_of_speech: String,
    #[serde(deserialize_with = "null_default")]
    pub pronunciation: String,
    #[serde(deserialize_with = "null_default")]
    pub example: String,
    #[serde(deserialize_with = "null_default")]
    pub synonyms: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub antonyms: Vec<String>,
    #[serde(deserialize_with = "lenient_float")]
    pub confidence: f64,
}

// =============================================================================
// NEURAL TRAINING
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkInfo {
    #[serde(rename = "parametros", deserialize_with = "lenient_count")]
    pub parameters: u64,
    #[serde(deserialize_with = "lenient_float")]
    pub precision: f64,
    #[serde(rename = "ultima_actualizacion")]
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeachReply {
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingReply {
    #[serde(deserialize_with = "lenient_opt_float")]
    pub accuracy_final: Option<f64>,
    #[serde(rename = "epochs_completados", deserialize_with = "lenient_count")]
    pub epochs_completed: u64,
}

// =============================================================================
// WEB SEARCH
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WebSearchReply {
    #[serde(deserialize_with = "null_default")]
    pub resultados: Vec<RawSearchHit>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawSearchHit {
    #[serde(deserialize_with = "null_default")]
    pub titulo: String,
    #[serde(deserialize_with = "null_default")]
    pub contenido: String,
    #[serde(deserialize_with = "null_default")]
    pub url: String,
    #[serde(deserialize_with = "null_default")]
    pub fuente: String,
}

// =============================================================================
// CLOUD
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmotionSample {
    #[serde(deserialize_with = "null_default")]
    pub emotion_type: String,
    #[serde(deserialize_with = "null_default")]
    pub color_code: String,
    #[serde(deserialize_with = "lenient_float")]
    pub intensity: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CloudStats {
    #[serde(deserialize_with = "lenient_count")]
    pub ai_sources: u64,
    #[serde(deserialize_with = "lenient_float")]
    pub confidence: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub knowledge_count: u64,
}
