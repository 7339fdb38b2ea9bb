use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Number of questions returned per page across all listing endpoints.
pub const QUESTIONS_PER_PAGE: usize = 10;

/// A trivia question as stored and served over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    /// The question text shown to the player
    pub question: String,
    pub answer: String,
    /// Id of the category this question belongs to
    pub category: i64,
    /// Difficulty rating (1 = easiest)
    pub difficulty: i64,
}

/// A question category ("Science", "Art", ...). Categories are read-only
/// from the API's perspective and are seeded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The `{id: type}` object returned by the category endpoints. Built with
/// [`category_map`] so key order follows query order.
pub type CategoryMap = serde_json::Map<String, serde_json::Value>;

/// Build the wire-format category map from an ordered category list.
pub fn category_map(categories: &[Category]) -> CategoryMap {
    categories
        .iter()
        .map(|c| (c.id.to_string(), serde_json::Value::String(c.kind.clone())))
        .collect()
}

/// Body of `POST /questions`. Every field is optional at the JSON layer;
/// missing required columns surface as a storage error, not a 400.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateQuestionRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_id_opt")]
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}

/// Body of `POST /questions/search`. An absent or empty term matches
/// every question.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
}

/// Body of `POST /quizzes`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuizRequest {
    /// Ids of questions already drawn this session, supplied by the client
    #[serde(default)]
    pub previous_questions: Vec<i64>,
    /// Category to draw from; absent means all categories
    #[serde(default)]
    pub quiz_category: Option<QuizCategory>,
}

/// Category selector inside a quiz request. Id 0 means "all categories".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuizCategory {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryListResponse {
    pub success: bool,
    pub categories: CategoryMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionListResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    /// Count of ALL questions, not just this page
    pub total_questions: i64,
    pub current_category: i64,
    pub categories: CategoryMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteQuestionResponse {
    pub success: bool,
    /// Id of the question that was deleted
    pub deleted: i64,
    pub questions: Vec<Question>,
    pub total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateQuestionResponse {
    pub success: bool,
    /// Id assigned by storage to the new question
    pub created: i64,
    pub questions: Vec<Question>,
    pub total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    /// True match count across all pages
    pub total_questions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryQuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: i64,
    pub current_category: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResponse {
    pub question: QuizPick,
}

/// Either the next question to play, or the literal `false` once the
/// client has seen every candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuizPick {
    Next(Question),
    Exhausted(bool),
}

impl QuizPick {
    /// The "no more questions" marker, serialized as `false`.
    pub fn exhausted() -> Self {
        QuizPick::Exhausted(false)
    }
}

/// Accept a category id as either a JSON number or a numeric string.
/// Existing clients send both (`"category": "1"` and `"id": 2`).
fn lenient_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid category id: {s:?}"))),
    }
}

fn lenient_id_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid category id: {s:?}"))),
    }
}
