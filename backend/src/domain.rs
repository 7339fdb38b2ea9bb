use crate::db::DbConnection;
use crate::error::ApiError;
use rand::rng;
use rand::seq::IndexedRandom;
use shared::{
    category_map, CategoryListResponse, CategoryQuestionsResponse, CreateQuestionRequest,
    CreateQuestionResponse, DeleteQuestionResponse, Question, QuestionListResponse, QuizPick,
    QuizRequest, QuizResponse, SearchRequest, SearchResponse, QUESTIONS_PER_PAGE,
};
use tracing::info;

/// Slice an ordered question list into the 1-based page of fixed size.
/// Out-of-range pages yield an empty slice.
pub fn paginate(questions: &[Question], page: u32) -> Vec<Question> {
    let page = page.max(1) as usize;
    questions
        .iter()
        .skip((page - 1) * QUESTIONS_PER_PAGE)
        .take(QUESTIONS_PER_PAGE)
        .cloned()
        .collect()
}

/// Per-endpoint business logic over the storage layer. Handlers stay thin;
/// each method returns the success payload or one of the four error kinds.
#[derive(Clone)]
pub struct TriviaService {
    db: DbConnection,
}

impl TriviaService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// All categories ordered by type, as the `{id: type}` map.
    pub async fn list_categories(&self) -> Result<CategoryListResponse, ApiError> {
        let categories = self.db.list_categories().await?;
        if categories.is_empty() {
            return Err(ApiError::NotFound);
        }

        Ok(CategoryListResponse {
            success: true,
            categories: category_map(&categories),
        })
    }

    /// One page of all questions, plus the full count and the category map.
    pub async fn list_questions(&self, page: u32) -> Result<QuestionListResponse, ApiError> {
        let questions = self.db.list_questions().await?;
        let page_slice = paginate(&questions, page);
        if page_slice.is_empty() {
            // Covers both "no questions" and out-of-range pages
            return Err(ApiError::NotFound);
        }

        let categories = self.db.list_categories().await?;
        Ok(QuestionListResponse {
            success: true,
            questions: page_slice,
            total_questions: questions.len() as i64,
            // Pinned to 1 regardless of request state, matching client expectations
            current_category: 1,
            categories: category_map(&categories),
        })
    }

    /// Delete a question by id, then return the refreshed page.
    pub async fn delete_question(
        &self,
        id: i64,
        page: u32,
    ) -> Result<DeleteQuestionResponse, ApiError> {
        let existing = self.db.get_question(id).await?;
        if existing.is_none() {
            return Err(ApiError::NotFound);
        }

        // Not transactional with the lookup above; a concurrent delete
        // makes this a no-op and the response is still built normally.
        self.db.delete_question(id).await?;
        info!("Deleted question {}", id);

        let questions = self.db.list_questions().await?;
        Ok(DeleteQuestionResponse {
            success: true,
            deleted: id,
            questions: paginate(&questions, page),
            total_questions: questions.len() as i64,
        })
    }

    /// Insert a new question and return the refreshed page. Field presence
    /// is not validated here; NULLs fail in storage and surface as 422.
    pub async fn add_question(
        &self,
        request: CreateQuestionRequest,
        page: u32,
    ) -> Result<CreateQuestionResponse, ApiError> {
        let created = self
            .db
            .insert_question(
                request.question.as_deref(),
                request.answer.as_deref(),
                request.category,
                request.difficulty,
            )
            .await?;
        info!("Created question {}", created);

        let questions = self.db.list_questions().await?;
        let page_slice = paginate(&questions, page);
        if page_slice.is_empty() {
            // Unreachable once the insert succeeded, kept as a guard
            return Err(ApiError::NotFound);
        }

        Ok(CreateQuestionResponse {
            success: true,
            created,
            questions: page_slice,
            total_questions: questions.len() as i64,
        })
    }

    /// Case-insensitive substring search. An absent or empty term matches
    /// every question. `total_questions` is the true match count.
    pub async fn search_questions(
        &self,
        request: SearchRequest,
        page: u32,
    ) -> Result<SearchResponse, ApiError> {
        let term = request.search_term.unwrap_or_default();
        let matches = self.db.search_questions(&term).await?;
        let page_slice = paginate(&matches, page);
        if page_slice.is_empty() {
            return Err(ApiError::NotFound);
        }

        Ok(SearchResponse {
            success: true,
            questions: page_slice,
            total_questions: matches.len() as i64,
        })
    }

    /// One page of the questions in a single category.
    pub async fn questions_by_category(
        &self,
        category_id: i64,
        page: u32,
    ) -> Result<CategoryQuestionsResponse, ApiError> {
        let questions = self.db.questions_by_category(category_id).await?;
        let page_slice = paginate(&questions, page);
        if page_slice.is_empty() {
            return Err(ApiError::NotFound);
        }

        // Questions can reference a category row that does not exist; the
        // response needs the row, so its absence is a 422, not a 404.
        let category = self.db.get_category(category_id).await?;
        let Some(category) = category else {
            return Err(ApiError::Unprocessable);
        };

        Ok(CategoryQuestionsResponse {
            success: true,
            total_questions: page_slice.len() as i64,
            questions: page_slice,
            current_category: category.id,
        })
    }

    /// Draw one random question the client has not seen yet. Category id 0
    /// (or an absent category) means draw from all questions.
    pub async fn play_quiz(&self, request: QuizRequest) -> Result<QuizResponse, ApiError> {
        let category_id = request.quiz_category.map(|c| c.id).unwrap_or(0);
        let candidates = if category_id == 0 {
            self.db.list_questions().await?
        } else {
            self.db.questions_by_category(category_id).await?
        };
        if candidates.is_empty() {
            return Err(ApiError::NotFound);
        }

        let unseen: Vec<Question> = candidates
            .into_iter()
            .filter(|q| !request.previous_questions.contains(&q.id))
            .collect();

        let pick = match unseen.choose(&mut rng()) {
            Some(question) => QuizPick::Next(question.clone()),
            None => QuizPick::exhausted(),
        };
        Ok(QuizResponse { question: pick })
    }
}
