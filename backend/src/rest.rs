use axum::{
    extract::{Path, Query, State},
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    CategoryListResponse, CategoryQuestionsResponse, CreateQuestionRequest,
    CreateQuestionResponse, DeleteQuestionResponse, QuestionListResponse, QuizRequest,
    QuizResponse, SearchRequest, SearchResponse,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::TriviaService;
use crate::error::{self, ApiError};

/// Application state containing the TriviaService
#[derive(Clone)]
pub struct AppState {
    pub service: TriviaService,
}

impl AppState {
    /// Create new application state with the given TriviaService
    pub fn new(service: TriviaService) -> Self {
        Self { service }
    }
}

/// Query parameters shared by the paginated endpoints
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

/// Build the full application router: routes, structured-error translation
/// for bare framework rejections, and permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:category_id/questions", get(questions_by_category))
        .route("/questions", get(list_questions).post(add_question))
        .route("/questions/:question_id", delete(delete_question))
        .route("/questions/search", post(search_questions))
        .route("/quizzes", post(play_quiz))
        .fallback(|| async { ApiError::NotFound })
        .layer(middleware::map_response(error::translate_bare_rejections))
        .layer(cors)
        .with_state(state)
}

/// Axum handler function for GET /categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    info!("GET /categories");
    state.service.list_categories().await.map(Json)
}

/// Axum handler function for GET /questions
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    info!("GET /questions - page: {}", query.page());
    state.service.list_questions(query.page()).await.map(Json)
}

/// Axum handler function for DELETE /questions/:question_id
pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<DeleteQuestionResponse>, ApiError> {
    info!("DELETE /questions/{}", question_id);
    state
        .service
        .delete_question(question_id, query.page())
        .await
        .map(Json)
}

/// Axum handler function for POST /questions
pub async fn add_question(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<Json<CreateQuestionResponse>, ApiError> {
    info!("POST /questions");
    state
        .service
        .add_question(request, query.page())
        .await
        .map(Json)
}

/// Axum handler function for POST /questions/search
pub async fn search_questions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    info!("POST /questions/search - term: {:?}", request.search_term);
    state
        .service
        .search_questions(request, query.page())
        .await
        .map(Json)
}

/// Axum handler function for GET /categories/:category_id/questions
pub async fn questions_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryQuestionsResponse>, ApiError> {
    info!("GET /categories/{}/questions", category_id);
    state
        .service
        .questions_by_category(category_id, query.page())
        .await
        .map(Json)
}

/// Axum handler function for POST /quizzes
pub async fn play_quiz(
    State(state): State<AppState>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    info!(
        "POST /quizzes - category: {:?}, previous: {}",
        request.quiz_category.as_ref().map(|c| c.id),
        request.previous_questions.len()
    );
    state.service.play_quiz(request).await.map(Json)
}
