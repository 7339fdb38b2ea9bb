use anyhow::Result;
use shared::{Category, Question};
use sqlx::sqlite::SqliteRow;
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;

// The database URL for the production database; overridden by TRIVIA_DATABASE_URL
const DATABASE_URL: &str = "sqlite:trivia.db";

/// The six canonical categories, seeded into a fresh database.
const SEED_CATEGORIES: [&str; 6] = [
    "Science",
    "Art",
    "Geography",
    "History",
    "Entertainment",
    "Sports",
];

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        // Connect to the database
        let pool = SqlitePool::connect(url).await?;

        // Setup database schema and seed categories
        Self::setup_schema(&pool).await?;
        Self::seed_categories(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize the standard database
    pub async fn init() -> Result<Self> {
        let url =
            std::env::var("TRIVIA_DATABASE_URL").unwrap_or_else(|_| DATABASE_URL.to_string());
        Self::new(&url).await
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // Generate a unique database name for tests
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                category INTEGER NOT NULL,
                difficulty INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Seed the category table on first run. Categories are read-only
    /// through the API, so an empty table would make every endpoint 404.
    async fn seed_categories(pool: &SqlitePool) -> Result<()> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM categories")
            .fetch_one(pool)
            .await?;
        let count: i64 = row.get("n");
        if count > 0 {
            return Ok(());
        }

        for kind in SEED_CATEGORIES {
            sqlx::query("INSERT INTO categories (type) VALUES (?)")
                .bind(kind)
                .execute(pool)
                .await?;
        }

        Ok(())
    }

    fn question_from_row(row: &SqliteRow) -> Question {
        Question {
            id: row.get("id"),
            question: row.get("question"),
            answer: row.get("answer"),
            category: row.get("category"),
            difficulty: row.get("difficulty"),
        }
    }

    fn category_from_row(row: &SqliteRow) -> Category {
        Category {
            id: row.get("id"),
            kind: row.get("type"),
        }
    }

    /// List all categories ordered by type
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, type FROM categories ORDER BY type ASC")
            .fetch_all(&*self.pool)
            .await?;
        Ok(rows.iter().map(Self::category_from_row).collect())
    }

    /// Look up a single category by id
    pub async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, type FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.as_ref().map(Self::category_from_row))
    }

    /// List all questions ordered by id
    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            "SELECT id, question, answer, category, difficulty FROM questions ORDER BY id ASC",
        )
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows.iter().map(Self::question_from_row).collect())
    }

    /// Look up a single question by id
    pub async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        let row = sqlx::query(
            "SELECT id, question, answer, category, difficulty FROM questions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.as_ref().map(Self::question_from_row))
    }

    /// Insert a new question and return its assigned id.
    /// Missing fields bind as NULL and fail the NOT NULL constraints.
    pub async fn insert_question(
        &self,
        question: Option<&str>,
        answer: Option<&str>,
        category: Option<i64>,
        difficulty: Option<i64>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO questions (question, answer, category, difficulty) VALUES (?, ?, ?, ?)",
        )
        .bind(question)
        .bind(answer)
        .bind(category)
        .bind(difficulty)
        .execute(&*self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Delete a question by id
    pub async fn delete_question(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive substring search over question text, ordered by id.
    /// An empty term matches every question.
    pub async fn search_questions(&self, term: &str) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            r#"
            SELECT id, question, answer, category, difficulty FROM questions
            WHERE LOWER(question) LIKE '%' || LOWER(?) || '%'
            ORDER BY id ASC
            "#,
        )
        .bind(term)
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows.iter().map(Self::question_from_row).collect())
    }

    /// List questions belonging to one category, ordered by id
    pub async fn questions_by_category(&self, category: i64) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            r#"
            SELECT id, question, answer, category, difficulty FROM questions
            WHERE category = ?
            ORDER BY id ASC
            "#,
        )
        .bind(category)
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows.iter().map(Self::question_from_row).collect())
    }

    /// Count all questions
    pub async fn count_questions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM questions")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Setup a new test database for each test
    async fn setup_test() -> DbConnection {
        DbConnection::init_test().await.expect("Failed to create test database")
    }

    async fn insert_sample(db: &DbConnection, text: &str, category: i64) -> i64 {
        db.insert_question(Some(text), Some("answer"), Some(category), Some(1))
            .await
            .expect("Failed to insert question")
    }

    #[tokio::test]
    async fn test_fresh_database_is_seeded_with_categories() {
        let db = setup_test().await;

        let categories = db.list_categories().await.expect("Failed to list categories");
        assert_eq!(categories.len(), 6);

        // Ordered by type, so Art comes first
        assert_eq!(categories[0].kind, "Art");
        assert!(categories.iter().any(|c| c.kind == "Science"));
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let db = setup_test().await;

        // Re-running setup against the same pool must not duplicate rows
        DbConnection::seed_categories(&db.pool).await.expect("Re-seed failed");

        let categories = db.list_categories().await.expect("Failed to list categories");
        assert_eq!(categories.len(), 6);
    }

    #[tokio::test]
    async fn test_insert_and_get_question() {
        let db = setup_test().await;

        let id = insert_sample(&db, "What is the heaviest organ in the human body?", 1).await;

        let question = db.get_question(id).await.expect("Query failed");
        assert!(question.is_some());
        let question = question.unwrap();
        assert_eq!(question.id, id);
        assert_eq!(question.question, "What is the heaviest organ in the human body?");
        assert_eq!(question.category, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent_question() {
        let db = setup_test().await;

        let result = db.get_question(12345).await.expect("Query failed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_insert_with_missing_required_field_fails() {
        let db = setup_test().await;

        // NULL question text violates the NOT NULL constraint
        let result = db.insert_question(None, Some("answer"), Some(1), Some(2)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_question() {
        let db = setup_test().await;
        let id = insert_sample(&db, "to be deleted", 1).await;

        let deleted = db.delete_question(id).await.expect("Delete failed");
        assert!(deleted);

        let gone = db.get_question(id).await.expect("Query failed");
        assert!(gone.is_none());

        // Deleting again reports nothing deleted
        let deleted_again = db.delete_question(id).await.expect("Re-delete failed");
        assert!(!deleted_again);
    }

    #[tokio::test]
    async fn test_list_questions_ordered_by_id() {
        let db = setup_test().await;
        let first = insert_sample(&db, "first", 1).await;
        let second = insert_sample(&db, "second", 2).await;
        let third = insert_sample(&db, "third", 1).await;

        let questions = db.list_questions().await.expect("List failed");
        let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = setup_test().await;
        insert_sample(&db, "Hello world", 1).await;
        insert_sample(&db, "say HELLO twice", 1).await;
        insert_sample(&db, "goodbye", 1).await;

        let matches = db.search_questions("hello").await.expect("Search failed");
        assert_eq!(matches.len(), 2);
        for q in &matches {
            assert!(q.question.to_lowercase().contains("hello"));
        }
    }

    #[tokio::test]
    async fn test_search_empty_term_matches_everything() {
        let db = setup_test().await;
        insert_sample(&db, "alpha", 1).await;
        insert_sample(&db, "beta", 2).await;

        let matches = db.search_questions("").await.expect("Search failed");
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn test_questions_by_category_filters_exactly() {
        let db = setup_test().await;
        insert_sample(&db, "science one", 1).await;
        insert_sample(&db, "art one", 2).await;
        insert_sample(&db, "science two", 1).await;

        let matches = db.questions_by_category(1).await.expect("Query failed");
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|q| q.category == 1));

        let none = db.questions_by_category(9999).await.expect("Query failed");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_count_questions() {
        let db = setup_test().await;
        assert_eq!(db.count_questions().await.expect("Count failed"), 0);

        insert_sample(&db, "one", 1).await;
        insert_sample(&db, "two", 1).await;
        assert_eq!(db.count_questions().await.expect("Count failed"), 2);
    }
}
