/// Catalog Routes
///
/// CRUD over the book catalog, consumed by the admin frontend. Reads require
/// a signed-in user; mutations require the admin role.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub price_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price_cents: i64,
    pub created_at: String,
}

type BookRow = (Uuid, String, String, i64, chrono::DateTime<Utc>);

fn to_response(row: BookRow) -> BookResponse {
    BookResponse {
        id: row.0.to_string(),
        title: row.1,
        author: row.2,
        price_cents: row.3,
        created_at: row.4.to_rfc3339(),
    }
}

fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::Forbidden))
    }
}

fn validate_book(form: &BookRequest) -> Result<(), AppError> {
    if form.title.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "title".to_string(),
        )));
    }
    if form.author.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "author".to_string(),
        )));
    }
    if form.price_cents < 0 {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "price".to_string(),
        )));
    }
    Ok(())
}

/// GET /books
pub async fn list_books(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let rows = sqlx::query_as::<_, BookRow>(
        "SELECT id, title, author, price_cents, created_at FROM books ORDER BY title",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let books: Vec<BookResponse> = rows.into_iter().map(to_response).collect();

    Ok(HttpResponse::Ok().json(books))
}

/// GET /books/{id}
pub async fn get_book(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let book_id = path.into_inner();

    let row = sqlx::query_as::<_, BookRow>(
        "SELECT id, title, author, price_cents, created_at FROM books WHERE id = $1",
    )
    .bind(book_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        AppError::Database(DatabaseError::NotFound(format!("book {}", book_id)))
    })?;

    Ok(HttpResponse::Ok().json(to_response(row)))
}

/// POST /books (admin only)
pub async fn create_book(
    claims: web::ReqData<Claims>,
    form: web::Json<BookRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&claims)?;
    validate_book(&form)?;

    let book_id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO books (id, title, author, price_cents, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(book_id)
    .bind(form.title.trim())
    .bind(form.author.trim())
    .bind(form.price_cents)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(book_id = %book_id, "Book created");

    Ok(HttpResponse::Created().json(BookResponse {
        id: book_id.to_string(),
        title: form.title.trim().to_string(),
        author: form.author.trim().to_string(),
        price_cents: form.price_cents,
        created_at: now.to_rfc3339(),
    }))
}

/// PUT /books/{id} (admin only)
pub async fn update_book(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    form: web::Json<BookRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&claims)?;
    validate_book(&form)?;

    let book_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE books
        SET title = $1, author = $2, price_cents = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(form.title.trim())
    .bind(form.author.trim())
    .bind(form.price_cents)
    .bind(Utc::now())
    .bind(book_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(format!(
            "book {}",
            book_id
        ))));
    }

    tracing::info!(book_id = %book_id, "Book updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Book updated" })))
}

/// DELETE /books/{id} (admin only)
pub async fn delete_book(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&claims)?;

    let book_id = path.into_inner();

    let result = sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(format!(
            "book {}",
            book_id
        ))));
    }

    tracing::info!(book_id = %book_id, "Book deleted");

    Ok(HttpResponse::NoContent().finish())
}
