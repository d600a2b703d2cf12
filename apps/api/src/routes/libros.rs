//! # Book Routes
//!
//! `/libros` - catalog management and storefront listing.
//!
//! | Method | Path        | Description                              |
//! |--------|-------------|------------------------------------------|
//! | GET    | /libros     | Paginated active books, `categoria` filter |
//! | POST   | /libros     | Create a book                            |
//! | GET    | /libros/:id | Book detail with authors                 |
//! | PUT    | /libros/:id | Update a book                            |
//! | DELETE | /libros/:id | Soft-delete a book                       |

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use libreria_core::{validation, Author, Book};

use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(update).delete(remove))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListBooksParams {
    page: Option<i64>,
    limit: Option<i64>,
    /// Category id filter.
    categoria: Option<String>,
}

impl ListBooksParams {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Book as listed: catalog row plus the price a buyer pays right now.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookDto {
    #[serde(flatten)]
    book: Book,
    effective_price_cents: i64,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        BookDto {
            effective_price_cents: book.effective_price_cents(),
            book,
        }
    }
}

/// Book detail: the listing DTO plus its authors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookDetailDto {
    #[serde(flatten)]
    book: BookDto,
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookRequest {
    isbn: String,
    title: String,
    description: Option<String>,
    price_cents: i64,
    stock: i64,
    category_id: Option<String>,
    publisher_id: Option<String>,
    #[serde(default)]
    on_sale: bool,
    sale_discount_pct: Option<i64>,
    #[serde(default)]
    author_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBookRequest {
    isbn: String,
    title: String,
    description: Option<String>,
    price_cents: i64,
    stock: i64,
    category_id: Option<String>,
    publisher_id: Option<String>,
    on_sale: bool,
    sale_discount_pct: Option<i64>,
    is_active: bool,
    /// When present, replaces the author links.
    author_ids: Option<Vec<String>>,
}

fn validate_book_payload(
    isbn: &str,
    title: &str,
    price_cents: i64,
    stock: i64,
    sale_discount_pct: Option<i64>,
) -> Result<(), ApiError> {
    validation::validate_isbn(isbn).map_err(libreria_core::CoreError::from)?;
    validation::validate_title(title).map_err(libreria_core::CoreError::from)?;
    validation::validate_price_cents(price_cents).map_err(libreria_core::CoreError::from)?;
    validation::validate_stock(stock).map_err(libreria_core::CoreError::from)?;
    if let Some(pct) = sale_discount_pct {
        validation::validate_discount_pct(pct).map_err(libreria_core::CoreError::from)?;
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Lists active books with pagination and optional category filter.
async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListBooksParams>,
) -> Result<Json<Paginated<BookDto>>, ApiError> {
    let (page, limit) = params.page_params().normalize();
    let category = params.categoria.as_deref();

    debug!(page, limit, ?category, "GET /libros");

    let books = state.db.books().list_active(page, limit, category).await?;
    let total = state.db.books().count_active(category).await?;

    let data = books.into_iter().map(BookDto::from).collect();
    Ok(Json(Paginated::new(data, page, limit, total)))
}

/// Book detail with authors.
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDetailDto>, ApiError> {
    let book = state
        .db
        .books()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Libro", &id))?;

    let authors = state.db.books().authors_of(&id).await?;

    Ok(Json(BookDetailDto {
        book: BookDto::from(book),
        authors,
    }))
}

/// Creates a book.
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookDetailDto>), ApiError> {
    debug!(isbn = %req.isbn, "POST /libros");

    validate_book_payload(
        &req.isbn,
        &req.title,
        req.price_cents,
        req.stock,
        req.sale_discount_pct,
    )?;

    let now = Utc::now();
    let book = Book {
        id: Uuid::new_v4().to_string(),
        isbn: req.isbn.trim().to_string(),
        title: req.title.trim().to_string(),
        description: req.description,
        price_cents: req.price_cents,
        stock: req.stock,
        category_id: req.category_id,
        publisher_id: req.publisher_id,
        is_active: true,
        on_sale: req.on_sale,
        sale_discount_pct: req.sale_discount_pct,
        created_at: now,
        updated_at: now,
    };

    state.db.books().insert(&book).await?;
    if !req.author_ids.is_empty() {
        state.db.books().set_authors(&book.id, &req.author_ids).await?;
    }

    let authors = state.db.books().authors_of(&book.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookDetailDto {
            book: BookDto::from(book),
            authors,
        }),
    ))
}

/// Updates a book.
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookDetailDto>, ApiError> {
    debug!(id = %id, "PUT /libros/:id");

    validate_book_payload(
        &req.isbn,
        &req.title,
        req.price_cents,
        req.stock,
        req.sale_discount_pct,
    )?;

    let existing = state
        .db
        .books()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Libro", &id))?;

    let book = Book {
        isbn: req.isbn.trim().to_string(),
        title: req.title.trim().to_string(),
        description: req.description,
        price_cents: req.price_cents,
        stock: req.stock,
        category_id: req.category_id,
        publisher_id: req.publisher_id,
        is_active: req.is_active,
        on_sale: req.on_sale,
        sale_discount_pct: req.sale_discount_pct,
        ..existing
    };

    state.db.books().update(&book).await?;
    if let Some(author_ids) = &req.author_ids {
        state.db.books().set_authors(&id, author_ids).await?;
    }

    let authors = state.db.books().authors_of(&id).await?;

    Ok(Json(BookDetailDto {
        book: BookDto::from(book),
        authors,
    }))
}

/// Soft-deletes a book.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(id = %id, "DELETE /libros/:id");

    state.db.books().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
