use std::collections::HashMap;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::filters::SortBy;
use crate::models::{
    Coffee, CoffeeRow, CoffeeSearch, CoffeeStatus, ImportCoffee, ImportNote, ImportRoaster, Note,
    Roaster,
};

/// Separates fields inside a coffee's `search_text`, so a search term never
/// matches across the end of one field and the start of the next.
const SEARCH_FIELD_SEPARATOR: char = '\u{1f}';

/// Current time as an RFC 3339 UTC timestamp, as stored in `created_at`.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Initialize database connection pool with recommended pragmas.
///
/// An in-memory database lives in a single connection, so the pool is
/// capped at one connection that is never recycled.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));
    if !in_memory {
        options = options
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    pool_options.connect_with(options).await
}

/// Run database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../migrations/001_create_catalog.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

// ============================================================================
// Roasters and notes
// ============================================================================

pub async fn list_roasters(pool: &SqlitePool) -> Result<Vec<Roaster>, sqlx::Error> {
    sqlx::query_as::<_, Roaster>(
        "SELECT id, name, description, location, website, created_at FROM roasters ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_roaster_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Roaster>, sqlx::Error> {
    sqlx::query_as::<_, Roaster>(
        "SELECT id, name, description, location, website, created_at FROM roasters WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_roaster_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Roaster>, sqlx::Error> {
    sqlx::query_as::<_, Roaster>(
        "SELECT id, name, description, location, website, created_at FROM roasters WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// Insert a roaster and return its id.
pub async fn insert_roaster(
    pool: &SqlitePool,
    roaster: &ImportRoaster,
    created_at: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO roasters (name, search_name, description, location, website, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(roaster.name.trim())
    .bind(roaster.name.trim().to_lowercase())
    .bind(roaster.description.as_deref())
    .bind(roaster.location.as_deref())
    .bind(roaster.website.as_deref())
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_notes(pool: &SqlitePool) -> Result<Vec<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>("SELECT id, name, category FROM notes ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn find_note_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Note>, sqlx::Error> {
    sqlx::query_as::<_, Note>("SELECT id, name, category FROM notes WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Insert a tasting note and return its id.
pub async fn insert_note(pool: &SqlitePool, note: &ImportNote) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO notes (name, category) VALUES (?, ?)")
        .bind(note.name.trim())
        .bind(note.category.as_deref())
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

// ============================================================================
// Coffees
// ============================================================================

const COFFEE_COLUMNS: &str = r#"
    SELECT c.id, c.name, c.roaster_id, r.name AS roaster_name, c.origin, c.process,
           c.variety, c.altitude_min, c.altitude_max, c.harvest_year, c.price_range,
           c.description, c.average_rating, c.review_count, c.status, c.moderation_reason,
           c.moderated_at, c.created_at
    FROM coffees c
    JOIN roasters r ON r.id = c.roaster_id
"#;

/// Id of a coffee with this name from this roaster, if any.
pub async fn find_coffee_id(
    pool: &SqlitePool,
    name: &str,
    roaster_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM coffees WHERE name = ? AND roaster_id = ?")
        .bind(name)
        .bind(roaster_id)
        .fetch_optional(pool)
        .await
}

/// Insert a coffee with its tasting notes and return its id.
pub async fn insert_coffee(
    pool: &SqlitePool,
    coffee: &ImportCoffee,
    roaster_id: i64,
    note_ids: &[i64],
    status: CoffeeStatus,
    created_at: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO coffees (name, roaster_id, origin, process, variety, altitude_min,
                             altitude_max, harvest_year, price_range, description,
                             average_rating, review_count, status, search_text, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(coffee.name.trim())
    .bind(roaster_id)
    .bind(coffee.origin.as_deref())
    .bind(coffee.process.as_deref())
    .bind(coffee.variety.as_deref())
    .bind(coffee.altitude_min)
    .bind(coffee.altitude_max)
    .bind(coffee.harvest_year)
    .bind(coffee.price_range.as_deref())
    .bind(coffee.description.as_deref())
    .bind(coffee.average_rating)
    .bind(coffee.review_count.unwrap_or(0))
    .bind(status)
    .bind(coffee_search_text(coffee))
    .bind(created_at)
    .execute(&mut *tx)
    .await?;
    let coffee_id = result.last_insert_rowid();

    for note_id in note_ids {
        sqlx::query("INSERT OR IGNORE INTO coffee_notes (coffee_id, note_id) VALUES (?, ?)")
            .bind(coffee_id)
            .bind(*note_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(coffee_id)
}

/// Lowercased name and origin, matched by listing searches.
fn coffee_search_text(coffee: &ImportCoffee) -> String {
    let mut text = coffee.name.trim().to_lowercase();
    if let Some(origin) = coffee.origin.as_deref() {
        text.push(SEARCH_FIELD_SEPARATOR);
        text.push_str(&origin.to_lowercase());
    }
    text
}

/// `LIKE` pattern matching `term` as a literal substring. Use with `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Get an approved coffee by id.
pub async fn get_coffee(pool: &SqlitePool, id: i64) -> Result<Option<Coffee>, sqlx::Error> {
    fetch_coffee(pool, id, Some(CoffeeStatus::Approved)).await
}

/// Get a coffee by id whatever its status.
pub async fn find_coffee(pool: &SqlitePool, id: i64) -> Result<Option<Coffee>, sqlx::Error> {
    fetch_coffee(pool, id, None).await
}

async fn fetch_coffee(
    pool: &SqlitePool,
    id: i64,
    status: Option<CoffeeStatus>,
) -> Result<Option<Coffee>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(COFFEE_COLUMNS);
    query.push(" WHERE c.id = ").push_bind(id);
    if let Some(status) = status {
        query.push(" AND c.status = ").push_bind(status);
    }
    let row: Option<CoffeeRow> = query.build_query_as().fetch_optional(pool).await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut notes = notes_by_coffee(pool, &[row.id]).await?;
    let coffee_notes = notes.remove(&row.id).unwrap_or_default();
    Ok(Some(Coffee::from_row(row, coffee_notes)))
}

/// Search approved coffees. Returns one page and the total match count.
pub async fn search_coffees(
    pool: &SqlitePool,
    search: &CoffeeSearch,
) -> Result<(Vec<Coffee>, i64), sqlx::Error> {
    let mut count_query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM coffees c JOIN roasters r ON r.id = c.roaster_id");
    push_filters(&mut count_query, search);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query: QueryBuilder<Sqlite> = QueryBuilder::new(COFFEE_COLUMNS);
    push_filters(&mut page_query, search);
    page_query.push(order_clause(search.sort_by));
    page_query
        .push(" LIMIT ")
        .push_bind(i64::from(search.limit))
        .push(" OFFSET ")
        .push_bind(search.offset());
    let rows: Vec<CoffeeRow> = page_query.build_query_as().fetch_all(pool).await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut notes = notes_by_coffee(pool, &ids).await?;
    let coffees = rows
        .into_iter()
        .map(|row| {
            let coffee_notes = notes.remove(&row.id).unwrap_or_default();
            Coffee::from_row(row, coffee_notes)
        })
        .collect();

    Ok((coffees, total))
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, search: &CoffeeSearch) {
    query.push(" WHERE c.status = 'approved'");

    if !search.search.is_empty() {
        let pattern = like_pattern(&search.search);
        query
            .push(" AND (c.search_text LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR r.search_name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    push_any_of(query, "c.origin", &search.origins);
    push_any_of(query, "c.roaster_id", &search.roaster_ids);
    push_any_of(query, "c.process", &search.processes);

    if !search.note_ids.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM coffee_notes cn WHERE cn.coffee_id = c.id AND cn.note_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in &search.note_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated("))");
    }

    if let Some(min_rating) = search.min_rating {
        query.push(" AND c.average_rating >= ").push_bind(min_rating);
    }
}

fn push_any_of<T>(query: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[T])
where
    T: Clone + Send + for<'q> sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite> + 'static,
{
    if values.is_empty() {
        return;
    }
    query.push(format!(" AND {} IN (", column));
    let mut separated = query.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

fn order_clause(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::Rating => " ORDER BY c.average_rating DESC, c.review_count DESC, c.id ASC",
        SortBy::Reviews => " ORDER BY c.review_count DESC, c.average_rating DESC, c.id ASC",
        SortBy::Recent => " ORDER BY c.created_at DESC, c.id DESC",
        SortBy::Name => " ORDER BY c.name COLLATE NOCASE ASC, c.id ASC",
    }
}

// ============================================================================
// Moderation
// ============================================================================

/// Coffees with the given status, oldest submission first.
pub async fn list_coffees_by_status(
    pool: &SqlitePool,
    status: CoffeeStatus,
    page: u32,
    limit: u32,
) -> Result<(Vec<Coffee>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coffees WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(COFFEE_COLUMNS);
    query
        .push(" WHERE c.status = ")
        .push_bind(status)
        .push(" ORDER BY c.created_at ASC, c.id ASC LIMIT ")
        .push_bind(i64::from(limit))
        .push(" OFFSET ")
        .push_bind(i64::from(page.saturating_sub(1)) * i64::from(limit));
    let rows: Vec<CoffeeRow> = query.build_query_as().fetch_all(pool).await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut notes = notes_by_coffee(pool, &ids).await?;
    let coffees = rows
        .into_iter()
        .map(|row| {
            let coffee_notes = notes.remove(&row.id).unwrap_or_default();
            Coffee::from_row(row, coffee_notes)
        })
        .collect();

    Ok((coffees, total))
}

/// Record a moderation decision. Returns false if no coffee has this id.
pub async fn set_coffee_status(
    pool: &SqlitePool,
    id: i64,
    status: CoffeeStatus,
    reason: Option<&str>,
    moderated_at: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE coffees SET status = ?, moderation_reason = ?, moderated_at = ? WHERE id = ?",
    )
    .bind(status)
    .bind(reason)
    .bind(moderated_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Tasting note names of each coffee, alphabetically.
async fn notes_by_coffee(
    pool: &SqlitePool,
    coffee_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, sqlx::Error> {
    let mut notes: HashMap<i64, Vec<String>> = HashMap::new();
    if coffee_ids.is_empty() {
        return Ok(notes);
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT cn.coffee_id, n.name FROM coffee_notes cn JOIN notes n ON n.id = cn.note_id WHERE cn.coffee_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in coffee_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY n.name");

    let rows: Vec<(i64, String)> = query.build_query_as().fetch_all(pool).await?;
    for (coffee_id, name) in rows {
        notes.entry(coffee_id).or_default().push(name);
    }
    Ok(notes)
}

/// Distinct origins of approved coffees.
pub async fn list_origins(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT DISTINCT origin FROM coffees
        WHERE status = 'approved' AND origin IS NOT NULL AND origin != ''
        ORDER BY origin
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Distinct processing methods of approved coffees.
pub async fn list_processes(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT DISTINCT process FROM coffees
        WHERE status = 'approved' AND process IS NOT NULL AND process != ''
        ORDER BY process
        "#,
    )
    .fetch_all(pool)
    .await
}
