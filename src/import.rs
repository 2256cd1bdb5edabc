//! Batch import of tasting notes, roasters and coffees.
//!
//! Items are imported one at a time. A failed item is reported in the
//! response and, unless `continue_on_error` is false, the batch goes on.

use sqlx::SqlitePool;

use crate::db;
use crate::models::{
    BatchImportRequest, CoffeeStatus, EntityType, ImportCoffee, ImportNote, ImportResponse,
    ImportResult, ImportRoaster,
};
use crate::validation::Validator;

/// Load a batch import document from a JSON file.
pub fn load_batch(path: &std::path::Path) -> Result<BatchImportRequest, ImportFileError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[derive(Debug, thiserror::Error)]
pub enum ImportFileError {
    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse import file: {0}")]
    Json(#[from] serde_json::Error),
}

pub async fn batch_import(pool: &SqlitePool, request: BatchImportRequest) -> ImportResponse {
    tracing::info!(
        "Starting batch import: {} notes, {} roasters, {} coffees",
        request.notes.len(),
        request.roasters.len(),
        request.coffees.len()
    );

    let mut response = ImportResponse::default();
    let stop_on_error = !request.continue_on_error;

    for note in &request.notes {
        let result = import_note(pool, note).await;
        if record(&mut response, result, stop_on_error) {
            return response.finish();
        }
    }

    for roaster in &request.roasters {
        let result = import_roaster(pool, roaster).await;
        if record(&mut response, result, stop_on_error) {
            return response.finish();
        }
    }

    for coffee in &request.coffees {
        let auto_approve = coffee.auto_approve.unwrap_or(request.auto_approve);
        let result = import_coffee(pool, coffee, auto_approve).await;
        if record(&mut response, result, stop_on_error) {
            return response.finish();
        }
    }

    let response = response.finish();
    tracing::info!("Batch import completed: {}", response.message);
    response
}

/// Add a result. Returns true if the batch must stop.
fn record(response: &mut ImportResponse, result: ImportResult, stop_on_error: bool) -> bool {
    let failed = !result.success;
    if failed {
        tracing::warn!(
            "Import of {:?} '{}' failed: {}",
            result.entity_type,
            result.entity_name,
            result.error_message.as_deref().unwrap_or_default()
        );
    }
    response.push(result);
    if failed && stop_on_error {
        tracing::warn!("Stopping batch import after first error");
        return true;
    }
    false
}

pub async fn import_note(pool: &SqlitePool, note: &ImportNote) -> ImportResult {
    if let Err(e) = Validator::validate_note(note) {
        return ImportResult::error(EntityType::Note, &note.name, e.to_string());
    }
    let name = note.name.trim();

    let outcome = async {
        if let Some(existing) = db::find_note_by_name(pool, name).await? {
            return Ok(ImportResult::skipped(EntityType::Note, existing.id, name));
        }
        let id = db::insert_note(pool, note).await?;
        Ok::<_, sqlx::Error>(ImportResult::created(EntityType::Note, id, name))
    }
    .await;

    outcome.unwrap_or_else(|e| {
        ImportResult::error(EntityType::Note, name, format!("Import failed: {}", e))
    })
}

pub async fn import_roaster(pool: &SqlitePool, roaster: &ImportRoaster) -> ImportResult {
    if let Err(e) = Validator::validate_roaster(roaster) {
        return ImportResult::error(EntityType::Roaster, &roaster.name, e.to_string());
    }
    let name = roaster.name.trim();

    let outcome = async {
        if let Some(existing) = db::find_roaster_by_name(pool, name).await? {
            tracing::info!("Roaster already exists with name: {}, skipping", name);
            return Ok(ImportResult::skipped(EntityType::Roaster, existing.id, name));
        }
        let id = db::insert_roaster(pool, roaster, &db::current_timestamp()).await?;
        tracing::info!("Created roaster: {} with ID: {}", name, id);
        Ok::<_, sqlx::Error>(ImportResult::created(EntityType::Roaster, id, name))
    }
    .await;

    outcome.unwrap_or_else(|e| {
        ImportResult::error(EntityType::Roaster, name, format!("Import failed: {}", e))
    })
}

pub async fn import_coffee(
    pool: &SqlitePool,
    coffee: &ImportCoffee,
    auto_approve: bool,
) -> ImportResult {
    if let Err(e) = Validator::validate_coffee(coffee) {
        return ImportResult::error(EntityType::Coffee, &coffee.name, e.to_string());
    }
    let name = coffee.name.trim();

    let outcome = async {
        let roaster = match coffee.roaster_id {
            Some(id) => db::find_roaster_by_id(pool, id).await?,
            None => match coffee.roaster_name.as_deref() {
                Some(roaster_name) => db::find_roaster_by_name(pool, roaster_name.trim()).await?,
                None => None,
            },
        };
        let Some(roaster) = roaster else {
            return Ok(ImportResult::error(
                EntityType::Coffee,
                name,
                "Roaster not found",
            ));
        };

        let mut note_ids = Vec::new();
        for note_name in &coffee.note_names {
            if let Some(note) = db::find_note_by_name(pool, note_name.trim()).await? {
                if !note_ids.contains(&note.id) {
                    note_ids.push(note.id);
                }
            }
        }
        if note_ids.is_empty() {
            return Ok(ImportResult::error(
                EntityType::Coffee,
                name,
                "At least one valid note is required",
            ));
        }

        if let Some(existing) = db::find_coffee_id(pool, name, roaster.id).await? {
            return Ok(ImportResult::skipped(EntityType::Coffee, existing, name));
        }

        let status = if auto_approve {
            CoffeeStatus::Approved
        } else {
            CoffeeStatus::Pending
        };
        let id = db::insert_coffee(
            pool,
            coffee,
            roaster.id,
            &note_ids,
            status,
            &db::current_timestamp(),
        )
        .await?;
        tracing::info!("Created coffee: {} with ID: {}, status: {:?}", name, id, status);
        Ok::<_, sqlx::Error>(ImportResult::created(EntityType::Coffee, id, name))
    }
    .await;

    outcome.unwrap_or_else(|e| {
        ImportResult::error(EntityType::Coffee, name, format!("Import failed: {}", e))
    })
}
