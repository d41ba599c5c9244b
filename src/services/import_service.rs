use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        ImportJobStatus, Role,
        listing::{self, ListingDraft, ValidListing},
        parse_enum,
    },
    dto::import_jobs::{ImportJobDetail, ImportJobList, RowError, UploadImportRequest},
    entity::import_jobs::{
        ActiveModel as JobActive, Column as JobCol, Entity as ImportJobs, Model as JobModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin, ensure_role},
    models::ImportJob,
    response::{ApiResponse, Meta},
    services::car_service::new_car,
    state::AppState,
};

pub const MAX_IMPORT_ROWS: usize = 5000;
const PREVIEW_ROWS: usize = 20;

/// Outcome of validating every row of a sheet.
#[derive(Debug, Default)]
pub struct RowCheck {
    pub valid: Vec<(ListingDraft, ValidListing)>,
    pub errors: Vec<RowError>,
}

pub fn check_rows(rows: &[ListingDraft], current_year: i32) -> RowCheck {
    let mut check = RowCheck::default();
    for (idx, row) in rows.iter().enumerate() {
        match listing::validate(row, current_year) {
            Ok(valid) => check.valid.push((row.clone(), valid)),
            Err(errors) => check.errors.push(RowError {
                row: idx + 1,
                errors,
            }),
        }
    }
    check
}

fn stored_rows(job: &JobModel) -> AppResult<Vec<ListingDraft>> {
    serde_json::from_value(job.rows.clone())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("unreadable import rows: {e}")))
}

async fn find_job(state: &AppState, id: Uuid) -> AppResult<JobModel> {
    ImportJobs::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn advance(job: JobModel, next: ImportJobStatus) -> AppResult<JobActive> {
    let current = parse_enum::<ImportJobStatus>(&job.status, "import status")?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Import job is {current}, cannot move to {next}"
        )));
    }
    let mut active: JobActive = job.into();
    active.status = Set(next.to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active)
}

/// Moves the job from the status it was read with to `next` only if no one
/// else moved it first, so a transition runs at most once.
async fn claim(state: &AppState, job: JobModel, next: ImportJobStatus) -> AppResult<JobModel> {
    let current = parse_enum::<ImportJobStatus>(&job.status, "import status")?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Import job is {current}, cannot move to {next}"
        )));
    }
    let updated = ImportJobs::update_many()
        .col_expr(JobCol::Status, Expr::value(next.to_string()))
        .col_expr(JobCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(JobCol::Id.eq(job.id))
        .filter(JobCol::Status.eq(current.to_string()))
        .exec(&state.orm)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Import job is no longer {current}"
        )));
    }
    find_job(state, job.id).await
}

async fn mark_failed(state: &AppState, id: Uuid, message: String) {
    let result = async {
        let job = find_job(state, id).await?;
        let mut active = advance(job, ImportJobStatus::Failed)?;
        active.error_message = Set(Some(message));
        active.update(&state.orm).await?;
        AppResult::Ok(())
    }
    .await;
    if let Err(err) = result {
        tracing::warn!(job_id = %id, error = %err, "could not mark import job failed");
    }
}

pub async fn upload(
    state: &AppState,
    user: &AuthUser,
    payload: UploadImportRequest,
) -> AppResult<ApiResponse<ImportJob>> {
    ensure_role(user, Role::Yard)?;
    let file_name = payload.file_name.trim().to_string();
    if file_name.is_empty() {
        return Err(AppError::BadRequest("File name is required".into()));
    }
    if payload.rows.len() > MAX_IMPORT_ROWS {
        return Err(AppError::BadRequest(format!(
            "A sheet may hold at most {MAX_IMPORT_ROWS} rows"
        )));
    }

    let rows = serde_json::to_value(&payload.rows)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    let job = JobActive {
        id: Set(Uuid::new_v4()),
        yard_id: Set(user.user_id),
        file_name: Set(file_name),
        status: Set(ImportJobStatus::Uploaded.to_string()),
        rows: Set(rows),
        row_errors: Set(None),
        total_rows: Set(payload.rows.len() as i32),
        valid_rows: Set(0),
        invalid_rows: Set(0),
        error_message: Set(None),
        committed_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "import_upload",
        "import_jobs",
        serde_json::json!({ "job_id": job.id, "rows": job.total_rows }),
    )
    .await;

    // The client polls the job until the preview is ready.
    let background = state.clone();
    let job_id = job.id;
    tokio::spawn(async move {
        if let Err(err) = process(&background, job_id).await {
            tracing::warn!(job_id = %job_id, error = %err, "import processing failed");
        }
    });

    Ok(ApiResponse::success("Import uploaded", ImportJob::from(job), Some(Meta::empty())))
}

/// UPLOADED -> PROCESSING -> PREVIEW_READY, or FAILED.
pub async fn process(state: &AppState, id: Uuid) -> AppResult<ImportJob> {
    let job = find_job(state, id).await?;
    let job = claim(state, job, ImportJobStatus::Processing).await?;
    tracing::debug!(job_id = %id, "processing import");

    let rows = match stored_rows(&job) {
        Ok(rows) => rows,
        Err(err) => {
            mark_failed(state, id, err.to_string()).await;
            return Err(err);
        }
    };
    if rows.is_empty() {
        mark_failed(state, id, "The file has no rows".to_string()).await;
        return find_job(state, id).await.map(ImportJob::from);
    }

    let check = check_rows(&rows, Utc::now().year());
    let result = async {
        let row_errors = serde_json::to_value(&check.errors)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
        let mut active = advance(job, ImportJobStatus::PreviewReady)?;
        active.valid_rows = Set(check.valid.len() as i32);
        active.invalid_rows = Set(check.errors.len() as i32);
        active.row_errors = Set(Some(row_errors));
        Ok::<_, AppError>(active.update(&state.orm).await?)
    }
    .await;

    match result {
        Ok(job) => {
            tracing::info!(
                job_id = %id,
                valid = job.valid_rows,
                invalid = job.invalid_rows,
                "import preview ready"
            );
            Ok(ImportJob::from(job))
        }
        Err(err) => {
            mark_failed(state, id, err.to_string()).await;
            Err(err)
        }
    }
}

pub async fn get_job(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ImportJobDetail>> {
    let job = find_job(state, id).await?;
    ensure_owner_or_admin(user, job.yard_id)?;

    let status = parse_enum::<ImportJobStatus>(&job.status, "import status")?;
    let preview = if status == ImportJobStatus::PreviewReady {
        check_rows(&stored_rows(&job)?, Utc::now().year())
            .valid
            .into_iter()
            .take(PREVIEW_ROWS)
            .map(|(draft, _)| draft)
            .collect()
    } else {
        Vec::new()
    };

    Ok(ApiResponse::success(
        "Import job",
        ImportJobDetail {
            job: ImportJob::from(job),
            preview,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_jobs(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ImportJobList>> {
    ensure_role(user, Role::Yard)?;
    let items: Vec<ImportJob> = ImportJobs::find()
        .filter(JobCol::YardId.eq(user.user_id))
        .order_by_desc(JobCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ImportJob::from)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Import jobs", ImportJobList { items }, Some(meta)))
}

/// PREVIEW_READY -> COMMITTING -> COMMITTED; valid rows become listings in one transaction.
pub async fn commit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ImportJob>> {
    let job = find_job(state, id).await?;
    ensure_owner_or_admin(user, job.yard_id)?;
    if job.valid_rows == 0
        && parse_enum::<ImportJobStatus>(&job.status, "import status")?
            == ImportJobStatus::PreviewReady
    {
        return Err(AppError::Conflict("Import has no valid rows to commit".into()));
    }

    let yard_id = job.yard_id;
    let rows = stored_rows(&job)?;
    let job = claim(state, job, ImportJobStatus::Committing).await?;

    let check = check_rows(&rows, Utc::now().year());
    let committed = async {
        let txn = state.orm.begin().await?;
        for (_, valid) in check.valid {
            new_car(yard_id, valid).insert(&txn).await?;
        }
        let mut active = advance(job, ImportJobStatus::Committed)?;
        active.committed_at = Set(Some(Utc::now().into()));
        let job = active.update(&txn).await?;
        txn.commit().await?;
        Ok::<_, AppError>(job)
    }
    .await;

    let job = match committed {
        Ok(job) => job,
        Err(err) => {
            mark_failed(state, id, err.to_string()).await;
            return Err(err);
        }
    };

    audit::record(
        &state.pool,
        user.user_id,
        "import_commit",
        "import_jobs",
        serde_json::json!({ "job_id": job.id, "cars": job.valid_rows }),
    )
    .await;

    Ok(ApiResponse::success("Import committed", ImportJob::from(job), Some(Meta::empty())))
}
