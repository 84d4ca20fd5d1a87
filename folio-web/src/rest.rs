use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, patch, put},
    Json, Router,
};
use folio_core::{Category, FolioError, NewProject, Project, ProjectDetail, ProjectImage, ProjectPatch};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors};

use crate::uploads::read_upload_form;
use crate::{FolioAxumError, FolioState};

type ApiResult<T> = Result<Json<T>, FolioAxumError>;

fn map_json_rejection(rejection: JsonRejection) -> FolioAxumError {
    FolioError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

fn map_path_rejection(rejection: PathRejection) -> FolioAxumError {
    FolioError::bad_request(rejection.body_text()).into()
}

fn map_query_rejection(rejection: QueryRejection) -> FolioAxumError {
    FolioError::bad_request(rejection.body_text()).into()
}

fn map_multipart_rejection(rejection: MultipartRejection) -> FolioAxumError {
    FolioError::bad_request(rejection.body_text()).into()
}

/// `{field: [message, ...]}` for every failed rule.
fn validation_errors(errors: &ValidationErrors) -> Value {
    let mut out = Map::new();
    for (field, failures) in errors.field_errors() {
        let messages: Vec<Value> = failures
            .iter()
            .map(|f| {
                let text = f
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| f.code.to_string());
                Value::String(text)
            })
            .collect();
        out.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(out)
}

fn validate<T: Validate>(input: &T, what: &str) -> Result<(), FolioAxumError> {
    input.validate().map_err(|errors| {
        FolioError::unprocessable(format!("{what} validation failed"))
            .with_errors(validation_errors(&errors))
            .into()
    })
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct OrderBody {
    pub order: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub saved: usize,
    pub images: Vec<ProjectImage>,
}

async fn health() -> &'static str {
    "ok"
}

async fn list_projects(
    State(state): State<FolioState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Project>> {
    let Query(params) = params.map_err(map_query_rejection)?;
    let catalog = state.catalog();

    let projects = match params.category.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => catalog.list_by_category(c.parse::<Category>()?).await?,
        _ => catalog.list_all().await?,
    };
    Ok(Json(projects))
}

async fn create_project(
    State(state): State<FolioState>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = body.map_err(map_json_rejection)?;
    let input = input.normalized();
    validate(&input, "Project")?;

    Ok(Json(state.catalog().create(input).await?))
}

async fn get_project(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Project> {
    let Path(id) = id.map_err(map_path_rejection)?;
    Ok(Json(state.catalog().get(id).await?))
}

async fn patch_project(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProjectPatch>, JsonRejection>,
) -> ApiResult<Project> {
    let Path(id) = id.map_err(map_path_rejection)?;
    let Json(patch) = body.map_err(map_json_rejection)?;
    let patch = patch.normalized();
    validate(&patch, "Project")?;

    Ok(Json(state.catalog().update(id, patch).await?))
}

async fn delete_project(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Project> {
    let Path(id) = id.map_err(map_path_rejection)?;
    Ok(Json(state.catalog().delete(id).await?))
}

async fn set_category(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CategoryBody>, JsonRejection>,
) -> ApiResult<Project> {
    let Path(id) = id.map_err(map_path_rejection)?;
    let Json(body) = body.map_err(map_json_rejection)?;
    Ok(Json(state.catalog().set_category(id, body.category).await?))
}

async fn list_slugs(State(state): State<FolioState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.catalog().slugs().await?))
}

async fn project_page(
    State(state): State<FolioState>,
    slug: Result<Path<String>, PathRejection>,
) -> ApiResult<ProjectDetail> {
    let Path(slug) = slug.map_err(map_path_rejection)?;
    Ok(Json(state.catalog().detail(&slug).await?))
}

async fn list_images(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<ProjectImage>> {
    let Path(id) = id.map_err(map_path_rejection)?;
    let mut collection = state.collection(id);
    Ok(Json(collection.load().await?.to_vec()))
}

async fn upload_images(
    State(state): State<FolioState>,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadOutcome> {
    let Path(id) = id.map_err(map_path_rejection)?;
    let multipart = multipart.map_err(map_multipart_rejection)?;

    let project = state.catalog().get(id).await?;
    let form = read_upload_form(multipart, state.blob_config.max_file_bytes).await?;

    let mut collection = state.collection(project.id);
    collection.load().await?;

    let mut uploader = state.uploader();
    form.queue_into(&mut uploader)?;
    let saved = uploader.commit(project.id, collection.len()).await?;

    collection.load().await?;
    Ok(Json(UploadOutcome {
        saved,
        images: collection.images().to_vec(),
    }))
}

async fn reorder_image(
    State(state): State<FolioState>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    body: Result<Json<OrderBody>, JsonRejection>,
) -> ApiResult<Vec<ProjectImage>> {
    let Path((id, image_id)) = ids.map_err(map_path_rejection)?;
    let Json(body) = body.map_err(map_json_rejection)?;

    let mut collection = state.collection(id);
    collection.reorder(image_id, body.order).await?;
    Ok(Json(collection.images().to_vec()))
}

async fn remove_image(
    State(state): State<FolioState>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Vec<ProjectImage>> {
    let Path((id, image_id)) = ids.map_err(map_path_rejection)?;

    let mut collection = state.collection(id);
    collection.remove(image_id).await?;
    Ok(Json(collection.images().to_vec()))
}

/// Admin and public routes over one shared state.
pub fn routes(state: FolioState) -> Router<()> {
    let upload_limit = state.blob_config.max_total_bytes as usize;

    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).patch(patch_project).delete(delete_project),
        )
        .route("/projects/{id}/category", put(set_category))
        .route(
            "/projects/{id}/images",
            get(list_images)
                .post(upload_images)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/projects/{id}/images/{image_id}",
            patch(reorder_image).delete(remove_image),
        )
        .route("/slugs", get(list_slugs))
        .route("/pages/{slug}", get(project_page))
        .with_state(state)
}
