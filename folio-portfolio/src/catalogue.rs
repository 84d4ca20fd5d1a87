//! Project CRUD over the Data Store, plus the public page lookups.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use folio_core::{
    from_row, from_rows, to_row, Category, DataStore, Filter, NewProject, OrderBy, Project,
    ProjectDetail, ProjectPatch, Query, Row, PROJECTS,
};

use crate::collection::ImageCollectionManager;
use crate::error::{PortfolioError, PortfolioResult};

#[derive(Clone)]
pub struct ProjectCatalog {
    store: Arc<dyn DataStore>,
}

impl ProjectCatalog {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Admin list, newest first.
    pub async fn list_all(&self) -> PortfolioResult<Vec<Project>> {
        let query = Query::new()
            .order_by(OrderBy::desc("created_at"))
            .order_by(OrderBy::desc("id"));
        self.find(query).await
    }

    /// Public listing for one category, highest id first.
    pub async fn list_by_category(&self, category: Category) -> PortfolioResult<Vec<Project>> {
        let query = Query::new()
            .eq("category", category.as_str())
            .order_by(OrderBy::desc("id"));
        self.find(query).await
    }

    pub async fn get(&self, id: i64) -> PortfolioResult<Project> {
        self.find_one(Query::new().eq("id", id), || format!("Project not found: {id}"))
            .await
    }

    pub async fn get_by_slug(&self, slug: &str) -> PortfolioResult<Project> {
        self.find_one(Query::new().eq("slug", slug), || {
            format!("Project not found: {slug}")
        })
        .await
    }

    /// Detail page: the project and its images in display order.
    pub async fn detail(&self, slug: &str) -> PortfolioResult<ProjectDetail> {
        let project = self.get_by_slug(slug).await?;
        let mut gallery = ImageCollectionManager::new(self.store.clone(), project.id);
        let images = gallery.load().await?.to_vec();
        Ok(ProjectDetail { project, images })
    }

    /// Every slug, for pre-rendering the detail pages.
    pub async fn slugs(&self) -> PortfolioResult<Vec<String>> {
        let rows = self
            .store
            .select(PROJECTS, &Query::new().order_by(OrderBy::asc("id")))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("slug").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: NewProject) -> PortfolioResult<Project> {
        let row = to_row(&input.normalized())?;
        let created = self.store.insert(PROJECTS, vec![row]).await?;
        let project: Project = first(created, || "Project insert returned no row".to_string())?;
        info!("Created project {}", project.id);
        Ok(project)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: ProjectPatch) -> PortfolioResult<Project> {
        let patch = patch.normalized();
        if patch.is_empty() {
            return self.get(id).await;
        }

        let mut row: Row = to_row(&patch)?;
        if patch.clears_cover() {
            row.insert("image_url".to_string(), Value::Null);
        }

        let updated = self.store.update(PROJECTS, row, &Filter::eq("id", id)).await?;
        let project: Project = first(updated, || format!("Project not found: {id}"))?;
        info!("Updated project {}", id);
        Ok(project)
    }

    pub async fn set_category(&self, id: i64, category: Category) -> PortfolioResult<Project> {
        self.update(id, ProjectPatch::category(category)).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> PortfolioResult<Project> {
        let removed = self.store.delete(PROJECTS, &Filter::eq("id", id)).await?;
        let project: Project = first(removed, || format!("Project not found: {id}"))?;
        info!("Deleted project {}", id);
        Ok(project)
    }

    async fn find(&self, query: Query) -> PortfolioResult<Vec<Project>> {
        let rows = self.store.select(PROJECTS, &query).await?;
        Ok(from_rows(rows)?)
    }

    async fn find_one<F>(&self, query: Query, missing: F) -> PortfolioResult<Project>
    where
        F: FnOnce() -> String,
    {
        let rows = self.store.select(PROJECTS, &query).await?;
        first(rows, missing)
    }
}

fn first<F>(rows: Vec<Row>, missing: F) -> PortfolioResult<Project>
where
    F: FnOnce() -> String,
{
    match rows.into_iter().next() {
        Some(row) => Ok(from_row(row)?),
        None => Err(PortfolioError::not_found(missing())),
    }
}
