use std::sync::Arc;

use serde_json::{json, Map};
use tracing::{debug, info, instrument, warn};

use folio_core::{from_rows, DataStore, Filter, OrderBy, ProjectImage, Query, PROJECT_IMAGES};

use crate::error::{PortfolioError, PortfolioResult};

/// The images of one project, in display order.
///
/// The collection only changes through [`load`](Self::load): mutations go to
/// the store first and are observed on the reload that follows a success.
/// A failed mutation leaves the collection as it was.
pub struct ImageCollectionManager {
    store: Arc<dyn DataStore>,
    project_id: i64,
    images: Vec<ProjectImage>,
}

impl ImageCollectionManager {
    pub fn new(store: Arc<dyn DataStore>, project_id: i64) -> Self {
        Self {
            store,
            project_id,
            images: Vec::new(),
        }
    }

    /// Display order: `order` ascending, ties by `id` ascending.
    pub fn display_query(project_id: i64) -> Query {
        Query::new()
            .eq("project_id", project_id)
            .order_by(OrderBy::asc("order"))
            .order_by(OrderBy::asc("id"))
    }

    #[instrument(skip(self), fields(project_id = self.project_id))]
    pub async fn load(&mut self) -> PortfolioResult<&[ProjectImage]> {
        let rows = self
            .store
            .select(PROJECT_IMAGES, &Self::display_query(self.project_id))
            .await
            .inspect_err(|e| warn!("Loading images failed: {}", e))?;
        self.images = from_rows(rows)?;
        debug!("Loaded {} image(s)", self.images.len());
        Ok(&self.images)
    }

    #[instrument(skip(self), fields(project_id = self.project_id))]
    pub async fn remove(&mut self, image_id: i64) -> PortfolioResult<()> {
        let removed = self
            .store
            .delete(PROJECT_IMAGES, &self.image_filter(image_id))
            .await
            .inspect_err(|e| warn!("Removing image {} failed: {}", image_id, e))?;
        if removed.is_empty() {
            return Err(self.missing(image_id));
        }

        info!("Removed image {}", image_id);
        self.load().await?;
        Ok(())
    }

    /// Set an image's `order`. Any integer is accepted; duplicates and gaps
    /// are fine.
    #[instrument(skip(self), fields(project_id = self.project_id))]
    pub async fn reorder(&mut self, image_id: i64, new_order: i64) -> PortfolioResult<()> {
        let mut patch = Map::new();
        patch.insert("order".to_string(), json!(new_order));

        let updated = self
            .store
            .update(PROJECT_IMAGES, patch, &self.image_filter(image_id))
            .await
            .inspect_err(|e| warn!("Moving image {} failed: {}", image_id, e))?;
        if updated.is_empty() {
            return Err(self.missing(image_id));
        }

        info!("Moved image {} to order {}", image_id, new_order);
        self.load().await?;
        Ok(())
    }

    pub fn images(&self) -> &[ProjectImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    fn image_filter(&self, image_id: i64) -> Filter {
        Filter::eq("id", image_id).and_eq("project_id", self.project_id)
    }

    fn missing(&self, image_id: i64) -> PortfolioError {
        let err = PortfolioError::not_found(format!(
            "Image {} not found in project {}",
            image_id, self.project_id
        ));
        warn!("{}", err);
        err
    }
}
