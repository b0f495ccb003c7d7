use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::CatalogLoader;
use crate::domain::{CatalogId, CatalogItem, SortOption};
use crate::error::GuideError;
use crate::presenter::Presenter;
use crate::store::FoundStore;

pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub sort: Option<SortOption>,
    pub hide_found: bool,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub catalog: String,
    pub total: usize,
    pub found: usize,
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResult {
    pub catalog: String,
    pub item: CatalogItem,
}

pub struct App<S: FoundStore + 'static> {
    loader: CatalogLoader,
    store: Arc<S>,
}

impl<S: FoundStore + 'static> App<S> {
    pub fn new(loader: CatalogLoader, store: Arc<S>) -> Self {
        Self { loader, store }
    }

    pub fn presenter(&self, catalog: CatalogId) -> Presenter<S> {
        Presenter::new(catalog, self.loader.clone(), Arc::clone(&self.store))
    }

    pub fn list(&self, catalog: CatalogId, options: ListOptions) -> Result<ListResult, GuideError> {
        let mut presenter = self.load(catalog)?;
        let total = presenter.items().len();
        let found = presenter.items().iter().filter(|item| item.found).count();

        if let Some(key) = options.sort {
            let current = presenter.items().to_vec();
            presenter.sort(&current, key);
        }
        if options.hide_found {
            let current = presenter.items().to_vec();
            presenter.filter(&current, true);
        }
        let items: Vec<CatalogItem> = match options.search.as_deref() {
            Some(term) => presenter
                .search(presenter.items(), term)
                .into_iter()
                .cloned()
                .collect(),
            None => presenter.items().to_vec(),
        };

        Ok(ListResult {
            catalog: presenter.catalog().to_string(),
            total,
            found,
            items,
        })
    }

    pub fn toggle(&self, catalog: CatalogId, name: &str) -> Result<ToggleResult, GuideError> {
        let mut presenter = self.load(catalog)?;
        let needle = name.trim().to_lowercase();
        let mut item = presenter
            .items()
            .iter()
            .find(|item| item.name.to_lowercase() == needle)
            .cloned()
            .ok_or_else(|| GuideError::ItemNotFound {
                catalog: presenter.catalog().to_string(),
                name: name.to_string(),
            })?;
        presenter.toggle_found(&mut item);
        Ok(ToggleResult {
            catalog: presenter.catalog().to_string(),
            item,
        })
    }

    fn load(&self, catalog: CatalogId) -> Result<Presenter<S>, GuideError> {
        let mut presenter = self.presenter(catalog);
        presenter.load();
        presenter.wait(LOAD_TIMEOUT)?;
        Ok(presenter)
    }
}
