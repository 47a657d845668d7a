use crate::core::export::primary_categories_of;
use crate::core::fields::slugify;
use crate::domain::model::{Category, ConfigState, Service};
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::validate_id_and_label;

/// Owns the single current state and applies operator actions to it.
/// A rejected action leaves the state untouched.
#[derive(Debug, Clone, Default)]
pub struct CatalogEditor {
    state: ConfigState,
}

impl CatalogEditor {
    pub fn new(state: ConfigState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    /// Swaps in a freshly loaded or imported state.
    pub fn replace(&mut self, state: ConfigState) {
        self.state = state;
    }

    pub fn reset(&mut self) {
        self.state = ConfigState::default();
    }

    pub fn primary_categories_of(&self, service: &Service) -> String {
        primary_categories_of(&self.state, service)
    }

    fn has_primary(&self, id: &str) -> bool {
        self.state.primaries.iter().any(|p| p.id == id)
    }

    pub fn add_primary(&mut self, id: &str, label: &str, order: i64) -> Result<Category> {
        let id = slugify(id);
        validate_id_and_label("Primary category", &id, label)?;
        if self.has_primary(&id) {
            return Err(CatalogError::DuplicateIdError {
                kind: "Primary category".to_string(),
                id,
            });
        }

        let category = Category {
            id: id.clone(),
            label: label.trim().to_string(),
            order,
        };
        self.state.primaries.push(category.clone());
        self.state.secondaries_by_primary.entry(id).or_default();
        tracing::info!("Added primary category '{}'", category.id);
        Ok(category)
    }

    /// Removes the primary, its bucket and every service mapping entry for it.
    pub fn delete_primary(&mut self, id: &str) -> Result<()> {
        if !self.has_primary(id) {
            return Err(CatalogError::NotFoundError {
                kind: "Primary category".to_string(),
                id: id.to_string(),
            });
        }

        self.state.primaries.retain(|p| p.id != id);
        self.state.secondaries_by_primary.remove(id);
        for service in &mut self.state.services {
            service.mapping.remove(id);
        }
        tracing::info!("Deleted primary category '{}'", id);
        Ok(())
    }

    pub fn add_secondary(
        &mut self,
        primary_id: &str,
        id: &str,
        label: &str,
        order: i64,
    ) -> Result<Category> {
        if !self.has_primary(primary_id) {
            return Err(CatalogError::NotFoundError {
                kind: "Primary category".to_string(),
                id: primary_id.to_string(),
            });
        }
        let id = slugify(id);
        validate_id_and_label("Secondary category", &id, label)?;

        let bucket = self
            .state
            .secondaries_by_primary
            .entry(primary_id.to_string())
            .or_default();
        if bucket.iter().any(|c| c.id == id) {
            return Err(CatalogError::DuplicateIdError {
                kind: format!("Secondary category under '{}'", primary_id),
                id,
            });
        }

        let category = Category {
            id,
            label: label.trim().to_string(),
            order,
        };
        bucket.push(category.clone());
        tracing::info!("Added secondary category '{}' under '{}'", category.id, primary_id);
        Ok(category)
    }

    /// Removes the secondary and strips it from service tags for that primary.
    pub fn delete_secondary(&mut self, primary_id: &str, id: &str) -> Result<()> {
        let bucket = self
            .state
            .secondaries_by_primary
            .get_mut(primary_id)
            .filter(|bucket| bucket.iter().any(|c| c.id == id))
            .ok_or_else(|| CatalogError::NotFoundError {
                kind: format!("Secondary category under '{}'", primary_id),
                id: id.to_string(),
            })?;
        bucket.retain(|c| c.id != id);

        for service in &mut self.state.services {
            if let Some(mapping) = service.mapping.get_mut(primary_id) {
                mapping.tags.retain(|t| t != id);
            }
        }
        tracing::info!("Deleted secondary category '{}' under '{}'", id, primary_id);
        Ok(())
    }

    /// Inserts or replaces a service. `editing_id` names the service being
    /// edited, which may be saved under a new id.
    pub fn save_service(&mut self, service: Service, editing_id: Option<&str>) -> Result<()> {
        let service = Service {
            service_id: service.service_id.trim().to_string(),
            service_name: service.service_name.trim().to_string(),
            ..service
        };
        if service.service_id.is_empty() || service.service_name.is_empty() {
            return Err(CatalogError::ValidationError {
                message: "service_id and service_name are required".to_string(),
            });
        }

        let id_taken = self
            .state
            .services
            .iter()
            .any(|s| s.service_id == service.service_id);
        if id_taken && editing_id != Some(service.service_id.as_str()) {
            return Err(CatalogError::DuplicateIdError {
                kind: "Service".to_string(),
                id: service.service_id,
            });
        }

        if let Some(old_id) = editing_id.filter(|old| *old != service.service_id) {
            self.state.services.retain(|s| s.service_id != old_id);
        }
        self.state
            .services
            .retain(|s| s.service_id != service.service_id);

        tracing::info!("Saved service '{}'", service.service_id);
        self.state
            .draft
            .set_editing_service_id(Some(&service.service_id));
        self.state.services.push(service);
        Ok(())
    }

    pub fn delete_service(&mut self, id: &str) -> Result<()> {
        let before = self.state.services.len();
        self.state.services.retain(|s| s.service_id != id);
        if self.state.services.len() == before {
            return Err(CatalogError::NotFoundError {
                kind: "Service".to_string(),
                id: id.to_string(),
            });
        }

        if self.state.draft.editing_service_id() == Some(id) {
            self.state.draft.set_editing_service_id(None);
        }
        tracing::info!("Deleted service '{}'", id);
        Ok(())
    }
}
