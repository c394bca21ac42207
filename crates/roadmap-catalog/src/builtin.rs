//! Embedded relocation catalog

use crate::catalog::Catalog;
use crate::error::CatalogError;

const RELOCATION_TOML: &str = include_str!("../data/relocation.toml");

impl Catalog {
    /// The relocation roadmap shipped with the crate
    ///
    /// # Errors
    /// Only fails if the embedded document is broken, which the tests guard.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(RELOCATION_TOML)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 7);
        assert!(catalog.optional_count() > 0);
        assert!(catalog.mandatory_count() > catalog.optional_count());
    }

    #[test]
    fn builtin_first_task_defaults_active() {
        let catalog = Catalog::builtin().unwrap();
        let first = &catalog.phases()[0].tasks[0];
        assert_eq!(first.default_status, Status::Active);
        assert_eq!(first.links.len(), 1);
    }

    #[test]
    fn builtin_has_phase_led_by_optional_task() {
        let catalog = Catalog::builtin().unwrap();
        let job_search = catalog.phase_index(&"job-search".into()).unwrap();
        assert!(catalog.phases()[job_search].tasks[0].optional);

        let portals = catalog.slot(&"job-portals".into()).unwrap();
        assert_eq!(portals.prev_mandatory, None);
    }
}
