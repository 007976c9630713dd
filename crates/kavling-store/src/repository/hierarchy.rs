//! # Hierarchy Repository
//!
//! Sites, subsites and zones. Creates and updates lock the child collection
//! plus its parent (to check the parent exists); deletes lock the collection
//! plus its children (to check nothing references it).
//!
//! | Operation        | Locks                |
//! |------------------|----------------------|
//! | site create/upd  | sites                |
//! | site delete      | sites, subsites      |
//! | subsite create   | sites, subsites      |
//! | subsite delete   | subsites, zones      |
//! | zone create/upd  | subsites, zones      |
//! | zone delete      | zones, bookings      |

use chrono::Utc;
use kavling_core::hierarchy::{
    ensure_site_deletable, ensure_subsite_deletable, ensure_zone_deletable, SiteInput, SubsiteInput, ZoneInput,
};
use kavling_core::{Booking, CoreResult, Site, Subsite, Zone};
use serde::Serialize;
use tracing::info;

use crate::capability::{ReadStore, WriteStore};
use crate::error::StoreResult;
use crate::ids;
use crate::names::CollectionName::{self, Bookings, Sites, Subsites, Zones};
use crate::store::Snapshot;

/// Result of a delete. Deleting a missing id is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug)]
pub struct HierarchyRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: ReadStore> HierarchyRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        HierarchyRepository { store }
    }

    pub fn sites(&self) -> StoreResult<Vec<Site>> {
        Ok(self.store.snapshot()?.records::<Site>().into_values().collect())
    }

    /// Subsites, optionally only those of `site_id`.
    pub fn subsites(&self, site_id: Option<&str>) -> StoreResult<Vec<Subsite>> {
        Ok(self
            .store
            .snapshot()?
            .records::<Subsite>()
            .into_values()
            .filter(|s| site_id.map_or(true, |id| s.site_id == id))
            .collect())
    }

    /// Zones, optionally only those of `subsite_id`.
    pub fn zones(&self, subsite_id: Option<&str>) -> StoreResult<Vec<Zone>> {
        Ok(self
            .store
            .snapshot()?
            .records::<Zone>()
            .into_values()
            .filter(|z| subsite_id.map_or(true, |id| z.subsite_id == id))
            .collect())
    }
}

impl<S: WriteStore> HierarchyRepository<'_, S> {
    // =========================================================================
    // Sites
    // =========================================================================

    pub fn create_site(&self, input: &SiteInput) -> StoreResult<Site> {
        let now = Utc::now();
        let session = self.store.begin(&[Sites])?;
        let sites = session.working_copy(Sites)?;
        let id = ids::resolve_id(input.requested_id(), ids::SITE, &sites, "site", now)?;
        let site = input.build(id)?;

        let write = session.with_record(&site)?;
        session.commit(vec![write], now)?;
        info!(site_id = %site.id, "Site created");
        Ok(site)
    }

    pub fn update_site(&self, id: &str, input: &SiteInput) -> StoreResult<Site> {
        let now = Utc::now();
        let session = self.store.begin(&[Sites])?;
        session.snapshot().require::<Site>(id)?;
        let site = input.build(id.to_string())?;

        let write = session.with_record(&site)?;
        session.commit(vec![write], now)?;
        info!(site_id = %site.id, "Site updated");
        Ok(site)
    }

    pub fn delete_site(&self, id: &str) -> StoreResult<Deleted> {
        self.delete(id, &[Sites, Subsites], Sites, |snap| {
            ensure_site_deletable(id, &snap.records::<Subsite>())
        })
    }

    // =========================================================================
    // Subsites
    // =========================================================================

    pub fn create_subsite(&self, input: &SubsiteInput) -> StoreResult<Subsite> {
        let now = Utc::now();
        let session = self.store.begin(&[Sites, Subsites])?;
        let subsites = session.working_copy(Subsites)?;
        let id = ids::resolve_id(input.requested_id(), ids::SUBSITE, &subsites, "subsite", now)?;
        let subsite = input.build(id, &session.snapshot().records::<Site>())?;

        let write = session.with_record(&subsite)?;
        session.commit(vec![write], now)?;
        info!(subsite_id = %subsite.id, site_id = %subsite.site_id, "Subsite created");
        Ok(subsite)
    }

    pub fn update_subsite(&self, id: &str, input: &SubsiteInput) -> StoreResult<Subsite> {
        let now = Utc::now();
        let session = self.store.begin(&[Sites, Subsites])?;
        session.snapshot().require::<Subsite>(id)?;
        let subsite = input.build(id.to_string(), &session.snapshot().records::<Site>())?;

        let write = session.with_record(&subsite)?;
        session.commit(vec![write], now)?;
        info!(subsite_id = %subsite.id, "Subsite updated");
        Ok(subsite)
    }

    pub fn delete_subsite(&self, id: &str) -> StoreResult<Deleted> {
        self.delete(id, &[Subsites, Zones], Subsites, |snap| {
            ensure_subsite_deletable(id, &snap.records::<Zone>())
        })
    }

    // =========================================================================
    // Zones
    // =========================================================================

    pub fn create_zone(&self, input: &ZoneInput) -> StoreResult<Zone> {
        let now = Utc::now();
        let session = self.store.begin(&[Subsites, Zones])?;
        let zones = session.working_copy(Zones)?;
        let id = ids::resolve_id(input.requested_id(), ids::ZONE, &zones, "zone", now)?;
        let zone = input.build(id, &session.snapshot().records::<Subsite>())?;

        let write = session.with_record(&zone)?;
        session.commit(vec![write], now)?;
        info!(zone_id = %zone.id, subsite_id = %zone.subsite_id, "Zone created");
        Ok(zone)
    }

    pub fn update_zone(&self, id: &str, input: &ZoneInput) -> StoreResult<Zone> {
        let now = Utc::now();
        let session = self.store.begin(&[Subsites, Zones])?;
        session.snapshot().require::<Zone>(id)?;
        let zone = input.build(id.to_string(), &session.snapshot().records::<Subsite>())?;

        let write = session.with_record(&zone)?;
        session.commit(vec![write], now)?;
        info!(zone_id = %zone.id, "Zone updated");
        Ok(zone)
    }

    pub fn delete_zone(&self, id: &str) -> StoreResult<Deleted> {
        self.delete(id, &[Zones, Bookings], Zones, |snap| {
            ensure_zone_deletable(id, &snap.records::<Booking>())
        })
    }

    fn delete<F>(&self, id: &str, locks: &[CollectionName], target: CollectionName, check: F) -> StoreResult<Deleted>
    where
        F: FnOnce(&Snapshot) -> CoreResult<()>,
    {
        let session = self.store.begin(locks)?;
        let mut collection = session.working_copy(target)?;
        if !collection.contains(id) {
            return Ok(Deleted {
                id: id.to_string(),
                deleted: false,
            });
        }
        check(session.snapshot())?;

        collection.remove(id);
        session.commit(vec![(target, collection)], Utc::now())?;
        info!(collection = %target, id = %id, "Record deleted");
        Ok(Deleted {
            id: id.to_string(),
            deleted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{confirmed_booking, hierarchy, store};
    use crate::repository::Repositories;
    use crate::StoreError;
    use kavling_core::{CoreError, ErrorKind};

    #[test]
    fn test_create_requires_existing_parent() {
        let (_dir, store) = store();
        let err = store
            .hierarchy()
            .create_subsite(&SubsiteInput {
                id: String::new(),
                site_id: "site_x".into(),
                name: "Blok A".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = store.hierarchy().create_site(&SiteInput::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_generated_and_duplicate_ids() {
        let (_dir, store) = store();
        let site = store
            .hierarchy()
            .create_site(&SiteInput {
                id: String::new(),
                name: "  Griya  ".into(),
            })
            .unwrap();
        assert!(site.id.starts_with("site_"));
        assert_eq!(site.name, "Griya");

        let dup = store.hierarchy().create_site(&SiteInput {
            id: site.id.clone(),
            name: "Other".into(),
        });
        assert!(matches!(dup, Err(StoreError::Core(CoreError::AlreadyExists { .. }))));
    }

    #[test]
    fn test_filters_and_update() {
        let (_dir, store) = store();
        hierarchy(&store);
        let h = store.hierarchy();
        assert_eq!(h.subsites(Some("site_1")).unwrap().len(), 1);
        assert!(h.subsites(Some("site_2")).unwrap().is_empty());
        assert_eq!(h.zones(None).unwrap().len(), 1);

        let zone = h
            .update_zone(
                "zone_1",
                &ZoneInput {
                    id: "ignored".into(),
                    subsite_id: "subsite_1".into(),
                    name: "Kavling A1 (sudut)".into(),
                },
            )
            .unwrap();
        assert_eq!(zone.id, "zone_1");
        assert_eq!(h.zones(Some("subsite_1")).unwrap()[0].name, "Kavling A1 (sudut)");

        let missing = h.update_site(
            "site_9",
            &SiteInput {
                id: String::new(),
                name: "x".into(),
            },
        );
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_rules() {
        let (_dir, store) = store();
        hierarchy(&store);
        confirmed_booking(&store, "bk_1");
        let h = store.hierarchy();

        for err in [
            h.delete_site("site_1").unwrap_err(),
            h.delete_subsite("subsite_1").unwrap_err(),
            h.delete_zone("zone_1").unwrap_err(),
        ] {
            assert!(matches!(err, StoreError::Core(CoreError::HasChildren { .. })));
        }

        assert_eq!(
            h.delete_zone("zone_9").unwrap(),
            Deleted {
                id: "zone_9".into(),
                deleted: false
            }
        );

        h.create_zone(&ZoneInput {
            id: "zone_2".into(),
            subsite_id: "subsite_1".into(),
            name: "Kavling A2".into(),
        })
        .unwrap();
        assert!(h.delete_zone("zone_2").unwrap().deleted);
        assert_eq!(h.zones(None).unwrap().len(), 1);
    }
}
