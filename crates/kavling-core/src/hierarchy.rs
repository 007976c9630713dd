//! Site → subsite → zone containment rules.
//!
//! ```text
//! Site ──< Subsite ──< Zone ──< Booking
//!   ▲          ▲          ▲
//!   │          │          └── delete rejected while bookings reference it
//!   │          └── delete rejected while zones reference it
//!   └── delete rejected while subsites reference it
//! ```

use serde::Deserialize;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Booking, Site, Subsite, Zone};
use crate::validation::{non_blank, required};
use crate::Records;

/// Create/update body for a site.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Create/update body for a subsite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubsiteInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub name: String,
}

/// Create/update body for a zone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subsite_id: String,
    #[serde(default)]
    pub name: String,
}

impl SiteInput {
    /// Caller-supplied id, if any.
    pub fn requested_id(&self) -> Option<String> {
        non_blank(Some(&self.id))
    }

    pub fn build(&self, id: String) -> CoreResult<Site> {
        Ok(Site {
            id,
            name: required("name", &self.name)?,
        })
    }
}

impl SubsiteInput {
    pub fn requested_id(&self) -> Option<String> {
        non_blank(Some(&self.id))
    }

    /// Validates the body and that the parent site exists.
    pub fn build(&self, id: String, sites: &Records<Site>) -> CoreResult<Subsite> {
        let name = required("name", &self.name)?;
        let site_id = required("site_id", &self.site_id)?;
        if !sites.contains_key(&site_id) {
            return Err(CoreError::not_found("site", site_id));
        }
        Ok(Subsite { id, site_id, name })
    }
}

impl ZoneInput {
    pub fn requested_id(&self) -> Option<String> {
        non_blank(Some(&self.id))
    }

    /// Validates the body and that the parent subsite exists.
    pub fn build(&self, id: String, subsites: &Records<Subsite>) -> CoreResult<Zone> {
        let name = required("name", &self.name)?;
        let subsite_id = required("subsite_id", &self.subsite_id)?;
        if !subsites.contains_key(&subsite_id) {
            return Err(CoreError::not_found("subsite", subsite_id));
        }
        Ok(Zone {
            id,
            subsite_id,
            name,
        })
    }
}

// =============================================================================
// Delete guards
// =============================================================================

pub fn ensure_site_deletable(site_id: &str, subsites: &Records<Subsite>) -> CoreResult<()> {
    if subsites.values().any(|s| s.site_id == site_id) {
        return Err(CoreError::HasChildren {
            entity: "site",
            children: "subsites",
        });
    }
    Ok(())
}

pub fn ensure_subsite_deletable(subsite_id: &str, zones: &Records<Zone>) -> CoreResult<()> {
    if zones.values().any(|z| z.subsite_id == subsite_id) {
        return Err(CoreError::HasChildren {
            entity: "subsite",
            children: "zones",
        });
    }
    Ok(())
}

pub fn ensure_zone_deletable(zone_id: &str, bookings: &Records<Booking>) -> CoreResult<()> {
    if bookings.values().any(|b| b.zone_id == zone_id) {
        return Err(CoreError::HasChildren {
            entity: "zone",
            children: "bookings",
        });
    }
    Ok(())
}

// =============================================================================
// Containment chain
// =============================================================================

/// Checks that `zone_id` belongs to `subsite_id`, which belongs to `site_id`,
/// and that all three exist.
pub fn check_zone_chain(
    sites: &Records<Site>,
    subsites: &Records<Subsite>,
    zones: &Records<Zone>,
    site_id: &str,
    subsite_id: &str,
    zone_id: &str,
) -> CoreResult<()> {
    let zone = zones
        .get(zone_id)
        .ok_or_else(|| CoreError::not_found("zone", zone_id))?;
    if zone.subsite_id != subsite_id {
        return Err(ValidationError::inconsistent("zone_id", "does not belong to subsite_id").into());
    }

    let subsite = subsites
        .get(subsite_id)
        .ok_or_else(|| CoreError::not_found("subsite", subsite_id))?;
    if subsite.site_id != site_id {
        return Err(ValidationError::inconsistent("subsite_id", "does not belong to site_id").into());
    }

    if !sites.contains_key(site_id) {
        return Err(CoreError::not_found("site", site_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Records<Site>, Records<Subsite>, Records<Zone>) {
        let mut sites = Records::new();
        sites.insert(
            "s1".into(),
            Site {
                id: "s1".into(),
                name: "Griya Asri".into(),
            },
        );
        let mut subsites = Records::new();
        subsites.insert(
            "ss1".into(),
            Subsite {
                id: "ss1".into(),
                site_id: "s1".into(),
                name: "Blok A".into(),
            },
        );
        let mut zones = Records::new();
        zones.insert(
            "z1".into(),
            Zone {
                id: "z1".into(),
                subsite_id: "ss1".into(),
                name: "A-01".into(),
            },
        );
        (sites, subsites, zones)
    }

    #[test]
    fn test_chain_ok() {
        let (s, ss, z) = fixture();
        assert!(check_zone_chain(&s, &ss, &z, "s1", "ss1", "z1").is_ok());
    }

    #[test]
    fn test_chain_missing_zone_is_not_found() {
        let (s, ss, z) = fixture();
        let err = check_zone_chain(&s, &ss, &z, "s1", "ss1", "z9").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "zone", .. }));
    }

    #[test]
    fn test_chain_wrong_parent_is_validation() {
        let (s, ss, z) = fixture();
        let err = check_zone_chain(&s, &ss, &z, "s2", "ss1", "z1").unwrap_err();
        assert_eq!(err.to_string(), "subsite_id does not belong to site_id");
    }

    #[test]
    fn test_subsite_requires_existing_site() {
        let (s, _, _) = fixture();
        let input = SubsiteInput {
            id: String::new(),
            site_id: "nope".into(),
            name: "Blok B".into(),
        };
        assert!(matches!(
            input.build("ss2".into(), &s),
            Err(CoreError::NotFound { entity: "site", .. })
        ));
    }

    #[test]
    fn test_site_name_required() {
        let input = SiteInput {
            id: String::new(),
            name: "  ".into(),
        };
        assert_eq!(
            input.build("s".into()).unwrap_err().to_string(),
            "name is required"
        );
    }

    #[test]
    fn test_delete_guards() {
        let (_, ss, z) = fixture();
        assert_eq!(
            ensure_site_deletable("s1", &ss).unwrap_err().to_string(),
            "cannot delete site with subsites"
        );
        assert!(ensure_site_deletable("s2", &ss).is_ok());
        assert_eq!(
            ensure_subsite_deletable("ss1", &z).unwrap_err().to_string(),
            "cannot delete subsite with zones"
        );
        assert!(ensure_zone_deletable("z1", &Records::new()).is_ok());
    }
}
