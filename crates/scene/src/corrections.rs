use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static data-cleaning rules for known defects in the boundary data.
///
/// - `region_aliases`: misspelled region names mapped to the canonical
///   spelling. Applied to state names and to district parent names.
/// - `district_parents`: districts whose real parent differs from the one
///   recorded in the raw data.
///
/// The defaults cover the defects known in the shipped Northeast India
/// datasets. Further corrections belong in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameCorrections {
    pub region_aliases: BTreeMap<String, String>,
    pub district_parents: BTreeMap<String, String>,
}

impl Default for NameCorrections {
    fn default() -> Self {
        Self {
            region_aliases: BTreeMap::from([(
                "Arunanchal Pradesh".to_string(),
                "Arunachal Pradesh".to_string(),
            )]),
            district_parents: BTreeMap::from([("Dima Hasao".to_string(), "Assam".to_string())]),
        }
    }
}

impl NameCorrections {
    pub fn none() -> Self {
        Self {
            region_aliases: BTreeMap::new(),
            district_parents: BTreeMap::new(),
        }
    }

    pub fn canonical_region<'a>(&'a self, name: &'a str) -> &'a str {
        self.region_aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Corrected parent region of `district`.
    pub fn district_parent(&self, district: &str, raw_parent: Option<&str>) -> Option<String> {
        if let Some(parent) = self.district_parents.get(district) {
            return Some(parent.clone());
        }
        raw_parent.map(|p| self.canonical_region(p).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::NameCorrections;

    #[test]
    fn aliases_fix_known_misspelling() {
        let c = NameCorrections::default();
        assert_eq!(c.canonical_region("Arunanchal Pradesh"), "Arunachal Pradesh");
        assert_eq!(c.canonical_region("Assam"), "Assam");
    }

    #[test]
    fn reparent_overrides_raw_parent() {
        let c = NameCorrections::default();
        assert_eq!(
            c.district_parent("Dima Hasao", Some("Nagaland")).as_deref(),
            Some("Assam")
        );
        assert_eq!(
            c.district_parent("Tawang", Some("Arunanchal Pradesh")).as_deref(),
            Some("Arunachal Pradesh")
        );
        assert_eq!(c.district_parent("Tawang", None), None);
    }

    #[test]
    fn none_is_identity() {
        let c = NameCorrections::none();
        assert_eq!(c.canonical_region("Arunanchal Pradesh"), "Arunanchal Pradesh");
        assert_eq!(
            c.district_parent("Dima Hasao", Some("Nagaland")).as_deref(),
            Some("Nagaland")
        );
    }
}
