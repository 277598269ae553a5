//! Permission-set filter.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::FilterError;
use crate::manifest::Manifest;

/// Manifest fields holding permission name arrays.
const PERMISSION_FIELDS: &[&str] = &["permissions", "optional_permissions"];

/// Keeps extensions whose declared permissions satisfy any of several groups.
///
/// Each group is given as a comma-separated list and matches when every
/// permission in it is declared (AND). The filter matches when any group
/// matches (OR): `["a,b", "c"]` means `(a AND b) OR c`. Required and optional
/// permissions count alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionFilter {
    groups: Vec<Vec<String>>,
}

impl PermissionFilter {
    pub const KIND: &'static str = "permissions";

    /// Parses comma-separated permission groups.
    pub fn new<S: AsRef<str>>(groups: &[S]) -> Result<Self, FilterError> {
        if groups.is_empty() {
            return Err(FilterError::NoPermissionGroups);
        }

        let groups = groups
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                let group: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if group.is_empty() {
                    Err(FilterError::EmptyPermissionGroup {
                        group: raw.to_string(),
                    })
                } else {
                    Ok(group)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { groups })
    }

    /// Checks the manifest's declared permissions against the groups.
    pub fn matches(&self, manifest: &Manifest) -> bool {
        let arrays: Vec<&Vec<Value>> = PERMISSION_FIELDS
            .iter()
            .filter_map(|field| manifest.get(*field).and_then(Value::as_array))
            .collect();
        if arrays.is_empty() {
            return false;
        }

        let declared: HashSet<&str> = arrays
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        self.groups
            .iter()
            .any(|group| group.iter().all(|name| declared.contains(name.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(value: Value) -> Manifest {
        match value {
            Value::Object(map) => map,
            other => panic!("test manifest must be an object, got {other}"),
        }
    }

    #[test]
    fn test_new_splits_and_trims_groups() {
        let filter = PermissionFilter::new(&["tabs, webRequest ,", "storage"]).unwrap();
        assert_eq!(
            filter.groups,
            vec![
                vec!["tabs".to_string(), "webRequest".to_string()],
                vec!["storage".to_string()]
            ]
        );
    }

    #[test]
    fn test_new_rejects_no_groups() {
        let groups: [&str; 0] = [];
        assert!(matches!(
            PermissionFilter::new(&groups),
            Err(FilterError::NoPermissionGroups)
        ));
    }

    #[test]
    fn test_new_rejects_empty_group() {
        match PermissionFilter::new(&["tabs", " , "]) {
            Err(FilterError::EmptyPermissionGroup { group }) => assert_eq!(group, " , "),
            other => panic!("expected EmptyPermissionGroup, got {other:?}"),
        }
    }

    #[test]
    fn test_any_group_satisfied() {
        let filter = PermissionFilter::new(&["webRequest,webRequestBlocking", "tabs"]).unwrap();
        let m = manifest(json!({"permissions": ["tabs", "webRequest"]}));
        assert!(filter.matches(&m));
    }

    #[test]
    fn test_group_requires_all_members() {
        let filter = PermissionFilter::new(&["webRequest,webRequestBlocking"]).unwrap();
        let m = manifest(json!({"permissions": ["tabs", "webRequest"]}));
        assert!(!filter.matches(&m));
    }

    #[test]
    fn test_optional_permissions_only() {
        let filter = PermissionFilter::new(&["tabs"]).unwrap();
        let m = manifest(json!({"optional_permissions": ["tabs"]}));
        assert!(filter.matches(&m));
    }

    #[test]
    fn test_group_spans_required_and_optional() {
        let filter = PermissionFilter::new(&["tabs,cookies"]).unwrap();
        let m = manifest(json!({
            "permissions": ["tabs"],
            "optional_permissions": ["cookies"]
        }));
        assert!(filter.matches(&m));
    }

    #[test]
    fn test_no_permission_arrays() {
        let filter = PermissionFilter::new(&["tabs"]).unwrap();
        assert!(!filter.matches(&manifest(json!({"name": "x"}))));
        assert!(!filter.matches(&manifest(json!({"permissions": "tabs"}))));
        assert!(!filter.matches(&manifest(json!({"permissions": {"tabs": true}}))));
    }

    #[test]
    fn test_non_string_entries_ignored() {
        let filter = PermissionFilter::new(&["tabs"]).unwrap();
        let m = manifest(json!({"permissions": [1, null, {"tabs": 1}, "tabs"]}));
        assert!(filter.matches(&m));

        let m = manifest(json!({"permissions": [1, null, ["tabs"]]}));
        assert!(!filter.matches(&m));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let filter = PermissionFilter::new(&["Tabs"]).unwrap();
        assert!(!filter.matches(&manifest(json!({"permissions": ["tabs"]}))));
    }
}
