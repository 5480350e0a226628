//! Relation field policy.
//!
//! Maps a module and a relation type to the upstream fields that are shown
//! and required. Lookups are pure; an unmapped pair is an error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use super::PolicyError;
use crate::types::{FieldName, HierarchyError, MemberModule, RelationType};

/// Fields rendered and required for one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldSet {
    pub required: Vec<FieldName>,
    /// Always a superset of `required`
    pub visible: Vec<FieldName>,
}

impl FieldSet {
    pub fn requires(&self, field: FieldName) -> bool {
        self.required.contains(&field)
    }

    pub fn is_visible(&self, field: FieldName) -> bool {
        self.visible.contains(&field)
    }

    /// Whether at least one complete ministry block is required.
    pub fn requires_ministries(&self) -> bool {
        self.requires(FieldName::TheirMinistries)
    }

    /// Required single-record upstream fields.
    pub fn required_leaders(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.required.iter().copied().filter(FieldName::is_leader)
    }

    /// Visible single-record upstream fields.
    pub fn visible_leaders(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.visible.iter().copied().filter(FieldName::is_leader)
    }
}

/// One row of the relation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPolicyEntry {
    pub module: MemberModule,
    pub relation_type: RelationType,
    pub required: Vec<FieldName>,
    /// Read-only context fields shown next to the required ones
    #[serde(default)]
    pub also_visible: Vec<FieldName>,
}

impl RelationPolicyEntry {
    fn field_set(&self) -> FieldSet {
        let mut visible = self.required.clone();
        for field in &self.also_visible {
            if !visible.contains(field) {
                visible.push(*field);
            }
        }
        FieldSet {
            required: self.required.clone(),
            visible,
        }
    }
}

/// The module × relation type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPolicy {
    entries: Vec<RelationPolicyEntry>,
}

impl RelationPolicy {
    /// Build a table from rows, validating it.
    pub fn new(entries: Vec<RelationPolicyEntry>) -> Result<Self, PolicyError> {
        let policy = Self { entries };
        policy.validate()?;
        Ok(policy)
    }

    /// Load a table from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, HierarchyError> {
        let policy: Self = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_yaml(&self) -> Result<String, HierarchyError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Fields shown and required for `module` under `relation_type`.
    pub fn fields_for(
        &self,
        module: MemberModule,
        relation_type: RelationType,
    ) -> Result<FieldSet, PolicyError> {
        self.entry(module, relation_type)
            .map(RelationPolicyEntry::field_set)
            .ok_or(PolicyError::Unmapped {
                module,
                relation_type,
            })
    }

    pub fn is_mapped(&self, module: MemberModule, relation_type: RelationType) -> bool {
        self.entry(module, relation_type).is_some()
    }

    /// Relation types a module may select, in declaration order.
    pub fn relation_types_for(&self, module: MemberModule) -> Vec<RelationType> {
        RelationType::ALL
            .into_iter()
            .filter(|rt| self.is_mapped(module, *rt))
            .collect()
    }

    /// The leader field a record hangs under for one relation.
    ///
    /// Changing it moves every descendant of the record. `None` when the
    /// relation requires ministries only.
    pub fn upstream_field_for(
        &self,
        module: MemberModule,
        relation_type: RelationType,
    ) -> Result<Option<FieldName>, PolicyError> {
        Ok(self
            .fields_for(module, relation_type)?
            .required_leaders()
            .next())
    }

    fn entry(
        &self,
        module: MemberModule,
        relation_type: RelationType,
    ) -> Option<&RelationPolicyEntry> {
        self.entries
            .iter()
            .find(|e| e.module == module && e.relation_type == relation_type)
    }

    pub(crate) fn validate(&self) -> Result<(), PolicyError> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert((entry.module, entry.relation_type)) {
                return Err(PolicyError::InvalidTable(format!(
                    "duplicate row for {} with {}",
                    entry.module, entry.relation_type
                )));
            }
            if entry.required.is_empty() {
                return Err(PolicyError::InvalidTable(format!(
                    "{} with {} requires no field",
                    entry.module, entry.relation_type
                )));
            }
            if entry.relation_type.is_ministry_bearing()
                != entry.required.contains(&FieldName::TheirMinistries)
            {
                return Err(PolicyError::InvalidTable(format!(
                    "{} with {} disagrees with the relation type on ministries",
                    entry.module, entry.relation_type
                )));
            }
        }
        Ok(())
    }
}

impl Default for RelationPolicy {
    fn default() -> Self {
        use FieldName::*;
        use MemberModule as M;
        use RelationType::*;

        let row = |module, relation_type, required: &[FieldName], also_visible: &[FieldName]| {
            RelationPolicyEntry {
                module,
                relation_type,
                required: required.to_vec(),
                also_visible: also_visible.to_vec(),
            }
        };

        let mut entries = vec![
            row(M::Pastor, OnlyRelatedHierarchicalCover, &[TheirChurch], &[]),
            row(M::Pastor, OnlyRelatedMinistries, &[TheirMinistries], &[]),
            row(
                M::Pastor,
                RelatedBothMinistriesAndHierarchicalCover,
                &[TheirChurch, TheirMinistries],
                &[],
            ),
        ];

        // Copastor, supervisor, preacher and disciple differ only in the tier above them.
        for (module, upstream) in [
            (M::Copastor, TheirPastor),
            (M::Supervisor, TheirCopastor),
            (M::Preacher, TheirSupervisor),
            (M::Disciple, TheirFamilyGroup),
        ] {
            entries.push(row(module, OnlyRelatedHierarchicalCover, &[upstream], &[]));
            entries.push(row(
                module,
                OnlyRelatedMinistries,
                &[TheirPastorOnlyMinistries, TheirMinistries],
                &[],
            ));
            entries.push(row(
                module,
                RelatedBothMinistriesAndHierarchicalCover,
                &[upstream, TheirMinistries],
                &[],
            ));
        }

        entries.push(row(
            M::Supervisor,
            RelatedDirectToPastor,
            &[TheirPastorRelationDirect],
            &[],
        ));
        entries.push(row(
            M::FamilyGroup,
            OnlyRelatedHierarchicalCover,
            &[TheirPreacher],
            &[TheirSupervisor],
        ));
        entries.push(row(
            M::Zone,
            OnlyRelatedHierarchicalCover,
            &[TheirSupervisor],
            &[TheirCopastor],
        ));

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FieldName::*;
    use MemberModule as M;
    use RelationType::*;

    #[test]
    fn test_default_table_is_valid() {
        assert!(RelationPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_table_rows() {
        use RelationType::{
            OnlyRelatedHierarchicalCover as Cover, OnlyRelatedMinistries as Ministries,
            RelatedBothMinistriesAndHierarchicalCover as Both, RelatedDirectToPastor as Direct,
        };

        let policy = RelationPolicy::default();
        let cases: Vec<(MemberModule, RelationType, Option<Vec<FieldName>>)> = vec![
            (M::Pastor, Cover, Some(vec![TheirChurch])),
            (M::Pastor, Ministries, Some(vec![TheirMinistries])),
            (M::Pastor, Both, Some(vec![TheirChurch, TheirMinistries])),
            (M::Pastor, Direct, None),
            (M::Copastor, Cover, Some(vec![TheirPastor])),
            (M::Copastor, Ministries, Some(vec![TheirPastorOnlyMinistries, TheirMinistries])),
            (M::Copastor, Both, Some(vec![TheirPastor, TheirMinistries])),
            (M::Copastor, Direct, None),
            (M::Supervisor, Cover, Some(vec![TheirCopastor])),
            (M::Supervisor, Ministries, Some(vec![TheirPastorOnlyMinistries, TheirMinistries])),
            (M::Supervisor, Both, Some(vec![TheirCopastor, TheirMinistries])),
            (M::Supervisor, Direct, Some(vec![TheirPastorRelationDirect])),
            (M::Preacher, Cover, Some(vec![TheirSupervisor])),
            (M::Preacher, Ministries, Some(vec![TheirPastorOnlyMinistries, TheirMinistries])),
            (M::Preacher, Both, Some(vec![TheirSupervisor, TheirMinistries])),
            (M::Preacher, Direct, None),
            (M::Disciple, Cover, Some(vec![TheirFamilyGroup])),
            (M::Disciple, Ministries, Some(vec![TheirPastorOnlyMinistries, TheirMinistries])),
            (M::Disciple, Both, Some(vec![TheirFamilyGroup, TheirMinistries])),
            (M::Disciple, Direct, None),
            (M::FamilyGroup, Cover, Some(vec![TheirPreacher])),
            (M::FamilyGroup, Ministries, None),
            (M::FamilyGroup, Both, None),
            (M::FamilyGroup, Direct, None),
            (M::Zone, Cover, Some(vec![TheirSupervisor])),
            (M::Zone, Ministries, None),
            (M::Zone, Both, None),
            (M::Zone, Direct, None),
        ];

        for (module, relation_type, expected) in cases {
            let result = policy.fields_for(module, relation_type);
            match expected {
                Some(required) => {
                    let fields = result.unwrap();
                    assert!(!fields.required.is_empty());
                    assert_eq!(fields.required, required, "{module} / {relation_type}");
                    assert!(fields.required.iter().all(|f| fields.is_visible(*f)));
                    assert_eq!(fields.requires_ministries(), relation_type.is_ministry_bearing());
                }
                None => assert_eq!(
                    result.unwrap_err(),
                    PolicyError::Unmapped { module, relation_type }
                ),
            }
        }
    }

    #[test]
    fn test_zone_shows_copastor_context() {
        let fields = RelationPolicy::default()
            .fields_for(M::Zone, OnlyRelatedHierarchicalCover)
            .unwrap();
        assert_eq!(fields.visible, vec![TheirSupervisor, TheirCopastor]);
        assert!(!fields.requires(TheirCopastor));
    }

    #[test]
    fn test_upstream_field_follows_relation() {
        let policy = RelationPolicy::default();
        let field = |module, relation_type| policy.upstream_field_for(module, relation_type);

        assert_eq!(field(M::Preacher, OnlyRelatedHierarchicalCover), Ok(Some(TheirSupervisor)));
        assert_eq!(field(M::Zone, OnlyRelatedHierarchicalCover), Ok(Some(TheirSupervisor)));
        assert_eq!(field(M::FamilyGroup, OnlyRelatedHierarchicalCover), Ok(Some(TheirPreacher)));
        assert_eq!(field(M::Pastor, OnlyRelatedHierarchicalCover), Ok(Some(TheirChurch)));
        assert_eq!(
            field(M::Supervisor, RelatedDirectToPastor),
            Ok(Some(TheirPastorRelationDirect))
        );
        assert_eq!(
            field(M::Disciple, OnlyRelatedMinistries),
            Ok(Some(TheirPastorOnlyMinistries))
        );
        assert_eq!(field(M::Pastor, OnlyRelatedMinistries), Ok(None));
        assert!(field(M::Zone, RelatedDirectToPastor).is_err());
    }

    #[test]
    fn test_relation_types_for_supervisor() {
        let types = RelationPolicy::default().relation_types_for(M::Supervisor);
        assert_eq!(types.len(), 4);
        assert_eq!(
            RelationPolicy::default().relation_types_for(M::Zone),
            vec![OnlyRelatedHierarchicalCover]
        );
    }

    #[test]
    fn test_yaml_roundtrip() {
        let policy = RelationPolicy::default();
        let yaml = policy.to_yaml().unwrap();
        let parsed = RelationPolicy::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, policy);
    }

    #[test]
    fn test_rejects_ministry_mismatch() {
        let result = RelationPolicy::new(vec![RelationPolicyEntry {
            module: M::Preacher,
            relation_type: OnlyRelatedMinistries,
            required: vec![TheirPastorOnlyMinistries],
            also_visible: vec![],
        }]);
        assert!(matches!(result, Err(PolicyError::InvalidTable(_))));
    }

    #[test]
    fn test_rejects_duplicate_rows() {
        let row = RelationPolicyEntry {
            module: M::Zone,
            relation_type: OnlyRelatedHierarchicalCover,
            required: vec![TheirSupervisor],
            also_visible: vec![],
        };
        let result = RelationPolicy::new(vec![row.clone(), row]);
        assert!(matches!(result, Err(PolicyError::InvalidTable(_))));
    }
}
