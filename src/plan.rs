//! Update plan: per-submodule bumps folded into the parent chart's next version

use crate::domain::{
    changed, classify, classify_missing, coarsen, dominant, next_release, sequence, BumpKind, ParentBump,
    PrereleaseIdentifier, SemanticVersion, TrainState,
};
use crate::error::{RelsyncError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Current and target version of one tracked submodule chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityVersionRecord {
    pub name: String,
    pub current_version: Option<SemanticVersion>,
    pub target_version: Option<SemanticVersion>,
}

impl EntityVersionRecord {
    pub fn new(
        name: impl Into<String>,
        current_version: Option<SemanticVersion>,
        target_version: Option<SemanticVersion>,
    ) -> Self {
        EntityVersionRecord {
            name: name.into(),
            current_version,
            target_version,
        }
    }

    /// Build a record from raw version strings, failing on the first invalid one
    pub fn parse(name: impl Into<String>, current: Option<&str>, target: Option<&str>) -> Result<Self> {
        Ok(EntityVersionRecord {
            name: name.into(),
            current_version: current.map(SemanticVersion::parse).transpose()?,
            target_version: target.map(SemanticVersion::parse).transpose()?,
        })
    }

    /// Bump implied by moving this entity from its current to its target version
    pub fn bump(&self) -> BumpKind {
        match (&self.current_version, &self.target_version) {
            (Some(current), Some(target)) => classify(current, target),
            (None, Some(_)) => classify_missing(),
            (_, None) => BumpKind::None,
        }
    }

    /// The version moved but not upward, so [`EntityVersionRecord::bump`] reports nothing
    pub fn is_downgrade(&self) -> bool {
        match (&self.current_version, &self.target_version) {
            (Some(current), Some(target)) => {
                changed(current, target) && classify(current, target) == BumpKind::None
            }
            _ => false,
        }
    }
}

/// Immutable result of one planning pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub entity_bumps: IndexMap<String, BumpKind>,
    pub dominant_bump: BumpKind,
    pub parent_bump: ParentBump,
    pub parent_current: SemanticVersion,
    pub parent_target: SemanticVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train: Option<TrainState>,
}

impl UpdatePlan {
    /// Fold entity bumps into the parent's target version.
    ///
    /// The parent moves by the coarsened dominant bump, then through the
    /// pre-release sequencer when an identifier is given.
    ///
    /// Fails with [`RelsyncError::InvalidVersion`] when the parent cannot be bumped:
    /// the bumped component or the train counter is already `u64::MAX`.
    pub fn build(
        entities: &[EntityVersionRecord],
        parent_current: &SemanticVersion,
        identifier: Option<&PrereleaseIdentifier>,
    ) -> Result<Self> {
        let entity_bumps: IndexMap<String, BumpKind> = entities
            .iter()
            .map(|entity| {
                let bump = entity.bump();
                if entity.is_downgrade() {
                    debug!(entity = %entity.name, "downgrade ignored for the parent bump");
                }
                debug!(
                    entity = %entity.name,
                    current = ?entity.current_version.as_ref().map(ToString::to_string),
                    target = ?entity.target_version.as_ref().map(ToString::to_string),
                    bump = %bump,
                    "classified entity"
                );
                (entity.name.clone(), bump)
            })
            .collect();

        let dominant_bump = dominant(entity_bumps.values().copied());
        let parent_bump = coarsen(dominant_bump);
        let candidate = next_release(parent_current, parent_bump.into())?;
        let sequenced = sequence(parent_current, &candidate, identifier)?;

        debug!(
            dominant = %dominant_bump,
            parent_bump = %parent_bump,
            current = %parent_current,
            candidate = %candidate,
            target = %sequenced.version,
            train = ?sequenced.train,
            "built update plan"
        );

        Ok(UpdatePlan {
            entity_bumps,
            dominant_bump,
            parent_bump,
            parent_current: parent_current.clone(),
            parent_target: sequenced.version,
            train: sequenced.train,
        })
    }

    /// Parse every raw input first, then build. Nothing is planned if any input is invalid.
    ///
    /// `parent_source` only names where the parent version came from, for the
    /// [`RelsyncError::MissingParentVersion`] message.
    pub fn from_strings(
        entities: &[(String, Option<String>, Option<String>)],
        parent_current: Option<&str>,
        parent_source: &Path,
        identifier: Option<&str>,
    ) -> Result<Self> {
        let parent_current = parent_current
            .ok_or_else(|| RelsyncError::MissingParentVersion(parent_source.to_path_buf()))
            .and_then(SemanticVersion::parse)?;
        let identifier = identifier.map(PrereleaseIdentifier::parse).transpose()?;
        let records = entities
            .iter()
            .map(|(name, current, target)| {
                EntityVersionRecord::parse(name.as_str(), current.as_deref(), target.as_deref())
            })
            .collect::<Result<Vec<_>>>()?;

        UpdatePlan::build(&records, &parent_current, identifier.as_ref())
    }

    /// Bump recorded for one entity, absent when it did not move
    pub fn bump_for(&self, name: &str) -> Option<BumpKind> {
        self.entity_bumps.get(name).copied().and_then(BumpKind::as_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn record(name: &str, current: Option<&str>, target: Option<&str>) -> EntityVersionRecord {
        EntityVersionRecord::parse(name, current, target).unwrap()
    }

    fn scenario_a() -> Vec<EntityVersionRecord> {
        vec![
            record("A", Some("1.2.0"), Some("1.3.0")),
            record("B", Some("2.0.0"), Some("2.0.1")),
        ]
    }

    #[test]
    fn test_record_bump_cases() {
        assert_eq!(record("x", Some("1.0.0"), Some("1.0.1")).bump(), BumpKind::Patch);
        assert_eq!(record("x", None, Some("1.0.0")).bump(), BumpKind::Major);
        assert_eq!(record("x", Some("1.0.0"), None).bump(), BumpKind::None);
        assert_eq!(record("x", None, None).bump(), BumpKind::None);
    }

    #[test]
    fn test_record_downgrade() {
        assert!(record("x", Some("1.5.3"), Some("1.4.2")).is_downgrade());
        assert!(!record("x", Some("1.5.0"), Some("1.4.9")).is_downgrade());
        assert!(!record("x", Some("1.0.0"), Some("1.0.0")).is_downgrade());
        assert!(!record("x", None, Some("1.0.0")).is_downgrade());
        assert_eq!(record("x", Some("1.5.3"), Some("1.4.2")).bump(), BumpKind::None);
    }

    #[test]
    fn test_build_fails_when_parent_component_is_at_limit() {
        let entities = vec![record("C", None, Some("1.0.0"))];
        let parent = v(&format!("0.{}.0", u64::MAX));
        let err = UpdatePlan::build(&entities, &parent, None).unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_build_fails_when_train_counter_is_at_limit() {
        let rc = PrereleaseIdentifier::parse("rc").unwrap();
        let parent = v(&format!("0.6.0-rc.{}", u64::MAX));
        let err = UpdatePlan::build(&[], &parent, Some(&rc)).unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_record_parse_rejects_invalid() {
        assert!(EntityVersionRecord::parse("x", Some("1.2"), None).is_err());
        assert!(EntityVersionRecord::parse("x", None, Some("1.02.0")).is_err());
    }

    #[test]
    fn test_scenario_a_stable_release() {
        let plan = UpdatePlan::build(&scenario_a(), &v("0.5.0"), None).unwrap();
        assert_eq!(plan.entity_bumps["A"], BumpKind::Minor);
        assert_eq!(plan.entity_bumps["B"], BumpKind::Patch);
        assert_eq!(plan.dominant_bump, BumpKind::Minor);
        assert_eq!(plan.parent_bump, ParentBump::Minor);
        assert_eq!(plan.parent_target.render(), "0.6.0");
        assert_eq!(plan.train, None);
    }

    #[test]
    fn test_scenario_b_increments_existing_train() {
        let rc = PrereleaseIdentifier::parse("rc").unwrap();
        let plan = UpdatePlan::build(&scenario_a(), &v("0.6.0-rc"), Some(&rc)).unwrap();
        assert_eq!(plan.parent_bump, ParentBump::Minor);
        assert_eq!(plan.parent_target.render(), "0.6.0-rc.1");
        assert_eq!(plan.train, Some(TrainState::IncrementTrain));
    }

    #[test]
    fn test_scenario_c_new_entity_forces_major() {
        let mut entities = scenario_a();
        entities.push(record("C", None, Some("3.0.0")));
        let plan = UpdatePlan::build(&entities, &v("0.5.0"), None).unwrap();
        assert_eq!(plan.entity_bumps["C"], BumpKind::Major);
        assert_eq!(plan.dominant_bump, BumpKind::Major);
        // dampened for the parent
        assert_eq!(plan.parent_bump, ParentBump::Minor);
        assert_eq!(plan.parent_target.render(), "0.6.0");
    }

    #[test]
    fn test_no_entities_still_patches_parent() {
        let plan = UpdatePlan::build(&[], &v("1.4.2"), None).unwrap();
        assert!(plan.entity_bumps.is_empty());
        assert_eq!(plan.dominant_bump, BumpKind::None);
        assert_eq!(plan.parent_bump, ParentBump::Patch);
        assert_eq!(plan.parent_target.render(), "1.4.3");
    }

    #[test]
    fn test_new_train_on_clean_parent() {
        let rc = PrereleaseIdentifier::parse("rc").unwrap();
        let plan = UpdatePlan::build(&scenario_a(), &v("0.5.0"), Some(&rc)).unwrap();
        assert_eq!(plan.parent_target.render(), "0.6.0-rc");
        assert_eq!(plan.train, Some(TrainState::NewTrain));
    }

    #[test]
    fn test_entity_order_preserved() {
        let entities = vec![
            record("zeta", Some("1.0.0"), Some("1.0.0")),
            record("alpha", Some("1.0.0"), Some("1.1.0")),
        ];
        let plan = UpdatePlan::build(&entities, &v("0.1.0"), None).unwrap();
        let names: Vec<&String> = plan.entity_bumps.keys().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(plan.bump_for("zeta"), None);
        assert_eq!(plan.bump_for("alpha"), Some(BumpKind::Minor));
    }

    #[test]
    fn test_from_strings_missing_parent() {
        let err = UpdatePlan::from_strings(&[], None, Path::new("Chart.yaml"), None).unwrap_err();
        assert!(matches!(err, RelsyncError::MissingParentVersion(_)));
    }

    #[test]
    fn test_from_strings_fails_fast_on_invalid_entity() {
        let entities = vec![
            ("A".to_string(), Some("1.0.0".to_string()), Some("1.1.0".to_string())),
            ("B".to_string(), Some("1.0".to_string()), Some("1.1.0".to_string())),
        ];
        let err = UpdatePlan::from_strings(&entities, Some("0.1.0"), Path::new("Chart.yaml"), None)
            .unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_from_strings_rejects_bad_identifier() {
        let err = UpdatePlan::from_strings(&[], Some("0.1.0"), Path::new("Chart.yaml"), Some("r c"))
            .unwrap_err();
        assert!(matches!(err, RelsyncError::InvalidVersion { .. }));
    }

    #[test]
    fn test_plan_serde_round_trip() {
        let plan = UpdatePlan::build(&scenario_a(), &v("0.5.0"), None).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["entity_bumps"]["A"], "minor");
        assert_eq!(json["parent_target"], "0.6.0");
        assert!(json.get("train").is_none());
        let back: UpdatePlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
