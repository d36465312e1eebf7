//! Workflow templates.
//!
//! A template is an ordered list of stages. Each stage either names its
//! approver directly or branches on a field of the submitted form data.
//!
//! Templates arrive in the wire shape of the document API (`TemplateDraft`
//! and `StageDraft`, with a `hasCondition` flag and optional fields) and are
//! validated into `WorkflowTemplate`, where every stage carries exactly one
//! routing rule. `Stage` serializes back into the draft shape and
//! deserializes through the same validation, so a stored template can never
//! hold an unroutable stage.

use crate::error::{StageError, TemplateError};
use chrono::{DateTime, Utc};
use docflow_core::{CommitteeId, RoleId, TemplateId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who approves a stage, as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproverType {
    /// One user holding a role, chosen by the workload balancer.
    SinglePerson,
    /// Every member of a committee plus its chairperson.
    Committee,
}

impl fmt::Display for ApproverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePerson => write!(f, "SinglePerson"),
            Self::Committee => write!(f, "Committee"),
        }
    }
}

/// Raw approver reference; exactly one field must match the approver type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproverSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee_id: Option<CommitteeId>,
}

/// A validated approver rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverRule {
    /// Pick the least-loaded user holding `role_id`.
    SinglePerson { role_id: RoleId },
    /// Assign the committee as a unit.
    Committee { committee_id: CommitteeId },
}

impl ApproverRule {
    /// Validates a type/spec pair.
    ///
    /// # Errors
    ///
    /// Returns `ApproverSpecMismatch` if the approver spec does not name exactly the
    /// reference the type requires.
    pub fn from_parts(kind: ApproverType, spec: ApproverSpec) -> Result<Self, StageError> {
        match (kind, spec.role_id, spec.committee_id) {
            (ApproverType::SinglePerson, Some(role_id), None) => Ok(Self::SinglePerson { role_id }),
            (ApproverType::Committee, None, Some(committee_id)) => {
                Ok(Self::Committee { committee_id })
            }
            (ApproverType::SinglePerson, _, _) => Err(StageError::ApproverSpecMismatch {
                details: "SinglePerson requires roleId only".to_string(),
            }),
            (ApproverType::Committee, _, _) => Err(StageError::ApproverSpecMismatch {
                details: "Committee requires committeeId only".to_string(),
            }),
        }
    }

    /// Returns the wire approver type.
    #[must_use]
    pub fn approver_type(&self) -> ApproverType {
        match self {
            Self::SinglePerson { .. } => ApproverType::SinglePerson,
            Self::Committee { .. } => ApproverType::Committee,
        }
    }

    /// Returns the wire approver spec.
    #[must_use]
    pub fn spec(&self) -> ApproverSpec {
        match *self {
            Self::SinglePerson { role_id } => ApproverSpec {
                role_id: Some(role_id),
                committee_id: None,
            },
            Self::Committee { committee_id } => ApproverSpec {
                role_id: None,
                committee_id: Some(committee_id),
            },
        }
    }
}

/// Numeric comparison used by condition variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

impl Operator {
    /// Evaluates `lhs <op> rhs`.
    #[must_use]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::GreaterThan => lhs > rhs,
            Self::LessThan => lhs < rhs,
            Self::AtLeast => lhs >= rhs,
            Self::AtMost => lhs <= rhs,
        }
    }
}

/// One branch of a conditional stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionVariant {
    pub condition_name: String,
    pub operator: Operator,
    pub value: f64,
    pub approver: ApproverRule,
}

/// How a stage finds its approver.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRouting {
    /// The approver is fixed.
    Direct(ApproverRule),
    /// The approver depends on the submitted value of `condition`.
    Conditional {
        condition: String,
        variants: Vec<ConditionVariant>,
    },
}

/// A validated template stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StageDraft", try_from = "StageDraft")]
pub struct Stage {
    pub stage_title: String,
    pub routing: StageRouting,
}

impl Stage {
    /// Creates a stage with a fixed approver.
    #[must_use]
    pub fn direct(title: impl Into<String>, approver: ApproverRule) -> Self {
        Self {
            stage_title: title.into(),
            routing: StageRouting::Direct(approver),
        }
    }

    /// Creates a stage that branches on `condition`.
    #[must_use]
    pub fn conditional(
        title: impl Into<String>,
        condition: impl Into<String>,
        variants: Vec<ConditionVariant>,
    ) -> Self {
        Self {
            stage_title: title.into(),
            routing: StageRouting::Conditional {
                condition: condition.into(),
                variants,
            },
        }
    }
}

/// Wire shape of a condition variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDraft {
    #[serde(default)]
    pub condition_name: String,
    pub operator: Operator,
    pub value: f64,
    pub approver_type: ApproverType,
    #[serde(default)]
    pub approver_spec: ApproverSpec,
}

/// Wire shape of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDraft {
    pub stage_title: String,
    #[serde(default)]
    pub has_condition: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition_variants: Vec<VariantDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_type: Option<ApproverType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_spec: Option<ApproverSpec>,
}

impl TryFrom<StageDraft> for Stage {
    type Error = StageError;

    fn try_from(draft: StageDraft) -> Result<Self, Self::Error> {
        let title = draft.stage_title.trim();
        if title.is_empty() {
            return Err(StageError::BlankTitle);
        }

        let has_direct = draft.approver_type.is_some() || draft.approver_spec.is_some();
        let has_condition_fields = draft.condition.is_some() || !draft.condition_variants.is_empty();

        if !draft.has_condition {
            if has_condition_fields {
                return Err(StageError::ConditionFieldsWithoutFlag);
            }
            let (Some(kind), Some(spec)) = (draft.approver_type, draft.approver_spec) else {
                return Err(StageError::MissingApprover);
            };
            return Ok(Stage::direct(title, ApproverRule::from_parts(kind, spec)?));
        }

        if has_direct {
            return Err(StageError::DirectApproverWithCondition);
        }
        let condition = match draft.condition.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => return Err(StageError::MissingCondition),
        };
        if draft.condition_variants.is_empty() {
            return Err(StageError::NoConditionVariants);
        }

        let variants = draft
            .condition_variants
            .into_iter()
            .enumerate()
            .map(|(variant_index, v)| {
                if !v.value.is_finite() {
                    return Err(StageError::NonFiniteValue { variant_index });
                }
                Ok(ConditionVariant {
                    condition_name: v.condition_name,
                    operator: v.operator,
                    value: v.value,
                    approver: ApproverRule::from_parts(v.approver_type, v.approver_spec)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Stage::conditional(title, condition, variants))
    }
}

impl From<Stage> for StageDraft {
    fn from(stage: Stage) -> Self {
        match stage.routing {
            StageRouting::Direct(rule) => StageDraft {
                stage_title: stage.stage_title,
                has_condition: false,
                condition: None,
                condition_variants: Vec::new(),
                approver_type: Some(rule.approver_type()),
                approver_spec: Some(rule.spec()),
            },
            StageRouting::Conditional {
                condition,
                variants,
            } => StageDraft {
                stage_title: stage.stage_title,
                has_condition: true,
                condition: Some(condition),
                condition_variants: variants
                    .into_iter()
                    .map(|v| VariantDraft {
                        condition_name: v.condition_name,
                        operator: v.operator,
                        value: v.value,
                        approver_type: v.approver.approver_type(),
                        approver_spec: v.approver.spec(),
                    })
                    .collect(),
                approver_type: None,
                approver_spec: None,
            },
        }
    }
}

/// Wire shape of a template submitted for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stages: Vec<StageDraft>,
}

/// A validated workflow template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: Option<String>,
    pub stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// Validates a draft into a template with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, naming the offending stage.
    pub fn from_draft(draft: TemplateDraft) -> Result<Self, TemplateError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(TemplateError::BlankName);
        }
        if draft.stages.is_empty() {
            return Err(TemplateError::NoStages);
        }

        let stages = draft
            .stages
            .into_iter()
            .enumerate()
            .map(|(stage_index, s)| {
                Stage::try_from(s).map_err(|reason| TemplateError::InvalidStage {
                    stage_index,
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        Ok(Self {
            id: TemplateId::new(),
            name: name.to_string(),
            description: draft.description,
            stages,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds a template directly from validated stages.
    #[must_use]
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Self {
        let now = Utc::now();
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: None,
            stages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn role_stage(title: &str, role: RoleId) -> serde_json::Value {
        json!({
            "stageTitle": title,
            "hasCondition": false,
            "approverType": "SinglePerson",
            "approverSpec": { "roleId": role.to_string() }
        })
    }

    #[test]
    fn operators_compare_numbers() {
        assert!(Operator::GreaterThan.holds(2.0, 1.0));
        assert!(!Operator::GreaterThan.holds(1.0, 1.0));
        assert!(Operator::AtLeast.holds(1.0, 1.0));
        assert!(Operator::LessThan.holds(0.5, 1.0));
        assert!(Operator::AtMost.holds(1.0, 1.0));
        assert!(!Operator::AtMost.holds(f64::NAN, 1.0));
    }

    #[test]
    fn operator_wire_names() {
        let op: Operator = serde_json::from_str("\">=\"").expect("deserialize");
        assert_eq!(op, Operator::AtLeast);
        assert_eq!(serde_json::to_string(&Operator::LessThan).expect("serialize"), "\"<\"");
    }

    #[test]
    fn direct_stage_from_draft() {
        let role = RoleId::new();
        let draft: StageDraft =
            serde_json::from_value(role_stage("Manager review", role)).expect("draft");
        let stage = Stage::try_from(draft).expect("valid");
        assert_eq!(stage.stage_title, "Manager review");
        assert_eq!(
            stage.routing,
            StageRouting::Direct(ApproverRule::SinglePerson { role_id: role })
        );
    }

    #[test]
    fn conditional_stage_from_draft() {
        let role = RoleId::new();
        let committee = CommitteeId::new();
        let draft: StageDraft = serde_json::from_value(json!({
            "stageTitle": "Budget",
            "hasCondition": true,
            "condition": "amount",
            "conditionVariants": [
                { "conditionName": "large", "operator": ">=", "value": 10000,
                  "approverType": "Committee", "approverSpec": { "committeeId": committee.to_string() } },
                { "conditionName": "small", "operator": "<", "value": 10000,
                  "approverType": "SinglePerson", "approverSpec": { "roleId": role.to_string() } }
            ]
        }))
        .expect("draft");
        let stage = Stage::try_from(draft).expect("valid");
        let StageRouting::Conditional { condition, variants } = &stage.routing else {
            panic!("expected conditional routing");
        };
        assert_eq!(condition, "amount");
        assert_eq!(variants.len(), 2);
        assert_eq!(
            variants[0].approver,
            ApproverRule::Committee {
                committee_id: committee
            }
        );
    }

    #[test]
    fn condition_fields_without_flag_rejected() {
        let role = RoleId::new();
        let mut value = role_stage("Review", role);
        value["condition"] = json!("amount");
        let draft: StageDraft = serde_json::from_value(value).expect("draft");
        assert_eq!(
            Stage::try_from(draft),
            Err(StageError::ConditionFieldsWithoutFlag)
        );
    }

    #[test]
    fn direct_approver_with_flag_rejected() {
        let role = RoleId::new();
        let mut value = role_stage("Review", role);
        value["hasCondition"] = json!(true);
        value["condition"] = json!("amount");
        let draft: StageDraft = serde_json::from_value(value).expect("draft");
        assert_eq!(
            Stage::try_from(draft),
            Err(StageError::DirectApproverWithCondition)
        );
    }

    #[test]
    fn missing_approver_rejected() {
        let draft: StageDraft =
            serde_json::from_value(json!({ "stageTitle": "Review" })).expect("draft");
        assert_eq!(Stage::try_from(draft), Err(StageError::MissingApprover));
    }

    #[test]
    fn conditional_without_variants_rejected() {
        let draft: StageDraft = serde_json::from_value(json!({
            "stageTitle": "Review", "hasCondition": true, "condition": "amount"
        }))
        .expect("draft");
        assert_eq!(Stage::try_from(draft), Err(StageError::NoConditionVariants));
    }

    #[test]
    fn spec_must_match_type() {
        let committee = CommitteeId::new();
        let draft: StageDraft = serde_json::from_value(json!({
            "stageTitle": "Review",
            "approverType": "SinglePerson",
            "approverSpec": { "committeeId": committee.to_string() }
        }))
        .expect("draft");
        assert!(matches!(
            Stage::try_from(draft),
            Err(StageError::ApproverSpecMismatch { .. })
        ));
    }

    #[test]
    fn unknown_approver_type_fails_to_parse() {
        let result: Result<StageDraft, _> = serde_json::from_value(json!({
            "stageTitle": "Review", "approverType": "Anybody"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn template_requires_name_and_stages() {
        let draft = TemplateDraft {
            name: "  ".to_string(),
            description: None,
            stages: Vec::new(),
        };
        assert_eq!(
            WorkflowTemplate::from_draft(draft),
            Err(TemplateError::BlankName)
        );

        let draft = TemplateDraft {
            name: "Purchase".to_string(),
            description: None,
            stages: Vec::new(),
        };
        assert_eq!(
            WorkflowTemplate::from_draft(draft),
            Err(TemplateError::NoStages)
        );
    }

    #[test]
    fn template_reports_failing_stage_index() {
        let role = RoleId::new();
        let draft: TemplateDraft = serde_json::from_value(json!({
            "name": "Purchase",
            "stages": [role_stage("One", role), { "stageTitle": "" }]
        }))
        .expect("draft");
        assert_eq!(
            WorkflowTemplate::from_draft(draft),
            Err(TemplateError::InvalidStage {
                stage_index: 1,
                reason: StageError::BlankTitle
            })
        );
    }

    #[test]
    fn stored_template_keeps_wire_shape() {
        let role = RoleId::new();
        let template = WorkflowTemplate::new(
            "Purchase",
            vec![Stage::direct(
                "Review",
                ApproverRule::SinglePerson { role_id: role },
            )],
        );
        let json = serde_json::to_value(&template).expect("serialize");
        assert_eq!(json["stages"][0]["stageTitle"], "Review");
        assert_eq!(json["stages"][0]["hasCondition"], false);
        assert_eq!(json["stages"][0]["approverType"], "SinglePerson");

        let parsed: WorkflowTemplate = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, template);
    }
}
