//! Per-artifact content policies.
//!
//! Each [`ArtifactPolicy`] owns an ordered list of [`PolicyRule`]s. Evaluation
//! first checks existence; rules only ever see the text of a present
//! artifact.

use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, ArtifactKind, ArtifactState};
use crate::config::GateConfig;
use crate::error::Result;
use crate::report::{RuleKind, Violation};
use crate::scanner::{self, ReferencePattern, DEFAULT_TRUSTED_DOMAIN};

/// A single content rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyRule {
    /// Every label must occur somewhere in the text.
    RequiredSections { labels: Vec<String> },

    /// At least `minimum` links to the pattern's domain.
    MinReferences {
        domain: ReferencePattern,
        minimum: usize,
    },

    /// Every phrase must occur; one violation per missing phrase.
    RequiredKeywords { phrases: Vec<String> },

    /// Every stage name must occur, in any order.
    RequiredStages { stages: Vec<String> },
}

/// Policy for one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPolicy {
    pub kind: ArtifactKind,
    pub path: String,
    pub rules: Vec<PolicyRule>,
}

impl ArtifactPolicy {
    /// Sections, trusted references, and provenance keywords.
    ///
    /// Fails only when the trusted domain cannot be compiled into a matcher.
    pub fn research(config: &GateConfig) -> Result<Self> {
        Ok(Self {
            kind: ArtifactKind::Research,
            path: config.paths.research.clone(),
            rules: vec![
                PolicyRule::RequiredSections {
                    labels: config.research_sections.clone(),
                },
                PolicyRule::MinReferences {
                    domain: ReferencePattern::new(&config.trusted_domain)?,
                    minimum: config.min_references,
                },
                PolicyRule::RequiredKeywords {
                    phrases: config.research_keywords.clone(),
                },
            ],
        })
    }

    pub fn security(config: &GateConfig) -> Self {
        Self {
            kind: ArtifactKind::Security,
            path: config.paths.security.clone(),
            rules: vec![PolicyRule::RequiredSections {
                labels: config.security_sections.clone(),
            }],
        }
    }

    pub fn pipeline(config: &GateConfig) -> Self {
        Self {
            kind: ArtifactKind::Pipeline,
            path: config.paths.pipeline.clone(),
            rules: vec![PolicyRule::RequiredStages {
                stages: config.pipeline_stages.clone(),
            }],
        }
    }

    /// All three policies in evaluation order.
    pub fn all(config: &GateConfig) -> Result<Vec<Self>> {
        Ok(vec![
            Self::research(config)?,
            Self::security(config),
            Self::pipeline(config),
        ])
    }

    /// Check one artifact.
    ///
    /// A required, absent artifact yields exactly one missing-file violation.
    /// A present artifact is held to every rule whether required or not.
    pub fn evaluate(&self, required: bool, artifact: &Artifact) -> Vec<Violation> {
        match &artifact.state {
            ArtifactState::Absent if required => vec![self.missing_file()],
            ArtifactState::Absent => Vec::new(),
            ArtifactState::Present(text) => self
                .rules
                .iter()
                .flat_map(|rule| self.check(rule, text))
                .collect(),
        }
    }

    fn missing_file(&self) -> Violation {
        let message = match self.kind {
            ArtifactKind::Pipeline => format!("Missing orchestration contract: {}", self.path),
            _ => format!("Missing required file: {}", self.path),
        };
        Violation::new(self.kind, RuleKind::MissingFile, message)
    }

    fn check(&self, rule: &PolicyRule, text: &str) -> Vec<Violation> {
        match rule {
            PolicyRule::RequiredSections { labels } => {
                let missing = scanner::missing_sections(text, labels);
                if missing.is_empty() {
                    return Vec::new();
                }
                vec![Violation::new(
                    self.kind,
                    RuleKind::MissingSections,
                    format!(
                        "{} file is missing required sections: {}",
                        self.label(),
                        missing.join(", ")
                    ),
                )]
            }
            PolicyRule::MinReferences { domain, minimum } => {
                let count = domain.count(text);
                if count >= *minimum {
                    return Vec::new();
                }
                vec![Violation::new(
                    self.kind,
                    RuleKind::InsufficientReferences,
                    format!(
                        "{} file has only {} {} references; expected at least {}.",
                        self.label(),
                        count,
                        domain_label(domain.domain()),
                        minimum
                    ),
                )]
            }
            PolicyRule::RequiredKeywords { phrases } => scanner::missing_keywords(text, phrases)
                .into_iter()
                .map(|phrase| {
                    Violation::new(
                        self.kind,
                        RuleKind::MissingKeyword,
                        format!("{} references should include '{}'.", self.label(), phrase),
                    )
                })
                .collect(),
            PolicyRule::RequiredStages { stages } => scanner::missing_sections(text, stages)
                .into_iter()
                .map(|stage| {
                    Violation::new(
                        self.kind,
                        RuleKind::MissingStage,
                        format!(
                            "Pipeline contract should include stage '{}' in {}.",
                            stage, self.path
                        ),
                    )
                })
                .collect(),
        }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            ArtifactKind::Research => "Research",
            ArtifactKind::Security => "Security",
            ArtifactKind::Pipeline => "Pipeline",
        }
    }
}

fn domain_label(domain: &str) -> &str {
    if domain.eq_ignore_ascii_case(DEFAULT_TRUSTED_DOMAIN) {
        "Microsoft Learn"
    } else {
        domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn references(n: usize) -> String {
        (0..n)
            .map(|i| format!("- https://learn.microsoft.com/azure/topic-{i}\n"))
            .collect()
    }

    fn compliant_research() -> String {
        format!(
            "## Assumptions\n## Known gotchas\n## Open questions\n## References\n\
             Source URL, Access date, Confidence\n{}",
            references(6)
        )
    }

    fn research_artifact(text: &str) -> Artifact {
        Artifact::present(
            ArtifactKind::Research,
            "artifacts/research/research.md",
            text,
        )
    }

    #[test]
    fn test_compliant_research_passes() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        assert!(policy
            .evaluate(true, &research_artifact(&compliant_research()))
            .is_empty());
    }

    #[test]
    fn test_missing_open_questions_is_single_violation() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let text = compliant_research().replace("## Open questions\n", "");

        assert_eq!(
            scanner::missing_sections(&text, &GateConfig::default().research_sections),
            vec!["## Open questions"]
        );

        let violations = policy.evaluate(true, &research_artifact(&text));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleKind::MissingSections);
        assert_eq!(
            violations[0].message,
            "Research file is missing required sections: ## Open questions"
        );
    }

    #[test]
    fn test_absent_required_is_one_missing_file() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let artifact = Artifact::absent(ArtifactKind::Research, "artifacts/research/research.md");

        let violations = policy.evaluate(true, &artifact);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleKind::MissingFile);
        assert_eq!(
            violations[0].message,
            "Missing required file: artifacts/research/research.md"
        );
    }

    #[test]
    fn test_absent_optional_is_silent() {
        for policy in ArtifactPolicy::all(&GateConfig::default()).unwrap() {
            let artifact = Artifact::absent(policy.kind, policy.path.clone());
            assert!(policy.evaluate(false, &artifact).is_empty());
        }
    }

    #[test]
    fn test_present_optional_is_still_checked() {
        let policy = ArtifactPolicy::security(&GateConfig::default());
        let artifact = Artifact::present(
            ArtifactKind::Security,
            "artifacts/security/securityassessment.md",
            "## Threat model summary\n## References\n",
        );
        let violations = policy.evaluate(false, &artifact);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Security file is missing required sections: ## Risk register, ## Residual risks"
        );
    }

    #[test]
    fn test_reference_shortfall_states_count() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let text = compliant_research().replace(&references(6), &references(4));

        let violations = policy.evaluate(true, &research_artifact(&text));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, RuleKind::InsufficientReferences);
        assert_eq!(
            violations[0].message,
            "Research file has only 4 Microsoft Learn references; expected at least 5."
        );
    }

    #[test]
    fn test_each_missing_keyword_is_named() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let text = compliant_research().replace("Source URL, Access date, Confidence", "");

        let messages: Vec<String> = policy
            .evaluate(true, &research_artifact(&text))
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Research references should include 'Source URL'.",
                "Research references should include 'Access date'.",
                "Research references should include 'Confidence'.",
            ]
        );
    }

    #[test]
    fn test_empty_research_reports_every_rule() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let violations = policy.evaluate(true, &research_artifact(""));
        let rules: Vec<RuleKind> = violations.iter().map(|v| v.rule).collect();
        assert_eq!(
            rules,
            vec![
                RuleKind::MissingSections,
                RuleKind::InsufficientReferences,
                RuleKind::MissingKeyword,
                RuleKind::MissingKeyword,
                RuleKind::MissingKeyword,
            ]
        );
    }

    #[test]
    fn test_pipeline_stages_any_order() {
        let policy = ArtifactPolicy::pipeline(&GateConfig::default());
        let artifact = Artifact::present(
            ArtifactKind::Pipeline,
            "docs/orchestration/pipeline.md",
            "1. security review\n2. VALIDATE\n3. research",
        );
        assert!(policy.evaluate(true, &artifact).is_empty());
    }

    #[test]
    fn test_pipeline_missing_stage_message() {
        let policy = ArtifactPolicy::pipeline(&GateConfig::default());
        let artifact = Artifact::present(
            ArtifactKind::Pipeline,
            "docs/orchestration/pipeline.md",
            "Research then Security",
        );
        let violations = policy.evaluate(true, &artifact);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Pipeline contract should include stage 'Validate' in docs/orchestration/pipeline.md."
        );
    }

    #[test]
    fn test_pipeline_absent_required_message() {
        let policy = ArtifactPolicy::pipeline(&GateConfig::default());
        let artifact = Artifact::absent(ArtifactKind::Pipeline, "docs/orchestration/pipeline.md");
        let violations = policy.evaluate(true, &artifact);
        assert_eq!(
            violations[0].message,
            "Missing orchestration contract: docs/orchestration/pipeline.md"
        );
    }

    #[test]
    fn test_custom_domain_label() {
        let config = GateConfig {
            trusted_domain: "docs.rs".to_string(),
            min_references: 1,
            ..GateConfig::default()
        };
        let policy = ArtifactPolicy::research(&config).unwrap();
        let violations = policy.evaluate(true, &research_artifact(&compliant_research()));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].message,
            "Research file has only 0 docs.rs references; expected at least 1."
        );
    }

    #[test]
    fn test_reference_pattern_built_with_policy() {
        let config = GateConfig {
            trusted_domain: "docs.rs".to_string(),
            ..GateConfig::default()
        };
        let policy = ArtifactPolicy::research(&config).unwrap();
        match &policy.rules[1] {
            PolicyRule::MinReferences { domain, minimum } => {
                assert_eq!(domain.domain(), "docs.rs");
                assert_eq!(*minimum, 5);
            }
            other => panic!("expected MinReferences, got {other:?}"),
        }
    }

    #[test]
    fn test_rules_serialize_domain_as_string() {
        let policy = ArtifactPolicy::research(&GateConfig::default()).unwrap();
        let json = serde_json::to_value(&policy.rules[1]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "min_references",
                "domain": "learn.microsoft.com",
                "minimum": 5
            })
        );
    }
}
