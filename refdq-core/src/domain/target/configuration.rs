// refdq-core/src/domain/target/configuration.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::compiler::SqlTemplate;
use crate::domain::error::DomainError;
use crate::domain::target::check::{CheckRegistry, GENERAL_VARIABLES};

// --- RAW DOCUMENTS (as read from YAML) ---

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TargetDocument {
    pub target_table: Option<String>,
    pub primary_key: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckInvocationDocument>,
    pub action: Option<ActionDocument>,
    pub group: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckInvocationDocument {
    #[serde(rename = "type")]
    pub check_type: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub args: BTreeMap<String, ArgValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActionDocument {
    pub name: Option<String>,
    pub trigger: Option<ActionTrigger>,
    pub sql: Option<String>,
    #[serde(flatten)]
    pub args: BTreeMap<String, ArgValue>,
}

/// Scalar or list argument attached to a check entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ArgValue>),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Integer(i) => write!(f, "{i}"),
            ArgValue::Float(x) => write!(f, "{x}"),
            ArgValue::Text(s) => f.write_str(s),
            ArgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

// --- VALIDATED MODEL ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTrigger {
    /// Runs after every successful write.
    Always,
    /// Runs only when the driver opts in.
    #[default]
    Optional,
}

#[derive(Debug, Clone)]
pub struct CheckInvocation {
    pub check_type: String,
    pub description: Option<String>,
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct PostWriteAction {
    pub name: String,
    pub trigger: ActionTrigger,
    pub sql: Option<SqlTemplate>,
    pub args: BTreeMap<String, String>,
}

impl PostWriteAction {
    pub fn should_run(&self, opted_in: bool) -> bool {
        match self.trigger {
            ActionTrigger::Always => true,
            ActionTrigger::Optional => opted_in,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub target_table: String,
    pub primary_key: String,
    pub checks: Vec<CheckInvocation>,
    pub action: Option<PostWriteAction>,
    pub group: Option<String>,
    pub description: Option<String>,
}

impl Target {
    pub fn from_document(name: &str, doc: TargetDocument) -> Result<Self, DomainError> {
        let missing = |key: &str| DomainError::InvalidConfig {
            source_name: name.to_string(),
            key: key.to_string(),
        };

        let target_table = doc
            .target_table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("target_table"))?;
        let primary_key = doc
            .primary_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing("primary_key"))?
            .trim()
            .to_uppercase();

        let checks = doc
            .checks
            .into_iter()
            .map(|c| {
                Ok(CheckInvocation {
                    check_type: c.check_type.ok_or_else(|| missing("checks[].type"))?,
                    description: c.description.filter(|d| !d.trim().is_empty()),
                    args: stringify(c.args),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let action = doc
            .action
            .map(|a| {
                let action_name = a.name.ok_or_else(|| missing("action.name"))?;
                let sql = a
                    .sql
                    .as_deref()
                    .map(|s| SqlTemplate::parse(s, &format!("action '{action_name}' of target '{name}'")))
                    .transpose()?;
                Ok::<_, DomainError>(PostWriteAction {
                    name: action_name,
                    trigger: a.trigger.unwrap_or_default(),
                    sql,
                    args: stringify(a.args),
                })
            })
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            target_table: target_table.trim().to_string(),
            primary_key,
            checks,
            action,
            group: doc.group,
            description: doc.description,
        })
    }
}

fn stringify(args: BTreeMap<String, ArgValue>) -> BTreeMap<String, String> {
    args.into_iter().map(|(k, v)| (k, v.to_string())).collect()
}

/// How a driver names the target of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Name(String),
    Table(String),
}

/// Every configured target, keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: BTreeMap<String, Target>,
}

impl TargetSet {
    pub fn from_documents(docs: BTreeMap<String, TargetDocument>) -> Result<Self, DomainError> {
        let targets = docs
            .into_iter()
            .map(|(name, doc)| Target::from_document(&name, doc).map(|t| (name, t)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { targets })
    }

    pub fn by_name(&self, name: &str) -> Result<&Target, DomainError> {
        self.targets
            .get(name)
            .ok_or_else(|| DomainError::TargetNotFound(name.to_string()))
    }

    /// Reverse lookup from the physical table name. Exactly one target must match.
    pub fn by_table(&self, table: &str) -> Result<&Target, DomainError> {
        let matches: Vec<&Target> = self
            .targets
            .values()
            .filter(|t| t.target_table.eq_ignore_ascii_case(table.trim()))
            .collect();
        match matches.as_slice() {
            [] => Err(DomainError::TargetNotFound(table.to_string())),
            [single] => Ok(single),
            many => Err(DomainError::AmbiguousTarget {
                table: table.to_string(),
                candidates: many.iter().map(|t| t.name.clone()).collect(),
            }),
        }
    }

    pub fn resolve(&self, selector: &TargetSelector) -> Result<&Target, DomainError> {
        match selector {
            TargetSelector::Name(name) => self.by_name(name),
            TargetSelector::Table(table) => self.by_table(table),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Physical table names, optionally restricted to one group.
    pub fn table_names(&self, group: Option<&str>) -> Vec<String> {
        self.targets
            .values()
            .filter(|t| group.is_none_or(|g| t.group.as_deref() == Some(g)))
            .map(|t| t.target_table.clone())
            .collect()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.targets
            .values()
            .filter_map(|t| t.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fails when an invocation references an unknown check type, or when a
    /// template placeholder can be bound by neither the general scope nor the
    /// invocation's own arguments.
    pub fn validate_checks(&self, registry: &CheckRegistry) -> Result<(), DomainError> {
        for target in self.targets.values() {
            for invocation in &target.checks {
                let definition = registry.get(&invocation.check_type).ok_or_else(|| {
                    DomainError::UnknownCheckType {
                        check_type: invocation.check_type.clone(),
                        target: target.name.clone(),
                    }
                })?;
                let templates = [&definition.sql, &definition.description];
                let unbound = templates.iter().flat_map(|t| t.variables()).find(|v| {
                    !GENERAL_VARIABLES.contains(&v.as_str()) && !invocation.args.contains_key(*v)
                });
                if let Some(variable) = unbound {
                    return Err(DomainError::MissingVariable {
                        variable: variable.clone(),
                        context: format!(
                            "check '{}' on target '{}'",
                            invocation.check_type, target.name
                        ),
                    });
                }
            }
            if let Some(action) = &target.action {
                let unbound = action.sql.iter().flat_map(|t| t.variables()).find(|v| {
                    !GENERAL_VARIABLES.contains(&v.as_str()) && !action.args.contains_key(*v)
                });
                if let Some(variable) = unbound {
                    return Err(DomainError::MissingVariable {
                        variable: variable.clone(),
                        context: format!("action '{}' of target '{}'", action.name, target.name),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> TargetDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn set() -> TargetSet {
        let mut docs = BTreeMap::new();
        docs.insert(
            "names".to_string(),
            doc("target_table: REF.PK.NAMES\nprimary_key: id\ngroup: people\nchecks:\n  - type: unique\n    column: ID\n"),
        );
        docs.insert(
            "countries".to_string(),
            doc("target_table: REF.GEO.COUNTRIES\nprimary_key: ISO\ngroup: geo\n"),
        );
        docs.insert(
            "cities".to_string(),
            doc("target_table: REF.GEO.CITIES\nprimary_key: CODE\ngroup: geo\n"),
        );
        TargetSet::from_documents(docs).unwrap()
    }

    #[test]
    fn test_parses_invocation_args() {
        let targets = set();
        let names = targets.by_name("names").unwrap();
        assert_eq!(names.primary_key, "ID");
        assert_eq!(names.checks[0].check_type, "unique");
        assert_eq!(names.checks[0].args.get("column").map(String::as_str), Some("ID"));
    }

    #[test]
    fn test_list_args_render_comma_separated() {
        let d = doc("target_table: T\nprimary_key: K\nchecks:\n  - type: accepted\n    values: [1, 'b', true]\n");
        let t = Target::from_document("t", d).unwrap();
        assert_eq!(t.checks[0].args["values"], "1, b, true");
    }

    #[test]
    fn test_missing_required_key_is_config_error() {
        let err = Target::from_document("broken", doc("primary_key: ID\n")).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidConfig { ref source_name, ref key } if source_name == "broken" && key == "target_table"
        ));
    }

    #[test]
    fn test_reverse_lookup_is_case_insensitive() {
        let targets = set();
        assert_eq!(targets.by_table("ref.geo.cities").unwrap().name, "cities");
        assert!(matches!(targets.by_table("REF.X"), Err(DomainError::TargetNotFound(_))));
    }

    #[test]
    fn test_reverse_lookup_rejects_duplicates() {
        let mut docs = BTreeMap::new();
        docs.insert("a".to_string(), doc("target_table: T\nprimary_key: K\n"));
        docs.insert("b".to_string(), doc("target_table: t\nprimary_key: K\n"));
        let targets = TargetSet::from_documents(docs).unwrap();
        match targets.by_table("T").unwrap_err() {
            DomainError::AmbiguousTarget { candidates, .. } => assert_eq!(candidates, ["a", "b"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_groups_and_table_names() {
        let targets = set();
        assert_eq!(targets.group_names(), ["geo", "people"]);
        assert_eq!(targets.table_names(Some("geo")), ["REF.GEO.CITIES", "REF.GEO.COUNTRIES"]);
        assert_eq!(targets.table_names(None).len(), 3);
    }

    #[test]
    fn test_action_trigger_defaults_to_optional() {
        let d = doc("target_table: T\nprimary_key: K\naction:\n  name: refresh\n  sql: call refresh('{table}')\n");
        let action = Target::from_document("t", d).unwrap().action.unwrap();
        assert_eq!(action.trigger, ActionTrigger::Optional);
        assert!(!action.should_run(false));
        assert!(action.should_run(true));
    }
}
