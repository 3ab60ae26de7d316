// refdq-core/src/domain/target/check.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::compiler::{RenderedQuery, SqlTemplate, VariableScope};
use crate::domain::error::DomainError;
use crate::domain::row::Row;
use crate::domain::target::configuration::CheckInvocation;

/// Variables every check can use without declaring them.
/// `table` is the relation under test: the staging table, or the virtual
/// post-merge table in merge mode.
pub const GENERAL_VARIABLES: [&str; 3] = ["table", "primary_key", "target_table"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckDocument {
    #[serde(rename = "type")]
    pub check_type: Option<String>,
    pub sql: Option<String>,
    pub description: Option<String>,
}

/// A reusable rule. Its SQL returns the violating rows.
#[derive(Debug, Clone)]
pub struct CheckDefinition {
    pub check_type: String,
    pub sql: SqlTemplate,
    pub description: SqlTemplate,
}

impl CheckDefinition {
    pub fn from_document(key: &str, doc: CheckDocument) -> Result<Self, DomainError> {
        let missing = |k: &str| DomainError::InvalidConfig {
            source_name: key.to_string(),
            key: k.to_string(),
        };
        let check_type = doc.check_type.ok_or_else(|| missing("type"))?;
        let sql = doc.sql.ok_or_else(|| missing("sql"))?;
        let context = format!("check '{check_type}'");
        Ok(Self {
            sql: SqlTemplate::parse(&sql, &context)?,
            description: SqlTemplate::parse(doc.description.as_deref().unwrap_or_default(), &context)?,
            check_type,
        })
    }

    /// Variables the invocation must provide on top of the general ones.
    pub fn required_arguments(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in self.sql.variables().iter().chain(self.description.variables()) {
            if !GENERAL_VARIABLES.contains(&v.as_str()) && !out.contains(&v.as_str()) {
                out.push(v);
            }
        }
        out
    }
}

/// Check definitions keyed by type name. Adding a check is a data change.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    definitions: BTreeMap<String, CheckDefinition>,
}

impl CheckRegistry {
    pub fn from_documents(docs: BTreeMap<String, CheckDocument>) -> Result<Self, DomainError> {
        let mut definitions = BTreeMap::new();
        for (key, doc) in docs {
            let definition = CheckDefinition::from_document(&key, doc)?;
            if definition.check_type != key {
                tracing::warn!(
                    "Check file '{}' declares type '{}'; it is registered as '{}'",
                    key,
                    definition.check_type,
                    key
                );
            }
            definitions.insert(key, definition);
        }
        Ok(Self { definitions })
    }

    pub fn get(&self, check_type: &str) -> Option<&CheckDefinition> {
        self.definitions.get(check_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CheckDefinition)> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A definition bound to one invocation: SQL and description fully rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub check_type: String,
    pub sql: RenderedQuery,
    pub description: String,
}

impl Check {
    pub fn bind(
        definition: &CheckDefinition,
        invocation: &CheckInvocation,
        general: &VariableScope,
        target_name: &str,
    ) -> Result<Self, DomainError> {
        let context = format!("check '{}' on target '{}'", definition.check_type, target_name);
        let scope = general.clone().with_invocation(invocation.args.clone());

        let sql = definition.sql.render(&scope, &context)?;
        let base = definition.description.render(&scope, &context)?.into_string();
        let description = match (base.trim().is_empty(), invocation.description.as_deref()) {
            (_, None) => base,
            (true, Some(extra)) => extra.to_string(),
            (false, Some(extra)) => format!("{base}\n{extra}"),
        };

        Ok(Self {
            check_type: definition.check_type.clone(),
            sql,
            description,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check_type: String,
    pub description: String,
    pub sql: RenderedQuery,
    pub rows: Vec<Row>,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(check: Check, rows: Vec<Row>) -> Self {
        Self {
            passed: rows.is_empty(),
            check_type: check.check_type,
            description: check.description,
            sql: check.sql,
            rows,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unique() -> CheckDefinition {
        CheckDefinition::from_document(
            "unique",
            CheckDocument {
                check_type: Some("unique".into()),
                sql: Some("select * from {table} where {column} in (select {column} from {table} group by 1 having count(*) > 1)".into()),
                description: Some("{column} must be unique".into()),
            },
        )
        .unwrap()
    }

    fn invocation(description: Option<&str>) -> CheckInvocation {
        CheckInvocation {
            check_type: "unique".into(),
            description: description.map(str::to_string),
            args: BTreeMap::from([("column".to_string(), "ID".to_string())]),
        }
    }

    #[test]
    fn test_sql_is_mandatory() {
        let err = CheckDefinition::from_document(
            "broken",
            CheckDocument {
                check_type: Some("broken".into()),
                sql: None,
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig { ref key, .. } if key == "sql"));
    }

    #[test]
    fn test_required_arguments_exclude_general_variables() {
        assert_eq!(unique().required_arguments(), ["column"]);
    }

    #[test]
    fn test_bind_layers_descriptions() {
        let scope = VariableScope::new().with_general("table", "STG.NAMES");
        let check = Check::bind(&unique(), &invocation(Some("Business key")), &scope, "names").unwrap();
        assert_eq!(check.description, "ID must be unique\nBusiness key");
        assert!(check.sql.as_str().starts_with("select * from STG.NAMES where ID in"));
    }

    #[test]
    fn test_bind_fails_on_unbound_placeholder() {
        let mut inv = invocation(None);
        inv.args.clear();
        let scope = VariableScope::new().with_general("table", "T");
        let err = Check::bind(&unique(), &inv, &scope, "names").unwrap_err();
        assert!(matches!(err, DomainError::MissingVariable { ref variable, .. } if variable == "column"));
    }

    #[test]
    fn test_result_passes_only_when_empty() {
        let scope = VariableScope::new().with_general("table", "T");
        let check = Check::bind(&unique(), &invocation(None), &scope, "names").unwrap();
        assert!(CheckResult::new(check.clone(), vec![]).passed);
        assert!(!CheckResult::new(check, vec![Row::new().with("ID", 1)]).passed);
    }
}
