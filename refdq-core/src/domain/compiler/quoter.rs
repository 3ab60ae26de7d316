// refdq-core/src/domain/compiler/quoter.rs

// Identifier and literal quoting for the SQL the gateway generates itself.
// User-authored check SQL is never rewritten.

use crate::domain::schema::TableSchema;

pub struct Quoter;

impl Quoter {
    /// `name` -> `"NAME"`, doubling embedded quotes.
    pub fn ident(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// `it's` -> `'it''s'`
    pub fn literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quoted, comma-separated column list.
    pub fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
        columns
            .into_iter()
            .map(Self::ident)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// True for variable-length string types. Staged text already has this type,
/// so a plain cast can never fail.
pub fn is_variable_length_string(data_type: &str) -> bool {
    let upper = data_type.trim().to_ascii_uppercase();
    ["VARCHAR", "STRING", "TEXT", "NVARCHAR", "CHARACTER VARYING"]
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

/// `CAST` for string targets, `TRY_CAST` for everything else, so an
/// unconvertible value becomes NULL instead of failing the statement.
pub fn cast_expression(expression: &str, data_type: &str) -> String {
    if is_variable_length_string(data_type) {
        format!("CAST({expression} AS {data_type})")
    } else {
        format!("TRY_CAST({expression} AS {data_type})")
    }
}

/// Projection converting staged text into the target's column types, in target
/// column order. Columns absent from the staging table project a typed NULL.
pub fn cast_projection(target: &TableSchema, staged: &TableSchema, qualifier: Option<&str>) -> String {
    target
        .columns()
        .iter()
        .map(|column| {
            let quoted = Quoter::ident(&column.name);
            if staged.contains(&column.name) {
                let source = match qualifier {
                    Some(q) => format!("{q}.{quoted}"),
                    None => quoted.clone(),
                };
                format!("{} AS {}", cast_expression(&source, &column.data_type), quoted)
            } else {
                format!("CAST(NULL AS {}) AS {}", column.data_type, quoted)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
