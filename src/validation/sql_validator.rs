use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use crate::api::middleware::AppError;

/// Classifies preview queries before they reach the engine
pub struct SqlValidator;

impl SqlValidator {
    /// Refuse statements that would change data.
    ///
    /// Text the local parser cannot read is let through: the remote engine owns
    /// the dialect and will reject it itself if it is invalid.
    pub fn ensure_read_only(sql: &str) -> Result<(), AppError> {
        let dialect = GenericDialect {};
        let ast = match Parser::parse_sql(&dialect, sql) {
            Ok(ast) => ast,
            Err(e) => {
                tracing::debug!("Local SQL parse failed, deferring to engine: {}", e);
                return Ok(());
            }
        };

        if ast.is_empty() {
            return Err(AppError::InvalidSql("Empty SQL query".to_string()));
        }

        for stmt in &ast {
            Self::check_statement(stmt)?;
        }

        Ok(())
    }

    fn check_statement(stmt: &Statement) -> Result<(), AppError> {
        match stmt {
            Statement::Query(_)
            | Statement::ExplainTable { .. }
            | Statement::ShowTables { .. }
            | Statement::ShowColumns { .. }
            | Statement::ShowViews { .. }
            | Statement::ShowDatabases { .. }
            | Statement::ShowSchemas { .. }
            | Statement::ShowObjects { .. }
            | Statement::ShowFunctions { .. }
            | Statement::ShowCreate { .. }
            | Statement::ShowCollation { .. }
            | Statement::ShowCharset { .. }
            | Statement::ShowStatus { .. }
            | Statement::ShowVariable { .. }
            | Statement::ShowVariables { .. } => Ok(()),
            // EXPLAIN ANALYZE runs the inner statement
            Statement::Explain {
                analyze, statement, ..
            } => {
                if *analyze {
                    Self::check_statement(statement)
                } else {
                    Ok(())
                }
            }
            Statement::Insert { .. } => Err(Self::write_rejected("INSERT")),
            Statement::Update { .. } => Err(Self::write_rejected("UPDATE")),
            Statement::Delete { .. } => Err(Self::write_rejected("DELETE")),
            Statement::Merge { .. } => Err(Self::write_rejected("MERGE")),
            Statement::Truncate { .. } => Err(Self::write_rejected("TRUNCATE")),
            Statement::Drop { .. } => Err(Self::write_rejected("DROP")),
            Statement::CreateTable { .. } => Err(Self::write_rejected("CREATE TABLE")),
            Statement::CreateView { .. } => Err(Self::write_rejected("CREATE VIEW")),
            Statement::AlterTable { .. } => Err(Self::write_rejected("ALTER TABLE")),
            _ => Err(AppError::InvalidSql(format!(
                "Only read statements can be previewed. Found: {}",
                Self::leading_keyword(&stmt.to_string())
            ))),
        }
    }

    /// Whether a query is safe to execute repeatedly and cache
    pub fn is_read_only(sql: &str) -> bool {
        Self::ensure_read_only(sql).is_ok()
    }

    fn write_rejected(kind: &str) -> AppError {
        AppError::InvalidSql(format!(
            "{} statements are not allowed in previews. Only SELECT queries are permitted.",
            kind
        ))
    }

    fn leading_keyword(sql: &str) -> String {
        sql.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }
}
