// Materialization metadata attached to worksheet code.
//
// The metadata is held as plain structs and rendered by one serializer per
// target language, so user-provided values (package names, versions) are
// always emitted as escaped literals.

use std::fmt::Write as _;

use crate::models::{Language, PipDependency, Submission};

/// Output column selection when the user does not narrow it
pub const ALL_COLUMNS: &str = "*";

/// `@bauplan.model(...)` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFraming {
    pub columns: Vec<String>,
    pub materialize: bool,
}

/// `@bauplan.python(...)` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFraming {
    pub python_version: String,
    pub pip: Vec<PipDependency>,
}

/// Decorators placed above a Python model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonFraming {
    pub model: ModelFraming,
    pub runtime: RuntimeFraming,
}

impl PythonFraming {
    pub fn render(&self, body: &str) -> String {
        let columns = self
            .model
            .columns
            .iter()
            .map(|c| python_str(c))
            .collect::<Vec<_>>()
            .join(", ");
        let pip = self
            .runtime
            .pip
            .iter()
            .map(|dep| format!("{}: {}", python_str(&dep.package), python_str(&dep.version)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut source = String::from("import bauplan\n");
        let _ = writeln!(
            source,
            "@bauplan.model(columns=[{}], materialize={})",
            columns,
            python_bool(self.model.materialize)
        );
        let _ = writeln!(
            source,
            "@bauplan.python({}, pip={{{}}})",
            python_str(&self.runtime.python_version),
            pip
        );
        source.push_str(body);
        source
    }
}

/// Pragma line placed above a SQL model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlFraming {
    pub materialize: bool,
}

impl SqlFraming {
    pub fn render(&self, body: &str) -> String {
        format!(
            "-- bauplan: materialize={}\n{}",
            python_bool(self.materialize),
            body
        )
    }
}

/// Framing for one submission, by language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFraming {
    Python(PythonFraming),
    Sql(SqlFraming),
}

impl SourceFraming {
    pub fn for_submission(submission: &Submission, python_version: &str) -> Self {
        match submission.language {
            Language::Python => SourceFraming::Python(PythonFraming {
                model: ModelFraming {
                    columns: vec![ALL_COLUMNS.to_string()],
                    materialize: submission.materialize,
                },
                runtime: RuntimeFraming {
                    python_version: python_version.to_string(),
                    pip: submission.effective_dependency().cloned().into_iter().collect(),
                },
            }),
            Language::Sql => SourceFraming::Sql(SqlFraming {
                materialize: submission.materialize,
            }),
        }
    }

    /// Framing lines first, user code below
    pub fn render(&self, body: &str) -> String {
        match self {
            SourceFraming::Python(framing) => framing.render(body),
            SourceFraming::Sql(framing) => framing.render(body),
        }
    }
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Single-quoted Python string literal
fn python_str(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(literal, "\\x{:02x}", c as u32);
            }
            c => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}
