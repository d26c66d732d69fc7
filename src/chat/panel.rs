use std::fmt::Write as FmtWrite;

use super::ContextPanel;

pub const NO_CONTEXTS: &str = "No contexts found";
pub const RETRIEVED_DOCS_LABEL: &str = "See retrieved docs";
pub const SQL_LABEL: &str = "See what was run inside the model";

pub fn render_panel(panel: &ContextPanel) -> String {
    let mut output = String::new();

    match panel {
        ContextPanel::Papers(papers) if papers.is_empty() => {
            writeln!(output, "{NO_CONTEXTS}").unwrap();
        }
        ContextPanel::Papers(papers) => {
            for paper in papers {
                writeln!(output, "▸ {}", paper.title).unwrap();
                for line in paper.abstract_text.lines() {
                    writeln!(output, "    {line}").unwrap();
                }
            }
        }
        ContextPanel::Chunks(chunks) => {
            writeln!(output, "{RETRIEVED_DOCS_LABEL}").unwrap();
            let json = serde_json::to_string_pretty(chunks)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
            writeln!(output, "{json}").unwrap();
        }
        ContextPanel::Sql { sql_query, rows } => {
            writeln!(output, "{SQL_LABEL}").unwrap();
            writeln!(output, "SQL: {sql_query}").unwrap();
            let json = serde_json::to_string_pretty(rows)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
            writeln!(output, "{json}").unwrap();
        }
    }

    output
}
