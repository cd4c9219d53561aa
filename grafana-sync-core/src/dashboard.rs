use serde_json::Value;
use thiserror::Error;

/// A dashboard is an open-ended JSON object; only `id`, `panels` and
/// `datasource` carry meaning for the sync algorithm.
pub type Dashboard = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("\"panels\" holds something other than a sequence of panel objects")]
    StructuralMismatch,
}

/// Points every `datasource` key reachable through nested `panels`
/// sequences at the given datasource. A `null` panels value is legal
/// (a leaf panel); any other non-sequence shape aborts the rewrite.
pub fn set_panel_datasources(panel: &mut Dashboard, datasource: &str) -> Result<(), RewriteError> {
    for (key, value) in panel.iter_mut() {
        match key.as_str() {
            "datasource" => *value = Value::String(datasource.to_string()),
            "panels" => match value {
                Value::Null => {}
                Value::Array(panels) => {
                    for entry in panels.iter_mut() {
                        match entry {
                            Value::Object(nested) => set_panel_datasources(nested, datasource)?,
                            _ => return Err(RewriteError::StructuralMismatch),
                        }
                    }
                }
                _ => return Err(RewriteError::StructuralMismatch),
            },
            _ => {}
        }
    }
    Ok(())
}
