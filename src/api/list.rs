//! List handler.
//!
//! Query-string pairs become equality filters ANDed with the path project.

use crate::error::Result;
use crate::model::{Issue, IssueField};
use crate::storage::{FilterField, FilterValue, IssueQuery, IssueStore};
use crate::util::id::{is_valid_id_format, normalize_id};
use crate::util::time::{format_timestamp, parse_timestamp};
use tracing::{debug, info};

/// List issues in `project` matching every filter in `params`.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn execute(
    store: &dyn IssueStore,
    project: &str,
    params: &[(String, String)],
) -> Result<Vec<Issue>> {
    let Some(query) = build_query(project, params) else {
        debug!(project, "Filter can never match; returning no issues");
        return Ok(Vec::new());
    };
    let issues = store.find(&query)?;
    info!(project, count = issues.len(), "Listed issues");
    Ok(issues)
}

/// Turn query-string pairs into an [`IssueQuery`].
///
/// A `project` key is ignored (the path decides). Unknown keys are ignored.
/// Returns `None` when some filter can never match a stored record: a
/// malformed `_id`, an unparseable timestamp, or `open` other than
/// `true`/`false`.
#[must_use]
pub fn build_query(project: &str, params: &[(String, String)]) -> Option<IssueQuery> {
    let mut query = IssueQuery::for_project(project);

    for (key, value) in params {
        let Some(field) = FilterField::from_key(key) else {
            debug!(key = %key, "Ignoring unknown list filter");
            continue;
        };
        let value = match field {
            FilterField::Id => {
                let id = normalize_id(value);
                if !is_valid_id_format(&id) {
                    return None;
                }
                FilterValue::Text(id)
            }
            FilterField::Field(IssueField::Open) => match value.as_str() {
                "true" => FilterValue::Flag(true),
                "false" => FilterValue::Flag(false),
                _ => return None,
            },
            FilterField::CreatedOn | FilterField::UpdatedOn => {
                FilterValue::Text(format_timestamp(&parse_timestamp(value)?))
            }
            FilterField::Field(_) => FilterValue::Text(value.clone()),
        };
        query = query.with(field, value);
    }

    Some(query)
}
