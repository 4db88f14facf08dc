//! The composable filter predicate.
//!
//! A [`QueryFilters`] value holds whichever optional criteria a caller
//! supplies; absent criteria impose no constraint. Assembly is a fold over
//! the present fields into parameterized SQL, so contradictory criteria are
//! never errors — they just match nothing.

use drivedex_types::{
    AclMemberId, GroupId, SecurityRange, SenderId, TagId, TimeRange, TransitId, UniqueId,
};
use rusqlite::types::Value;

/// Optional criteria AND'ed together into one predicate.
///
/// The one exception to plain AND composition is the security-scope /
/// access-list pair: when both are present an entry matches if its security
/// group falls in the range **or** it holds at least one listed ACL member.
/// That lets one call ask "everything I'm scoped for, plus anything shared
/// with me". Passing [`SecurityRange::none`] with an ACL list degrades to
/// pure access-list filtering.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Inclusive security-group range, OR-coupled with `acl_any_of`.
    pub security_range: Option<SecurityRange>,
    /// Entry's archival status must be one of these.
    pub archival_status_any_of: Vec<i32>,
    /// Entry's file type must be one of these.
    pub file_type_any_of: Vec<i32>,
    /// Entry's data type must be one of these.
    pub data_type_any_of: Vec<i32>,
    /// Entry's sender must be one of these.
    pub sender_any_of: Vec<SenderId>,
    /// Entry's group must be one of these.
    pub group_any_of: Vec<GroupId>,
    /// Entry's transit id must be one of these.
    pub transit_any_of: Vec<TransitId>,
    /// Entry's unique id must be one of these.
    pub unique_any_of: Vec<UniqueId>,
    /// Entry's user date must fall in this inclusive range.
    pub user_date_range: Option<TimeRange>,
    /// Entry must hold at least one of these tags.
    pub tags_any_of: Vec<TagId>,
    /// Entry must hold every one of these tags. Distinct operator from
    /// `tags_any_of`; supply one or the other per call.
    pub tags_all_of: Vec<TagId>,
    /// Entry matches if it holds any of these ACL members, OR'd with the
    /// security range.
    pub acl_any_of: Vec<AclMemberId>,
}

impl QueryFilters {
    /// No constraints: matches every entry.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Convenience: only a security-scope constraint.
    #[must_use]
    pub fn scoped(range: SecurityRange) -> Self {
        Self { security_range: Some(range), ..Self::default() }
    }

    /// Folds the present criteria into the WHERE clause being built.
    pub(crate) fn apply(&self, wb: &mut WhereBuilder) {
        match (self.security_range, self.acl_any_of.is_empty()) {
            (Some(range), true) => {
                wb.push(
                    "(e.security_group >= ? AND e.security_group <= ?)",
                    [Value::from(range.start), Value::from(range.end)],
                );
            }
            (Some(range), false) => {
                let acl = in_list(self.acl_any_of.iter().map(|a| blob(a.as_bytes())));
                wb.push(
                    format!(
                        "((e.security_group >= ? AND e.security_group <= ?) OR e.id IN \
                         (SELECT a.entry_id FROM acl_index a WHERE a.member_id IN ({})))",
                        acl.placeholders
                    ),
                    [Value::from(range.start), Value::from(range.end)]
                        .into_iter()
                        .chain(acl.params),
                );
            }
            (None, false) => {
                let acl = in_list(self.acl_any_of.iter().map(|a| blob(a.as_bytes())));
                wb.push(
                    format!(
                        "e.id IN (SELECT a.entry_id FROM acl_index a WHERE a.member_id IN ({}))",
                        acl.placeholders
                    ),
                    acl.params,
                );
            }
            (None, true) => {}
        }

        if !self.archival_status_any_of.is_empty() {
            let list = in_list(self.archival_status_any_of.iter().map(|&v| Value::from(v)));
            wb.push(format!("e.archival_status IN ({})", list.placeholders), list.params);
        }

        if !self.file_type_any_of.is_empty() {
            let list = in_list(self.file_type_any_of.iter().map(|&v| Value::from(v)));
            wb.push(format!("e.file_type IN ({})", list.placeholders), list.params);
        }

        if !self.data_type_any_of.is_empty() {
            let list = in_list(self.data_type_any_of.iter().map(|&v| Value::from(v)));
            wb.push(format!("e.data_type IN ({})", list.placeholders), list.params);
        }

        if !self.sender_any_of.is_empty() {
            let list = in_list(self.sender_any_of.iter().map(|s| Value::Blob(s.as_bytes().to_vec())));
            wb.push(format!("e.sender IN ({})", list.placeholders), list.params);
        }

        if !self.group_any_of.is_empty() {
            let list = in_list(self.group_any_of.iter().map(|g| blob(g.as_bytes())));
            wb.push(format!("e.group_id IN ({})", list.placeholders), list.params);
        }

        if !self.transit_any_of.is_empty() {
            let list = in_list(self.transit_any_of.iter().map(|t| blob(t.as_bytes())));
            wb.push(format!("e.transit_id IN ({})", list.placeholders), list.params);
        }

        if !self.unique_any_of.is_empty() {
            let list = in_list(self.unique_any_of.iter().map(|u| blob(u.as_bytes())));
            wb.push(format!("e.unique_id IN ({})", list.placeholders), list.params);
        }

        if let Some(range) = self.user_date_range {
            wb.push(
                "(e.user_date >= ? AND e.user_date <= ?)",
                [Value::from(range.start.as_i64()), Value::from(range.end.as_i64())],
            );
        }

        if !self.tags_any_of.is_empty() {
            let list = in_list(self.tags_any_of.iter().map(|t| blob(t.as_bytes())));
            wb.push(
                format!(
                    "e.id IN (SELECT t.entry_id FROM tag_index t WHERE t.tag_id IN ({}))",
                    list.placeholders
                ),
                list.params,
            );
        }

        if !self.tags_all_of.is_empty() {
            // Membership intersection: one subquery per required tag.
            let subqueries: Vec<&str> = self
                .tags_all_of
                .iter()
                .map(|_| "SELECT entry_id FROM tag_index WHERE tag_id = ?")
                .collect();
            wb.push(
                format!("e.id IN ({})", subqueries.join(" INTERSECT ")),
                self.tags_all_of.iter().map(|t| blob(t.as_bytes())),
            );
        }
    }
}

/// Accumulates WHERE clauses and their positional parameters in step.
#[derive(Debug, Default)]
pub(crate) struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl WhereBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a clause and, in order, the parameters its placeholders bind.
    pub(crate) fn push(
        &mut self,
        clause: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    /// Renders `" WHERE a AND b"`, or an empty string with no clauses.
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}

struct InList {
    placeholders: String,
    params: Vec<Value>,
}

fn in_list(values: impl Iterator<Item = Value>) -> InList {
    let params: Vec<Value> = values.collect();
    let placeholders = vec!["?"; params.len()].join(",");
    InList { placeholders, params }
}

pub(crate) fn blob(bytes: &[u8; 16]) -> Value {
    Value::Blob(bytes.to_vec())
}
