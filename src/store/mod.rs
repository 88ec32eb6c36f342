pub mod children;
pub mod parents;

pub use children::ChildStore;
pub use parents::ParentStore;

pub const PARENTS_TABLE: &str = "parents";
pub const CHILDREN_TABLE: &str = "children";

pub(crate) const PARENT_COLUMNS: &str = "id, first_name, last_name, street, city, state, zip_code";
pub(crate) const CHILD_COLUMNS: &str = "id, first_name, last_name, parent_id";

/// Absent path ids and ids that aren't integers both end up as not-found.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
