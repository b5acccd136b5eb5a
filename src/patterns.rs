//! Compiled name patterns shared by the planner and the stores

use std::sync::OnceLock;

use regex::Regex;

/// Bare identifier: entity, helper, alias and binding names
pub const IDENTIFIER: &str = r"^\w+$";
/// Field key, optionally `**`-prefixed for splicing
pub const FIELD_KEY: &str = r"^(\*\*)?(\w+)$";
/// `"outer:inner"` or `"inner"`
pub const NAME_PAIR: &str = r"^(?:(\w+):)?(\w+)$";

/// Compiles a pattern literal once per cell.
///
/// Only the constants above are passed in; `test_patterns_compile` keeps them
/// valid, so this is the single place a regex compile failure could surface.
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("pattern literal"))
}

pub fn identifier() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, IDENTIFIER)
}

pub fn field_key() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, FIELD_KEY)
}

pub fn name_pair() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, NAME_PAIR)
}
