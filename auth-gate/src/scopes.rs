use std::collections::BTreeSet;

/// Whether `granted` covers every scope in `required`.
///
/// Order and duplicates are irrelevant; an empty `required` is always satisfied.
pub fn authorize<S: AsRef<str>>(required: &[S], granted: &BTreeSet<String>) -> bool {
    required.iter().all(|scope| granted.contains(scope.as_ref()))
}
