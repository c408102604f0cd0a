/// Version of the title normalization rule.
///
/// Artifact bundles record the version their title index was built with and the
/// loader refuses bundles built with a different rule. Bump this whenever
/// `normalize_title` changes behavior.
pub const NORMALIZATION_VERSION: u32 = 1;

/// Normalizes a display title or user query into its index key.
///
/// Lowercases, drops every character that is neither alphanumeric nor
/// whitespace, collapses whitespace runs to a single space and trims the ends.
/// "  The  Matrix: Reloaded! " becomes "the matrix reloaded".
pub fn normalize_title(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else if ch.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }

    out
}
