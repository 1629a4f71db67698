// Key names arrive in whatever spelling the model picked ("Return", "ctrl+s", "Tab").
// Only one rewrite is applied here; backends resolve the rest.

pub const KEY_ENTER: &str = "enter";

/// Maps the case-insensitive name `return` to `enter`; every other name passes through.
pub fn normalize_key_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("return") {
        KEY_ENTER.to_string()
    } else {
        name.to_string()
    }
}
