/// Normalize a raw key name into the canonical token used by gesture
/// profiles and input events, e.g. `"w"` -> `"W"`, `"escape"` -> `"ESC"`.
///
/// Returns `None` for empty input or names containing whitespace.
pub fn normalize_key(raw: &str) -> Option<String> {
    let upper = raw.trim().to_ascii_uppercase();
    if upper.is_empty() || upper.chars().any(char::is_whitespace) {
        return None;
    }
    let canonical = match upper.as_str() {
        "ESCAPE" => "ESC",
        "RETURN" => "ENTER",
        "CONTROL" => "CTRL",
        "OPTION" => "ALT",
        "SUPER" | "WIN" | "WINDOWS" | "CMD" | "COMMAND" => "META",
        "LEFTARROW" => "LEFT",
        "RIGHTARROW" => "RIGHT",
        "UPARROW" => "UP",
        "DOWNARROW" => "DOWN",
        "PGUP" => "PAGEUP",
        "PGDOWN" | "PGDN" => "PAGEDOWN",
        "DEL" => "DELETE",
        "INS" => "INSERT",
        "BACK" => "BACKSPACE",
        other => return Some(normalize_function_key(other).unwrap_or_else(|| other.to_string())),
    };
    Some(canonical.to_string())
}

/// `F01` and `F1` both become `F1`; anything outside `F1`..`F24` is not a
/// function key.
fn normalize_function_key(upper: &str) -> Option<String> {
    let digits = upper.strip_prefix('F')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u8>().ok()? {
        n @ 1..=24 => Some(format!("F{n}")),
        _ => None,
    }
}

/// Whether a normalized token names a modifier key. Modifiers never start
/// or end a gesture.
pub fn is_modifier_key(token: &str) -> bool {
    matches!(
        token,
        "SHIFT"
            | "LSHIFT"
            | "RSHIFT"
            | "CTRL"
            | "LCTRL"
            | "RCTRL"
            | "ALT"
            | "LALT"
            | "RALT"
            | "ALTGR"
            | "META"
            | "LMETA"
            | "RMETA"
    )
}

/// Normalize a token and reject modifiers in one step.
pub fn trigger_key(raw: &str) -> Option<String> {
    normalize_key(raw).filter(|token| !is_modifier_key(token))
}
