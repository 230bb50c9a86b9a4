// Lines of a shared roll start with one of these.
pub(crate) const SHARED_GLYPH: &str = "※";
pub(crate) const FORMULA_GLYPH: &str = "◈";
pub(crate) const SUCCESS_GLYPH: &str = "✓";
pub(crate) const FAILURE_GLYPH: &str = "✕";

/// Drops the group braces and sort suffixes from a transcript.
pub(crate) fn strip_unwanted_text(output: &str) -> String {
    output
        .replace(&['{', '}'][..], "")
        .replace("sa", "")
        .replace("sd", "")
}

/// `__first second__ — `, or nothing without comments.
pub(crate) fn format_comment(comments: &[String]) -> String {
    if comments.is_empty() {
        return String::new();
    }
    format!("__{}__ — ", comments.join(" "))
}

/// Flags every face of the first `[...]` of a transcript as a success.
pub(crate) fn star_faces(rolled: &str) -> String {
    let Some((start, end)) = rolled
        .find('[')
        .and_then(|start| rolled[start..].find(']').map(|len| (start, start + len)))
    else {
        return rolled.to_owned();
    };

    let faces = rolled[start + 1..end]
        .split(", ")
        .map(|face| {
            if face.ends_with('*') {
                face.to_owned()
            } else {
                format!("{face}*")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}[{faces}]{}", &rolled[..start], &rolled[end + 1..])
}

/// The part of a transcript after its `notation:` label.
pub(crate) fn after_label(result: &str) -> &str {
    result
        .split_once(':')
        .map_or(result, |(_, rolled)| rolled)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_unwanted_text() {
        assert_eq!(
            strip_unwanted_text("{4d6>4}: {[5*, 6*, 5*, 5*]} = 4"),
            "4d6>4: [5*, 6*, 5*, 5*] = 4"
        );
        assert_eq!(strip_unwanted_text("3d10sd: [10, 9, 8] = 27"), "3d10: [10, 9, 8] = 27");
    }

    #[test]
    fn test_format_comment() {
        assert_eq!(format_comment(&[]), "");
        assert_eq!(
            format_comment(&["fire".to_owned(), "damage".to_owned()]),
            "__fire damage__ — "
        );
    }

    #[test]
    fn test_star_faces() {
        assert_eq!(star_faces("[5, 6]+3"), "[5*, 6*]+3");
        assert_eq!(star_faces("[5*, 2]"), "[5*, 2*]");
        assert_eq!(star_faces("7"), "7");
    }

    #[test]
    fn test_after_label() {
        assert_eq!(after_label("1d20: [15] = 15"), "[15] = 15");
        assert_eq!(after_label("[15] = 15"), "[15] = 15");
    }
}
