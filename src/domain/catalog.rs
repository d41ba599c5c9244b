/// Stable, URL-safe identifier for a brand or model name.
///
/// `"Mercedes-Benz"` and `" mercedes  benz "` both become `mercedes-benz`, so
/// listings can be filtered by brand regardless of how the seller typed it.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        let ch = fold_diacritic(ch);
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        "unknown".to_string()
    } else {
        out
    }
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ř' => 'r',
        'š' | 'ś' => 's',
        'ù' | 'ú' | 'û' | 'ü' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::slug;

    #[test]
    fn collapses_separators_and_case() {
        assert_eq!(slug("Mercedes-Benz"), "mercedes-benz");
        assert_eq!(slug("  Land   Rover "), "land-rover");
        assert_eq!(slug("--Alfa__Romeo--"), "alfa-romeo");
    }

    #[test]
    fn strips_accents() {
        assert_eq!(slug("Škoda"), "skoda");
        assert_eq!(slug("Citroën"), "citroen");
    }

    #[test]
    fn empty_or_symbol_only_names_are_unknown() {
        assert_eq!(slug(""), "unknown");
        assert_eq!(slug("!!!"), "unknown");
        assert_eq!(slug("סוזוקי"), "unknown");
    }
}
