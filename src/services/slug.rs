//! URL slugs for categories and products.

use chrono::Utc;

use crate::errors::ServiceError;

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lower-cases `input`, folds common accents and collapses every run of
/// non-alphanumeric characters into a single `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase).map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug to store: the supplied one (normalized) or one derived from `name`.
pub fn resolve(name: &str, supplied: Option<&str>) -> Result<String, ServiceError> {
    let slug = slugify(supplied.unwrap_or(name));
    if slug.is_empty() {
        return Err(ServiceError::ValidationError(
            "Slug must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

/// Disambiguates a slug that is already taken.
pub fn with_collision_suffix(slug: &str) -> String {
    format!("{}-{}", slug, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Cañas de Mosca", "canas-de-mosca")]
    #[test_case("  Líneas  #5 / WF  ", "lineas-5-wf")]
    #[test_case("Moscas Secas", "moscas-secas")]
    #[test_case("ADAMS--PARACHUTE", "adams-parachute")]
    #[test_case("!!!", "")]
    fn slugify_normalizes(input: &str, expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn resolve_prefers_supplied_slug() {
        assert_eq!(resolve("Reels", Some("Carretes Top")).unwrap(), "carretes-top");
        assert_eq!(resolve("Reels", None).unwrap(), "reels");
        assert!(resolve("???", None).is_err());
    }

    #[test]
    fn collision_suffix_is_numeric() {
        let suffixed = with_collision_suffix("reels");
        let tail = suffixed.strip_prefix("reels-").unwrap();
        assert!(tail.chars().all(|c| c.is_ascii_digit()));
    }
}
