/// Produces a lowercase, hyphen-separated ASCII identifier from free text.
///
/// Common Latin diacritics are folded to their base letter, `&` reads as
/// `and`, and any run of other characters becomes a single `-`. The result
/// never starts or ends with `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    let mut push = |character: char| {
        if character.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(character);
        } else {
            pending_separator = true;
        }
    };

    for character in text.chars().flat_map(char::to_lowercase) {
        match ascii_fold(character) {
            Some(replacement) => replacement.chars().for_each(&mut push),
            None => push(character),
        }
    }

    slug
}

fn ascii_fold(character: char) -> Option<&'static str> {
    let replacement = match character {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'þ' => "th",
        '&' => " and ",
        '\u{0300}'..='\u{036f}' => "",
        _ => return None,
    };

    Some(replacement)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::slugify;

    #[test]
    fn slugify_hyphenates_words() {
        assert_eq!(slugify("Gorillaz without Murdoc"), "gorillaz-without-murdoc");
        assert_eq!(slugify(" French Touch "), "french-touch");
        assert_eq!(slugify("AC/DC"), "ac-dc");
    }

    #[test]
    fn slugify_folds_diacritics_and_ampersands() {
        assert_eq!(slugify("Beyoncé"), "beyonce");
        assert_eq!(slugify("Mötley Crüe"), "motley-crue");
        assert_eq!(slugify("Simon & Garfunkel"), "simon-and-garfunkel");
    }

    #[test]
    fn slugify_of_punctuation_only_is_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" -- !! "), "");
    }

    proptest! {
        #[test]
        fn slug_uses_only_lowercase_ascii_and_single_hyphens(text in "\\PC{0,40}") {
            let slug = slugify(&text);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn slugify_is_idempotent(text in "\\PC{0,40}") {
            let slug = slugify(&text);
            prop_assert_eq!(slugify(&slug), slug);
        }
    }
}
