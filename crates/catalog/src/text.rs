//! Display-name normalisation.

/// Title-case a name or title.
///
/// Every alphabetic run starts upper-case and continues lower-case; any
/// non-letter starts a new run, except an apostrophe directly inside a word,
/// so "philosopher's" stays "Philosopher's" rather than "Philosopher'S".
///
/// ```
/// use libris_catalog::text::title_case;
///
/// assert_eq!(title_case("george orwell"), "George Orwell");
/// assert_eq!(title_case("j.k. rowling"), "J.K. Rowling");
/// ```
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;

    for ch in input.chars() {
        if ch.is_alphabetic() {
            if in_word || after_inner_apostrophe(&out) {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// `out` ends in a letter followed by an apostrophe.
fn after_inner_apostrophe(out: &str) -> bool {
    let mut rev = out.chars().rev();
    matches!(rev.next(), Some('\'')) && rev.next().is_some_and(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalises_each_word() {
        assert_eq!(title_case("murder on the orient express"), "Murder On The Orient Express");
    }

    #[test]
    fn lowers_the_rest_of_each_word() {
        assert_eq!(title_case("tHE dA vINCI cODE"), "The Da Vinci Code");
    }

    #[test]
    fn punctuation_starts_a_new_word() {
        assert_eq!(title_case("j.k. rowling"), "J.K. Rowling");
        assert_eq!(title_case("jean-paul sartre"), "Jean-Paul Sartre");
    }

    #[test]
    fn inner_apostrophe_does_not_capitalise() {
        assert_eq!(
            title_case("harry potter and the philosopher's stone"),
            "Harry Potter And The Philosopher's Stone"
        );
        assert_eq!(title_case("'tis the season"), "'Tis The Season");
    }

    #[test]
    fn digits_and_whitespace_pass_through() {
        assert_eq!(title_case("1984"), "1984");
        assert_eq!(title_case("  catch 22 "), "  Catch 22 ");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn idempotent() {
        let once = title_case("to kill a mockingbird");
        assert_eq!(title_case(&once), once);
    }
}
