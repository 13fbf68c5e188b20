//! Markup-to-plain-text reduction for free-text fields.
//!
//! Titles, abstracts, and comments in the dump carry TeX markup, hard line
//! wraps, and irregular spacing. [`scrub`] reduces them to single-line prose:
//! commands and grouping braces are removed, escaped symbols are kept, and all
//! whitespace runs (including embedded newlines) collapse to single spaces.

/// Reduces a markup-bearing string to plain single-line prose.
pub fn scrub(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                // A line-break command; the surrounding whitespace collapse
                // turns it into a single space.
                Some('\\') => {
                    chars.next();
                    out.push(' ');
                }
                // A command like \emph or \alpha: drop the command name, keep
                // whatever argument text follows (its braces are stripped below).
                Some(next) if next.is_ascii_alphabetic() => {
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphabetic() {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push(' ');
                }
                // An escaped symbol like \% or \&: keep the symbol itself.
                Some(&next) => {
                    chars.next();
                    out.push(next);
                }
                None => {}
            },
            // Grouping and math delimiters contribute no prose.
            '{' | '}' | '$' => {}
            // Non-breaking space.
            '~' => out.push(' '),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }

    collapse_whitespace(&out)
}

/// Collapses every run of whitespace to a single space and trims the ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(scrub("A simple title"), "A simple title");
    }

    #[test]
    fn newlines_collapse_to_single_spaces() {
        assert_eq!(
            scrub("A title\n  wrapped over\nthree lines"),
            "A title wrapped over three lines"
        );
    }

    #[test]
    fn repeated_whitespace_collapses() {
        assert_eq!(scrub("too   many    spaces"), "too many spaces");
    }

    #[test]
    fn commands_are_dropped_and_arguments_kept() {
        assert_eq!(scrub(r"an \emph{important} result"), "an important result");
    }

    #[test]
    fn math_delimiters_are_stripped() {
        assert_eq!(scrub(r"we show $E = mc^2$ holds"), "we show E = mc^2 holds");
    }

    #[test]
    fn escaped_symbols_keep_the_symbol() {
        assert_eq!(scrub(r"50\% of cases"), "50% of cases");
    }

    #[test]
    fn line_break_commands_become_spaces() {
        assert_eq!(scrub(r"first\\second"), "first second");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(scrub(""), "");
    }
}
