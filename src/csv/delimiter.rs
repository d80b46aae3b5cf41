/// Candidate separators in tie-break order.
pub const CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

const SAMPLE_CHARS: usize = 10_000;
const SAMPLE_LINES: usize = 10;

/// Guesses the field separator from the first lines of `text`.
///
/// Each candidate is scored by its unquoted occurrences across the sample;
/// the highest score wins and ties go to the earlier candidate, so input
/// without any candidate yields a comma.
pub fn detect_delimiter(text: &str) -> char {
    // The limit counts chars, so astral-plane text samples further than a
    // UTF-16 cut would.
    let sample = match text.char_indices().nth(SAMPLE_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    let lines: Vec<&str> = split_lines(sample).take(SAMPLE_LINES).collect();

    let mut best: Option<(char, usize)> = None;
    for candidate in CANDIDATES {
        let score: usize = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .sum();
        tracing::trace!(candidate = ?candidate, score, "delimiter score");
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best.map_or(',', |(candidate, _)| candidate)
}

/// Human readable name for a delimiter, as accepted by `--delimiter`.
pub fn delimiter_name(delimiter: char) -> String {
    match delimiter {
        ',' => "comma".to_owned(),
        ';' => "semicolon".to_owned(),
        '\t' => "tab".to_owned(),
        '|' => "pipe".to_owned(),
        other => format!("{other:?}"),
    }
}

/// Parses a delimiter override: a single character or one of the names
/// returned by [`delimiter_name`].
pub fn parse_delimiter(raw: &str) -> Result<char, String> {
    match raw.to_ascii_lowercase().as_str() {
        "comma" => return Ok(','),
        "semicolon" => return Ok(';'),
        "tab" | "\\t" => return Ok('\t'),
        "pipe" => return Ok('|'),
        _ => {}
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some('"'), None) => Err("the quote character cannot be a delimiter".to_owned()),
        (Some('\r' | '\n'), None) => Err("a line break cannot be a delimiter".to_owned()),
        (Some(ch), None) => Ok(ch),
        _ => Err(format!(
            "expected a single character or one of comma, semicolon, tab, pipe; got {raw:?}"
        )),
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(pos) => {
                let skip = if current[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[pos + skip..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

fn count_unquoted(line: &str, candidate: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                chars.next();
                continue;
            }
            in_quotes = !in_quotes;
        } else if !in_quotes && ch == candidate {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn sample_limit_counts_chars() {
        let mut text = "\u{1F600}".repeat(SAMPLE_CHARS - 2);
        text.push_str(";;,,,");
        assert_eq!(detect_delimiter(&text), ';');
    }

    #[test]
    fn ties_and_empty_input_fall_back_to_comma() {
        assert_eq!(detect_delimiter(""), ',');
        assert_eq!(detect_delimiter("title"), ',');
        assert_eq!(detect_delimiter("a;b,c"), ',');
        assert_eq!(detect_delimiter("a;b\tc"), ';');
    }

    #[test]
    fn ignores_separators_inside_quotes() {
        let text = "id;title\n1;\"Hello, World, Again\"\n2;\"He said \"\"a,b\"\"\"";
        assert_eq!(detect_delimiter(text), ';');
    }

    #[test]
    fn samples_only_the_first_ten_lines() {
        let mut text = "id;title\n".repeat(10);
        text.push_str(&"a,b,c,d,e,f,g,h\n".repeat(20));
        assert_eq!(detect_delimiter(&text), ';');
    }

    #[test]
    fn splits_on_every_line_ending() {
        let lines: Vec<&str> = split_lines("a\r\nb\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn parses_named_and_literal_overrides() {
        assert_eq!(parse_delimiter("tab"), Ok('\t'));
        assert_eq!(parse_delimiter("Semicolon"), Ok(';'));
        assert_eq!(parse_delimiter("|"), Ok('|'));
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter(",,").is_err());
        assert_eq!(delimiter_name('\t'), "tab");
    }
}
