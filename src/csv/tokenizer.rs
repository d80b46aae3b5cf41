const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Splits CSV text into rows of raw fields.
///
/// Quoted fields may contain the delimiter, line breaks and doubled quotes.
/// Rows are returned as found; widths are not checked here.
pub fn tokenize(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::Unquoted;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            State::Quoted => {
                if ch == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        state = State::Unquoted;
                    }
                } else {
                    field.push(ch);
                }
            }
            State::Unquoted => match ch {
                '"' => state = State::Quoted,
                ch if ch == delimiter => row.push(std::mem::take(&mut field)),
                '\n' | '\r' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                ch => field.push(ch),
            },
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
