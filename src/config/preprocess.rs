//! Comment-tolerant preprocessing of the route file.
//!
//! The route file is JSON that may also contain `//` line comments and
//! string literals spanning several physical lines. [`preprocess`] turns it
//! into strict JSON of exactly the same length: comment bytes become spaces,
//! newlines and tabs inside strings become spaces. Because no byte is added
//! or removed, a parser offset into the output is also an offset into the
//! input, which is what [`line_of_offset`] relies on.

/// Rewrite `input` into strict JSON of identical length.
pub fn preprocess(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        match byte {
            b'\\' => {
                // Escape: copy the pair through untouched.
                output.push(byte);
                if let Some(&escaped) = input.get(i + 1) {
                    output.push(escaped);
                    i += 1;
                }
            }
            b'"' => {
                in_string = !in_string;
                output.push(byte);
            }
            b'\n' | b'\t' if in_string => output.push(b' '),
            b'/' if !in_string && input.get(i + 1) == Some(&b'/') => {
                // Blank out the comment but keep its line ending.
                let end = input[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(input.len(), |pos| i + pos);
                output.resize(output.len() + (end - i), b' ');
                i = end;
                continue;
            }
            _ => output.push(byte),
        }
        i += 1;
    }

    debug_assert_eq!(output.len(), input.len());
    output
}

/// 1-based line number of `offset` in `original`.
pub fn line_of_offset(original: &[u8], offset: usize) -> usize {
    let end = offset.min(original.len());
    original[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Byte offset of a 1-based `line` / `column` position in `buffer`.
///
/// Positions past the end are clamped to the buffer length.
pub fn offset_of(buffer: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        buffer
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == b'\n')
            .nth(line - 2)
            .map_or(buffer.len(), |(pos, _)| pos + 1)
    };
    (line_start + column.saturating_sub(1)).min(buffer.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> String {
        let out = preprocess(src.as_bytes());
        assert_eq!(out.len(), src.len());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn multiline_strings_are_joined() {
        let out = run("{\"body\": \"this is\na multiline\nstring\"}");
        assert!(!out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["body"], "this is a multiline string");
    }

    #[test]
    fn tabs_inside_strings_become_spaces() {
        let out = run("{\"body\":\t\"a\tb\"}");
        assert_eq!(out, "{\"body\":\t\"a b\"}");
    }

    #[test]
    fn trailing_comment_without_newline() {
        let out = run("{\"body\": \"value\"} // what a meaningful body!");
        assert!(!out.contains("// what"));
        assert!(serde_json::from_str::<serde_json::Value>(&out).is_ok());
    }

    #[test]
    fn comment_in_the_middle_keeps_its_line() {
        let src = "{\"body\": // value comes next\n\"value\"}";
        let out = run(src);
        assert!(!out.contains("// value"));
        assert_eq!(out.matches('\n').count(), 1);
        assert_eq!(out.find('\n'), src.find('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["body"], "value");
    }

    #[test]
    fn full_line_comment() {
        let out = run("// My config\n{\"body\": \"value\"}");
        assert!(!out.contains("// My config"));
        assert!(out.starts_with("            \n{"));
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let out = run("{\"body\": \"value //look //find\"}");
        assert!(out.contains("//look //find"));

        let out = run("{\"body\": \"value \n//look \n//find\"}");
        assert!(out.contains("//look"));
        assert!(out.contains("//find"));
    }

    #[test]
    fn escaped_quotes_do_not_end_the_string() {
        let out = run("{\"body\": \"say \\\"hi\\\" // not a comment\"} // comment");
        assert!(out.contains("\\\"hi\\\" // not a comment"));
        assert!(!out.contains("// comment"));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["body"], "say \"hi\" // not a comment");
    }

    #[test]
    fn lone_slash_is_kept() {
        let out = run("{\"url\": \"/a/b\"} /");
        assert!(out.ends_with(" /"));
    }

    #[test]
    fn newlines_outside_strings_keep_their_positions() {
        let src = "[ // routes\n  {\"url\": \"/x\",\n   \"body\": \"one\ntwo\"}\n]\n";
        let out = preprocess(src.as_bytes());
        let positions = |buf: &[u8]| -> Vec<usize> {
            buf.iter().enumerate().filter(|(_, &b)| b == b'\n').map(|(i, _)| i).collect()
        };
        let mut expected = positions(src.as_bytes());
        // The newline inside the "body" string is the only one rewritten.
        let in_string = src.find("one\ntwo").unwrap() + 3;
        expected.retain(|&p| p != in_string);
        assert_eq!(positions(&out), expected);
    }

    #[test]
    fn line_numbers_count_the_original_buffer() {
        let original = b"a\nb\nc";
        assert_eq!(line_of_offset(original, 0), 1);
        assert_eq!(line_of_offset(original, 2), 2);
        assert_eq!(line_of_offset(original, 4), 3);
        assert_eq!(line_of_offset(original, 100), 3);
    }

    #[test]
    fn offsets_from_line_and_column() {
        let buffer = b"ab\ncd\nef";
        assert_eq!(offset_of(buffer, 1, 1), 0);
        assert_eq!(offset_of(buffer, 2, 2), 4);
        assert_eq!(offset_of(buffer, 3, 1), 6);
        assert_eq!(offset_of(buffer, 9, 1), buffer.len());
    }
}
