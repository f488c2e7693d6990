//! Encoding of the DATA payload.

/// Encodes a message body for transmission after `DATA`.
///
/// Bare `\n` line endings become `\r\n`, lines starting with `.` get an extra
/// leading dot (RFC 5321 section 4.5.2), a final line break is added when
/// missing, and the `.` terminator line is appended.
#[must_use]
pub fn encode_data(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + body.len() / 32 + 5);
    let mut at_line_start = true;
    let mut prev_cr = false;

    for &b in body {
        if at_line_start && b == b'.' {
            out.push(b'.');
        }
        if b == b'\n' {
            if !prev_cr {
                out.push(b'\r');
            }
            out.push(b'\n');
            at_line_start = true;
        } else {
            out.push(b);
            at_line_start = false;
        }
        prev_cr = b == b'\r';
    }

    if !at_line_start {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"", b".\r\n" ; "empty body")]
    #[test_case(b"hello\n", b"hello\r\n.\r\n" ; "lf normalised")]
    #[test_case(b"hello\r\n", b"hello\r\n.\r\n" ; "crlf kept")]
    #[test_case(b"hello", b"hello\r\n.\r\n" ; "missing final newline")]
    #[test_case(b".\n", b"..\r\n.\r\n" ; "lone dot stuffed")]
    #[test_case(b"a\n.b\n..c\n", b"a\r\n..b\r\n...c\r\n.\r\n" ; "leading dots stuffed")]
    #[test_case(b"a.b\n", b"a.b\r\n.\r\n" ; "inner dot untouched")]
    #[test_case(b"a\n\nb", b"a\r\n\r\nb\r\n.\r\n" ; "blank lines kept")]
    fn encodes(input: &[u8], expected: &[u8]) {
        assert_eq!(encode_data(input), expected);
    }

    #[test]
    fn terminator_only_appears_at_end() {
        let encoded = encode_data(b"line\n.\nmore\n");
        let text = String::from_utf8(encoded).unwrap();
        assert_eq!(text.matches("\r\n.\r\n").count(), 1);
        assert!(text.ends_with("\r\n.\r\n"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// Reverses the transfer encoding: drops the terminator, unstuffs
        /// leading dots and turns CRLF back into LF.
        fn decode(encoded: &[u8]) -> String {
            let text = std::str::from_utf8(encoded).unwrap();
            let text = text.strip_suffix(".\r\n").unwrap();
            text.split_inclusive("\r\n")
                .map(|line| line.strip_prefix('.').unwrap_or(line).replace("\r\n", "\n"))
                .collect()
        }

        proptest! {
            #[test]
            fn terminator_appears_once_at_end(body in r"[a.\r\n]{0,64}") {
                let encoded = encode_data(body.as_bytes());
                // The DATA command line ends with CRLF, so the stream
                // always has a line break before the payload.
                let mut stream = b"\r\n".to_vec();
                stream.extend_from_slice(&encoded);
                let stream = String::from_utf8(stream).unwrap();

                prop_assert_eq!(stream.matches("\r\n.\r\n").count(), 1);
                prop_assert!(stream.ends_with("\r\n.\r\n"));
            }

            #[test]
            fn decoding_restores_body(body in r"[a.\n]{0,64}") {
                let mut expected = body.clone();
                if !expected.is_empty() && !expected.ends_with('\n') {
                    expected.push('\n');
                }
                prop_assert_eq!(decode(&encode_data(body.as_bytes())), expected);
            }

            #[test]
            fn every_line_ends_with_crlf(body in r"[a.\r\n]{0,64}") {
                let encoded = encode_data(body.as_bytes());
                for (i, &b) in encoded.iter().enumerate() {
                    if b == b'\n' {
                        prop_assert!(i > 0 && encoded[i - 1] == b'\r');
                    }
                }
            }
        }
    }
}
