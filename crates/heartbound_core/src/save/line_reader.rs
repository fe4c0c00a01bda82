use std::io::{self, BufRead};

pub struct LineReader<R> {
    inner: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: Vec::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Read the next line with control characters removed.
    /// Anything after a carriage return on the same line is discarded.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let end = self
            .buf
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .unwrap_or(self.buf.len());
        let text: Vec<u8> = self.buf[..end]
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_control())
            .collect();
        String::from_utf8(text)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Read the next line as a trimmed token.
    pub fn read_token(&mut self) -> io::Result<Option<String>> {
        Ok(self.read_line()?.map(|line| line.trim().to_string()))
    }

    /// Read the next line as a decimal number.
    pub fn read_number(&mut self) -> io::Result<Option<f64>> {
        Ok(self.read_line()?.map(|line| parse_decimal(&line)))
    }
}

/// Parse the longest numeric prefix of `text`, ignoring surrounding blanks.
/// Text with no numeric prefix reads as zero.
pub fn parse_decimal(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>() {
        return value;
    }

    let bytes = text.as_bytes();
    let mut end = 0usize;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'+' | b'-' if i == 0 => {}
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + 1;
    }
    if !seen_digit {
        return 0.0;
    }
    text[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn strips_line_endings_and_controls() {
        let mut r = LineReader::new(Cursor::new(b"12\t34 \r\nroom\x07_a\nlast".as_slice()));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("1234 "));
        assert_eq!(r.read_token().unwrap().as_deref(), Some("room_a"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(r.read_line().unwrap(), None);
        assert_eq!(r.line_no(), 3);
    }

    #[test]
    fn decimal_reads_longest_numeric_prefix() {
        assert_eq!(parse_decimal("100 "), 100.0);
        assert_eq!(parse_decimal("-12.5"), -12.5);
        assert_eq!(parse_decimal("+3"), 3.0);
        assert_eq!(parse_decimal("1.2.3"), 1.2);
        assert_eq!(parse_decimal("-"), 0.0);
        assert_eq!(parse_decimal(""), 0.0);
    }
}
