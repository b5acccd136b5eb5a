//! JSON line I/O for the CLI
//!
//! - Input: one JSON object per line
//! - Output: one JSON object per line, flushed after each
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read one JSON request line
pub fn read_request<R: BufRead>(reader: &mut R) -> CliResult<Value> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::bad_request("Empty input"));
    }

    let value: Value = serde_json::from_str(&line)?;
    Ok(value)
}

/// Read request lines until EOF (for the start command).
///
/// Blank lines are skipped; a line that is not JSON yields a
/// `CLI_BAD_REQUEST` item and reading continues.
pub fn read_requests<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Value>> {
    reader.lines().filter_map(|line| match line {
        Err(e) => Some(Err(CliError::from(e))),
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(serde_json::from_str(&line).map_err(CliError::from)),
    })
}

/// Write a success response line
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_line(out, &json!({"status": "ok", "data": data}))
}

/// Write an error response line
pub fn write_error<W: Write>(out: &mut W, code: &str, path: &str, message: &str) -> CliResult<()> {
    write_line(
        out,
        &json!({
            "status": "error",
            "code": code,
            "path": path,
            "message": message
        }),
    )
}

/// Write an already-built response object
pub fn write_line<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)
        .map_err(|e| CliError::io_error(format!("failed to write response: {}", e)))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_request() {
        let mut input = Cursor::new("{\"op\": \"render\"}\n");
        assert_eq!(read_request(&mut input).unwrap(), json!({"op": "render"}));
    }

    #[test]
    fn test_read_empty_request() {
        let mut input = Cursor::new("\n");
        assert_eq!(read_request(&mut input).unwrap_err().code_str(), "CLI_BAD_REQUEST");
    }

    #[test]
    fn test_read_requests_skips_blank_and_keeps_going() {
        let input = Cursor::new("{\"a\":1}\n\nnot json\n{\"b\":2}\n");
        let items: Vec<_> = read_requests(input).collect();
        assert_eq!(items.len(), 3);
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap(), &json!({"b": 2}));
    }

    #[test]
    fn test_write_lines() {
        let mut out = Vec::new();
        write_response(&mut out, json!([1])).unwrap();
        write_error(&mut out, "PQL_NOT_FOUND", "__from__", "__from__: entity not found (X)").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0], json!({"status": "ok", "data": [1]}));
        assert_eq!(lines[1]["code"], json!("PQL_NOT_FOUND"));
        assert_eq!(lines[1]["path"], json!("__from__"));
    }
}
