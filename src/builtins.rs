//! The builtin command set.
//!
//! Every handler follows the registry contract: own name, argument list and
//! the piped input buffer in, replacement buffer out. Argument and I/O
//! failures are reported as structured JSON payloads so they stay pipeable;
//! only a failure to produce bytes at all becomes a `ShellError`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::error::ShellError;
use crate::registry::{Registry, json_line, structured_error, structured_output};

/// Build a registry with the full stock command set registered.
pub fn default_registry() -> Registry {
    let mut reg = Registry::new();
    reg.register("pwd", cmd_pwd);
    reg.register("ls", cmd_ls);
    reg.register("echo", cmd_echo);
    reg.register("tab", cmd_tab);
    reg.register("select", cmd_select);
    reg.register("cat", cmd_cat);
    reg.register("cd", cmd_cd);
    reg.register("env", cmd_env);
    reg.register("whoami", cmd_whoami);
    reg.register("date", cmd_date);
    reg.register("mkdir", cmd_mkdir);
    reg.register("rm", cmd_rm);
    reg.register("cp", cmd_cp);
    reg.register("mv", cmd_mv);
    reg.register("find", cmd_find);
    reg.register("grep", cmd_grep);
    reg.register("wc", cmd_wc);
    reg.register("head", cmd_head);
    reg.register("tail", cmd_tail);
    reg
}

/// 2-space-indented JSON plus a trailing newline.
fn pretty_line(v: &Value) -> Result<Vec<u8>, ShellError> {
    let mut bytes = serde_json::to_vec_pretty(v)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// `pwd`: the current working directory as a single JSON object.
fn cmd_pwd(name: &str, _args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    match std::env::current_dir() {
        Ok(cwd) => structured_output(serde_json::json!({"pwd": cwd.to_string_lossy()})),
        Err(e) => structured_error(
            name,
            1,
            e.to_string(),
            &["ensure you have read permissions on the current directory"],
        ),
    }
}

/// `ls [path]`: directory entries as a bare JSON array of
/// `{name, size, isdir, mode, modtime}` objects, so the result pipes
/// straight into `select`.
fn cmd_ls(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let path = args.first().map(String::as_str).unwrap_or(".");
    match list_dir(path) {
        Ok(entries) => json_line(entries),
        Err(e) => structured_error(name, 1, e.to_string(), &["path not found or not accessible"]),
    }
}

fn list_dir(path: &str) -> std::io::Result<Vec<Value>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        out.push(serde_json::json!({
            "name": entry.file_name().to_string_lossy(),
            "size": meta.len(),
            "isdir": meta.is_dir(),
            "mode": mode_string(&meta),
            "modtime": modtime_rfc3339(&meta),
        }));
    }
    Ok(out)
}

#[cfg(unix)]
fn mode_string(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    let mut s = String::with_capacity(10);
    s.push(if meta.is_dir() { 'd' } else { '-' });
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

#[cfg(not(unix))]
fn mode_string(meta: &fs::Metadata) -> String {
    let mut s = String::with_capacity(10);
    s.push(if meta.is_dir() { 'd' } else { '-' });
    s.push_str(if meta.permissions().readonly() {
        "r--r--r--"
    } else {
        "rw-rw-rw-"
    });
    s
}

fn modtime_rfc3339(meta: &fs::Metadata) -> String {
    meta.modified()
        .map(|t| DateTime::<Local>::from(t).to_rfc3339())
        .unwrap_or_default()
}

/// `echo`: with arguments and no piped input, print the arguments; with
/// piped input, pretty-print it as JSON when it parses and pass it through
/// untouched when it does not.
fn cmd_echo(_name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    if input.is_empty() && !args.is_empty() {
        return Ok(format!("{}\n", args.join(" ")).into_bytes());
    }
    if !input.is_empty() {
        if let Ok(v) = serde_json::from_slice::<Value>(input) {
            return pretty_line(&v);
        }
        return Ok(input.to_vec());
    }
    Ok(b"\n".to_vec())
}

/// `tab`: pretty-print piped JSON.
fn cmd_tab(name: &str, _args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    if input.is_empty() {
        return structured_error(name, 1, "no input", &["pipe data to the tab command"]);
    }
    match serde_json::from_slice::<Value>(input) {
        // column layout not implemented yet; renders the same as echo
        Ok(v) => pretty_line(&v),
        Err(e) => structured_error(name, 1, e.to_string(), &["input must be valid JSON"]),
    }
}

/// `select f1,f2,…`: keep only the named fields of each object in a piped
/// JSON array. Objects with none of the fields are dropped entirely.
fn cmd_select(name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(fields) = args.first() else {
        return structured_error(
            name,
            1,
            "missing fields argument",
            &["usage: select field1,field2,field3"],
        );
    };
    if input.is_empty() {
        return structured_error(name, 1, "no input", &["pipe data to select"]);
    }
    let rows: Vec<Map<String, Value>> = match serde_json::from_slice(input) {
        Ok(rows) => rows,
        Err(e) => {
            return structured_error(
                name,
                1,
                e.to_string(),
                &["input must be a JSON array of objects"],
            );
        }
    };
    let wanted: Vec<&str> = fields.split(',').map(str::trim).collect();
    let mut out = Vec::new();
    for row in rows {
        let filtered: Map<String, Value> = row
            .into_iter()
            .filter(|(k, _)| wanted.contains(&k.as_str()))
            .collect();
        if !filtered.is_empty() {
            out.push(Value::Object(filtered));
        }
    }
    json_line(out)
}

/// `cat <file>`: raw file bytes, no envelope.
fn cmd_cat(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(file) = args.first() else {
        return structured_error(name, 1, "missing file argument", &["usage: cat <file>"]);
    };
    match fs::read(file) {
        Ok(content) => Ok(content),
        Err(e) => structured_error(name, 1, e.to_string(), &["file not found or not readable"]),
    }
}

/// `cd <path>`: change the process working directory.
fn cmd_cd(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(path) = args.first() else {
        return structured_error(name, 1, "missing path argument", &["usage: cd <path>"]);
    };
    if let Err(e) = std::env::set_current_dir(path) {
        return structured_error(
            name,
            1,
            e.to_string(),
            &["directory not found or not accessible"],
        );
    }
    let cwd = std::env::current_dir()?;
    structured_output(serde_json::json!({"pwd": cwd.to_string_lossy()}))
}

/// `env`: the process environment as one JSON object.
fn cmd_env(_name: &str, _args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    structured_output(vars)
}

/// `whoami`: the current user, from $USER.
fn cmd_whoami(_name: &str, _args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    structured_output(serde_json::json!({"user": user}))
}

/// `date`: the current local time, RFC 3339.
fn cmd_date(_name: &str, _args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    structured_output(serde_json::json!({"date": Local::now().to_rfc3339()}))
}

/// `mkdir <path>`: create a directory and any missing parents.
fn cmd_mkdir(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(path) = args.first() else {
        return structured_error(name, 1, "missing path", &["usage: mkdir <path>"]);
    };
    match fs::create_dir_all(path) {
        Ok(()) => structured_output(serde_json::json!({"created": path})),
        Err(e) => structured_error(name, 1, e.to_string(), &["failed to create directory"]),
    }
}

/// `rm <path>`: remove a file or a directory tree.
fn cmd_rm(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(path) = args.first() else {
        return structured_error(name, 1, "missing path", &["usage: rm <path>"]);
    };
    match remove_path(path) {
        Ok(()) => structured_output(serde_json::json!({"removed": path})),
        Err(e) => structured_error(name, 1, e.to_string(), &["failed to remove"]),
    }
}

fn remove_path(path: &str) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// `cp <src> <dst>`: copy a file, or a directory tree recursively.
fn cmd_cp(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let (Some(src), Some(dst)) = (args.first(), args.get(1)) else {
        return structured_error(name, 1, "missing src/dst", &["usage: cp <src> <dst>"]);
    };
    match copy_path(Path::new(src), Path::new(dst)) {
        Ok(()) => structured_output(serde_json::json!({"copied": format!("{} -> {}", src, dst)})),
        Err(e) => structured_error(name, 1, e.to_string(), &["copy failed"]),
    }
}

fn copy_path(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_path(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}

/// `mv <src> <dst>`: rename.
fn cmd_mv(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let (Some(src), Some(dst)) = (args.first(), args.get(1)) else {
        return structured_error(name, 1, "missing src/dst", &["usage: mv <src> <dst>"]);
    };
    match fs::rename(src, dst) {
        Ok(()) => structured_output(serde_json::json!({"moved": format!("{} -> {}", src, dst)})),
        Err(e) => structured_error(name, 1, e.to_string(), &["move failed"]),
    }
}

/// `find <substr>`: walk the current directory tree collecting paths whose
/// file name contains the pattern.
fn cmd_find(name: &str, args: &[String], _input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(pattern) = args.first() else {
        return structured_error(name, 1, "missing pattern", &["usage: find <pattern>"]);
    };
    let mut matches = Vec::new();
    walk(Path::new("."), pattern, &mut matches);
    structured_output(matches)
}

/// Depth-first walk; unreadable directories are skipped, not errors.
fn walk(dir: &Path, pattern: &str, matches: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_name().to_string_lossy().contains(pattern) {
            matches.push(path.to_string_lossy().into_owned());
        }
        if path.is_dir() {
            walk(&path, pattern, matches);
        }
    }
}

/// `grep <substr>`: lines of the piped input containing the pattern.
fn cmd_grep(name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let Some(pattern) = args.first() else {
        return structured_error(name, 1, "missing pattern", &["usage: grep <pattern>"]);
    };
    let text = String::from_utf8_lossy(input);
    let matches: Vec<&str> = text
        .split('\n')
        .filter(|line| line.contains(pattern.as_str()))
        .collect();
    structured_output(matches)
}

/// `wc`: line, word and byte counts of the piped input.
///
/// Lines are `\n`-split segments, so a trailing newline contributes a final
/// empty segment. Long-standing behavior; scripts depend on it.
fn cmd_wc(_name: &str, _args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let text = String::from_utf8_lossy(input);
    structured_output(serde_json::json!({
        "lines": text.split('\n').count(),
        "words": text.split_whitespace().count(),
        "chars": input.len(),
    }))
}

/// Count argument for `head`/`tail`; anything unparsable means 10.
fn line_count_arg(args: &[String]) -> usize {
    args.first().and_then(|a| a.parse().ok()).unwrap_or(10)
}

/// `head [n]`: the first `n` lines of the piped input (default 10).
fn cmd_head(_name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let count = line_count_arg(args);
    let text = String::from_utf8_lossy(input);
    let lines: Vec<&str> = text.split('\n').take(count).collect();
    structured_output(lines)
}

/// `tail [n]`: the last `n` lines of the piped input (default 10), starting
/// from `max(0, total - n)`.
fn cmd_tail(_name: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, ShellError> {
    let count = line_count_arg(args);
    let text = String::from_utf8_lossy(input);
    let lines: Vec<&str> = text.split('\n').collect();
    let start = lines.len().saturating_sub(count);
    structured_output(&lines[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExecutionError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn as_error(bytes: &[u8]) -> ExecutionError {
        serde_json::from_slice(bytes).expect("structured error payload")
    }

    fn envelope_data(bytes: &[u8]) -> Value {
        let v: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(v["success"], Value::Bool(true));
        v["data"].clone()
    }

    #[test]
    fn select_keeps_requested_fields() {
        let input = br#"[{"a":1,"b":2,"c":3}]"#;
        let out = cmd_select("select", &args(&["a,b"]), input).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[{\"a\":1,\"b\":2}]\n");
    }

    #[test]
    fn select_drops_objects_left_empty() {
        let input = br#"[{"c":3}]"#;
        let out = cmd_select("select", &args(&["a,b"]), input).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }

    #[test]
    fn select_requires_argument_and_input() {
        let err = as_error(&cmd_select("select", &[], b"[]").unwrap());
        assert_eq!(err.message, "missing fields argument");
        assert!(err.hints.unwrap()[0].starts_with("usage:"));

        let err = as_error(&cmd_select("select", &args(&["a"]), b"").unwrap());
        assert_eq!(err.message, "no input");
    }

    #[test]
    fn select_rejects_non_array_input() {
        let err = as_error(&cmd_select("select", &args(&["a"]), br#"{"a":1}"#).unwrap());
        assert_eq!(err.command, "select");
        assert_eq!(err.code, 1);
    }

    #[test]
    fn echo_joins_args_with_trailing_newline() {
        let out = cmd_echo("echo", &args(&["hello", "world"]), b"").unwrap();
        assert_eq!(out, b"hello world\n");
    }

    #[test]
    fn echo_pretty_prints_json_input_with_two_space_indent() {
        let out = cmd_echo("echo", &[], br#"{"x":1}"#).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"x\": 1\n}\n");
    }

    #[test]
    fn echo_passes_non_json_input_through_unchanged() {
        let out = cmd_echo("echo", &[], b"not json at all").unwrap();
        assert_eq!(out, b"not json at all");
    }

    #[test]
    fn echo_with_nothing_prints_a_newline() {
        assert_eq!(cmd_echo("echo", &[], b"").unwrap(), b"\n");
    }

    #[test]
    fn tab_requires_input() {
        let err = as_error(&cmd_tab("tab", &[], b"").unwrap());
        assert_eq!(err.message, "no input");
    }

    #[test]
    fn tab_reports_invalid_json() {
        let err = as_error(&cmd_tab("tab", &[], b"{oops").unwrap());
        assert_eq!(err.command, "tab");
        assert_eq!(err.hints.unwrap(), vec!["input must be valid JSON"]);
    }

    #[test]
    fn tab_round_trips_valid_json() {
        let input = br#"[{"name":"a","size":1},{"name":"b","size":2}]"#;
        let out = cmd_tab("tab", &[], input).unwrap();
        let reparsed: Value = serde_json::from_slice(&out).unwrap();
        let original: Value = serde_json::from_slice(input).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn head_defaults_to_ten_on_unparsable_count() {
        let input = b"1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n11\n12";
        let out = cmd_head("head", &args(&["lots"]), input).unwrap();
        let data = envelope_data(&out);
        assert_eq!(data.as_array().unwrap().len(), 10);
        assert_eq!(data[0], "1");
    }

    #[test]
    fn tail_clamps_start_to_zero() {
        let input = b"a\nb\nc\nd\ne";
        let out = cmd_tail("tail", &args(&["10"]), input).unwrap();
        let data = envelope_data(&out);
        assert_eq!(data.as_array().unwrap().len(), 5);
        assert_eq!(data[0], "a");
        assert_eq!(data[4], "e");
    }

    #[test]
    fn tail_takes_the_last_lines() {
        let input = b"a\nb\nc\nd\ne";
        let out = cmd_tail("tail", &args(&["2"]), input).unwrap();
        let data = envelope_data(&out);
        assert_eq!(data.as_array().unwrap().len(), 2);
        assert_eq!(data[0], "d");
    }

    #[test]
    fn wc_counts_split_segments_words_and_bytes() {
        let out = cmd_wc("wc", &[], b"hello world\n").unwrap();
        let data = envelope_data(&out);
        assert_eq!(data["lines"], 2);
        assert_eq!(data["words"], 2);
        assert_eq!(data["chars"], 12);
    }

    #[test]
    fn grep_filters_lines_by_substring() {
        let out = cmd_grep("grep", &args(&["oo"]), b"foo\nbar\nmoon\n").unwrap();
        let data = envelope_data(&out);
        assert_eq!(data.as_array().unwrap().len(), 2);
        assert_eq!(data[0], "foo");
        assert_eq!(data[1], "moon");
    }

    #[test]
    fn walk_collects_substring_matches_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/report.txt"), b"").unwrap();
        fs::write(dir.path().join("a/other.log"), b"").unwrap();

        let mut matches = Vec::new();
        walk(dir.path(), "report", &mut matches);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("report.txt"));
    }

    #[test]
    fn grep_requires_pattern() {
        let err = as_error(&cmd_grep("grep", &[], b"x").unwrap());
        assert_eq!(err.message, "missing pattern");
    }

    #[test]
    fn ls_emits_bare_array_with_entry_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.txt"), b"hi").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let out = cmd_ls("ls", &args(&[&dir.path().to_string_lossy()]), b"").unwrap();
        let entries: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(entries.len(), 2);
        let file = entries
            .iter()
            .find(|e| e["name"] == "one.txt")
            .expect("file entry");
        assert_eq!(file["size"], 2);
        assert_eq!(file["isdir"], Value::Bool(false));
        assert!(file["modtime"].as_str().unwrap().contains('T'));
        let sub = entries.iter().find(|e| e["name"] == "sub").unwrap();
        assert_eq!(sub["isdir"], Value::Bool(true));
    }

    #[test]
    fn ls_reports_missing_path_as_payload() {
        let err = as_error(&cmd_ls("ls", &args(&["/definitely/not/here"]), b"").unwrap());
        assert_eq!(err.command, "ls");
        assert_eq!(err.code, 1);
    }

    #[test]
    fn cat_reads_file_bytes_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        fs::write(&path, b"plain bytes").unwrap();
        let out = cmd_cat("cat", &args(&[&path.to_string_lossy()]), b"").unwrap();
        assert_eq!(out, b"plain bytes");
    }

    #[test]
    fn cat_requires_file_argument() {
        let err = as_error(&cmd_cat("cat", &[], b"").unwrap());
        assert_eq!(err.message, "missing file argument");
    }

    #[test]
    fn mkdir_rm_cp_mv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_string_lossy().into_owned();

        let made = format!("{}/a/b", base);
        envelope_data(&cmd_mkdir("mkdir", &args(&[&made]), b"").unwrap());
        assert!(Path::new(&made).is_dir());

        let src = format!("{}/a/f.txt", base);
        fs::write(&src, b"data").unwrap();
        let copied = format!("{}/a/g.txt", base);
        envelope_data(&cmd_cp("cp", &args(&[&src, &copied]), b"").unwrap());
        assert_eq!(fs::read(&copied).unwrap(), b"data");

        let moved = format!("{}/a/h.txt", base);
        envelope_data(&cmd_mv("mv", &args(&[&copied, &moved]), b"").unwrap());
        assert!(!Path::new(&copied).exists());
        assert!(Path::new(&moved).exists());

        envelope_data(&cmd_rm("rm", &args(&[&made]), b"").unwrap());
        assert!(!Path::new(&made).exists());
    }

    #[test]
    fn cp_copies_directories_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("tree");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("inner/leaf.txt"), b"leaf").unwrap();

        let dst = dir.path().join("copy");
        envelope_data(
            &cmd_cp(
                "cp",
                &args(&[&src.to_string_lossy(), &dst.to_string_lossy()]),
                b"",
            )
            .unwrap(),
        );
        assert_eq!(fs::read(dst.join("inner/leaf.txt")).unwrap(), b"leaf");
    }

    #[test]
    fn rm_reports_missing_target_as_payload() {
        let err = as_error(&cmd_rm("rm", &args(&["/no/such/thing"]), b"").unwrap());
        assert_eq!(err.command, "rm");
    }

    #[test]
    fn identity_builtins_return_single_objects() {
        let data = envelope_data(&cmd_whoami("whoami", &[], b"").unwrap());
        assert!(data["user"].is_string());

        let data = envelope_data(&cmd_date("date", &[], b"").unwrap());
        assert!(data["date"].as_str().unwrap().contains('T'));

        let data = envelope_data(&cmd_pwd("pwd", &[], b"").unwrap());
        assert!(!data["pwd"].as_str().unwrap().is_empty());

        let data = envelope_data(&cmd_env("env", &[], b"").unwrap());
        assert!(data.is_object());
    }

    #[test]
    fn default_registry_has_the_stock_set() {
        let reg = default_registry();
        for name in [
            "pwd", "ls", "echo", "tab", "select", "cat", "cd", "env", "whoami", "date", "mkdir",
            "rm", "cp", "mv", "find", "grep", "wc", "head", "tail",
        ] {
            assert!(reg.is_builtin(name), "missing builtin {name}");
        }
        assert!(!reg.is_builtin("run"));
    }
}
