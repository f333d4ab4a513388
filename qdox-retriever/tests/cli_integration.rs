use anyhow::Result;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper to run the CLI binary with given args
fn run_cli(args: &[&str]) -> Result<std::process::Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_qdox"))
        .args(args)
        .env("RUST_LOG", "error") // Reduce log noise
        .output()?;
    Ok(output)
}

/// Helper to populate a folder with a small corpus
fn populate_documents(temp_dir: &TempDir) -> Result<()> {
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("archive"))?;
    std::fs::write(root.join("camping.txt"), "wild weekend camping in the mountains")?;
    std::fs::write(root.join("animals.txt"), "wild animals live in the mountains")?;
    std::fs::write(root.join("brunch.txt"), "weekend brunch recipes and coffee")?;
    std::fs::write(root.join("archive/report.txt"), "quarterly revenue report for investors")?;
    std::fs::write(root.join("archive/sales.txt"), "revenue growth from weekend sales")?;
    std::fs::write(root.join("README.md"), "revenue revenue revenue")?;
    Ok(())
}

fn folder_arg(temp_dir: &TempDir) -> String {
    temp_dir.path().to_string_lossy().to_string()
}

#[test]
fn test_search_prints_percent_and_quoted_path() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let output = run_cli(&[
        "search",
        &folder_arg(&temp_dir),
        "revenue",
        "--threshold",
        "0",
        "--strategy",
        "threshold",
    ])?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(!lines.is_empty());
    assert!(lines.len() <= 5);
    for line in &lines {
        let (percent, path) = line.split_once(' ').expect("percent then path");
        assert!(percent.ends_with('%'), "bad line {line}");
        assert!(path.starts_with('"') && path.ends_with('"'), "bad line {line}");
        assert!(!path.contains("README.md"));
    }
    Ok(())
}

#[test]
fn test_search_json_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let output = run_cli(&[
        "search",
        &folder_arg(&temp_dir),
        "wild weekend",
        "-n",
        "2",
        "-t",
        "-1",
        "--format",
        "json",
    ])?;

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["query"], "wild weekend");
    assert_eq!(json["generation"], 0);
    let results = json["results"].as_array().expect("results array");
    assert!(!results.is_empty() && results.len() <= 2);
    let first = results[0]["similarity"].as_f64().expect("similarity");
    for result in results {
        assert!(result["similarity"].as_f64().expect("similarity") <= first);
        assert!(result["path"].as_str().expect("path").ends_with(".txt"));
    }
    assert!(json.get("error").is_none());
    Ok(())
}

#[test]
fn test_search_reads_folder_config() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;
    std::fs::write(temp_dir.path().join("qdox.toml"), "top_n = 1\nthreshold = -1.0\n")?;

    let output = run_cli(&["search", &folder_arg(&temp_dir), "revenue"])?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.lines().count(), 1);
    Ok(())
}

#[test]
fn test_search_fails_when_rank_exceeds_corpus() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("only.txt"), "a single lonely document")?;

    let output = run_cli(&["search", &folder_arg(&temp_dir), "lonely"])?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn test_search_rejects_invalid_pattern() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let output = run_cli(&["search", &folder_arg(&temp_dir), "revenue", "-P", "(unclosed"])?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid path pattern"));
    Ok(())
}

#[test]
fn test_search_fails_for_query_without_terms() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let output = run_cli(&["search", &folder_arg(&temp_dir), "!!! 42"])?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Query \"!!! 42\" failed"), "stderr: {stderr}");
    assert_eq!(stderr.matches("Failed to transform").count(), 1);
    Ok(())
}

#[test]
fn test_watch_keeps_going_after_failed_query() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_qdox"))
        .args(["watch", &folder_arg(&temp_dir), "-t", "-1", "-n", "1"])
        .env("RUST_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    {
        let mut stdin = child.stdin.take().expect("piped stdin");
        writeln!(stdin, "!!! 42")?;
        writeln!(stdin, "revenue")?;
    }

    let output = child.wait_with_output()?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.lines().count(), 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed"));
    Ok(())
}

#[test]
fn test_watch_answers_stdin_queries_until_eof() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_documents(&temp_dir)?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_qdox"))
        .args(["watch", &folder_arg(&temp_dir), "-t", "-1", "-n", "1"])
        .env("RUST_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    {
        let mut stdin = child.stdin.take().expect("piped stdin");
        writeln!(stdin, "revenue")?;
        writeln!(stdin)?;
        writeln!(stdin, "wild weekend")?;
    }

    let output = child.wait_with_output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 2);
    Ok(())
}

#[test]
fn test_invalid_format_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_cli(&["search", &folder_arg(&temp_dir), "q", "--format", "xml"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_help_describes_the_tool() -> Result<()> {
    let output = run_cli(&["--help"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("A CLI tool to search a folder of text documents"));
    assert!(stdout.contains("search") && stdout.contains("watch"));
    Ok(())
}
