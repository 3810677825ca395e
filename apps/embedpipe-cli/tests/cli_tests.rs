use std::io::Write;
use std::process::{Command, Output, Stdio};

// The fake embedder keeps these tests independent of model weights while
// exercising the full stdin -> stdout contract of the real binary.
fn run_pipeline(input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_embedpipe"))
        .env("APP_USE_FAKE_EMBEDDINGS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn embedpipe");
    child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn stderr_text(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn empty_stdin_is_a_successful_noop() {
    let out = run_pipeline("");
    assert!(out.status.success());
    assert!(out.stdout.is_empty(), "no output bytes for empty input");
}

#[test]
fn empty_array_echoes_empty_array() {
    let out = run_pipeline("[]");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "[]\n");
}

#[test]
fn batch_yields_one_unit_vector_per_input_in_order() {
    let out = run_pipeline(r#"["hello world", "goodbye moon", "hello world"]"#);
    assert!(out.status.success(), "stderr: {}", stderr_text(&out));

    let rows: Vec<Vec<f32>> = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.len(), 384);
        let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() <= 1e-3, "norm={norm}");
    }
    // Same input string, same process: identical vectors.
    assert_eq!(rows[0], rows[2]);
    assert_ne!(rows[0], rows[1]);
}

#[test]
fn output_ends_with_single_newline() {
    let out = run_pipeline(r#"["x"]"#);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout).into_owned();
    assert!(text.ends_with('\n'));
    assert_eq!(text.matches('\n').count(), 1, "exactly one line");
}

#[test]
fn non_array_json_is_rejected() {
    for input in [r#""hello""#, "42", r#"{"a":1}"#] {
        let out = run_pipeline(input);
        assert_eq!(out.status.code(), Some(1));
        assert!(out.stdout.is_empty(), "no partial output");
        let err = stderr_text(&out);
        assert!(err.contains("Error processing:"), "stderr: {err}");
        assert!(
            err.contains("Input must be a JSON array of strings"),
            "stderr: {err}"
        );
    }
}

#[test]
fn invalid_json_is_rejected() {
    let out = run_pipeline("not json");
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(stderr_text(&out).contains("Error processing:"));
}

#[test]
fn non_string_element_fails_as_processing_error() {
    let out = run_pipeline(r#"["ok", 42]"#);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(stderr_text(&out).contains("Error processing:"));
}

#[test]
fn model_load_failure_exits_before_reading_input() {
    // Run from an empty directory with no fake-embedder override and no
    // model dir anywhere the loader looks.
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let mut child = Command::new(env!("CARGO_BIN_EXE_embedpipe"))
        .current_dir(tmp.path())
        .env_remove("APP_USE_FAKE_EMBEDDINGS")
        .env_remove("APP_MODEL_DIR")
        .env_remove("MODEL_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn embedpipe");
    // The process may exit before touching stdin, so ignore a broken pipe.
    let _ = child
        .stdin
        .as_mut()
        .expect("stdin")
        .write_all(br#"["never embedded"]"#);
    let out = child.wait_with_output().expect("wait");

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let err = stderr_text(&out);
    assert!(err.contains("Error loading model:"), "stderr: {err}");
}
