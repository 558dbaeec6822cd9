//! Tests for ProvisionService and command dispatch

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tempfile::TempDir;

use ocrdeploy::application::services::ProvisionService;
use ocrdeploy::application::ApplicationError;
use ocrdeploy::cli::args::{Cli, Commands};
use ocrdeploy::cli::args::USAGE_HINT;
use ocrdeploy::cli::commands::{dispatch, execute_command, fallback_message};
use ocrdeploy::cli::CliError;
use ocrdeploy::config::Settings;
use ocrdeploy::domain::{DomainError, ProvisionStep};
use ocrdeploy::infrastructure::di::ServiceContainer;
use ocrdeploy::infrastructure::traits::{CommandRunner, RealFileSystem};
use ocrdeploy::util::testing;

/// Mock runner that records every invocation instead of running it
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<(String, Vec<OsString>)>>,
    stdout: String,
    exit_status: Option<ExitStatus>,
    spawn_fails: bool,
}

impl RecordingRunner {
    fn new() -> Self {
        Self::default()
    }

    fn with_stdout(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    fn spawn_failing() -> Self {
        Self {
            spawn_fails: true,
            ..Self::default()
        }
    }

    /// Recorded calls with arguments converted for easy comparison.
    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.raw_calls()
            .into_iter()
            .map(|(cmd, args)| {
                let args = args
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned())
                    .collect();
                (cmd, args)
            })
            .collect()
    }

    fn raw_calls(&self) -> Vec<(String, Vec<OsString>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, cmd: &str, args: &[OsString]) -> io::Result<ExitStatus> {
        self.calls
            .lock()
            .unwrap()
            .push((cmd.to_string(), args.to_vec()));
        if self.spawn_fails {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }
        Ok(self.exit_status.unwrap_or_default())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &str, args: &[OsString]) -> io::Result<Output> {
        let status = self.record(cmd, args)?;
        Ok(Output {
            status,
            stdout: self.stdout.as_bytes().to_vec(),
            stderr: b"permission denied".to_vec(),
        })
    }

    fn run_inherited(&self, cmd: &str, args: &[OsString]) -> io::Result<ExitStatus> {
        self.record(cmd, args)
    }
}

fn test_settings(project_id: Option<&str>) -> Settings {
    Settings {
        project_id: project_id.map(String::from),
        region: "us-central1".into(),
        source_dir: PathBuf::from("functions"),
        gcloud: "gcloud".into(),
    }
}

fn service_with(runner: Arc<RecordingRunner>, project_id: Option<&str>) -> ProvisionService {
    testing::init_test_setup();
    ProvisionService::new(
        Arc::new(RealFileSystem),
        runner,
        Arc::new(test_settings(project_id)),
    )
}

fn subcommand(args: &[String]) -> String {
    args.iter().take(3).cloned().collect::<Vec<_>>().join(" ")
}

// ============================================================
// processPhoto
// ============================================================

#[test]
fn given_existing_photo_when_processing_then_uploads_once_to_images_bucket() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("bill.jpg");
    std::fs::write(&photo, b"jpeg").unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    let report = service.process_photo(Some(photo.as_path())).unwrap();

    // Assert
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "gcloud");
    assert_eq!(
        calls[0].1,
        vec![
            "storage".to_string(),
            "cp".to_string(),
            photo.display().to_string(),
            "gs://utilityimages".to_string(),
            "--project=my-proj".to_string(),
        ]
    );
    assert!(report.all_succeeded());
}

#[cfg(unix)]
#[test]
fn given_non_utf8_photo_name_when_processing_then_path_passed_byte_for_byte() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    // Arrange
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join(OsStr::from_bytes(b"bill\xff.jpg"));
    std::fs::write(&photo, b"jpeg").unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    service.process_photo(Some(photo.as_path())).unwrap();

    // Assert
    let calls = runner.raw_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1[2].as_os_str(), photo.as_os_str());
    assert!(PathBuf::from(&calls[0].1[2]).exists());
}

#[test]
fn given_missing_photo_when_processing_then_no_calls_and_file_does_not_exist() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.jpg");
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    let err = service.process_photo(Some(missing.as_path())).unwrap_err();

    // Assert
    assert!(runner.calls().is_empty());
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::FileNotFound(_))
    ));
    assert_eq!(err.to_string(), "File does not exist.");
}

#[test]
fn given_directory_instead_of_photo_when_processing_then_rejected() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    let err = service.process_photo(Some(temp.path())).unwrap_err();

    assert!(runner.calls().is_empty());
    assert_eq!(err.to_string(), "File does not exist.");
}

#[test]
fn given_no_path_when_processing_then_file_does_not_exist() {
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    let err = service.process_photo(None).unwrap_err();

    assert!(runner.calls().is_empty());
    assert_eq!(err.to_string(), "File does not exist.");
}

// ============================================================
// initializeGCloud / compileCloudFunctions
// ============================================================

#[test]
fn given_project_when_initializing_then_buckets_topic_and_functions_in_order() {
    // Arrange
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    let report = service.initialize().unwrap();

    // Assert
    let calls = runner.calls();
    let heads: Vec<String> = calls.iter().map(|(_, a)| subcommand(a)).collect();
    assert_eq!(
        heads,
        vec![
            "storage buckets create",
            "storage buckets create",
            "storage buckets create",
            "pubsub topics create",
            "functions deploy ocr-extract",
            "functions deploy ocr-save",
        ]
    );
    let buckets: Vec<&str> = calls[..3].iter().map(|(_, a)| a[3].as_str()).collect();
    assert_eq!(
        buckets,
        vec![
            "gs://utilityimages",
            "gs://utilityprocessedimages",
            "gs://utilityresults"
        ]
    );
    assert_eq!(calls[3].1[3], "UtilityResults");
    assert_eq!(report.outcomes.len(), 6);
}

#[test]
fn given_project_when_compiling_then_only_two_deployments() {
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), Some("my-proj"));

    service.compile_functions().unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls
        .iter()
        .all(|(_, a)| a[0] == "functions" && a[1] == "deploy"));
    assert!(!calls
        .iter()
        .any(|(_, a)| a[0] == "storage" || a[0] == "pubsub"));
}

#[test]
fn given_any_project_when_deploying_then_trigger_bindings_never_vary() {
    for project in ["alpha", "beta-123"] {
        let runner = Arc::new(RecordingRunner::new());
        let service = service_with(runner.clone(), Some(project));

        service.compile_functions().unwrap();

        let calls = runner.calls();
        assert!(calls[0]
            .1
            .contains(&"--trigger-bucket=utilityimages".to_string()));
        assert!(calls[1]
            .1
            .contains(&"--trigger-topic=UtilityResults".to_string()));
        assert!(calls[0]
            .1
            .iter()
            .any(|a| a.starts_with("--set-env-vars=") && a.contains(&format!("GCP_PROJECT={project}"))));
    }
}

#[test]
fn given_no_project_when_initializing_then_config_error_and_no_calls() {
    let runner = Arc::new(RecordingRunner::new());
    let service = service_with(runner.clone(), None);

    let err = service.initialize().unwrap_err();

    assert!(matches!(err, ApplicationError::ProjectNotConfigured));
    assert!(runner.calls().is_empty());
}

#[cfg(unix)]
#[test]
fn given_remote_failures_when_initializing_then_continues_and_reports() {
    use std::os::unix::process::ExitStatusExt;

    // Arrange: every gcloud call exits 1
    let runner = Arc::new(RecordingRunner {
        exit_status: Some(ExitStatus::from_raw(1 << 8)),
        ..RecordingRunner::default()
    });
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    let report = service.initialize().unwrap();

    // Assert
    assert_eq!(runner.calls().len(), 6);
    assert_eq!(report.failed().count(), 6);
    assert_eq!(report.outcomes[0].exit_code, Some(1));
}

#[test]
fn given_gcloud_missing_when_initializing_then_aborts_after_first_step() {
    let runner = Arc::new(RecordingRunner::spawn_failing());
    let service = service_with(runner.clone(), Some("my-proj"));

    let err = service.initialize().unwrap_err();

    assert!(matches!(err, ApplicationError::CommandSpawn { .. }));
    assert_eq!(runner.calls().len(), 1);
}

// ============================================================
// fetchResult
// ============================================================

#[test]
fn given_stored_result_when_fetching_then_reads_stem_json_from_results_bucket() {
    // Arrange
    let runner = Arc::new(RecordingRunner::with_stdout(
        r#"{"house_number": "1234", "renew_size": "3/4"}"#,
    ));
    let service = service_with(runner.clone(), Some("my-proj"));

    // Act
    let value = service.fetch_result("bill.photo.jpg").unwrap().unwrap();

    // Assert
    assert_eq!(value["house_number"], "1234");
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        vec![
            "storage",
            "cat",
            "gs://utilityresults/bill.json",
            "--project=my-proj"
        ]
    );
}

#[test]
fn given_empty_object_when_fetching_then_none() {
    let runner = Arc::new(RecordingRunner::with_stdout("  \n"));
    let service = service_with(runner, Some("my-proj"));

    assert!(service.fetch_result("bill.jpg").unwrap().is_none());
}

#[test]
fn given_garbage_object_when_fetching_then_invalid_result() {
    let runner = Arc::new(RecordingRunner::with_stdout("not json"));
    let service = service_with(runner, Some("my-proj"));

    let err = service.fetch_result("bill.jpg").unwrap_err();

    assert!(matches!(err, ApplicationError::InvalidResult { .. }));
}

#[cfg(unix)]
#[test]
fn given_read_failure_when_fetching_then_command_failed_with_stderr() {
    use std::os::unix::process::ExitStatusExt;

    let runner = Arc::new(RecordingRunner {
        exit_status: Some(ExitStatus::from_raw(1 << 8)),
        ..RecordingRunner::default()
    });
    let service = service_with(runner, Some("my-proj"));

    let err = service.fetch_result("bill.jpg").unwrap_err();

    match err {
        ApplicationError::CommandFailed {
            message, exit_code, ..
        } => {
            assert_eq!(message, "permission denied");
            assert_eq!(exit_code, Some(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================
// Dispatch
// ============================================================

fn container_with(runner: Arc<RecordingRunner>, project_id: Option<&str>) -> ServiceContainer {
    testing::init_test_setup();
    ServiceContainer::with_deps(test_settings(project_id), Arc::new(RealFileSystem), runner)
}

#[test]
fn given_unknown_subcommand_when_dispatching_then_no_calls_and_ok() {
    // Arrange
    let cli = Cli::try_parse_from(["ocrdeploy", "deployEverything"]).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let container = container_with(runner.clone(), None);

    // Act
    let result = dispatch(&cli, &container);

    // Assert
    assert!(result.is_ok());
    assert!(runner.calls().is_empty());
    assert_eq!(
        fallback_message(Some("deployEverything")),
        format!("deployEverything\n{USAGE_HINT}")
    );
}

#[test]
fn given_no_subcommand_when_dispatching_then_ok_without_calls() {
    let cli = Cli::try_parse_from(["ocrdeploy"]).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let container = container_with(runner.clone(), None);

    assert!(dispatch(&cli, &container).is_ok());
    assert!(runner.calls().is_empty());
}

#[test]
fn given_missing_photo_when_dispatching_then_noinput_exit_code() {
    let cli = Cli::try_parse_from(["ocrdeploy", "processPhoto", "/definitely/not/here.jpg"]).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let container = container_with(runner.clone(), Some("p"));

    let err = dispatch(&cli, &container).unwrap_err();

    assert_eq!(err.exit_code(), ocrdeploy::exitcode::NOINPUT);
    assert_eq!(err.to_string(), "File does not exist.");
    assert!(runner.calls().is_empty());
}

#[test]
fn given_compile_command_when_dispatching_then_two_deploys() {
    let cli = Cli::try_parse_from(["ocrdeploy", "compileCloudFunctions"]).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let container = container_with(runner.clone(), Some("p"));

    dispatch(&cli, &container).unwrap();

    assert_eq!(runner.calls().len(), 2);
}

#[test]
fn given_stored_result_when_dispatching_fetch_then_printed_without_error() {
    let cli = Cli::try_parse_from(["ocrdeploy", "fetchResult", "bill.jpg"]).unwrap();
    let runner = Arc::new(RecordingRunner::with_stdout(r#"{"total": 12.5, "lines": ["a"]}"#));
    let container = container_with(runner.clone(), Some("p"));

    let result = dispatch(&cli, &container);

    assert!(result.is_ok(), "fetch failed: {result:?}");
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn given_no_project_when_dispatching_initialize_then_config_exit_code() {
    let cli = Cli::try_parse_from(["ocrdeploy", "initializeGCloud"]).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let container = container_with(runner.clone(), None);

    let err = dispatch(&cli, &container).unwrap_err();

    assert!(matches!(err, CliError::Infra(_)));
    assert_eq!(err.exit_code(), ocrdeploy::exitcode::CONFIG);
    assert!(runner.calls().is_empty());
}

// ============================================================
// config init
// ============================================================

#[test]
fn given_broken_local_config_when_forcing_init_then_template_rewritten() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ocrdeploy.toml");
    std::fs::write(&path, "project_id = [").unwrap();
    let dir = temp.path().to_str().unwrap();
    let cli =
        Cli::try_parse_from(["ocrdeploy", "-C", dir, "config", "init", "--force"]).unwrap();
    testing::init_test_setup();

    // Act
    let result = execute_command(&cli);

    // Assert
    assert!(result.is_ok(), "init failed: {result:?}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), Settings::template());
}

#[test]
fn given_broken_local_config_when_showing_path_then_ok() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("ocrdeploy.toml"), "project_id = [").unwrap();
    let dir = temp.path().to_str().unwrap();
    let cli = Cli::try_parse_from(["ocrdeploy", "-C", dir, "config", "path"]).unwrap();
    testing::init_test_setup();

    assert!(execute_command(&cli).is_ok());
}

#[test]
fn given_project_dir_is_a_file_when_initializing_config_then_ioerr() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let not_a_dir = temp.path().join("file.txt");
    std::fs::write(&not_a_dir, "x").unwrap();
    let dir = not_a_dir.to_str().unwrap();
    let cli = Cli::try_parse_from(["ocrdeploy", "-C", dir, "config", "init"]).unwrap();
    testing::init_test_setup();

    // Act
    let err = execute_command(&cli).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), ocrdeploy::exitcode::IOERR);
    assert!(err.to_string().starts_with("I/O error: create config directory"), "{err}");
}

#[test]
fn given_create_steps_then_upload_target_is_images_bucket() {
    let step = ocrdeploy::domain::upload_step(std::path::Path::new("x.jpg"));
    assert!(matches!(
        step,
        ProvisionStep::UploadObject { ref bucket, .. } if bucket == "utilityimages"
    ));
}

// ============================================================
// Argument parsing
// ============================================================

#[test]
fn given_project_flag_and_photo_when_parsing_then_both_captured() {
    let cli = Cli::try_parse_from(["ocrdeploy", "-p", "proj", "processPhoto", "a.jpg"]).unwrap();

    assert_eq!(cli.project.as_deref(), Some("proj"));
    match cli.command {
        Some(Commands::ProcessPhoto { file }) => assert_eq!(file, Some(PathBuf::from("a.jpg"))),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn given_kebab_alias_when_parsing_then_maps_to_same_command() {
    let cli = Cli::try_parse_from(["ocrdeploy", "compile-functions"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::CompileCloudFunctions)));

    let cli = Cli::try_parse_from(["ocrdeploy", "initialize"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::InitializeGCloud)));
}

#[test]
fn given_unrecognized_word_when_parsing_then_unknown_keeps_value() {
    let cli = Cli::try_parse_from(["ocrdeploy", "resizeAll", "extra"]).unwrap();
    match cli.command {
        Some(Commands::Unknown(args)) => {
            assert_eq!(args[0], "resizeAll");
            assert_eq!(args.len(), 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
