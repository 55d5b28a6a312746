use super::*;

/// `sh -c <script> sh <task id>`: the task id becomes `$1`.
fn shell(script: &str) -> CommandExecutor {
    CommandExecutor::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "sh".to_string()],
    )
}

#[test]
fn test_command_line() {
    let executor = CommandExecutor::from_config(&RunnerConfig::default());
    assert_eq!(executor.program(), "drush");
    assert_eq!(
        executor.command_line(TaskId::new(42)),
        vec!["drush", "@hostmaster", "hosting-task", "42"]
    );
}

#[tokio::test]
async fn test_execute_success() {
    let executor = shell("exit 0");
    assert!(executor.execute(TaskId::new(1)).await.is_ok());
}

#[tokio::test]
async fn test_execute_failure_reports_exit_code() {
    let executor = shell("exit 3");
    let err = executor.execute(TaskId::new(101)).await.unwrap_err();
    match err {
        ExecutorError::TaskFailed { task, code } => {
            assert_eq!(task, TaskId::new(101));
            assert_eq!(code, Some(3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_task_id_is_passed_as_last_argument() {
    // Succeeds only for the task id 102.
    let executor = shell("test \"$1\" = 102");
    assert!(executor.execute(TaskId::new(102)).await.is_ok());
    assert!(executor.execute(TaskId::new(101)).await.is_err());
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let executor = CommandExecutor::new("/nonexistent/drushqueued/drush", Vec::new());
    let err = executor.execute(TaskId::new(5)).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Spawn { .. }));
    assert_eq!(err.task(), TaskId::new(5));
}
