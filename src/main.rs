use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    jira_manager::cli::run().await
}
