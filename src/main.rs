fn main() -> std::process::ExitCode {
    handoff::app::startup::startup()
}
