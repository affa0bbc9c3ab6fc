//! The docsync command-line executable.

mod app;
mod cli;

fn main() -> std::process::ExitCode {
    app::run()
}
