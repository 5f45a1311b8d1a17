use is_terminal::IsTerminal;

fn main() {
    // Reset SIGPIPE to default behavior to prevent panic on broken pipe
    // (e.g., when piping to `head` or `less` that exits early)
    #[cfg(unix)]
    reset_sigpipe();

    if let Err(e) = octl::run() {
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.print().ok();
            std::process::exit(clap_err.exit_code());
        }
        let colorize = std::io::stderr().is_terminal();
        octl::diagnostics::error(colorize, format!("{e:#}"));
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
