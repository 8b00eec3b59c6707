use std::io::Write;

use clap::CommandFactory;
use clap_complete::{Shell, generate};

/// Write the completion script for `shell` to `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = crate::cli::Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_output() {
        let mut buf = Vec::new();
        write_completions(Shell::Zsh, &mut buf);
        let script = String::from_utf8_lossy(&buf);
        assert!(script.contains("dockdb"));
        assert!(script.contains("--non-interactive"));
    }
}
