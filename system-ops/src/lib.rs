pub mod shell;
pub mod traits;

use traits::SystemOps;

/// The real, shelling-out implementation used by the binary.
#[must_use]
pub fn make_shell_ops() -> Box<dyn SystemOps<Error = anyhow::Error>> {
    Box::new(shell::ShellOps::new())
}
