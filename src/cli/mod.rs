//! CLI host commands. The engine ends at [`crate::chain`]; everything in
//! here is the presentation collaborator that calls it and renders.

pub mod catalog_cmd;
pub mod doctor;
pub mod fetch_cmd;
pub mod output;
pub mod watch_cmd;

/// Install the tracing subscriber for long-running commands.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug-level
/// engine logs and the default keeps to info.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "demanda_rt=debug"
    } else {
        "demanda_rt=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
