mod cli;
mod commands;
mod file_kind;
mod logging;

use cli::{DriverParams, build_command};

/// The translator binary's own name, used to recognize invocation as the
/// translate pipeline rather than the compile pipeline.
const TRANSLATOR_NAME: &str = "tinker-translate";

fn main() {
    let bin_name = invoked_name();
    let matches = build_command(leak_name(&bin_name)).get_matches();
    let params = DriverParams::from_matches(&matches);

    logging::init(params.verbose);

    let exit_code = if bin_name == TRANSLATOR_NAME {
        commands::translate::run(&params)
    } else {
        commands::compile::run(&params)
    };

    std::process::exit(exit_code);
}

/// The file stem of `argv[0]`, which the reference driver uses to choose
/// which sub-program to run.
fn invoked_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("tinker")
        .to_string()
}

/// `clap::Command::name` wants a `'static str`; the process's own argv0
/// lives for the whole run, so leaking it once is harmless and avoids
/// threading a lifetime through `build_command`.
fn leak_name(name: &str) -> &'static str {
    Box::leak(name.to_string().into_boxed_str())
}
