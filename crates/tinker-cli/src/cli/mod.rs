mod args;
mod dispatch;

pub use dispatch::DriverParams;

use clap::Command;

/// Color output mode for diagnostics rendering.
#[derive(Clone, Copy, Debug, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::IsTerminal::is_terminal(&std::io::stdout())
                    && std::io::IsTerminal::is_terminal(&std::io::stderr())
            }
        }
    }
}

/// Builds the one flat command both `tinker` and `tinker-translate`
/// present; `bin_name` only affects the `--help` banner.
pub fn build_command(bin_name: &'static str) -> Command {
    Command::new(bin_name)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Front end and interpreter for the Tinker language")
        .bin_name(bin_name)
        .arg(args::input_arg())
        .arg(args::output_arg())
        .arg(args::compile_arg())
        .arg(args::keep_arg())
        .arg(args::verbose_arg())
        .arg(args::color_arg())
}
