//! Command-line arguments shared by both binaries

use clap::Args;
use std::ffi::OsString;
use std::path::PathBuf;

/// Flags whose next token is a value, never a flag
const VALUE_FLAGS: &[&str] = &[
    "-I", "--input", "-O", "--output", "-C", "--channels", "-D", "--log-file", "--codec",
    "--config", "--frames-per-thread",
];

/// Rewrite the legacy `-XD` verbose switch to `--verbose`.
///
/// Clap would read `-XD` as `-X -D` with `-D` missing its value. A `-XD`
/// that is the value of a preceding flag (a log file named `-XD`) is left
/// alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out: Vec<OsString> = Vec::new();
    for arg in args.into_iter().map(Into::into) {
        let is_value = out
            .last()
            .and_then(|prev| prev.to_str())
            .is_some_and(|prev| VALUE_FLAGS.contains(&prev));
        if arg == "-XD" && !is_value {
            out.push(OsString::from("--verbose"));
        } else {
            out.push(arg);
        }
    }
    out
}

/// Options common to the parallel and serial decoders
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Encoded input file (concatenated fixed-size frames)
    #[arg(short = 'I', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Raw interleaved 16-bit PCM output file
    #[arg(short = 'O', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Output channels, 1 or 2 [default: 2]
    #[arg(short = 'C', long, value_parser = clap::value_parser!(u16).range(1..=2))]
    pub channels: Option<u16>,

    /// Append logs to this file instead of stderr
    #[arg(short = 'D', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Per-frame debug output (`-XD` is accepted as well)
    #[arg(short = 'X', long)]
    pub verbose: bool,

    /// Frame codec: ima-adpcm, or avccelt when built with the `avccelt`
    /// feature [default: avccelt if built in, else ima-adpcm]
    #[arg(long, value_name = "NAME")]
    pub codec: Option<String>,

    /// TOML settings file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Options only the parallel decoder takes
#[derive(Args, Debug, Clone, Default)]
pub struct ParallelArgs {
    /// Encoder frames decoded by each worker thread [default: 500]
    #[arg(long, value_name = "N")]
    pub frames_per_thread: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        parallel: ParallelArgs,
    }

    #[test]
    fn test_short_flags() {
        let cli = TestCli::try_parse_from([
            "pardec", "-I", "in.avc", "-O", "out.pcm", "-C", "1", "-D", "run.log", "-X",
        ])
        .unwrap();

        assert_eq!(cli.common.input, PathBuf::from("in.avc"));
        assert_eq!(cli.common.output, PathBuf::from("out.pcm"));
        assert_eq!(cli.common.channels, Some(1));
        assert_eq!(cli.common.log_file, Some(PathBuf::from("run.log")));
        assert!(cli.common.verbose);
        assert_eq!(cli.parallel.frames_per_thread, None);
    }

    #[test]
    fn test_long_flags() {
        let cli = TestCli::try_parse_from([
            "pardec",
            "--input",
            "in.avc",
            "--output",
            "out.pcm",
            "--frames-per-thread",
            "25",
            "--codec",
            "ima-adpcm",
        ])
        .unwrap();

        assert_eq!(cli.parallel.frames_per_thread, Some(25));
        assert_eq!(cli.common.codec.as_deref(), Some("ima-adpcm"));
        assert_eq!(cli.common.channels, None);
    }

    #[test]
    fn test_legacy_verbose_switch() {
        let args = normalize_args(["pardec", "-I", "in.avc", "-XD", "-O", "out.pcm"]);
        let cli = TestCli::try_parse_from(args).unwrap();
        assert!(cli.common.verbose);
        assert_eq!(cli.common.log_file, None);

        // Without rewriting, -XD is -X followed by a valueless -D
        assert!(TestCli::try_parse_from(["pardec", "-I", "a", "-O", "b", "-XD"]).is_err());
    }

    #[test]
    fn test_legacy_switch_kept_as_flag_value() {
        let args = normalize_args(["pardec", "-I", "a", "-O", "b", "-D", "-XD"]);
        assert_eq!(args[6], OsString::from("-XD"));
        let cli = TestCli::try_parse_from(args).unwrap();
        assert_eq!(cli.common.log_file, Some(PathBuf::from("-XD")));
        assert!(!cli.common.verbose);
    }

    #[test]
    fn test_channel_range_enforced() {
        assert!(TestCli::try_parse_from(["pardec", "-I", "a", "-O", "b", "-C", "3"]).is_err());
    }

    #[test]
    fn test_input_and_output_required() {
        assert!(TestCli::try_parse_from(["pardec", "-I", "a"]).is_err());
        assert!(TestCli::try_parse_from(["pardec", "-O", "b"]).is_err());
    }
}
