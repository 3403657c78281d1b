//! Failure reporting for the replay harness

use std::process::ExitCode;

pub type CliResult<T> = anyhow::Result<T>;

/// Malformed request script (sysexits `EX_DATAERR`)
pub const EXIT_BAD_SCRIPT: u8 = 65;
/// Script or output file could not be read or written (`EX_IOERR`)
pub const EXIT_IO: u8 = 74;
/// Invalid or unreadable pool configuration (`EX_CONFIG`)
pub const EXIT_CONFIG: u8 = 78;

/// Classify a failure by the first recognised error in its cause chain
pub fn exit_status(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if cause.downcast_ref::<ipc_echo::Error>().is_some() {
            return EXIT_CONFIG;
        }
        if cause.downcast_ref::<serde_json::Error>().is_some()
            || cause.downcast_ref::<rmp_serde::decode::Error>().is_some()
        {
            return EXIT_BAD_SCRIPT;
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return EXIT_IO;
        }
    }
    1
}

/// Report a failed run on stderr and pick the process exit code
pub fn to_exit_code(result: CliResult<()>) -> ExitCode {
    let Err(error) = result else {
        return ExitCode::SUCCESS;
    };

    let status = exit_status(&error);
    tracing::debug!(status, "replay harness failed");
    eprintln!("ipc-echo: {error:#}");
    ExitCode::from(status)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_config_error_maps_to_config_status() {
        let error = anyhow::Error::new(ipc_echo::Error::Config("bad".to_string()))
            .context("failed to load config pools.toml");
        assert_eq!(exit_status(&error), EXIT_CONFIG);
    }

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = anyhow::Error::new(ipc_echo::Error::Io(io)).context("failed to load config");
        assert_eq!(exit_status(&error), EXIT_CONFIG);
    }

    #[test]
    fn test_decode_error_maps_to_bad_script() {
        let result: CliResult<Vec<u8>> = serde_json::from_str::<Vec<u8>>("[1,")
            .context("invalid JSON script demo.json");
        assert_eq!(exit_status(&result.unwrap_err()), EXIT_BAD_SCRIPT);
    }

    #[test]
    fn test_unclassified_error_is_generic_failure() {
        let error = anyhow::anyhow!("batch size must be at least 1");
        assert_eq!(exit_status(&error), 1);
    }
}
