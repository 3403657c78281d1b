use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, ensure};
use ipc_echo::ipc::{CommandHandle, EchoRequest, EchoResponse, Transcript};
use ipc_echo::{EchoConfig, EchoServer};
use serde_json::{Value, json};

use crate::cli::ReplayArgs;
use crate::error::CliResult;

pub fn execute(args: ReplayArgs, config: EchoConfig) -> CliResult<()> {
    ensure!(args.batch > 0, "batch size must be at least 1");

    let requests = load_script(&args.script)?;
    tracing::info!(
        script = %args.script.display(),
        requests = requests.len(),
        batch = args.batch,
        "replaying script"
    );

    let mut server = EchoServer::with_config(config);
    if args.subscribe {
        server.add_echo_event_handler(|cookie| tracing::info!(cookie, "echo event"));
        server.add_echo_complex_event_handler(|cookie, cookie_string, cookie_array| {
            tracing::info!(cookie, cookie_string, ?cookie_array, "echo complex event");
        });
    }

    let mut transcript = Transcript::new();
    let mut out = io::stdout().lock();
    let mut pending = requests.into_iter().enumerate().peekable();

    while pending.peek().is_some() {
        for (id, request) in pending.by_ref().take(args.batch) {
            server.dispatch(CommandHandle::new(id as u64), request);
        }
        server.drain(&mut transcript);

        for (id, response) in transcript.take() {
            writeln!(out, "{}", response_line(id, &response)?)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// One output line: `{"id": .., "response": ..}`
///
/// Doubles also carry their raw bits, and non-finite values are written as
/// strings (`"NaN"`, `"inf"`, `"-inf"`) since JSON has no literal for them.
fn response_line(id: u64, response: &EchoResponse) -> CliResult<Value> {
    let mut body = serde_json::to_value(response)?;
    if let EchoResponse::EchoDouble(value) = response {
        body["bits"] = Value::String(format!("{:#018x}", value.to_bits()));
        if !value.is_finite() {
            body["value"] = Value::String(value.to_string());
        }
    }
    Ok(json!({ "id": id, "response": body }))
}

fn load_script(path: &Path) -> CliResult<Vec<EchoRequest>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let requests: Vec<EchoRequest> = if path.extension().is_some_and(|ext| ext == "msgpack") {
        rmp_serde::from_slice(&bytes)
            .with_context(|| format!("invalid MessagePack script {}", path.display()))?
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("invalid JSON script {}", path.display()))?
    };
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response_line() {
        let line = response_line(4, &EchoResponse::EchoSimple(-3)).unwrap();
        assert_eq!(
            line,
            json!({"id": 4, "response": {"method": "echo_simple", "value": -3}})
        );
    }

    #[test]
    fn test_finite_double_keeps_number_and_bits() {
        let line = response_line(0, &EchoResponse::EchoDouble(-0.0)).unwrap();
        assert_eq!(line["response"]["value"], json!(-0.0));
        assert_eq!(line["response"]["bits"], "0x8000000000000000");
    }

    #[test]
    fn test_non_finite_double_is_not_null() {
        let nan = f64::from_bits(0x7ff8_0000_0000_beef);
        let line = response_line(1, &EchoResponse::EchoDouble(nan)).unwrap();
        assert_eq!(line["response"]["value"], "NaN");
        assert_eq!(line["response"]["bits"], "0x7ff800000000beef");

        let line = response_line(2, &EchoResponse::EchoDouble(f64::NEG_INFINITY)).unwrap();
        assert_eq!(line["response"]["value"], "-inf");
        assert_eq!(line["response"]["bits"], "0xfff0000000000000");
    }
}
