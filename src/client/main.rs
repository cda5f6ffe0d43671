//! Keyvo Client CLI

use clap::Parser;
use keyvo::protocol::{Codec, Command, Limits, Reply};
use keyvo::{Result, UdpClient};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to send requests to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// How long to wait for each reply, in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Run a single command (e.g. `GET x`) instead of the interactive prompt
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let client = UdpClient::connect(&args.server).await?;
    let mut client = client.with_timeout(Duration::from_millis(args.timeout_ms));

    if !args.command.is_empty() {
        let command = parse_user_input(&args.command.join(" "))?;
        let reply = client.execute(&command).await?;
        print_reply(&reply);
        return Ok(reply.is_ok());
    }

    println!("Keyvo Client");
    println!("Sending to {}", args.server);
    repl(&mut client).await?;
    println!("Goodbye!");
    Ok(true)
}

async fn repl(client: &mut UdpClient) -> Result<()> {
    loop {
        print!("keyvo> ");
        io::stdout().flush()?;

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match parse_user_input(input) {
                    Ok(command) => match client.execute(&command).await {
                        Ok(reply) => print_reply(&reply),
                        Err(e) => eprintln!("Error: {}", e),
                    },
                    Err(e) => eprintln!("Parse error: {}", e),
                }
            }
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Check verb and arguments only; the server enforces its own size limits
fn parse_user_input(input: &str) -> Result<Command> {
    Ok(Codec::decode_line(input, &Limits::UNBOUNDED)?)
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Ok(None) => println!("OK"),
        Reply::Ok(Some(value)) => println!("\"{}\"", value),
        Reply::NotFound => println!("(not found)"),
        Reply::AlreadyExists => println!("(error) key already exists"),
        Reply::Malformed => println!("(error) malformed request"),
        Reply::InternalError => println!("(error) server internal error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyvo::Error;

    #[test]
    fn long_keys_and_values_are_left_to_the_server() {
        let key = "k".repeat(1_000);
        let value = "v".repeat(3_000);

        let command = parse_user_input(&format!("DEFINE {} {}", key, value)).unwrap();
        assert_eq!(command, Command::Define { key, value });
    }

    #[test]
    fn malformed_input_is_rejected_locally() {
        assert!(matches!(parse_user_input("GET"), Err(Error::Decode(_))));
        assert!(matches!(parse_user_input("SET a 1"), Err(Error::Decode(_))));
    }
}
