//! coach-chat CLI — 对话、流式输出与空闲时段查询的命令行工具
//!
//! Usage:
//!   coach-chat ask <message> [--model <m>] [--system <s>]     One-shot reply
//!   coach-chat stream <message> [--model <m>] [--system <s>]  Stream the reply to stdout
//!   coach-chat slots <start> <end> [--min <minutes>] [--busy <start>/<end>]...
//!   coach-chat key set <secret> | key delete                   Manage the keychain entry

use std::io::Write;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use coach_chat::credentials::{
    CredentialProvider, EnvCredentialProvider, KeyringCredentialStore,
};
use coach_chat::{find_free_slots, suggest_title, BusyEvent, ChatClient, ChatTurn, ClientConfig};

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coach_chat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "ask" => cmd_ask(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "slots" => cmd_slots(&args[2..]),
        "key" => cmd_key(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("coach-chat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"coach-chat — 对话客户端命令行工具

USAGE:
    coach-chat <COMMAND> [OPTIONS]

COMMANDS:
    ask <message>               Send one message and print the reply
    stream <message>            Stream the reply as it is generated
    slots <start> <end>         List free slots between two RFC 3339 times
    key set <secret>            Store the API key in the OS keychain
    key delete                  Remove the stored API key
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --model <name>              Model identifier (default: {DEFAULT_MODEL})
    --system <prompt>           System prompt
    --max-tokens <n>            Output token limit (default: {DEFAULT_MAX_TOKENS})
    --min <minutes>             Minimum slot length for `slots` (default: 30)
    --busy <start>/<end>        Busy block for `slots`, repeatable

ENVIRONMENT:
    ANTHROPIC_API_KEY           API key, preferred over the keychain entry
    COACH_CHAT_ENDPOINT         Message endpoint URL
    COACH_CHAT_MAX_RETRIES      Retries for 5xx responses
    RUST_LOG                    Log filter (default: coach_chat=info)"#
    );
}

/// Value following `--name`, if present.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = true;
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn build_client() -> anyhow::Result<ChatClient> {
    let config = ClientConfig::from_env().context("invalid COACH_CHAT_* configuration")?;
    let builder = ChatClient::builder().config(config);
    let builder = if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        builder.credentials(EnvCredentialProvider::default())
    } else {
        builder.credentials(KeyringCredentialStore::default())
    };
    Ok(builder.build()?)
}

struct ChatArgs<'a> {
    message: &'a str,
    model: &'a str,
    system: Option<&'a str>,
    max_tokens: u32,
}

fn chat_args(args: &[String]) -> anyhow::Result<ChatArgs<'_>> {
    let message = positional(args)
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("missing <message>"))?;
    let max_tokens = match flag(args, "--max-tokens") {
        Some(n) => n.parse().context("--max-tokens must be a positive integer")?,
        None => DEFAULT_MAX_TOKENS,
    };
    Ok(ChatArgs {
        message,
        model: flag(args, "--model").unwrap_or(DEFAULT_MODEL),
        system: flag(args, "--system"),
        max_tokens,
    })
}

async fn cmd_ask(args: &[String]) -> anyhow::Result<()> {
    let chat = chat_args(args)?;
    let client = build_client()?;
    match client
        .send(chat.message, chat.system, chat.model, chat.max_tokens)
        .await
    {
        Ok(reply) => {
            println!("{}", reply.text_content);
            Ok(())
        }
        Err(e) => bail!("{} ({})", e.user_message(), e),
    }
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    let chat = chat_args(args)?;
    let client = build_client()?;

    if let Some(title) = suggest_title(&client, chat.message, chat.model).await {
        eprintln!("# {title}");
    }

    let turns = [ChatTurn::user(chat.message)];
    let mut stream = client.stream_conversation(&turns, chat.system, chat.model, chat.max_tokens);
    let mut stdout = std::io::stdout();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                stdout.write_all(chunk.as_bytes())?;
                stdout.flush()?;
            }
            Err(e) => {
                println!();
                bail!("{} ({})", e.user_message(), e);
            }
        }
    }
    println!();
    Ok(())
}

fn parse_time(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid RFC 3339 time: {raw}"))?
        .with_timezone(&Utc))
}

fn cmd_slots(args: &[String]) -> anyhow::Result<()> {
    let pos = positional(args);
    let (start, end) = match pos.as_slice() {
        [start, end, ..] => (parse_time(start)?, parse_time(end)?),
        _ => bail!("usage: slots <start> <end> [--min <minutes>] [--busy <start>/<end>]..."),
    };
    let min = match flag(args, "--min") {
        Some(m) => Duration::minutes(m.parse().context("--min must be a whole number of minutes")?),
        None => Duration::minutes(30),
    };

    let mut busy = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if arg != "--busy" {
            continue;
        }
        let raw = args
            .get(i + 1)
            .ok_or_else(|| anyhow!("--busy needs <start>/<end>"))?;
        let (s, e) = raw
            .split_once('/')
            .ok_or_else(|| anyhow!("--busy needs <start>/<end>, got {raw}"))?;
        busy.push(BusyEvent::new(parse_time(s)?, parse_time(e)?));
    }

    for slot in find_free_slots(&busy, start, end, min) {
        println!(
            "{} - {} ({} min)",
            slot.start().to_rfc3339(),
            slot.end().to_rfc3339(),
            slot.duration().num_minutes()
        );
    }
    Ok(())
}

async fn cmd_key(args: &[String]) -> anyhow::Result<()> {
    let store = KeyringCredentialStore::default();
    match args.first().map(String::as_str) {
        Some("set") => {
            let secret = args.get(1).ok_or_else(|| anyhow!("missing <secret>"))?;
            store.set(secret).await?;
            println!("API key stored");
        }
        Some("delete") => {
            if store.delete().await? {
                println!("API key removed");
            } else {
                println!("no API key was stored");
            }
        }
        _ => bail!("usage: key set <secret> | key delete"),
    }
    Ok(())
}
