use anyhow::Result;
use clap::Parser;
use cliclack::{input, spinner};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use magpie::agent::Agent;
use magpie::concierge::{RecordUnknownQuestion, RecordUserDetails};
use magpie::models::message::Message;
use magpie::notify::{NotificationSink, PushoverSink};
use magpie::persona::Persona;
use magpie::providers::configs::OpenAiProviderConfig;
use magpie::providers::openai::OpenAiProvider;
use magpie::registry::ToolRegistry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model to use (overrides MAGPIE_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Completion host (overrides MAGPIE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Directory holding summary.txt and profile.txt
    #[arg(long, default_value = "resources")]
    resources: PathBuf,

    /// Name the persona answers as
    #[arg(long, default_value = "Sora")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = OpenAiProviderConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    let provider = Box::new(OpenAiProvider::new(config)?);

    let persona = Persona::load(&cli.resources, &cli.name)?;
    let system_prompt = persona.system_prompt()?;

    let sink: Arc<dyn NotificationSink> = Arc::new(PushoverSink::from_env()?);
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(RecordUserDetails::new(sink.clone())))?;
    registry.register(Box::new(RecordUnknownQuestion::new(sink)))?;

    let agent = Agent::new(provider, Arc::new(registry), system_prompt);

    println!(
        "Chatting with {} {}",
        persona.name,
        style("- type \"exit\" to end the session").dim()
    );
    println!();

    let mut history: Vec<Message> = Vec::new();

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;

        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");

        match agent.reply(&message_text, &history).await {
            Ok(answer) => {
                spin.stop("");
                println!("{}", answer);
                println!();
                history.push(Message::user().with_text(&message_text));
                history.push(Message::assistant().with_text(&answer));
            }
            Err(e) => {
                // Turn failed; history stays as it was before this message.
                spin.stop("");
                eprintln!("{} {}", style("error:").red().bold(), e);
            }
        }
    }

    Ok(())
}
