//! Interactive chat loop on top of `Conversation`.
//!
//! ```text
//! MISTRAL_API_KEY=... cargo run --example chat -- image pixtral-12b-2409
//! > What is in this picture? | ./photo.png
//! ```
//!
//! Type `/history` to print the conversation, `/clear` to forget it and
//! `/quit` to leave.

use std::io::{self, BufRead, Write};
use std::path::Path;

use parley::{Conversation, ModelCatalog, Modality};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("MISTRAL_API_KEY").expect("MISTRAL_API_KEY must be set");

    let mut args = std::env::args().skip(1);
    let modality: Modality = args.next().as_deref().unwrap_or("text").parse()?;
    let model = match args.next() {
        Some(model) => model,
        None => ModelCatalog::mistral()
            .default_model(modality)
            .unwrap_or_default()
            .to_string(),
    };

    let mut conversation = Conversation::new(api_key, modality.as_str(), &model)?;
    println!("Chatting with {} ({} mode). /quit to exit.", model, modality);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                conversation.clear_history();
                println!("History cleared.");
                continue;
            }
            "/history" => {
                for message in conversation.history() {
                    println!("[{}] {}", message.role(), message.content());
                }
                continue;
            }
            input => {
                let (text, attachment) = match input.split_once('|') {
                    Some((text, path)) => (text.trim(), Some(Path::new(path.trim()))),
                    None => (input, None),
                };

                match conversation.ask(text, attachment).await {
                    Ok(reply) => println!("{}", reply.content()),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
    }

    Ok(())
}
