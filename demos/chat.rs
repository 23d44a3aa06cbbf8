use std::error::Error;
use std::io::{self, Write};

use dotenv::dotenv;
use legal_chat::{
    AttachmentTray, FileIngestor, FileSessionStore, GeminiClient, LegalAssistant,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();
    let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");

    println!("⚖️  Boolean Legal AI Assistant\n");

    let store = Box::new(FileSessionStore::default_location()?);
    let mut assistant = LegalAssistant::new(GeminiClient::new(api_key), store)?;
    let ingestor = FileIngestor::default();
    let mut tray = AttachmentTray::new();
    let mut web_search = false;

    println!("Commands: /attach <path>, /search (toggle web search), /new, quit");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let line = input.trim();

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            let record = ingestor.process_path(path.trim()).await;
            match tray.admit(&record.name, &record.mime_type, record.size) {
                Some(id) => {
                    let name = record.name.clone();
                    tray.resolve(&id, record);
                    match tray.errored().last() {
                        Some(bad) if bad.name == name => eprintln!(
                            "❌ {}: {}",
                            name,
                            bad.error_message.as_deref().unwrap_or("processing failed")
                        ),
                        _ => println!("📎 Attached {} ({} staged)", name, tray.len()),
                    }
                }
                None => eprintln!("❌ Attachment limit reached; remove a file first."),
            }
            continue;
        }
        if line == "/search" {
            web_search = !web_search;
            println!(
                "🔍 Web search is now {}",
                if web_search { "on" } else { "off" }
            );
            continue;
        }
        if line == "/new" {
            assistant.sessions_mut().start_new_chat();
            println!("🆕 Started a new chat.");
            continue;
        }

        println!("\nThinking...");
        let files = tray.take_ready();
        match assistant.submit_query(line, files, web_search).await {
            Ok(reply) => {
                println!("\n{}\n", reply.text);
                if !reply.sources.is_empty() {
                    println!("Sources:");
                    for (i, source) in reply.sources.iter().enumerate() {
                        println!("  {}. {} ({})", i + 1, source.title, source.uri);
                    }
                    println!();
                }
                println!("------------------------------------------------------------------");
            }
            Err(e) => {
                eprintln!("❌ Error: {}", e);
            }
        }
    }

    Ok(())
}
