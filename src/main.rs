use clap::Parser;
use flashgen::config::Command;
use flashgen::core::study::{Face, StudySession};
use flashgen::utils::{logger, validation::Validate};
use flashgen::{
    ChatCompletionClient, CliConfig, CollectionStore, Flashcard, FlashcardEngine,
    FlashcardRequest, LocalStorage, TomlConfig,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting flashgen CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let settings = match cli.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, settings).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        std::process::exit(e.severity().exit_code());
    }

    Ok(())
}

async fn run(command: Command, settings: TomlConfig) -> flashgen::Result<()> {
    let account = settings.account();
    let storage = LocalStorage::new(settings.storage_path().to_string());
    let store = CollectionStore::with_quota(storage, settings.quota);

    match command {
        Command::Generate {
            text,
            file,
            save,
            json,
        } => {
            let text = read_source_text(text, file).await?;
            let engine = FlashcardEngine::new(ChatCompletionClient::new(settings));
            let result = engine.run(&FlashcardRequest::new(text)).await?;

            if result.flashcards.is_empty() {
                eprintln!("⚠️ The model returned no usable flashcards; try again or rephrase the text");
                return Ok(());
            }

            print_cards(&result.flashcards, json)?;

            if let Some(name) = save {
                let summary = store.save(&account, &name, result.flashcards).await?;
                println!(
                    "💾 Saved collection '{}' with {} cards",
                    summary.name, summary.card_count
                );
            }
        }
        Command::List => {
            let collections = store.list(&account.user_id).await?;
            if collections.is_empty() {
                println!("No saved collections");
            }
            for collection in collections {
                println!(
                    "{}\t{} cards\t{}",
                    collection.name,
                    collection.card_count,
                    collection.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Show { name } => {
            let collection = store.load(&account.user_id, &name).await?;
            print_cards(&collection.flashcards, false)?;
        }
        Command::Study { name } => {
            let collection = store.load(&account.user_id, &name).await?;
            study(StudySession::new(collection.flashcards))?;
        }
        Command::Delete { name } => {
            store.delete(&account.user_id, &name).await?;
            println!("🗑️ Deleted collection '{}'", name);
        }
    }

    Ok(())
}

async fn read_source_text(text: Option<String>, file: Option<PathBuf>) -> flashgen::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(tokio::fs::read_to_string(path).await?);
    }

    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;
    Ok(buffer)
}

fn print_cards(cards: &[Flashcard], json: bool) -> flashgen::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(cards)?);
        return Ok(());
    }

    for (i, card) in cards.iter().enumerate() {
        println!("{:>2}. Q: {}", i + 1, card.front);
        println!("    A: {}", card.back);
    }
    Ok(())
}

fn study(mut session: StudySession) -> flashgen::Result<()> {
    if session.is_empty() {
        println!("This collection has no cards");
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let label = match session.visible_face() {
            Some(Face::Back) => "A",
            _ => "Q",
        };
        println!(
            "[{}/{}] {}: {}",
            session.position() + 1,
            session.len(),
            label,
            session.visible_text().unwrap_or_default()
        );
        print!("(enter) flip  (n)ext  (p)revious  (q)uit > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match line?.trim() {
            "" | "f" => {
                session.flip();
            }
            "n" => {
                if !session.next() {
                    println!("🎉 End of collection");
                    break;
                }
            }
            "p" => {
                session.previous();
            }
            "q" => break,
            other => println!("Unknown command '{}'", other),
        }
    }

    Ok(())
}
