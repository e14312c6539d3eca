use std::sync::Arc;

use agenda_core::breaker::CircuitBreaker;
use agenda_core::clock::Clock;
use agenda_core::remote::RemoteAdapter;
use agenda_core::{AgendaConfig, AgendaError, Assistant, Mode, Reply, SchedulingSink};
use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;

use crate::chat_client::ChatCompletionsClient;
use crate::render::Render;
use crate::store::{self, HistoryFile, JsonContactStore};
use crate::utils::tui::create_spinner;
use crate::webhook::{DryRunSink, Organizer, WebhookSink};

/// What the user typed at the prompt.
#[derive(Debug, PartialEq)]
enum Line {
    Empty,
    Quit,
    Reset,
    Text(String),
}

fn classify(line: &str) -> Line {
    match line.trim() {
        "" => Line::Empty,
        "/quit" | "/sair" | "/exit" => Line::Quit,
        "/reset" | "/limpar" => Line::Reset,
        text => Line::Text(text.to_string()),
    }
}

pub async fn run(mode: Option<Mode>, dry_run: bool) -> Result<()> {
    let config = super::load_config()?;
    let mode = mode.unwrap_or(config.mode);
    let clock: Arc<dyn Clock> = Arc::new(config.clock()?);
    let data_dir = config.data_path();

    let contacts = JsonContactStore::open(store::contacts_path(&data_dir))
        .context("Could not read known contacts")?;
    let history = HistoryFile::new(store::history_path(&data_dir));

    let mut assistant = Assistant::new(mode, clock.clone()).with_contacts(Box::new(contacts));
    match history.load(clock.now().with_timezone(&Utc)) {
        Ok(Some(conversation)) => assistant = assistant.with_conversation(conversation),
        Ok(None) => {}
        Err(e) => eprintln!("  {}", format!("Ignoring saved conversation: {}", e).yellow()),
    }

    if mode == Mode::Remote {
        match remote_adapter(&config, clock.clone()) {
            Ok(adapter) => assistant = assistant.with_remote(adapter),
            Err(e) => eprintln!(
                "  {}",
                format!("{}. Using local extraction.", e).yellow()
            ),
        }
    }

    let sink = scheduling_sink(&config, dry_run)?;

    print_banner(mode, &assistant);

    loop {
        let line: String = Input::new()
            .with_prompt("  Você")
            .allow_empty(true)
            .interact_text()?;

        let text = match classify(&line) {
            Line::Empty => continue,
            Line::Quit => break,
            Line::Reset => {
                assistant.reset();
                history.clear()?;
                println!("  {}", "Conversa reiniciada.".dimmed());
                continue;
            }
            Line::Text(text) => text,
        };

        let spinner = (mode == Mode::Remote).then(|| create_spinner("Pensando..."));
        let reply = assistant.send(&text).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let reply = reply?;

        println!("{}", reply.render());
        if matches!(reply, Reply::Proposal(_)) {
            decide(&mut assistant, sink.as_ref()).await?;
        }

        history.save(assistant.conversation())?;
    }

    history.save(assistant.conversation())?;
    Ok(())
}

/// Ask what to do with a complete proposal.
async fn decide(assistant: &mut Assistant, sink: &dyn SchedulingSink) -> Result<()> {
    println!();
    let choice = Select::new()
        .with_prompt("  Agendar esta reunião?")
        .items(&["Confirmar", "Cancelar", "Continuar editando"])
        .default(0)
        .interact()?;

    match choice {
        0 => {
            let spinner = create_spinner("Agendando...");
            let outcome = assistant.confirm(sink).await;
            spinner.finish_and_clear();
            println!("{}", outcome?.render());
        }
        1 => {
            assistant.cancel()?;
            println!("  {}", "Cancelado.".dimmed());
        }
        _ => {}
    }
    Ok(())
}

fn remote_adapter(config: &AgendaConfig, clock: Arc<dyn Clock>) -> Result<RemoteAdapter> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "{} (set {})",
            AgendaError::RemoteNotConfigured,
            config.remote.api_key_env
        )
    })?;
    let transport = ChatCompletionsClient::new(&config.remote, api_key, config.remote_timeout()?)?;
    let breaker = CircuitBreaker::new(
        config.breaker.failure_threshold,
        config.breaker_cooldown()?,
        clock,
    )
    .shared();
    Ok(RemoteAdapter::new(Arc::new(transport), breaker, config.timezone.clone()))
}

fn scheduling_sink(config: &AgendaConfig, dry_run: bool) -> Result<Box<dyn SchedulingSink>> {
    if dry_run {
        return Ok(Box::new(DryRunSink));
    }
    match &config.webhook.url {
        Some(url) => {
            let organizer = Organizer::new(
                config.organizer.name.clone(),
                config.organizer.email.clone(),
                config.timezone.clone(),
            );
            Ok(Box::new(WebhookSink::new(url.clone(), organizer)?))
        }
        None => {
            eprintln!(
                "  {}",
                "No webhook.url configured; confirmed meetings will not be sent.".yellow()
            );
            Ok(Box::new(DryRunSink))
        }
    }
}

fn print_banner(mode: Mode, assistant: &Assistant) {
    let mode_label = match mode {
        Mode::Local => "local",
        Mode::Remote => "remoto",
    };
    println!(
        "{} {}",
        "agenda".bold(),
        format!("(modo {}, /reset para recomeçar, /quit para sair)", mode_label).dimmed()
    );
    let resumed = assistant.conversation().turns().len();
    if resumed > 0 {
        println!(
            "  {}",
            format!("Continuando conversa anterior ({} mensagens).", resumed).dimmed()
        );
    }
    println!();
}
