//! Interactive terminal client for the course materials assistant.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default http://localhost:8000/api/
//! course-chat
//!
//! # Point at another deployment
//! course-chat --api-url https://courses.example.com/api/
//!
//! # Disable colors (useful for piping output)
//! course-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/new` - Start a new chat
//! - `/history` - List previous chats
//! - `/open <n|session_id>` - Open a previous chat read-only
//! - `/courses` - Show the course catalogue
//! - `/theme` - Switch between light and dark theme
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use course_chat::chat::{
    ChatArgs, ChatClient, ChatCommand, ChatConfig, EventBus, FileStore, MemoryStore,
    PreferenceStore, UiEvent, default_event_bus, help_text, parse_command,
};
use course_chat::{CourseClient, PlainTextRenderer, Renderer};

type Client = ChatClient<CourseClient, Box<dyn PreferenceStore>>;

/// Main entry point for the course-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("course-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let api = CourseClient::with_options(config.api_url.clone(), Some(config.timeout))?;
    let store: Box<dyn PreferenceStore> = match &config.preferences_path {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    tracing::debug!(base_url = %api.base_url(), "starting");

    let client: Client = ChatClient::new(api, store);
    let bus: EventBus<Client> = default_event_bus();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    renderer.set_theme(client.theme().initialize_theme());
    println!("Course Materials Assistant ({})", client.api().base_url());
    println!("Type /help for commands, /quit to exit\n");

    client.create_new_session().await;
    tokio::join!(client.load_course_stats(), client.load_chat_history());
    renderer.print_course_stats(&client.course_stats());
    renderer.print_history(&client.history());
    renderer.sync_transcript(&client.transcript());

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                let Some(cmd) = parse_command(line) else {
                    dispatch(&client, &bus, &mut renderer, UiEvent::SubmitQuery(line.to_string()))
                        .await;
                    continue;
                };
                match cmd {
                    ChatCommand::Quit => {
                        println!("Goodbye!");
                        break;
                    }
                    ChatCommand::NewChat => {
                        dispatch(&client, &bus, &mut renderer, UiEvent::NewChat).await;
                        renderer.print_history(&client.history());
                    }
                    ChatCommand::History => {
                        client.load_chat_history().await;
                        renderer.print_history(&client.history());
                    }
                    ChatCommand::Open(target) => {
                        let Some(session_id) = resolve_history_target(&client, &target) else {
                            renderer.print_error(&format!("No chat number {target} in the list"));
                            continue;
                        };
                        dispatch(
                            &client,
                            &bus,
                            &mut renderer,
                            UiEvent::SelectHistoryItem(session_id),
                        )
                        .await;
                        if let Some(modal) = client.modal() {
                            renderer.print_modal(&modal);
                        }
                        acknowledge_alerts(&client, &mut renderer, &mut rl);
                    }
                    ChatCommand::Close => {
                        if client.modal().is_some() {
                            dispatch(&client, &bus, &mut renderer, UiEvent::CloseModal).await;
                            renderer.print_info("Back to the current chat.");
                        } else {
                            renderer.print_info("No chat is open.");
                        }
                    }
                    ChatCommand::Courses => {
                        client.load_course_stats().await;
                        renderer.print_course_stats(&client.course_stats());
                    }
                    ChatCommand::Theme => {
                        dispatch(&client, &bus, &mut renderer, UiEvent::ToggleTheme).await;
                        let theme = client.theme().current();
                        renderer.set_theme(theme);
                        renderer.print_info(&format!("Theme set to {theme}."));
                    }
                    ChatCommand::Help => {
                        for line in help_text().lines() {
                            println!("    {}", line);
                        }
                    }
                    ChatCommand::Invalid(message) => {
                        renderer.print_error(&message);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Dispatches `event`, redrawing the transcript whenever the client reports a
/// change until every handler has finished.
async fn dispatch(
    client: &Client,
    bus: &EventBus<Client>,
    renderer: &mut PlainTextRenderer,
    event: UiEvent,
) {
    let handlers = bus.dispatch(client, event);
    tokio::pin!(handlers);
    loop {
        tokio::select! {
            _ = &mut handlers => break,
            _ = client.changed() => renderer.sync_transcript(&client.transcript()),
        }
    }
    renderer.sync_transcript(&client.transcript());
}

/// A 1-based list position, or a session id taken verbatim.
fn resolve_history_target(client: &Client, target: &str) -> Option<String> {
    match target.parse::<usize>() {
        Ok(position) => position
            .checked_sub(1)
            .and_then(|index| client.history_session(index)),
        Err(_) => Some(target.to_string()),
    }
}

/// Shows each pending alert and blocks until the user presses Enter.
fn acknowledge_alerts(client: &Client, renderer: &mut PlainTextRenderer, rl: &mut DefaultEditor) {
    while let Some(alert) = client.take_alert() {
        renderer.print_alert(&alert);
        if let Err(err) = rl.readline("Press Enter to continue ") {
            tracing::debug!(error = %err, "alert dismissed without input");
        }
    }
}
