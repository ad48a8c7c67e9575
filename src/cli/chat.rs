use std::io::{self, BufRead, Write};

use crate::agent::{Agent, ChatModel, OpenAiClient, TodoTools};
use crate::config::ChatConfig;
use crate::db::Database;
use crate::error::TodoError;

pub fn run(db: &Database) -> Result<i32, TodoError> {
    // The credential check happens before any network traffic.
    let config = ChatConfig::from_env()?;
    let client = OpenAiClient::new(config)?;
    tracing::info!(model = client.model(), db = ?db.path(), "starting chat session");

    print_welcome(client.model());
    let mut agent = Agent::new(client, TodoTools::new(db.conn()));
    let stdin = io::stdin();
    session(&mut agent, stdin.lock())?;
    Ok(0)
}

/// What a line typed at the prompt means.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Exit,
    Help,
    Clear,
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Input::Skip,
        "exit" | "quit" | "q" | "退出" => Input::Exit,
        "help" | "h" | "帮助" => Input::Help,
        "clear" | "cls" | "清屏" => Input::Clear,
        "list" | "ls" | "列表" | "显示" => Input::Message("Show all my pending tasks"),
        "stats" | "statistics" | "统计" => {
            Input::Message("Show my task statistics with a short summary")
        }
        _ => Input::Message(line),
    }
}

/// Read lines until EOF or an exit command. Turn errors are reported and the session goes on.
fn session<M: ChatModel, R: BufRead>(agent: &mut Agent<'_, M>, input: R) -> Result<(), TodoError> {
    let mut lines = input.lines();
    loop {
        print!("\nyou> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        match classify(&line) {
            Input::Skip => continue,
            Input::Exit => {
                println!("Bye!");
                break;
            }
            Input::Help => print_help(),
            Input::Clear => {
                agent.clear_history();
                println!("Conversation cleared.");
            }
            Input::Message(text) => match agent.chat(text) {
                Ok(answer) => println!("\nassistant> {answer}"),
                Err(e) => eprintln!("Error: {}", e.message),
            },
        }
    }
    Ok(())
}

fn print_welcome(model: &str) {
    println!("todoai chat ({model}): manage your tasks in plain language.");
    println!("Type `help` for commands, `exit` to leave.");
}

fn print_help() {
    println!("\nCommands:");
    println!("  list, ls     show all pending tasks");
    println!("  stats        statistics and summary");
    println!("  clear        forget the conversation so far");
    println!("  help         this help");
    println!("  exit, quit   leave");
    println!("\nOr just say what you want, e.g.:");
    println!("  add a task to prepare the project demo, high priority");
    println!("  complete task 3");
    println!("  which work tasks are still open?");
}
