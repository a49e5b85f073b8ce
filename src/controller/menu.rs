//! The operator's interactive command-line menu.
//!
//! Cosmetics (prompts, colouring) are an external collaborator 
//! ("Operator menu"), but the commands it invokes and their dispatch belong
//! to the core (§4.6). Modeled on
//! `server_controller.py`'s `display_menu`/
//! `action_input`/`control_client`/`action_validated_client_command`, with
//! the design choice of the protocol applied in place of the chained `if/elif` on
//! raw input strings. `colored`'s red/green backgrounds replace `colorama`'s.

use std::path::PathBuf;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::file_manager;
use crate::session::Session;

use super::commands::{self, DirListingOutcome, DownloadOutcome};
use super::Controller;

type StdinLines = Lines<BufReader<Stdin>>;

pub struct MenuConfig {
    pub binary_hash_paths: Vec<PathBuf>,
    pub known_good_hashes_path: PathBuf,
    pub auth_log_path: PathBuf,
}

enum TopCommand {
    Help,
    Refresh,
    List,
    Set(usize),
    Good,
    Exit,
    Unrecognised,
}

impl TopCommand {
    fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("help") => TopCommand::Help,
            Some("r") => TopCommand::Refresh,
            Some("list") => TopCommand::List,
            Some("good") => TopCommand::Good,
            Some("exit") => TopCommand::Exit,
            Some("set") => match parts.next().and_then(|n| n.parse().ok()) {
                Some(index) => TopCommand::Set(index),
                None => TopCommand::Unrecognised,
            },
            _ => TopCommand::Unrecognised,
        }
    }
}

enum SessionCommand {
    Help,
    Refresh,
    Kill,
    Put,
    Get,
    Processes,
    SysInfo,
    Disk,
    ListDir,
    Exit,
    Unrecognised,
}

impl SessionCommand {
    fn parse(line: &str) -> Self {
        match line {
            "help" => SessionCommand::Help,
            "r" => SessionCommand::Refresh,
            "kill" => SessionCommand::Kill,
            "put" => SessionCommand::Put,
            "get" => SessionCommand::Get,
            "processes" => SessionCommand::Processes,
            "sysinfo" => SessionCommand::SysInfo,
            "disk" => SessionCommand::Disk,
            "listdir" => SessionCommand::ListDir,
            "exit" => SessionCommand::Exit,
            _ => SessionCommand::Unrecognised,
        }
    }
}

/// Runs the top-level menu until the operator issues `exit`.
pub async fn run(controller: &Controller, config: &MenuConfig) {
    let mut lines: StdinLines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_statistics(controller, config);
        print!("\nCommand: ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };

        match TopCommand::parse(line.trim()) {
            TopCommand::Help => print_top_help(),
            TopCommand::Refresh => {}
            TopCommand::List => {
                if controller.session_count() == 0 {
                    println!("{}", "No connected clients".on_red());
                } else {
                    println!("{}", controller.render_table());
                }
            }
            TopCommand::Good => controller.generate_known_good_hashes(
                &config.binary_hash_paths,
                &config.known_good_hashes_path,
            ),
            TopCommand::Set(index) => match controller.get(index) {
                Some(session) => run_session(controller, index, &session, &mut lines).await,
                None => println!(
                    "{}",
                    "Client ID does not exist, please enter ID from 'list'".on_red()
                ),
            },
            TopCommand::Exit => {
                controller.shutdown_all().await;
                break;
            }
            TopCommand::Unrecognised => {
                println!(
                    "{}",
                    "Command not recognised, type 'help' for command listing".on_red()
                );
            }
        }
    }
}

async fn run_session(controller: &Controller, index: usize, session: &Session, lines: &mut StdinLines) {
    println!(
        "{}",
        format!("Connected to client {}", session.addr.ip()).on_green()
    );

    loop {
        if controller.get(index).is_none() {
            println!("{}", "Client disconnected".on_red());
            return;
        }

        print!("\nClient {}: ", session.addr.ip());
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(line)) = lines.next_line().await else {
            return;
        };

        match SessionCommand::parse(line.trim()) {
            SessionCommand::Help => print_session_help(),
            SessionCommand::Refresh => {}
            SessionCommand::Kill => {
                controller.kill(index).await;
                return;
            }
            SessionCommand::Put => run_put(controller, session, lines).await,
            SessionCommand::Get => run_get(controller, session, lines).await,
            SessionCommand::Processes => run_processes(controller, session).await,
            SessionCommand::SysInfo => run_sysinfo(controller, session).await,
            SessionCommand::Disk => run_disk(controller, session).await,
            SessionCommand::ListDir => run_listdir(session, lines).await,
            SessionCommand::Exit => return,
            SessionCommand::Unrecognised => {
                println!(
                    "{}",
                    "Command not recognised, type 'help' for command listing".on_red()
                );
            }
        }
    }
}

async fn run_processes(controller: &Controller, session: &Session) {
    match commands::processes(session, controller.artifacts()).await {
        Ok(path) => println!(
            "{}",
            format!("Process dump saved to {}", path.display()).on_green()
        ),
        Err(err) => println!("{}", format!("Error: {err}").on_red()),
    }
}

async fn run_sysinfo(controller: &Controller, session: &Session) {
    match commands::sysinfo(session, controller.artifacts()).await {
        Ok((path, body)) => {
            println!(
                "{}",
                format!("Sysinfo dump saved to {}", path.display()).on_green()
            );
            println!("{body}");
        }
        Err(err) => println!("{}", format!("Error: {err}").on_red()),
    }
}

async fn run_disk(controller: &Controller, session: &Session) {
    match commands::disk(session, controller.artifacts()).await {
        Ok((path, body)) => {
            println!(
                "{}",
                format!("Disk dump saved to {}", path.display()).on_green()
            );
            println!("{body}");
        }
        Err(err) => println!("{}", format!("Error: {err}").on_red()),
    }
}

async fn run_listdir(session: &Session, lines: &mut StdinLines) {
    loop {
        print!("Enter directory to list or 'exit': ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(line)) = lines.next_line().await else {
            return;
        };
        let path = line.trim();
        if path == "exit" {
            return;
        }
        match commands::listdir(session, path).await {
            Ok(DirListingOutcome::Entries(entries)) => println!("{entries}"),
            Ok(DirListingOutcome::NotFound) => println!("{}", "Directory not found".on_red()),
            Ok(DirListingOutcome::PermissionDenied) => println!("{}", "Permission denied".on_red()),
            Ok(DirListingOutcome::NotADirectory) => println!("{}", "Not a directory".on_red()),
            Err(err) => println!("{}", format!("Error: {err}").on_red()),
        }
    }
}

async fn run_get(controller: &Controller, session: &Session, lines: &mut StdinLines) {
    loop {
        print!("Enter file and path to download, or 'exit': ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(line)) = lines.next_line().await else {
            return;
        };
        let path = line.trim();
        if path == "exit" {
            return;
        }
        match commands::download(session, path, controller.artifacts()).await {
            Ok(DownloadOutcome::Saved(path)) => println!(
                "{}",
                format!("File received and saved {}", path.display()).on_green()
            ),
            Ok(DownloadOutcome::RemoteMissing) => println!(
                "{}",
                "Permission denied or file does not exist on client, please try again or 'exit'".on_red()
            ),
            Err(err) => println!("{}", format!("Error downloading file: {err}").on_red()),
        }
    }
}

async fn run_put(controller: &Controller, session: &Session, lines: &mut StdinLines) {
    let files = match controller.artifacts().list_tool_box() {
        Ok(files) => files,
        Err(err) => {
            println!("{}", format!("Error listing tool_box: {err}").on_red());
            return;
        }
    };
    if files.is_empty() {
        println!(
            "{}",
            "No files available, please put files in 'tool_box' folder".on_red()
        );
        return;
    }

    println!("ID   Filename");
    for (id, file) in files.iter().enumerate() {
        println!("{id}    {file}");
    }

    print!("\nEnter file ID to send: ");
    let _ = std::io::Write::flush(&mut std::io::stdout());
    let Ok(Some(line)) = lines.next_line().await else {
        return;
    };
    let Some(filename) = line.trim().parse::<usize>().ok().and_then(|id| files.get(id)) else {
        println!("{}", "File ID does not exist".on_red());
        return;
    };

    let path = controller.artifacts().tool_box_dir().join(filename);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("{}", format!("Error: file not sent. {err}").on_red());
            return;
        }
    };

    match commands::upload(session, filename, &bytes).await {
        Ok(()) => println!("{}", "File sent".on_green()),
        Err(err) => println!("{}", format!("Error: file not sent. {err}").on_red()),
    }
}

fn print_statistics(controller: &Controller, config: &MenuConfig) {
    println!("\n*** SERVER INFO AND LOGS ***");
    println!("Number of connected clients: {}", controller.session_count());
    println!("\nLast 5 logged auth attempts:");
    let tail = file_manager::tail_auth_log(&config.auth_log_path);
    if tail.is_empty() {
        println!("None");
    } else {
        for line in tail {
            println!("{line}");
        }
    }
    println!("{}", "*".repeat(28));
}

fn print_top_help() {
    for (cmd, desc) in [
        ("help", "Display all commands"),
        ("r", "Refresh statistics"),
        ("list", "List connected clients"),
        ("set <id>", "Interact with client <id>, e.g. 'set 1'"),
        ("good", "Regenerate the known-good binary hash manifest"),
        ("exit", "Shut down the server and signal all clients to close"),
    ] {
        println!("{}", format!("{cmd} - {desc}").on_green());
    }
}

fn print_session_help() {
    for (cmd, desc) in [
        ("help", "Display all commands"),
        ("r", "Refresh statistics"),
        ("kill", "Close this client's connection"),
        ("put", "Send a file to the client"),
        ("get", "Download a file from the client"),
        ("processes", "List processes running on the client"),
        ("sysinfo", "Display the client's OS, CPU and memory information"),
        ("disk", "Display the client's disk usage"),
        ("listdir", "List a directory on the client"),
        ("exit", "Return to the main menu"),
    ] {
        println!("{}", format!("{cmd} - {desc}").on_green());
    }
}
