use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use qz_core::domain::tone::{Tone, UnknownTone};
use qz_core::usecase::InteractionController;

use crate::commands;

const HELP: &str = "\
Type text and press Enter to paraphrase it.
  /tone [NAME]     show or change the tone
  /copy            copy the last result
  /clear           start over
  /history         list recent paraphrases
  /restore N|ID    bring back a history entry
  /quit            leave";

/// 1 行分の入力
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Submit(String),
    ShowTone,
    SetTone(Tone),
    Copy,
    Clear,
    History,
    Restore(String),
    Help,
    Quit,
    Unknown(String),
}

fn parse_line(raw: &str) -> Result<Line, UnknownTone> {
    let line = raw.trim_end_matches(['\r', '\n']);
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return Ok(Line::Submit(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    Ok(match name.to_lowercase().as_str() {
        "tone" if arg.is_empty() => Line::ShowTone,
        "tone" => Line::SetTone(arg.parse()?),
        "copy" => Line::Copy,
        "clear" | "new" => Line::Clear,
        "history" => Line::History,
        "restore" if !arg.is_empty() => Line::Restore(arg.to_string()),
        "help" | "?" => Line::Help,
        "quit" | "exit" | "q" => Line::Quit,
        _ => Line::Unknown(line.trim().to_string()),
    })
}

fn prompt(controller: &InteractionController) -> Result<()> {
    let mut err = std::io::stderr();
    write!(err, "[{}] > ", controller.state().tone())?;
    err.flush()?;
    Ok(())
}

/// 行単位の対話セッション。結果は stdout、案内とエラーは stderr に出す。
pub async fn run(controller: &mut InteractionController, tone: Tone, verbose: bool) -> Result<()> {
    controller.set_tone(tone)?;
    eprintln!("Quizontal ({}). /help for commands.", controller.rewriter_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(controller)?;
        let Some(raw) = lines.next_line().await? else {
            break;
        };

        let line = match parse_line(&raw) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match line {
            Line::Submit(text) => {
                controller.set_input(text)?;
                match controller.submit().await {
                    Ok(output) => println!("{output}"),
                    Err(e) => {
                        log::debug!("submit failed: {e}");
                        eprintln!("{}", e.message);
                    }
                }
            }
            Line::ShowTone => {
                let names: Vec<&str> = Tone::ALL.iter().map(|t| t.display_name()).collect();
                eprintln!("Tone: {} (available: {})", controller.state().tone(), names.join(", "));
            }
            Line::SetTone(tone) => {
                controller.set_tone(tone)?;
                eprintln!("Tone set to {tone}.");
            }
            Line::Copy => match controller.copy() {
                Ok(()) => eprintln!("{}", controller.copy_label()),
                Err(e) => eprintln!("{}", e.message),
            },
            Line::Clear => {
                controller.clear()?;
                eprintln!("Cleared.");
            }
            Line::History => commands::print_history(controller.history()),
            Line::Restore(target) => match commands::restore(controller, &target) {
                Ok(()) => {
                    let state = controller.state();
                    eprintln!("Restored ({}): {}", state.tone(), state.input());
                    println!("{}", state.output());
                }
                Err(e) => eprintln!("{e}"),
            },
            Line::Help => eprintln!("{HELP}"),
            Line::Quit => break,
            Line::Unknown(cmd) => eprintln!("Unknown command '{cmd}'. /help lists commands."),
        }
    }

    if verbose {
        eprintln!("{}", serde_json::to_string_pretty(&controller.metrics())?);
    }
    Ok(())
}
