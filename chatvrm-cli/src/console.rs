// ChatVRM interactive console
// Multi-turn chat with the avatar; each reply is shown as screenplays

use anyhow::Result;
use chatvrm_core::{SegmenterConfig, VoiceParams};
use chatvrm_llm::{ChatProvider, Message};
use chatvrm_script::text_to_screenplay;
use futures_util::StreamExt;
use std::io::{self, BufRead, BufReader, Write};

/// Default character prompt: short replies with one emotion tag per sentence
pub const SYSTEM_PROMPT: &str = "You are a friendly virtual character talking with the user. \
Reply in one to three short sentences. Start each sentence with one of the emotion tags \
[neutral], [happy], [angry], [sad] or [relaxed] that fits how you feel, for example: \
[happy]Nice to meet you! [relaxed]What shall we talk about?";

enum CommandResult {
    Continue,
    Exit,
    Output(String),
}

pub struct InteractiveConsole<'a> {
    provider: &'a dyn ChatProvider,
    segmenter: SegmenterConfig,
    voice: VoiceParams,
    history: Vec<Message>,
}

impl<'a> InteractiveConsole<'a> {
    pub fn new(provider: &'a dyn ChatProvider, segmenter: SegmenterConfig, voice: VoiceParams) -> Self {
        Self {
            provider,
            segmenter,
            voice,
            history: vec![Message::system(SYSTEM_PROMPT)],
        }
    }

    /// Start the interactive console
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdin = BufReader::new(stdin.lock());

        loop {
            print!("you> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.handle_line(line).await {
                Ok(CommandResult::Continue) => continue,
                Ok(CommandResult::Exit) => break,
                Ok(CommandResult::Output(output)) => println!("{}", output),
                Err(e) => println!("❌ Error: {}", e),
            }
        }

        println!("\n👋 Goodbye!");
        Ok(())
    }

    fn print_banner(&self) {
        println!("\nChatVRM console ({})", self.provider.name());
        println!("Type a message to talk, ':reset' to start over, ':exit' to quit");
        println!();
    }

    async fn handle_line(&mut self, line: &str) -> Result<CommandResult> {
        match line {
            ":exit" | ":quit" | ":q" => return Ok(CommandResult::Exit),
            ":reset" => {
                self.history.truncate(1);
                return Ok(CommandResult::Output("History cleared".to_string()));
            }
            ":history" => {
                for message in &self.history[1..] {
                    println!("  {:?}: {}", message.role, message.content);
                }
                return Ok(CommandResult::Continue);
            }
            _ => {}
        }

        self.history.push(Message::user(line));
        let mut stream = match self.provider.chat_stream(&self.history).await {
            Ok(stream) => stream,
            Err(e) => {
                self.history.pop();
                return Err(e.into());
            }
        };

        print!("avatar> ");
        let mut reply = String::new();
        while let Some(piece) = stream.next().await {
            let piece = match piece {
                Ok(piece) => piece,
                Err(e) => {
                    println!();
                    self.history.pop();
                    return Err(e.into());
                }
            };
            print!("{}", piece);
            io::stdout().flush()?;
            reply.push_str(&piece);
        }
        println!();

        let screenplays = text_to_screenplay(&reply, self.voice, &self.segmenter);
        self.history.push(Message::assistant(reply));

        let lines: Vec<String> = screenplays
            .iter()
            .map(|p| format!("  [{}] {}", p.expression, p.talk.message.trim_end()))
            .collect();
        Ok(CommandResult::Output(lines.join("\n")))
    }
}
