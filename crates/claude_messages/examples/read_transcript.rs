//! Prints the messages decoded from a saved `--output-format stream-json` transcript.
//!
//! Usage:
//! - `claude -p "Hello" --output-format stream-json --verbose > out.jsonl`
//! - `cargo run -p claude_messages --example read_transcript -- out.jsonl`

use std::{env, error::Error};

use claude_messages::{message_jsonl_file, ContentBlock, Message};

fn main() -> Result<(), Box<dyn Error>> {
    let Some(path) = env::args().nth(1) else {
        return Err("Provide a path to a stream-json transcript".into());
    };

    for record in message_jsonl_file(&path)? {
        match record.outcome {
            Ok(Message::Assistant(msg)) => {
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => println!("{}: {text}", record.line_number),
                        ContentBlock::ToolUse { name, .. } => {
                            println!("{}: [tool_use {name}]", record.line_number)
                        }
                        _ => {}
                    }
                }
            }
            Ok(Message::Result(msg)) => {
                println!(
                    "{}: result {} after {} turns",
                    record.line_number, msg.subtype, msg.num_turns
                );
            }
            Ok(other) => println!("{}: {}", record.line_number, other.kind()),
            Err(err) => eprintln!("{err}"),
        }
    }

    Ok(())
}
