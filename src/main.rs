use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::Parser;

use stencil::{Captures, Engine, Pattern, ScanOptions, Token, TraceEvent, compile};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Placeholder pattern: literal text, `*` gaps, `[name]` captures
    pattern: String,

    /// File to scan (stdin when omitted)
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Rewrite each match with this template; `[name]` expands to the
    /// captured value
    #[arg(short, long, value_name = "TEMPLATE")]
    rewrite: Option<String>,

    /// Write the edited text back to FILE instead of stdout
    #[arg(short = 'i', long, requires = "file")]
    in_place: bool,

    /// Match literal fragments case-sensitively
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Print a trace of every token search to stderr
    #[arg(short, long)]
    trace: bool,

    /// Label attached to trace output
    #[arg(short, long, default_value = "")]
    label: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = match &args.file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    let pattern = compile(&args.pattern);
    for warning in pattern.warnings() {
        eprintln!("warning: {warning}");
    }
    let template = args.rewrite.as_deref().map(compile);

    let mut engine = Engine::from_str(&text);
    if args.trace {
        engine.set_trace(|event: &TraceEvent| eprintln!("{event}"));
    }
    let options = ScanOptions {
        case_sensitive: args.case_sensitive,
        label: args.label.clone(),
    };

    let mut matched = 0usize;
    engine.apply(&pattern, &options, |m| {
        matched += 1;
        match &template {
            Some(template) => {
                let text = expand(template, m.captures());
                m.replace(&text);
            }
            None => {
                println!("{}..{}: {:?}", m.start(), m.end(), m.matched_text());
                for cap in m.captures().iter() {
                    println!("  [{}] = {:?} at {}", cap.name, cap.value, cap.index);
                }
            }
        }
    })?;

    if template.is_some() {
        if args.in_place && let Some(path) = &args.file {
            fs::write(path, engine.text()).with_context(|| format!("failed to write {path}"))?;
            eprintln!("{path}: {matched} match(es) rewritten");
        } else {
            print!("{engine}");
        }
    } else {
        eprintln!("{matched} match(es)");
    }
    Ok(())
}

/// Expand a rewrite template against one match's captures. Templates reuse
/// the pattern language; a gap renders as a single space.
fn expand(template: &Pattern, captures: &Captures) -> String {
    let mut out = String::new();
    for token in template.tokens() {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Capture(name) => out.push_str(captures.value(name)),
            Token::Gap => out.push(' '),
        }
    }
    out
}
