// Sprig: front end driver

mod cli;

use std::fmt::Display;
use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use crossterm::style::{style, Color, Stylize};

use cli::Cli;
use sprig::parser::ast::{Diagnostic, ParseTree, Symbol};
use sprig::parser::lexer::SourceLocation;
use sprig::parser::{parse, parse_with_trace};
use sprig::trace::WriteTrace;

fn main() -> ExitCode {
    let args = Cli::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the file parsed without diagnostics.
fn run(args: &Cli) -> anyhow::Result<bool> {
    let source = fs::read(&args.path)
        .with_context(|| format!("failed to read '{}'", args.path.display()))?;

    let tree = if args.trace {
        let mut trace = WriteTrace::new(io::stderr().lock());
        parse_with_trace(&source, Some(&mut trace))?
    } else {
        parse(&source)?
    };

    let painter = Painter {
        color: !args.no_color,
    };

    if args.tokens && !args.quiet {
        print_tokens(&tree, &source);
    }
    if !args.quiet {
        print_tree(&tree, &source, &painter);
    }

    let file = args.path.display().to_string();
    for diagnostic in &tree.diagnostics {
        eprintln!("{}", render_diagnostic(&tree, &source, &file, diagnostic, &painter));
    }
    if !tree.diagnostics.is_empty() {
        eprintln!(
            "{}",
            painter.paint(format!("{} error(s) in {file}", tree.diagnostics.len()), Color::Red)
        );
    }

    Ok(tree.diagnostics.is_empty())
}

struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, text: impl Display, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: impl Display, color: Color) -> String {
        if self.color {
            style(text).with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn print_tokens(tree: &ParseTree, source: &[u8]) {
    // Lexeme 0 is the sentinel.
    for lexi in 1..tree.lexemes.len() {
        let lexeme = tree.lexemes.get(lexi);
        let location = SourceLocation::from_offset(source, lexeme.span.start);
        println!(
            "#{lexi:<5} {:<8} {:<32} {:?}",
            location.to_string(),
            lexeme.terminal.to_string(),
            tree.lexeme_text(source, lexi)
        );
    }
    println!();
}

fn print_tree(tree: &ParseTree, source: &[u8], painter: &Painter) {
    for (nodi, depth) in tree.iter() {
        let symbol = tree.symbol(nodi);
        let color = match symbol {
            Symbol::Error => Color::Red,
            s if s.is_literal() => Color::Yellow,
            s if s.is_binary() => Color::Magenta,
            _ => Color::Cyan,
        };
        let detail = tree.describe(source, nodi);
        println!(
            "{:indent$}{} {}",
            "",
            painter.paint(symbol, color),
            detail,
            indent = depth * 2
        );
    }
}

/// Render a diagnostic with its location and the offending source line.
fn render_diagnostic(
    tree: &ParseTree,
    source: &[u8],
    file: &str,
    diagnostic: &Diagnostic,
    painter: &Painter,
) -> String {
    let lexeme = tree.lexemes.get(diagnostic.lexi);
    let location = SourceLocation::from_offset(source, lexeme.span.start);

    let line_start = lexeme.span.start.min(source.len());
    let line_start = source[..line_start]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |nl| nl + 1);
    let line_end = source[line_start..]
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .map_or(source.len(), |end| line_start + end);
    let line = String::from_utf8_lossy(&source[line_start..line_end]);

    let gutter = " ".repeat(location.line.to_string().len());
    let carets = "^".repeat(lexeme.span.len().max(1));

    format!(
        "{}: {}\n{gutter}--> {file}:{location}\n{gutter} |\n{} | {line}\n{gutter} | {:pad$}{}",
        painter.bold(format!("error[{}]", diagnostic.tag), Color::Red),
        diagnostic.message(lexeme.terminal),
        location.line,
        "",
        painter.paint(carets, Color::Red),
        pad = location.column - 1,
    )
}
