use std::env;
use std::fs;

use ariadne::{Color, Label, Report, ReportKind, Source};
use rill_lexer::{Lexer, Span, Token};
use rill_parser::Parser;
use rill_sema::Resolver;

fn print_usage() {
    eprintln!("Rill Compiler Frontend");
    eprintln!();
    eprintln!("Usage: rill <command> <file.rl>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  lex <file>      Show lexer output (tokens)");
    eprintln!("  parse <file>    Show parser output (AST)");
    eprintln!("  resolve <file>  Show name resolution (symbol table)");
    eprintln!("  help            Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  rill parse demos/hello.rl");
    eprintln!("  rill resolve demos/hello.rl");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    // Handle help
    if args[1] == "help" || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        std::process::exit(0);
    }

    let commands = ["lex", "parse", "resolve"];

    let (mode, file_path) = if commands.contains(&args[1].as_str()) {
        if args.len() < 3 {
            eprintln!("Usage: rill {} <file.rl>", args[1]);
            std::process::exit(1);
        }
        (args[1].as_str(), &args[2])
    } else if args[1].starts_with("--") {
        // Support legacy --command syntax
        let cmd = args[1].trim_start_matches("--");
        if commands.contains(&cmd) {
            if args.len() < 3 {
                eprintln!("Usage: rill {} <file.rl>", cmd);
                std::process::exit(1);
            }
            (cmd, &args[2])
        } else {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    } else {
        // Default: treat argument as file and resolve it
        ("resolve", &args[1])
    };

    let source = match fs::read_to_string(file_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file_path, e);
            std::process::exit(1);
        }
    };

    match mode {
        "lex" => run_lexer(&source, file_path),
        "parse" => run_parser(&source, file_path),
        "resolve" => run_resolver(&source, file_path),
        _ => unreachable!(),
    }
}

fn run_lexer(source: &str, file_path: &str) {
    println!("=== Lexer Output for {} ===\n", file_path);

    match Lexer::tokenize(source) {
        Ok(tokens) => {
            println!("{:<8} {:<8} {:<12} {}", "SPAN", "LENGTH", "TOKEN TYPE", "VALUE");
            println!("{}", "-".repeat(50));

            for spanned in &tokens {
                let span_str = format!("{}..{}", spanned.span.start, spanned.span.end);
                let len = spanned.span.end - spanned.span.start;
                let token_type = token_type_name(&spanned.token);
                let value = format!("{}", spanned.token);

                println!("{:<8} {:<8} {:<12} {}", span_str, len, token_type, value);
            }

            println!("\n=== Summary ===");
            println!("Total tokens: {}", tokens.len());

            // Count by type
            let keywords = tokens.iter().filter(|t| is_keyword(&t.token)).count();
            let idents = tokens.iter().filter(|t| matches!(t.token, Token::Ident(_))).count();
            let literals = tokens.iter().filter(|t| is_literal(&t.token)).count();
            let operators = tokens.iter().filter(|t| is_operator(&t.token)).count();
            let delimiters = tokens.iter().filter(|t| is_delimiter(&t.token)).count();

            println!("  Keywords:    {}", keywords);
            println!("  Identifiers: {}", idents);
            println!("  Literals:    {}", literals);
            println!("  Operators:   {}", operators);
            println!("  Delimiters:  {}", delimiters);
        }
        Err(e) => {
            report_error(source, file_path, &e.message, e.span);
            std::process::exit(1);
        }
    }
}

fn run_parser(source: &str, file_path: &str) {
    println!("=== Parser Output for {} ===\n", file_path);

    match Parser::parse(source) {
        Ok(program) => {
            println!("{}", program.pretty_print());
            println!("=== Summary ===");
            println!("Functions: {}", program.functions.len());
        }
        Err(e) => {
            report_error(source, file_path, &e.message, e.span);
            std::process::exit(1);
        }
    }
}

fn run_resolver(source: &str, file_path: &str) {
    println!("=== Name Resolution for {} ===\n", file_path);

    let mut program = match Parser::parse(source) {
        Ok(program) => program,
        Err(e) => {
            report_error(source, file_path, &e.message, e.span);
            std::process::exit(1);
        }
    };

    match Resolver::resolve(&mut program) {
        Ok(table) => {
            println!("{}", table.pretty_print());
        }
        Err(e) => {
            report_error(source, file_path, &e.message, e.span);
            std::process::exit(1);
        }
    }
}

fn report_error(source: &str, file_path: &str, message: &str, span: Span) {
    let result = Report::build(ReportKind::Error, file_path, span.start)
        .with_message(message)
        .with_label(
            Label::new((file_path, span.start..span.end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((file_path, Source::from(source)));

    if result.is_err() {
        // stderr is gone, fall back to a bare line
        eprintln!("error: {} at {}..{}", message, span.start, span.end);
    }
}

fn token_type_name(token: &Token) -> &'static str {
    match token {
        Token::If | Token::Else | Token::While | Token::Do | Token::For
        | Token::Switch | Token::Case | Token::Default | Token::Return
        | Token::True | Token::False | Token::KwInt | Token::KwFloat
        | Token::KwString | Token::KwBool | Token::KwVoid => "KEYWORD",

        Token::IntLiteral(_) => "INT",
        Token::FloatLiteral(_) => "FLOAT",
        Token::StringLiteral(_) => "STRING",

        Token::Ident(_) => "IDENT",

        Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Percent
        | Token::Eq | Token::EqEq | Token::NotEq | Token::Lt | Token::Gt
        | Token::LtEq | Token::GtEq | Token::AndAnd | Token::OrOr | Token::Not => "OPERATOR",

        Token::LParen | Token::RParen | Token::LBrace | Token::RBrace => "DELIMITER",

        Token::Comma | Token::Colon | Token::Semi => "PUNCTUATION",

        Token::Eof => "EOF",
    }
}

fn is_keyword(token: &Token) -> bool {
    matches!(token_type_name(token), "KEYWORD")
}

fn is_literal(token: &Token) -> bool {
    matches!(
        token,
        Token::IntLiteral(_) | Token::FloatLiteral(_) | Token::StringLiteral(_)
    )
}

fn is_operator(token: &Token) -> bool {
    matches!(token_type_name(token), "OPERATOR")
}

fn is_delimiter(token: &Token) -> bool {
    matches!(token_type_name(token), "DELIMITER" | "PUNCTUATION")
}
