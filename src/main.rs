//! Demo binary: run the page behaviors over an HTML file.
//!
//! Usage: bellows <input.html> [--settings settings.json] [--url page-url]
//!
//! Prints the transformed document to stdout; attach statistics go to
//! the log (RUST_LOG=info).

use std::process::ExitCode;

use bellows::{parse_html, to_html, BehaviorRegistry, Notification, Settings};

struct Args {
    input: String,
    settings_path: Option<String>,
    url: String,
}

fn parse_args() -> Result<Args, String> {
    let mut input = None;
    let mut settings_path = None;
    let mut url = "https://example.com/".to_string();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                settings_path =
                    Some(args.next().ok_or("--settings requires a path")?);
            }
            "--url" => {
                url = args.next().ok_or("--url requires a value")?;
            }
            "-h" | "--help" => {
                return Err("usage: bellows <input.html> [--settings settings.json] [--url page-url]"
                    .to_string());
            }
            other if input.is_none() => input = Some(other.to_string()),
            other => return Err(format!("unexpected argument: {}", other)),
        }
    }

    Ok(Args {
        input: input.ok_or("missing input file")?,
        settings_path,
        url,
    })
}

fn run(args: &Args) -> Result<(), String> {
    let html = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {}", args.input, e))?;

    let settings = match &args.settings_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path, e))?;
            serde_json::from_str::<Settings>(&raw)
                .map_err(|e| format!("invalid settings in {}: {}", path, e))?
        }
        None => Settings::default(),
    };

    let mut doc = parse_html(&html, &args.url);
    let mut registry = BehaviorRegistry::with_default_behaviors();
    registry.subscribe(|event| {
        let Notification::AccordionAttached { panel_ids } = event;
        log::info!("accordion attached: {} panel(s)", panel_ids.len());
    });

    registry.attach(&mut doc, &settings);
    println!("{}", to_html(&doc.root));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    if let Err(message) = run(&args) {
        eprintln!("{}", message);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
