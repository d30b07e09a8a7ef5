//! Narrativize a stored storyline JSON into diary-style paragraphs.
//!
//! ```bash
//! therasim output_storylines/storyline_20250207_162355.json
//! ```
//!
//! Writes the diary JSON to an `output_diaries/` directory next to the
//! storyline file and prints the output path.

use std::path::PathBuf;
use std::sync::Arc;

use therasim_core::{load_storyline, save_diary, NarrativeChainer, PromptSet, TextGen};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct CliArgs {
    storyline_path: PathBuf,
    model: Option<String>,
    prompts_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage.");
            std::process::exit(1);
        }
    };

    // Check for API key
    if std::env::var("OPENAI_API_KEY").is_err() {
        eprintln!("Error: OPENAI_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export OPENAI_API_KEY=your_key_here");
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = openai::OpenAi::from_env()?;
    if let Some(model) = args.model {
        client = client.with_model(model);
    }
    let backend: Arc<dyn TextGen> = Arc::new(client);

    let mut chainer = NarrativeChainer::new(backend);
    if let Some(ref dir) = args.prompts_dir {
        let prompts = PromptSet::from_dir(dir)
            .map_err(|e| format!("failed to load prompts from {}: {e}", dir.display()))?;
        chainer = chainer.with_system_prompt(prompts.narrator_system);
    }

    println!("Loading storyline from: {}", args.storyline_path.display());
    let storyline = load_storyline(&args.storyline_path).await.map_err(|e| {
        format!(
            "failed to load storyline {}: {e}",
            args.storyline_path.display()
        )
    })?;

    info!(periods = storyline.len(), "storyline loaded");

    println!("Narrativizing periods...");
    let diary = chainer.narrativize_storyline(&storyline).await?;

    let out_path = save_diary(&diary, &args.storyline_path).await?;
    println!("Diary saved to: {}", out_path.display());
    Ok(())
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut storyline_path = None;
    let mut model = None;
    let mut prompts_dir = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--model" => {
                model = Some(
                    iter.next()
                        .ok_or("--model requires a value")?
                        .to_string(),
                );
            }
            "--prompts" => {
                prompts_dir = Some(PathBuf::from(
                    iter.next().ok_or("--prompts requires a value")?,
                ));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag: {flag}"));
            }
            positional => {
                if storyline_path.is_some() {
                    return Err("expected exactly one storyline path".to_string());
                }
                storyline_path = Some(PathBuf::from(positional));
            }
        }
    }

    Ok(CliArgs {
        storyline_path: storyline_path.ok_or("missing storyline path argument")?,
        model,
        prompts_dir,
    })
}

fn print_help() {
    println!("therasim - narrativize a storyline JSON into diary paragraphs");
    println!();
    println!("USAGE:");
    println!("    therasim <STORYLINE_JSON> [--model MODEL] [--prompts DIR]");
    println!();
    println!("ARGS:");
    println!("    <STORYLINE_JSON>   Path to the storyline JSON file");
    println!();
    println!("OPTIONS:");
    println!("    --model MODEL      Completion model to use (default: gpt-4o-mini)");
    println!("    --prompts DIR      Directory with prompt overrides");
    println!("                       (storyline_system.txt, narrator_system.txt)");
    println!("    -h, --help         Print this help");
    println!();
    println!("Requires OPENAI_API_KEY (can be set in a .env file).");
}
